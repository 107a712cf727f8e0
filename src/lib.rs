//! ember: A one-shot loader for fire incident dispatch records.
//!
//! This library pages through a Socrata open-data dataset, validates each row
//! against a fixed document shape, and bulk-loads the result into an
//! Elasticsearch index, one `_bulk` request per page.
//!
//! # Example
//!
//! ```ignore
//! use std::num::NonZeroU64;
//! use ember::{Config, run_pipeline, error::PipelineError};
//! use ember::config::{MetricsConfig, PagingConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), PipelineError> {
//!     let paging = PagingConfig::new(NonZeroU64::new(1000).unwrap(), None);
//!     let config = Config::from_env(paging, MetricsConfig::default())
//!         .map_err(|source| PipelineError::Config { source })?;
//!     let stats = run_pipeline(config).await?;
//!     println!("Indexed {} documents", stats.documents_indexed);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod sink;
pub mod source;
pub mod transform;

// Re-export main types
pub use config::Config;
pub use pipeline::{Pipeline, PipelineStats, run_pipeline};
pub use sink::{DocumentSink, ElasticsearchSink};
pub use source::{RecordSource, SocrataSource};
