//! Sink components for writing canonical records to the search index.

pub mod bulk;
mod elasticsearch;
mod traits;

pub use bulk::{BulkBatch, BulkWriter};
pub use elasticsearch::{
    ElasticsearchSink, classify_index_response, index_definition, summarize_bulk_response,
};
pub use traits::{BulkSummary, DocumentSink, IndexStatus};
