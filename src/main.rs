//! ember: Loads fire incident dispatch records into Elasticsearch.
//!
//! Reads credentials and endpoints from the environment (a `.env` file is
//! honoured), pages through the Socrata dataset and bulk-indexes every valid
//! row. Exits non-zero only when configuration is invalid or the source
//! cannot be read; failed page uploads are logged and skipped.

use clap::Parser;
use snafu::prelude::*;
use std::num::NonZeroU64;
use tracing::{debug, info, warn};

use ember::config::{Config, MetricsConfig, PagingConfig};
use ember::error::{AddressParseSnafu, ConfigSnafu, MetricsSnafu, PipelineError};
use ember::{logging, metrics, run_pipeline};

/// Fire incident dispatch data loader.
#[derive(Parser, Debug)]
#[command(name = "ember")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// How many rows to get per page.
    #[arg(long, alias = "page_size")]
    page_size: NonZeroU64,

    /// How many pages to get in total (default: enough to cover every row).
    #[arg(long, alias = "num_pages")]
    num_pages: Option<u64>,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Serve Prometheus metrics on this address (e.g. 0.0.0.0:9090).
    #[arg(long)]
    metrics_address: Option<String>,

    /// Validate configuration without contacting the source or the index.
    #[arg(long)]
    dry_run: bool,
}

#[snafu::report]
#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    let args = Args::parse();

    // Load .env before the subscriber so RUST_LOG can come from it.
    let dotenv = dotenvy::dotenv();
    logging::init(&args.log_level);
    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }

    info!("ember starting");

    let paging = PagingConfig::new(args.page_size, args.num_pages);
    let metrics_config = MetricsConfig {
        address: args.metrics_address.clone(),
    };
    let config = Config::from_env(paging, metrics_config).context(ConfigSnafu)?;

    if args.dry_run {
        info!("Dry run mode - validating configuration");
        info!("Source: {}", config.source.resource_url());
        info!("Index: {}", config.sink.index_url());
        info!("Page size: {}", config.paging.page_size);
        match config.paging.num_pages {
            Some(pages) => info!("Pages: {}", pages),
            None => info!("Pages: all"),
        }
        info!("Configuration is valid");
        return Ok(());
    }

    if let Some(address) = &config.metrics.address {
        let addr = address.parse().context(AddressParseSnafu)?;
        metrics::init(addr).await.context(MetricsSnafu)?;
    }

    let stats = run_pipeline(config).await?;

    if stats.pages_failed > 0 {
        warn!(
            "Run completed with {} failed page(s): {:?}",
            stats.pages_failed,
            stats.failed_pages()
        );
    } else {
        info!("Run completed successfully");
    }

    Ok(())
}
