//! Tracing initialization for the CLI.

use tracing_subscriber::EnvFilter;

/// Initialize human-readable logging.
///
/// Uses the `RUST_LOG` environment variable if set, otherwise falls back to
/// `log_level`.
pub fn init(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
