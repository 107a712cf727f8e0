//! Prometheus recorder and scrape endpoint.
//!
//! The job is short-lived, so the endpoint mainly serves scrapes taken while
//! a long backfill is running. It exposes:
//! - `/metrics` - Prometheus metrics in text format
//! - `/health` - returns 200 OK while the process is alive

use axum::{Extension, Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use snafu::prelude::*;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::{BindSnafu, MetricsError, PrometheusInitSnafu};

/// Install the global recorder and serve it on `addr`.
///
/// The listener is bound before returning so a taken port fails the run at
/// startup instead of being logged from a background task.
pub async fn init(addr: SocketAddr) -> Result<PrometheusHandle, MetricsError> {
    let listener = TcpListener::bind(addr)
        .await
        .context(BindSnafu { address: addr })?;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context(PrometheusInitSnafu)?;

    info!("Metrics endpoint listening on http://{}/metrics", addr);
    tokio::spawn(serve(listener, router(handle.clone())));

    Ok(handle)
}

fn router(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .layer(Extension(handle))
}

async fn serve(listener: TcpListener, app: Router) {
    if let Err(e) = axum::serve(listener, app).await {
        error!("Metrics server error: {}", e);
    }
}

async fn metrics_handler(Extension(handle): Extension<PrometheusHandle>) -> String {
    handle.render()
}

async fn health_handler() -> &'static str {
    "ok\n"
}
