//! Error types for ember using snafu.
//!
//! This module defines structured error types with context selectors for
//! all error conditions in the codebase.

use snafu::prelude::*;

use crate::transform::RawRecord;

// ============ Config Errors ============

/// Errors that can occur while assembling the run configuration.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// One or more settings are missing or invalid.
    ///
    /// All problems are accumulated so the operator sees them at once.
    #[snafu(display("Invalid configuration:\n{message}"))]
    InvalidSettings { message: String },
}

// ============ Source Errors ============

/// Errors that can occur while querying the source dataset.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceError {
    /// Failed to build the HTTP client.
    #[snafu(display("Failed to build source HTTP client: {source}"))]
    SourceClient { source: reqwest::Error },

    /// The request failed in transport or returned a non-success status.
    #[snafu(display("Source request failed ({operation}): {source}"))]
    SourceRequest {
        operation: &'static str,
        source: reqwest::Error,
    },

    /// The response body was not the expected JSON shape.
    #[snafu(display("Failed to decode source response ({operation}): {source}"))]
    SourceDecode {
        operation: &'static str,
        source: reqwest::Error,
    },

    /// The count query returned no rows.
    #[snafu(display("Count query returned no rows"))]
    EmptyCount,

    /// The count query returned a value that is not a non-negative integer.
    #[snafu(display("Count query returned an invalid value: {value}"))]
    InvalidCount { value: String },
}

// ============ Transform Errors ============

/// Reasons a single field of a raw record cannot be coerced.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FieldError {
    /// Required key is absent.
    #[snafu(display("missing field `{field}`"))]
    MissingField { field: &'static str },

    /// Value is null, an array or an object.
    #[snafu(display("field `{field}` has unsupported value {value}"))]
    UnsupportedValue {
        field: &'static str,
        value: serde_json::Value,
    },

    /// Value does not parse as a floating-point number.
    #[snafu(display("field `{field}` is not a number: {value:?}"))]
    NotNumeric {
        field: &'static str,
        value: String,
        source: std::num::ParseFloatError,
    },

    /// Value parses but is NaN or infinite.
    #[snafu(display("field `{field}` is not a finite number: {value}"))]
    NonFinite { field: &'static str, value: f64 },

    /// Timestamp is not in a recognized format.
    #[snafu(display("field `{field}` is not a timestamp: {value:?}"))]
    InvalidTimestamp { field: &'static str, value: String },
}

/// A raw record that could not be turned into a canonical record.
///
/// Carries the offending payload so it can be logged as-is.
#[derive(Debug, Snafu)]
#[snafu(display("{source}"))]
pub struct TransformError {
    pub source: FieldError,
    pub record: RawRecord,
}

// ============ Sink Errors ============

/// Errors that can occur while talking to the search index.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// Failed to build the HTTP client.
    #[snafu(display("Failed to build sink HTTP client: {source}"))]
    SinkClient { source: reqwest::Error },

    /// Transport failure (connection refused, timeout, ...).
    #[snafu(display("Sink request failed ({operation}): {source}"))]
    SinkRequest {
        operation: &'static str,
        source: reqwest::Error,
    },

    /// The index answered with a non-success status.
    #[snafu(display("Sink returned HTTP {status} ({operation}): {body}"))]
    SinkStatus {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Failed to encode the bulk payload.
    #[snafu(display("Failed to encode bulk payload: {source}"))]
    BulkEncode { source: std::io::Error },
}

// ============ Metrics Errors ============

/// Errors that can occur during metrics initialization.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MetricsError {
    /// Failed to bind the metrics listener.
    #[snafu(display("Failed to bind metrics endpoint to {address}"))]
    Bind {
        address: std::net::SocketAddr,
        source: std::io::Error,
    },

    /// Failed to initialize Prometheus recorder.
    #[snafu(display("Failed to initialize Prometheus recorder"))]
    PrometheusInit {
        source: metrics_exporter_prometheus::BuildError,
    },
}

// ============ Pipeline Error (top-level) ============

/// Top-level errors that abort a run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PipelineError {
    /// Configuration error.
    #[snafu(display("Configuration error"))]
    Config { source: ConfigError },

    /// Could not construct the source client.
    #[snafu(display("Source setup failed"))]
    SourceSetup { source: SourceError },

    /// Could not construct the sink client.
    #[snafu(display("Sink setup failed"))]
    SinkSetup { source: SinkError },

    /// The total record count could not be obtained.
    #[snafu(display("Failed to count source records"))]
    CountRecords { source: SourceError },

    /// A page could not be fetched.
    #[snafu(display("Failed to fetch page {page} (offset {offset})"))]
    FetchPage {
        page: u64,
        offset: u64,
        source: SourceError,
    },

    /// Address parsing error.
    #[snafu(display("Failed to parse metrics address"))]
    AddressParse { source: std::net::AddrParseError },

    /// Metrics error.
    #[snafu(display("Metrics error"))]
    Metrics { source: MetricsError },
}

impl PipelineError {
    /// Page number of the failed fetch, if this error aborted the paging loop.
    pub fn failed_page(&self) -> Option<u64> {
        match self {
            PipelineError::FetchPage { page, .. } => Some(*page),
            _ => None,
        }
    }
}
