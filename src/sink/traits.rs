//! Traits for document sinks.
//!
//! The pipeline only needs two operations from the destination: make sure the
//! index exists, and accept one bulk request per page.

use async_trait::async_trait;

use crate::error::SinkError;

use super::bulk::BulkBatch;

/// Outcome of the index creation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Created,
    AlreadyExists,
}

/// Result of an accepted bulk request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSummary {
    /// Items the index reported back.
    pub items: usize,
    /// Items the index rejected individually.
    pub failed: usize,
    /// First rejection reason, if any.
    pub first_error: Option<String>,
}

/// Destination for canonical records.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Create the target index, treating an existing index as success.
    async fn ensure_index(&self) -> Result<IndexStatus, SinkError>;

    /// Send one page worth of documents in a single request.
    async fn bulk_upload(&self, batch: BulkBatch) -> Result<BulkSummary, SinkError>;
}
