//! Traits for paged record sources.

use async_trait::async_trait;
use std::num::NonZeroU64;

use crate::error::SourceError;
use crate::transform::RawRecord;

/// One bounded slice of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: NonZeroU64,
    pub offset: u64,
}

/// Raw rows of one page, in source order.
pub type Page = Vec<RawRecord>;

/// A dataset that can be counted and read by offset.
///
/// Implementations must return rows in a stable order (the pipeline relies on
/// it to tile the dataset with consecutive offsets).
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Total number of rows available.
    async fn total_records(&self) -> Result<u64, SourceError>;

    /// Fetch at most `request.limit` rows starting at `request.offset`.
    async fn fetch_page(&self, request: PageRequest) -> Result<Page, SourceError>;
}
