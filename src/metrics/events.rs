//! Internal events for metrics emission.
//!
//! Each event struct represents a measurable occurrence in the pipeline.
//! Events implement the `InternalEvent` trait which emits the corresponding
//! Prometheus metric. Without an installed recorder the calls are no-ops.

use metrics::{counter, gauge, histogram};
use std::time::Duration;
use tracing::trace;

use crate::pipeline::PageStatus;

/// Trait for internal events that can be emitted as metrics.
pub trait InternalEvent {
    /// Emit this event as a metric.
    fn emit(self);
}

/// Event emitted once the source row count is known.
pub struct SourceRecordsTotal {
    pub count: u64,
}

impl InternalEvent for SourceRecordsTotal {
    fn emit(self) {
        trace!(count = self.count, "Source records total");
        gauge!("ember_source_records").set(self.count as f64);
    }
}

/// Event emitted when raw rows are fetched from the source.
pub struct RecordsFetched {
    pub count: u64,
}

impl InternalEvent for RecordsFetched {
    fn emit(self) {
        trace!(count = self.count, "Records fetched");
        counter!("ember_records_fetched_total").increment(self.count);
    }
}

/// Event emitted when a raw row fails transformation and is dropped.
pub struct RecordDropped;

impl InternalEvent for RecordDropped {
    fn emit(self) {
        trace!("Record dropped");
        counter!("ember_records_dropped_total").increment(1);
    }
}

/// Event emitted when a bulk request carrying documents is accepted.
pub struct DocumentsIndexed {
    pub count: u64,
}

impl InternalEvent for DocumentsIndexed {
    fn emit(self) {
        trace!(count = self.count, "Documents indexed");
        counter!("ember_documents_indexed_total").increment(self.count);
    }
}

/// Event emitted when the index rejects individual bulk items.
pub struct BulkItemsFailed {
    pub count: u64,
}

impl InternalEvent for BulkItemsFailed {
    fn emit(self) {
        trace!(count = self.count, "Bulk items failed");
        counter!("ember_bulk_item_failures_total").increment(self.count);
    }
}

/// Event emitted when a page finishes, whatever its outcome.
pub struct PageProcessed {
    pub status: PageStatus,
    pub duration: Duration,
}

impl InternalEvent for PageProcessed {
    fn emit(self) {
        trace!(
            status = self.status.as_str(),
            duration_ms = self.duration.as_millis(),
            "Page processed"
        );
        counter!("ember_pages_processed_total", "status" => self.status.as_str()).increment(1);
        histogram!("ember_page_duration_seconds").record(self.duration.as_secs_f64());
    }
}

/// Event emitted when the bulk payload for a page has been encoded.
pub struct BulkPayloadBytes {
    pub bytes: u64,
}

impl InternalEvent for BulkPayloadBytes {
    fn emit(self) {
        trace!(bytes = self.bytes, "Bulk payload encoded");
        histogram!("ember_bulk_payload_bytes").record(self.bytes as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_recorder_is_noop() {
        crate::emit!(RecordsFetched { count: 3 });
        crate::emit!(PageProcessed {
            status: PageStatus::Uploaded,
            duration: Duration::from_millis(5),
        });
    }
}
