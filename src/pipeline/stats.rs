//! Run and page statistics.

use std::time::Duration;

use crate::sink::IndexStatus;

/// Final state of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    /// Bulk request accepted.
    Uploaded,
    /// Nothing to send (no rows, or every row dropped).
    Empty,
    /// Bulk request failed; the page's documents are lost for this run.
    Failed,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Uploaded => "uploaded",
            PageStatus::Empty => "empty",
            PageStatus::Failed => "failed",
        }
    }
}

/// Outcome of one page.
#[derive(Debug, Clone)]
pub struct PageReport {
    /// 1-based page number.
    pub number: u64,
    pub offset: u64,
    /// Raw rows returned by the source.
    pub fetched: u64,
    /// Rows that failed transformation.
    pub dropped: u64,
    /// Documents in the bulk request.
    pub documents: u64,
    /// Documents the index rejected individually.
    pub item_failures: u64,
    pub status: PageStatus,
    pub elapsed: Duration,
    /// Upload or encoding error for failed pages.
    pub error: Option<String>,
}

impl PageReport {
    pub(crate) fn new(number: u64, offset: u64) -> Self {
        Self {
            number,
            offset,
            fetched: 0,
            dropped: 0,
            documents: 0,
            item_failures: 0,
            status: PageStatus::Empty,
            elapsed: Duration::ZERO,
            error: None,
        }
    }

    /// Documents accepted by the index.
    pub fn indexed(&self) -> u64 {
        match self.status {
            PageStatus::Uploaded => self.documents.saturating_sub(self.item_failures),
            PageStatus::Empty | PageStatus::Failed => 0,
        }
    }
}

/// Statistics about the pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Row count reported by the source before paging.
    pub total_records: u64,
    pub pages_planned: u64,
    pub pages_uploaded: usize,
    pub pages_empty: usize,
    pub pages_failed: usize,
    pub records_fetched: u64,
    pub records_dropped: u64,
    pub documents_indexed: u64,
    pub bulk_item_failures: u64,
    pub elapsed: Duration,
    /// `None` when index setup failed and the run continued anyway.
    pub index_status: Option<IndexStatus>,
    /// Per-page reports in page order.
    pub pages: Vec<PageReport>,
}

impl PipelineStats {
    pub(crate) fn record(&mut self, report: PageReport) {
        match report.status {
            PageStatus::Uploaded => self.pages_uploaded += 1,
            PageStatus::Empty => self.pages_empty += 1,
            PageStatus::Failed => self.pages_failed += 1,
        }
        self.records_fetched += report.fetched;
        self.records_dropped += report.dropped;
        self.documents_indexed += report.indexed();
        self.bulk_item_failures += report.item_failures;
        self.pages.push(report);
    }

    /// Page numbers whose upload failed.
    pub fn failed_pages(&self) -> Vec<u64> {
        self.pages
            .iter()
            .filter(|p| p.status == PageStatus::Failed)
            .map(|p| p.number)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_status_labels() {
        assert_eq!(PageStatus::Uploaded.as_str(), "uploaded");
        assert_eq!(PageStatus::Empty.as_str(), "empty");
        assert_eq!(PageStatus::Failed.as_str(), "failed");
    }

    #[test]
    fn test_pipeline_stats_default() {
        let stats = PipelineStats::default();
        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.documents_indexed, 0);
        assert!(stats.pages.is_empty());
    }

    #[test]
    fn test_record_aggregates_pages() {
        let mut stats = PipelineStats::default();

        let mut uploaded = PageReport::new(1, 0);
        uploaded.fetched = 10;
        uploaded.dropped = 2;
        uploaded.documents = 8;
        uploaded.item_failures = 1;
        uploaded.status = PageStatus::Uploaded;
        stats.record(uploaded);

        let mut failed = PageReport::new(2, 10);
        failed.fetched = 10;
        failed.documents = 10;
        failed.status = PageStatus::Failed;
        stats.record(failed);

        assert_eq!(stats.pages_uploaded, 1);
        assert_eq!(stats.pages_failed, 1);
        assert_eq!(stats.records_fetched, 20);
        assert_eq!(stats.records_dropped, 2);
        assert_eq!(stats.documents_indexed, 7);
        assert_eq!(stats.bulk_item_failures, 1);
        assert_eq!(stats.failed_pages(), vec![2]);
    }
}
