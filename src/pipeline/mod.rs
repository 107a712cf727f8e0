//! Main processing pipeline.
//!
//! Connects the source, transformer and sink into a strictly sequential
//! paging loop:
//!
//! `Initializing -> ComputingTotal -> Paging(n) -> Finalizing -> Done`
//!
//! Row-level transform failures drop the row, bulk upload failures drop the
//! page, and only a failed count query or page fetch aborts the run.

mod stats;

use snafu::prelude::*;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{Config, PagingConfig};
use crate::emit;
use crate::error::{
    BulkEncodeSnafu, CountRecordsSnafu, FetchPageSnafu, PipelineError, SinkError, SinkSetupSnafu,
    SourceSetupSnafu,
};
use crate::metrics::events::{
    BulkItemsFailed, BulkPayloadBytes, DocumentsIndexed, PageProcessed, RecordDropped,
    RecordsFetched, SourceRecordsTotal,
};
use crate::sink::{BulkBatch, BulkWriter, DocumentSink, ElasticsearchSink, IndexStatus};
use crate::source::{Page, PageRequest, RecordSource, SocrataSource};
use crate::transform::transform;

pub use stats::{PageReport, PageStatus, PipelineStats};

/// Driver states, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Initializing,
    ComputingTotal,
    /// Processing the 1-based page `page` of `of`.
    Paging { page: u64, of: u64 },
    Finalizing,
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Initializing => f.write_str("initializing"),
            PipelineState::ComputingTotal => f.write_str("computing_total"),
            PipelineState::Paging { page, of } => write!(f, "paging({page}/{of})"),
            PipelineState::Finalizing => f.write_str("finalizing"),
            PipelineState::Done => f.write_str("done"),
        }
    }
}

/// A page after transformation and encoding.
struct EncodedPage {
    batch: BulkBatch,
    dropped: u64,
}

/// Sequential fetch, transform and load driver.
pub struct Pipeline<S, K> {
    source: S,
    sink: K,
    paging: PagingConfig,
    index: String,
}

impl<S: RecordSource, K: DocumentSink> Pipeline<S, K> {
    pub fn new(source: S, sink: K, paging: PagingConfig, index: impl Into<String>) -> Self {
        Self {
            source,
            sink,
            paging,
            index: index.into(),
        }
    }

    /// Run the job to completion.
    ///
    /// Returns the run statistics once every page has been attempted, even if
    /// some uploads failed. The reported total is the source count, not the
    /// number of documents that made it into the index.
    pub async fn run(&self) -> Result<PipelineStats, PipelineError> {
        let started = Instant::now();
        let mut stats = PipelineStats::default();

        enter(PipelineState::Initializing);
        stats.index_status = self.initialize().await;

        enter(PipelineState::ComputingTotal);
        let total = self
            .source
            .total_records()
            .await
            .context(CountRecordsSnafu)?;
        emit!(SourceRecordsTotal { count: total });

        let page_count = self.paging.resolve_page_count(total);
        stats.total_records = total;
        stats.pages_planned = page_count;
        info!(
            total_records = total,
            page_size = self.paging.page_size.get(),
            pages = page_count,
            "Starting paging"
        );

        for index in 0..page_count {
            enter(PipelineState::Paging {
                page: index + 1,
                of: page_count,
            });
            let report = self.process_page(index, page_count).await?;
            stats.record(report);
        }

        enter(PipelineState::Finalizing);
        stats.elapsed = started.elapsed();
        info!("All pages processed");
        info!("  Total source records: {}", stats.total_records);
        info!(
            "  Pages: {} uploaded, {} empty, {} failed",
            stats.pages_uploaded, stats.pages_empty, stats.pages_failed
        );
        info!(
            "  Rows: {} fetched, {} dropped, {} documents indexed",
            stats.records_fetched, stats.records_dropped, stats.documents_indexed
        );
        info!(
            "  Total processing time: {:.2} seconds",
            stats.elapsed.as_secs_f64()
        );

        enter(PipelineState::Done);
        Ok(stats)
    }

    /// Create the index if needed. Failures here never abort the run.
    async fn initialize(&self) -> Option<IndexStatus> {
        match self.sink.ensure_index().await {
            Ok(IndexStatus::Created) => {
                info!(index = %self.index, "Created index");
                Some(IndexStatus::Created)
            }
            Ok(IndexStatus::AlreadyExists) => {
                info!(index = %self.index, "Index already exists, skipping creation");
                Some(IndexStatus::AlreadyExists)
            }
            Err(e) => {
                warn!(index = %self.index, error = %e, "Index setup failed, continuing");
                None
            }
        }
    }

    async fn process_page(&self, index: u64, page_count: u64) -> Result<PageReport, PipelineError> {
        let started = Instant::now();
        let number = index + 1;
        let offset = self.paging.offset(index);

        let rows = self
            .source
            .fetch_page(PageRequest {
                limit: self.paging.page_size,
                offset,
            })
            .await
            .context(FetchPageSnafu {
                page: number,
                offset,
            })?;

        let mut report = PageReport::new(number, offset);
        report.fetched = rows.len() as u64;
        emit!(RecordsFetched {
            count: report.fetched
        });

        match self.encode(number, rows) {
            Ok(encoded) => {
                report.dropped = encoded.dropped;
                report.documents = encoded.batch.documents() as u64;
                self.upload(encoded.batch, &mut report).await;
            }
            Err(e) => {
                warn!(page = number, error = %e, "Failed to build bulk payload");
                report.status = PageStatus::Failed;
                report.error = Some(e.to_string());
            }
        }

        report.elapsed = started.elapsed();
        emit!(PageProcessed {
            status: report.status,
            duration: report.elapsed,
        });
        info!(
            fetched = report.fetched,
            dropped = report.dropped,
            documents = report.documents,
            status = report.status.as_str(),
            "Page {}/{} finished in {:.2} seconds",
            number,
            page_count,
            report.elapsed.as_secs_f64()
        );

        Ok(report)
    }

    /// Transform rows straight into the bulk writer, dropping bad rows.
    fn encode(&self, page: u64, rows: Page) -> Result<EncodedPage, SinkError> {
        let mut writer = BulkWriter::new(&self.index, Vec::new());
        let mut dropped = 0;

        for raw in rows {
            match transform(raw) {
                Ok(record) => writer.write_record(&record).context(BulkEncodeSnafu)?,
                Err(e) => {
                    dropped += 1;
                    emit!(RecordDropped);
                    let payload = serde_json::to_string(&e.record).unwrap_or_default();
                    warn!(page, error = %e, row = %payload, "Skipping row");
                }
            }
        }

        let (body, documents) = writer.finish().context(BulkEncodeSnafu)?;
        Ok(EncodedPage {
            batch: BulkBatch::from_parts(body, documents),
            dropped,
        })
    }

    async fn upload(&self, batch: BulkBatch, report: &mut PageReport) {
        if batch.is_empty() {
            debug!(page = report.number, "No documents to upload");
            report.status = PageStatus::Empty;
            return;
        }

        emit!(BulkPayloadBytes {
            bytes: batch.body().len() as u64
        });

        match self.sink.bulk_upload(batch).await {
            Ok(summary) => {
                report.status = PageStatus::Uploaded;
                report.item_failures = summary.failed as u64;
                emit!(DocumentsIndexed {
                    count: report.indexed()
                });
                if summary.failed > 0 {
                    emit!(BulkItemsFailed {
                        count: summary.failed as u64
                    });
                    warn!(
                        page = report.number,
                        failed = summary.failed,
                        first_error = summary.first_error.as_deref().unwrap_or("unknown"),
                        "Index rejected some documents"
                    );
                }
            }
            Err(e) => {
                warn!(page = report.number, error = %e, "Failed to insert page into index");
                report.status = PageStatus::Failed;
                report.error = Some(e.to_string());
            }
        }
    }
}

fn enter(state: PipelineState) {
    debug!(%state, "Pipeline state");
}

/// Build the Socrata source and Elasticsearch sink from `config` and run.
pub async fn run_pipeline(config: Config) -> Result<PipelineStats, PipelineError> {
    let source = SocrataSource::new(&config.source).context(SourceSetupSnafu)?;
    let index = config.sink.index.clone();
    let sink = ElasticsearchSink::new(config.sink).context(SinkSetupSnafu)?;

    info!(
        dataset = %config.source.dataset_id,
        %index,
        "Loading dataset into index"
    );

    Pipeline::new(source, sink, config.paging, index).run().await
}
