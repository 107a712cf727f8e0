//! Elasticsearch sink.
//!
//! Creates the index with a fixed mapping and posts one `_bulk` request per
//! page. All requests use HTTP basic auth.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::{Value, json};
use snafu::prelude::*;
use tracing::debug;

use crate::config::SinkConfig;
use crate::error::{SinkClientSnafu, SinkError, SinkRequestSnafu, SinkStatusSnafu};
use crate::transform::fields;

use super::bulk::BulkBatch;
use super::traits::{BulkSummary, DocumentSink, IndexStatus};

const NDJSON: &str = "application/x-ndjson";

/// Error type Elasticsearch reports when creating an index that exists.
const ALREADY_EXISTS: &str = "resource_already_exists_exception";

/// Index settings and mappings for canonical records.
pub fn index_definition() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                (fields::STARFIRE_INCIDENT_ID): {"type": "keyword"},
                (fields::INCIDENT_DATETIME): {"type": "date"},
                (fields::INCIDENT_BOROUGH): {"type": "keyword"},
                (fields::HIGHEST_ALARM_LEVEL): {"type": "keyword"},
                (fields::INCIDENT_CLASSIFICATION): {"type": "keyword"},
                (fields::INCIDENT_CLASSIFICATION_GROUP): {"type": "keyword"},
                (fields::DISPATCH_RESPONSE_SECONDS_QY): {"type": "float"},
                (fields::INCIDENT_TRAVEL_TM_SECONDS_QY): {"type": "float"},
                (fields::ENGINES_ASSIGNED_QUANTITY): {"type": "float"}
            }
        }
    })
}

/// Sink writing to one Elasticsearch index.
pub struct ElasticsearchSink {
    client: reqwest::Client,
    config: SinkConfig,
}

impl ElasticsearchSink {
    pub fn new(config: SinkConfig) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context(SinkClientSnafu)?;

        Ok(Self { client, config })
    }

    pub fn index(&self) -> &str {
        &self.config.index
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.basic_auth(&self.config.username, Some(&self.config.password))
    }
}

#[async_trait]
impl DocumentSink for ElasticsearchSink {
    async fn ensure_index(&self) -> Result<IndexStatus, SinkError> {
        let operation = "create index";
        let response = self
            .authed(self.client.put(self.config.index_url()))
            .json(&index_definition())
            .send()
            .await
            .context(SinkRequestSnafu { operation })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context(SinkRequestSnafu { operation })?;
        debug!(status = status.as_u16(), %body, "Index creation response");

        classify_index_response(status, body)
    }

    async fn bulk_upload(&self, batch: BulkBatch) -> Result<BulkSummary, SinkError> {
        let operation = "bulk upload";
        let response = self
            .authed(self.client.post(self.config.bulk_url()))
            .header(CONTENT_TYPE, NDJSON)
            .body(batch.into_body())
            .send()
            .await
            .context(SinkRequestSnafu { operation })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context(SinkRequestSnafu { operation })?;

        ensure!(
            status.is_success(),
            SinkStatusSnafu {
                operation,
                status: status.as_u16(),
                body,
            }
        );

        Ok(summarize_bulk_response(&body))
    }
}

/// Map the index creation response onto created / already exists / error.
pub fn classify_index_response(status: StatusCode, body: String) -> Result<IndexStatus, SinkError> {
    if status.is_success() {
        return Ok(IndexStatus::Created);
    }
    if status == StatusCode::BAD_REQUEST && body.contains(ALREADY_EXISTS) {
        return Ok(IndexStatus::AlreadyExists);
    }
    SinkStatusSnafu {
        operation: "create index",
        status: status.as_u16(),
        body,
    }
    .fail()
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<serde_json::Map<String, Value>>,
}

/// Count item-level rejections in a `_bulk` response.
///
/// The request itself succeeded at this point; a body that cannot be parsed
/// is reported as zero items rather than as a failure.
pub fn summarize_bulk_response(body: &str) -> BulkSummary {
    let Ok(response) = serde_json::from_str::<BulkResponse>(body) else {
        debug!("Unparseable bulk response body, skipping item accounting");
        return BulkSummary::default();
    };

    let mut summary = BulkSummary {
        items: response.items.len(),
        ..BulkSummary::default()
    };
    if !response.errors {
        return summary;
    }

    for item in &response.items {
        // Each item is keyed by its action, e.g. {"index": {...}}.
        let Some(error) = item.values().find_map(|result| result.get("error")) else {
            continue;
        };
        summary.failed += 1;
        if summary.first_error.is_none() {
            summary.first_error = Some(describe_item_error(error));
        }
    }
    summary
}

fn describe_item_error(error: &Value) -> String {
    let kind = error.get("type").and_then(Value::as_str);
    let reason = error.get("reason").and_then(Value::as_str);
    match (kind, reason) {
        (Some(kind), Some(reason)) => format!("{kind}: {reason}"),
        (Some(kind), None) => kind.to_string(),
        _ => error.to_string(),
    }
}
