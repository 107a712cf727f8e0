//! Socrata (SODA) dataset reader.
//!
//! Queries `{host}/resource/{dataset}.json` with SoQL parameters. Rows are
//! filtered to those carrying both identifying fields and sorted newest
//! first, so consecutive offsets tile the dataset as long as it is not
//! modified mid-run. There is no snapshot or cursor token: rows inserted
//! upstream during a run can shift page boundaries.

use async_trait::async_trait;
use serde_json::Value;
use snafu::prelude::*;
use tracing::debug;

use crate::config::SourceConfig;
use crate::error::{
    EmptyCountSnafu, InvalidCountSnafu, SourceClientSnafu, SourceDecodeSnafu, SourceError,
    SourceRequestSnafu,
};
use crate::transform::{RawRecord, fields};

use super::traits::{Page, PageRequest, RecordSource};

/// Header carrying the application token.
const APP_TOKEN_HEADER: &str = "X-App-Token";

/// Reader for one Socrata dataset.
pub struct SocrataSource {
    client: reqwest::Client,
    url: String,
    app_token: String,
}

impl SocrataSource {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context(SourceClientSnafu)?;

        Ok(Self {
            client,
            url: config.resource_url(),
            app_token: config.app_token.clone(),
        })
    }

    /// `$where` predicate requiring both identifying fields.
    pub fn row_filter() -> String {
        format!(
            "{} IS NOT NULL AND {} IS NOT NULL",
            fields::STARFIRE_INCIDENT_ID,
            fields::INCIDENT_DATETIME
        )
    }

    /// `$order` clause, newest incidents first.
    pub fn row_order() -> String {
        format!("{} DESC", fields::INCIDENT_DATETIME)
    }

    async fn query(
        &self,
        params: &[(&str, String)],
        operation: &'static str,
    ) -> Result<Vec<RawRecord>, SourceError> {
        debug!(url = %self.url, ?params, "Querying source");

        let response = self
            .client
            .get(&self.url)
            .header(APP_TOKEN_HEADER, &self.app_token)
            .query(params)
            .send()
            .await
            .context(SourceRequestSnafu { operation })?
            .error_for_status()
            .context(SourceRequestSnafu { operation })?;

        response
            .json::<Vec<RawRecord>>()
            .await
            .context(SourceDecodeSnafu { operation })
    }
}

#[async_trait]
impl RecordSource for SocrataSource {
    async fn total_records(&self) -> Result<u64, SourceError> {
        let rows = self
            .query(&[("$select", "COUNT(*)".to_string())], "count")
            .await?;
        parse_count(&rows)
    }

    async fn fetch_page(&self, request: PageRequest) -> Result<Page, SourceError> {
        let params = [
            ("$limit", request.limit.to_string()),
            ("$offset", request.offset.to_string()),
            ("$where", Self::row_filter()),
            ("$order", Self::row_order()),
        ];
        self.query(&params, "fetch page").await
    }
}

/// Extract the row count from a `$select=COUNT(*)` response.
///
/// The column alias depends on the API version (`COUNT` or `count`), and the
/// value may arrive as a string or a number.
pub fn parse_count(rows: &[RawRecord]) -> Result<u64, SourceError> {
    let row = rows.first().context(EmptyCountSnafu)?;
    let value = row
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("count"))
        .or_else(|| row.iter().next())
        .map(|(_, value)| value)
        .context(EmptyCountSnafu)?;

    let count = match value {
        Value::String(s) => s.trim().parse::<u64>().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    };

    count.context(InvalidCountSnafu {
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: Value) -> Vec<RawRecord> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_count_string_value() {
        assert_eq!(parse_count(&rows(json!([{"COUNT": "105"}]))).unwrap(), 105);
    }

    #[test]
    fn test_parse_count_lowercase_numeric() {
        assert_eq!(parse_count(&rows(json!([{"count": 7}]))).unwrap(), 7);
    }

    #[test]
    fn test_parse_count_falls_back_to_first_column() {
        assert_eq!(parse_count(&rows(json!([{"COUNT_1": "3"}]))).unwrap(), 3);
    }

    #[test]
    fn test_parse_count_rejects_empty_and_invalid() {
        assert!(matches!(
            parse_count(&rows(json!([]))),
            Err(SourceError::EmptyCount)
        ));
        assert!(matches!(
            parse_count(&rows(json!([{}]))),
            Err(SourceError::EmptyCount)
        ));
        assert!(matches!(
            parse_count(&rows(json!([{"COUNT": "-1"}]))),
            Err(SourceError::InvalidCount { .. })
        ));
    }

    #[test]
    fn test_query_clauses() {
        assert_eq!(
            SocrataSource::row_filter(),
            "starfire_incident_id IS NOT NULL AND incident_datetime IS NOT NULL"
        );
        assert_eq!(SocrataSource::row_order(), "incident_datetime DESC");
    }
}
