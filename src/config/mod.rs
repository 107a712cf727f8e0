//! Run configuration.
//!
//! Credentials and endpoints come from the environment, paging parameters
//! from the command line. Everything is validated once at startup and every
//! problem is reported together, so a misconfigured run fails with the full
//! list instead of one variable at a time.

pub mod vars;

use snafu::prelude::*;
use std::fmt;
use std::num::NonZeroU64;
use std::time::Duration;
use url::Url;

use crate::error::{ConfigError, InvalidSettingsSnafu};

/// Default Socrata host for the NYC open data portal.
pub const DEFAULT_SOURCE_HOST: &str = "https://data.cityofnewyork.us";

/// Default timeout applied to every HTTP request, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 600;

/// Main configuration structure for a run.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceConfig,
    pub sink: SinkConfig,
    pub paging: PagingConfig,
    /// Metrics configuration (optional, disabled by default).
    pub metrics: MetricsConfig,
}

/// Socrata dataset to read from.
#[derive(Clone)]
pub struct SourceConfig {
    /// Base URL of the portal, without trailing slash.
    pub host: String,
    pub dataset_id: String,
    pub app_token: String,
    pub request_timeout: Duration,
}

impl SourceConfig {
    /// Endpoint for row queries against the dataset.
    pub fn resource_url(&self) -> String {
        format!("{}/resource/{}.json", self.host, self.dataset_id)
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("host", &self.host)
            .field("dataset_id", &self.dataset_id)
            .field("app_token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Search index to write to.
#[derive(Clone)]
pub struct SinkConfig {
    /// Base URL of the cluster, without trailing slash.
    pub host: String,
    pub username: String,
    pub password: String,
    pub index: String,
    pub request_timeout: Duration,
}

impl SinkConfig {
    pub fn index_url(&self) -> String {
        format!("{}/{}", self.host, self.index)
    }

    pub fn bulk_url(&self) -> String {
        format!("{}/_bulk", self.host)
    }
}

impl fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("index", &self.index)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// How many rows to request per page, and how many pages.
#[derive(Debug, Clone, Copy)]
pub struct PagingConfig {
    pub page_size: NonZeroU64,
    /// Explicit page count. `None` means "all rows" (computed from the total).
    pub num_pages: Option<u64>,
}

impl PagingConfig {
    pub fn new(page_size: NonZeroU64, num_pages: Option<u64>) -> Self {
        Self {
            page_size,
            num_pages,
        }
    }

    /// Number of pages to request given the dataset's total row count.
    pub fn resolve_page_count(&self, total: u64) -> u64 {
        self.num_pages
            .unwrap_or_else(|| total.div_ceil(self.page_size.get()))
    }

    /// Row offset of the zero-based page `index`.
    pub fn offset(&self, index: u64) -> u64 {
        index.saturating_mul(self.page_size.get())
    }
}

/// Prometheus endpoint configuration.
#[derive(Debug, Clone, Default)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP server to. Disabled when `None`.
    pub address: Option<String>,
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env(paging: PagingConfig, metrics: MetricsConfig) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), paging, metrics)
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(
        lookup: F,
        paging: PagingConfig,
        metrics: MetricsConfig,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = vars::Collector::new(lookup);

        let dataset_id = env.required(vars::DATASET_ID);
        let app_token = env.required(vars::APP_TOKEN);
        let source_host = env.url_or(vars::SOURCE_HOST, DEFAULT_SOURCE_HOST);
        let sink_host = env.required_url(vars::ES_HOST);
        let username = env.required(vars::ES_USERNAME);
        let password = env.required(vars::ES_PASSWORD);
        let index = env.required(vars::INDEX_NAME);
        let timeout_secs =
            env.parsed_or(vars::REQUEST_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS);

        if let Some(name) = &index {
            env.check(
                is_valid_index_name(name),
                format!("'{}' is not a valid index name: {name:?}", vars::INDEX_NAME),
            );
        }
        if let Some(address) = &metrics.address {
            env.check(
                address.parse::<std::net::SocketAddr>().is_ok(),
                format!("metrics address is not a socket address: {address:?}"),
            );
        }

        let errors = env.into_errors();
        ensure!(
            errors.is_empty(),
            InvalidSettingsSnafu {
                message: errors.join("\n"),
            }
        );

        // All options are Some once no errors were recorded.
        match (
            dataset_id,
            app_token,
            source_host,
            sink_host,
            username,
            password,
            index,
        ) {
            (
                Some(dataset_id),
                Some(app_token),
                Some(source_host),
                Some(sink_host),
                Some(username),
                Some(password),
                Some(index),
            ) => {
                let request_timeout = Duration::from_secs(timeout_secs);
                Ok(Self {
                    source: SourceConfig {
                        host: source_host,
                        dataset_id,
                        app_token,
                        request_timeout,
                    },
                    sink: SinkConfig {
                        host: sink_host,
                        username,
                        password,
                        index,
                        request_timeout,
                    },
                    paging,
                    metrics,
                })
            }
            _ => InvalidSettingsSnafu {
                message: "configuration incomplete",
            }
            .fail(),
        }
    }
}

/// Elasticsearch index name rules: lowercase, no path or wildcard characters,
/// must not start with `-`, `_` or `+`, and must not be `.` or `..`.
fn is_valid_index_name(name: &str) -> bool {
    const FORBIDDEN: &[char] = &['\\', '/', '*', '?', '"', '<', '>', '|', ' ', ',', '#', ':'];

    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.starts_with(['-', '_', '+'])
        && !name.contains(FORBIDDEN)
        && !name.chars().any(|c| c.is_uppercase())
}

/// Validate an HTTP(S) base URL and strip any trailing slash.
pub(crate) fn normalize_base_url(raw: &str) -> Result<String, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn paging() -> PagingConfig {
        PagingConfig::new(NonZeroU64::new(50).unwrap(), None)
    }

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATASET_ID", "8m42-w767"),
            ("APP_TOKEN", "token"),
            ("ES_HOST", "https://search.example.com:9200/"),
            ("ES_USERNAME", "elastic"),
            ("ES_PASSWORD", "changeme"),
            ("INDEX_NAME", "fire-incidents"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(
            |key| env.get(key).map(|v| v.to_string()),
            paging(),
            MetricsConfig::default(),
        )
    }

    #[test]
    fn test_config_from_complete_env() {
        let config = load(&full_env()).unwrap();
        assert_eq!(config.source.dataset_id, "8m42-w767");
        assert_eq!(config.source.host, DEFAULT_SOURCE_HOST);
        assert_eq!(
            config.source.resource_url(),
            "https://data.cityofnewyork.us/resource/8m42-w767.json"
        );
        assert_eq!(config.sink.host, "https://search.example.com:9200");
        assert_eq!(config.sink.bulk_url(), "https://search.example.com:9200/_bulk");
        assert_eq!(
            config.sink.index_url(),
            "https://search.example.com:9200/fire-incidents"
        );
        assert_eq!(
            config.sink.request_timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_missing_variables_are_all_reported() {
        let mut env = full_env();
        env.remove("APP_TOKEN");
        env.remove("ES_PASSWORD");
        env.insert("INDEX_NAME", "   ");

        let err = load(&env).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("APP_TOKEN"));
        assert!(message.contains("ES_PASSWORD"));
        assert!(message.contains("INDEX_NAME"));
        assert!(!message.contains("DATASET_ID"));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let mut env = full_env();
        env.insert("ES_HOST", "ftp://search.example.com");
        env.insert("REQUEST_TIMEOUT_SECS", "soon");
        env.insert("INDEX_NAME", "Fire_Incidents");

        let message = load(&env).unwrap_err().to_string();
        assert!(message.contains("ES_HOST"));
        assert!(message.contains("REQUEST_TIMEOUT_SECS"));
        assert!(message.contains("index name"));
    }

    #[test]
    fn test_optional_overrides() {
        let mut env = full_env();
        env.insert("SOURCE_HOST", "http://127.0.0.1:8080/");
        env.insert("REQUEST_TIMEOUT_SECS", "30");

        let config = load(&env).unwrap();
        assert_eq!(config.source.host, "http://127.0.0.1:8080");
        assert_eq!(config.source.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&full_env()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("changeme"));
        assert!(!debug.contains("\"token\""));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_credentials_are_not_trimmed() {
        let mut env = full_env();
        env.insert("ES_PASSWORD", " pass word ");
        env.insert("APP_TOKEN", "token\t");
        env.insert("ES_HOST", " https://search.example.com:9200/ ");

        let config = load(&env).unwrap();
        assert_eq!(config.sink.password, " pass word ");
        assert_eq!(config.source.app_token, "token\t");
        assert_eq!(config.sink.host, "https://search.example.com:9200");
    }

    #[test]
    fn test_page_count_defaults_to_ceiling() {
        let paging = PagingConfig::new(NonZeroU64::new(50).unwrap(), None);
        assert_eq!(paging.resolve_page_count(105), 3);
        assert_eq!(paging.resolve_page_count(100), 2);
        assert_eq!(paging.resolve_page_count(0), 0);

        let offsets: Vec<u64> = (0..paging.resolve_page_count(105))
            .map(|page| paging.offset(page))
            .collect();
        assert_eq!(offsets, vec![0, 50, 100]);
    }

    #[test]
    fn test_explicit_page_count_wins() {
        let paging = PagingConfig::new(NonZeroU64::new(50).unwrap(), Some(1));
        assert_eq!(paging.resolve_page_count(105), 1);
    }

    #[test]
    fn test_index_name_rules() {
        assert!(is_valid_index_name("fire-incidents"));
        assert!(is_valid_index_name("fdny_2024"));
        assert!(!is_valid_index_name("FireIncidents"));
        assert!(!is_valid_index_name("_hidden"));
        assert!(!is_valid_index_name("a/b"));
        assert!(!is_valid_index_name(".."));
    }
}
