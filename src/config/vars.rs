//! Environment variable names and an accumulating reader.
//!
//! Each accessor records a message instead of failing, so the caller can
//! surface every missing or malformed variable in a single error.

use std::str::FromStr;

use super::normalize_base_url;

pub const DATASET_ID: &str = "DATASET_ID";
pub const APP_TOKEN: &str = "APP_TOKEN";
pub const SOURCE_HOST: &str = "SOURCE_HOST";
pub const ES_HOST: &str = "ES_HOST";
pub const ES_USERNAME: &str = "ES_USERNAME";
pub const ES_PASSWORD: &str = "ES_PASSWORD";
pub const INDEX_NAME: &str = "INDEX_NAME";
pub const REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";

/// Reads variables through `lookup`, collecting errors as it goes.
pub struct Collector<F> {
    lookup: F,
    errors: Vec<String>,
}

impl<F> Collector<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(lookup: F) -> Self {
        Self {
            lookup,
            errors: Vec::new(),
        }
    }

    /// Blank values count as unset. Anything else is returned verbatim, so
    /// credentials keep their surrounding whitespace.
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    pub fn required(&mut self, name: &str) -> Option<String> {
        let value = self.get(name);
        if value.is_none() {
            self.errors
                .push(format!("environment variable '{name}' is not set"));
        }
        value
    }

    pub fn required_url(&mut self, name: &str) -> Option<String> {
        let raw = self.required(name)?;
        self.url(name, &raw)
    }

    pub fn url_or(&mut self, name: &str, default: &str) -> Option<String> {
        let raw = self.get(name).unwrap_or_else(|| default.to_string());
        self.url(name, &raw)
    }

    fn url(&mut self, name: &str, raw: &str) -> Option<String> {
        match normalize_base_url(raw.trim()) {
            Ok(url) => Some(url),
            Err(e) => {
                self.errors.push(format!(
                    "environment variable '{name}' is not a valid http(s) URL ({raw:?}): {e}"
                ));
                None
            }
        }
    }

    pub fn parsed_or<T>(&mut self, name: &str, default: T) -> T
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(raw) = self.get(name) else {
            return default;
        };
        match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                self.errors.push(format!(
                    "environment variable '{name}' could not be parsed ({raw:?}): {e}"
                ));
                default
            }
        }
    }

    /// Record `message` unless `ok` holds.
    pub fn check(&mut self, ok: bool, message: String) {
        if !ok {
            self.errors.push(message);
        }
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_accumulates_errors() {
        let mut env = Collector::new(|_: &str| None);
        assert!(env.required("EMBER_TEST_A").is_none());
        assert!(env.required("EMBER_TEST_B").is_none());

        let errors = env.into_errors();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("EMBER_TEST_A"));
        assert!(errors[0].contains("not set"));
    }

    #[test]
    fn test_required_keeps_whitespace() {
        let mut env = Collector::new(|_: &str| Some(" s3cret ".to_string()));
        assert_eq!(env.required("ES_PASSWORD").as_deref(), Some(" s3cret "));
        assert!(env.into_errors().is_empty());
    }

    #[test]
    fn test_blank_value_is_unset() {
        let mut env = Collector::new(|_: &str| Some("  \n".to_string()));
        assert!(env.required("ES_PASSWORD").is_none());
        assert_eq!(env.into_errors().len(), 1);
    }

    #[test]
    fn test_urls_and_numbers_are_trimmed() {
        let mut env = Collector::new(|name: &str| match name {
            "EMBER_TEST_URL" => Some(" https://example.com/ \n".to_string()),
            "EMBER_TEST_NUM" => Some(" 30 ".to_string()),
            _ => None,
        });
        assert_eq!(
            env.required_url("EMBER_TEST_URL").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(env.parsed_or("EMBER_TEST_NUM", 7u64), 30);
        assert!(env.into_errors().is_empty());
    }

    #[test]
    fn test_parsed_or_default_and_error() {
        let mut env = Collector::new(|name: &str| match name {
            "EMBER_TEST_GOOD" => Some("42".to_string()),
            "EMBER_TEST_BAD" => Some("forty-two".to_string()),
            _ => None,
        });
        assert_eq!(env.parsed_or("EMBER_TEST_GOOD", 7u64), 42);
        assert_eq!(env.parsed_or("EMBER_TEST_UNSET", 7u64), 7);
        assert_eq!(env.parsed_or("EMBER_TEST_BAD", 7u64), 7);

        let errors = env.into_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("EMBER_TEST_BAD"));
    }

    #[test]
    fn test_url_default_and_validation() {
        let mut env = Collector::new(|name: &str| {
            (name == "EMBER_TEST_URL").then(|| "not a url".to_string())
        });
        assert_eq!(
            env.url_or("EMBER_TEST_UNSET", "https://example.com/").as_deref(),
            Some("https://example.com")
        );
        assert!(env.required_url("EMBER_TEST_URL").is_none());
        assert_eq!(env.into_errors().len(), 1);
    }
}
