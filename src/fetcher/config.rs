//! Configuration for the random fact API client

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Random fact API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Endpoint path for a random fact
    #[serde(default = "default_path")]
    pub path: String,

    /// Language requested from the API; omitted from the query when unset or empty
    #[serde(default = "default_language")]
    pub language: Option<String>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra attempts after a transient failure
    #[serde(default)]
    pub retry_attempts: usize,

    /// Base backoff in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_base_url() -> String { "https://uselessfacts.jsph.pl".to_string() }
fn default_path() -> String { "/api/v2/facts/random".to_string() }
fn default_language() -> Option<String> { Some("en".to_string()) }
fn default_user_agent() -> String { format!("fact-archive/{}", env!("CARGO_PKG_VERSION")) }
fn default_timeout_ms() -> u64 { 10_000 }
fn default_retry_backoff_ms() -> u64 { 500 }

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            path: default_path(),
            language: default_language(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            retry_attempts: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl FetcherConfig {
    /// Config pointing at a different API host, e.g. a local mock
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Full endpoint URL without query string
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get retry backoff as Duration
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::default();
        assert_eq!(
            config.endpoint(),
            "https://uselessfacts.jsph.pl/api/v2/facts/random"
        );
        assert_eq!(config.language.as_deref(), Some("en"));
        assert_eq!(config.retry_attempts, 0);
        assert!(config.user_agent.starts_with("fact-archive/"));
    }

    #[test]
    fn test_endpoint_joins_slashes() {
        let mut config = FetcherConfig::with_base_url("http://127.0.0.1:9000/");
        config.path = "random".to_string();
        assert_eq!(config.endpoint(), "http://127.0.0.1:9000/random");
    }

    #[test]
    fn test_duration_conversions() {
        let config = FetcherConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.retry_backoff(), Duration::from_millis(500));
    }
}
