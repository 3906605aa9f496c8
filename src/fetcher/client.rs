//! HTTP client for the useless facts API with retry on transient failures

use super::config::FetcherConfig;
use super::models::RandomFactResponse;
use super::FactSource;
use crate::facts::Fact;
use crate::metrics::METRICS;
use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Longest upstream error body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Fetch error types
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Upstream returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Response is missing required field `{0}`")]
    MissingField(&'static str),
}

impl FetchError {
    /// Short label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::RequestFailed(_) => "request_failed",
            FetchError::Timeout(_) => "timeout",
            FetchError::UpstreamStatus { .. } => "upstream_status",
            FetchError::InvalidResponse(_) => "invalid_response",
            FetchError::MissingField(_) => "missing_field",
        }
    }

    /// Network-level failures and 5xx responses are worth another attempt
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::RequestFailed(_) | FetchError::Timeout(_) => true,
            FetchError::UpstreamStatus { status, .. } => *status >= 500,
            FetchError::InvalidResponse(_) | FetchError::MissingField(_) => false,
        }
    }

    /// The request succeeded but the body was not a usable fact
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            FetchError::InvalidResponse(_) | FetchError::MissingField(_)
        )
    }
}

/// Random fact API client
pub struct UselessFactsClient {
    http: Client,
    config: FetcherConfig,
}

impl UselessFactsClient {
    /// Create a new client
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Single request against the random fact endpoint
    async fn call_api(&self) -> Result<Fact, FetchError> {
        let url = self.config.endpoint();
        debug!("Requesting random fact from {}", url);

        let mut req = self.http.get(&url).header(ACCEPT, "application/json");
        if let Some(language) = self.config.language.as_deref().filter(|l| !l.is_empty()) {
            req = req.query(&[("language", language)]);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(e.to_string())
            } else {
                FetchError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FetchError::UpstreamStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body: RandomFactResponse = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        body.into_fact().map_err(FetchError::MissingField)
    }

    /// Calculate exponential backoff
    fn calculate_backoff(&self, attempt: usize) -> Duration {
        let base = self.config.retry_backoff();
        let multiplier = 2_u32.saturating_pow(attempt.saturating_sub(1) as u32);
        base.saturating_mul(multiplier)
    }
}

#[async_trait]
impl FactSource for UselessFactsClient {
    async fn fetch(&self) -> Result<Fact, FetchError> {
        let start = Instant::now();
        let mut attempt = 0;

        let result = loop {
            attempt += 1;

            match self.call_api().await {
                Ok(fact) => break Ok(fact),
                Err(e) if e.is_transient() && attempt <= self.config.retry_attempts => {
                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        "Fetch attempt {} failed: {}, retrying in {:?}",
                        attempt, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    error!("Fetch failed after {} attempt(s): {}", attempt, e);
                    break Err(e);
                }
            }
        };

        METRICS
            .fetch_duration
            .observe(start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            METRICS.fetch_errors.with_label_values(&[e.kind()]).inc();
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = UselessFactsClient::new(FetcherConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_calculate_backoff() {
        let client = UselessFactsClient::new(FetcherConfig::default()).unwrap();

        assert_eq!(client.calculate_backoff(1), Duration::from_millis(500));
        assert_eq!(client.calculate_backoff(2), Duration::from_millis(1000));
        assert_eq!(client.calculate_backoff(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Timeout("t".into()).is_transient());
        assert!(FetchError::RequestFailed("r".into()).is_transient());
        assert!(FetchError::UpstreamStatus { status: 503, body: String::new() }.is_transient());
        assert!(!FetchError::UpstreamStatus { status: 404, body: String::new() }.is_transient());
        assert!(!FetchError::MissingField("text").is_transient());
        assert!(FetchError::MissingField("text").is_format_error());
        assert!(!FetchError::Timeout("t".into()).is_format_error());
    }
}
