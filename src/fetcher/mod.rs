//! Random fact fetcher
//!
//! The cycle only depends on [`FactSource`]; [`UselessFactsClient`] is the
//! HTTP implementation against the useless facts API.

pub mod client;
pub mod config;
pub mod models;

pub use client::{FetchError, UselessFactsClient};
pub use config::FetcherConfig;
pub use models::RandomFactResponse;

use crate::facts::Fact;
use async_trait::async_trait;

/// Anything that can produce one candidate fact per call
#[async_trait]
pub trait FactSource: Send + Sync {
    async fn fetch(&self) -> Result<Fact, FetchError>;
}
