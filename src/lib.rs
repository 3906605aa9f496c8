//! Random fact collector with a deduplicated JSON archive
//!
//! Fetches facts from the useless facts API and appends each new one to a
//! local archive file, skipping any fact whose text is already stored.

pub mod config;
pub mod cycle;
pub mod error;
pub mod facts;
pub mod fetcher;
pub mod metrics;
pub mod scheduler;

pub use config::Config;
pub use cycle::FactCollector;
pub use error::{FactError, Result};
pub use facts::{Archive, ArchiveConfig, ArchiveStore, CorruptPolicy, CycleOutcome, Fact};
pub use fetcher::{FactSource, FetchError, FetcherConfig, UselessFactsClient};
pub use scheduler::{RunSummary, Scheduler, SchedulerConfig};
