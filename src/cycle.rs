//! Fetch-dedupe-persist cycle
//!
//! One cycle fetches a candidate fact, reloads the archive, and appends and
//! saves the candidate only when its text is not stored yet. Nothing is
//! cached between cycles.

use crate::error::Result;
use crate::facts::{Archive, ArchiveStore, CycleOutcome};
use crate::fetcher::FactSource;
use crate::metrics::METRICS;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Ties a fact source to an archive store
pub struct FactCollector {
    source: Arc<dyn FactSource>,
    store: ArchiveStore,
}

impl FactCollector {
    pub fn new(source: Arc<dyn FactSource>, store: ArchiveStore) -> Self {
        Self { source, store }
    }

    pub fn store(&self) -> &ArchiveStore {
        &self.store
    }

    /// Current archive contents
    pub fn archive(&self) -> Result<Archive> {
        self.store.load()
    }

    /// Run one cycle.
    ///
    /// Fetch failures are returned as [`CycleOutcome::FetchFailed`] and never
    /// touch the archive. A failed save is returned as `Err`.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let candidate = match self.source.fetch().await {
            Ok(fact) => fact,
            Err(e) => {
                warn!("Cycle aborted, fetch failed ({}): {}", e.kind(), e);
                METRICS.record_cycle("fetch_failed");
                return Ok(CycleOutcome::FetchFailed(e));
            }
        };
        debug!("Fetched fact: {:?}", candidate.text);

        let mut archive = match self.store.load() {
            Ok(archive) => archive,
            Err(e) => {
                error!("Cycle aborted, archive unreadable: {}", e);
                METRICS.record_cycle("read_failed");
                return Err(e);
            }
        };

        if archive.contains(&candidate) {
            info!("Duplicate fact skipped ({} facts stored)", archive.len());
            METRICS.record_cycle("duplicate");
            METRICS.archive_size.set(archive.len() as i64);
            return Ok(CycleOutcome::Duplicate(candidate));
        }

        archive.insert(candidate.clone());

        if let Err(e) = self.store.save(&archive) {
            error!("Cycle failed, archive not saved: {}", e);
            METRICS.record_cycle("write_failed");
            return Err(e);
        }

        let total = archive.len();
        info!("New fact added ({} facts stored)", total);
        METRICS.record_cycle("added");
        METRICS.archive_size.set(total as i64);

        Ok(CycleOutcome::Added {
            fact: candidate,
            total,
        })
    }
}
