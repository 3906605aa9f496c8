//! One-shot and periodic execution of the fetch cycle

use crate::cycle::FactCollector;
use crate::error::Result;
use crate::facts::CycleOutcome;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between the start of two cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Stop after this many cycles; run until shutdown when unset
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

fn default_interval_secs() -> u64 {
    60
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_cycles: None,
        }
    }
}

impl SchedulerConfig {
    /// Get interval as Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Tally of cycle outcomes over a scheduler run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub added: u64,
    pub duplicates: u64,
    pub fetch_failures: u64,
    pub write_failures: u64,
    pub read_failures: u64,
}

impl RunSummary {
    pub fn cycles(&self) -> u64 {
        self.added
            + self.duplicates
            + self.fetch_failures
            + self.write_failures
            + self.read_failures
    }

    fn record(&mut self, result: &Result<CycleOutcome>) {
        match result {
            Ok(CycleOutcome::Added { .. }) => self.added += 1,
            Ok(CycleOutcome::Duplicate(_)) => self.duplicates += 1,
            Ok(CycleOutcome::FetchFailed(_)) => self.fetch_failures += 1,
            Err(e) if e.is_write_failure() => self.write_failures += 1,
            Err(_) => self.read_failures += 1,
        }
    }
}

/// Runs cycles sequentially, never overlapping
pub struct Scheduler {
    collector: FactCollector,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(collector: FactCollector, config: SchedulerConfig) -> Self {
        Self { collector, config }
    }

    pub fn collector(&self) -> &FactCollector {
        &self.collector
    }

    /// Run a single cycle
    pub async fn run_once(&self) -> Result<CycleOutcome> {
        self.collector.run_cycle().await
    }

    /// Repeat the cycle every interval until `shutdown` resolves or
    /// `max_cycles` cycles have run. The first cycle starts immediately;
    /// `max_cycles = 0` runs none.
    ///
    /// Failed cycles are logged and counted; the loop keeps going.
    pub async fn run<F>(&self, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        let mut summary = RunSummary::default();
        let mut ticker = tokio::time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            "Fetching a new fact every {}s{}",
            self.config.interval_secs,
            self.config
                .max_cycles
                .map(|n| format!(" for {} cycles", n))
                .unwrap_or_default()
        );

        loop {
            if self.limit_reached(&summary) {
                break;
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let result = self.collector.run_cycle().await;
            if let Err(e) = &result {
                error!("Cycle failed: {}", e);
            }
            summary.record(&result);
        }

        info!(
            "Scheduler stopped after {} cycles: {} added, {} duplicates, \
             {} fetch failures, {} write failures, {} read failures",
            summary.cycles(),
            summary.added,
            summary.duplicates,
            summary.fetch_failures,
            summary.write_failures,
            summary.read_failures
        );
        summary
    }

    fn limit_reached(&self, summary: &RunSummary) -> bool {
        self.config
            .max_cycles
            .is_some_and(|max| summary.cycles() >= max)
    }
}
