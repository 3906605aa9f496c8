//! Metrics collection for the fetch cycle

use prometheus::{
    CounterVec, Histogram, IntGauge, Opts, Registry,
    register_counter_vec_with_registry, register_histogram_with_registry,
    register_int_gauge_with_registry,
};
use std::sync::Arc;
use once_cell::sync::Lazy;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Cycle metrics
    pub cycles: CounterVec,
    pub archive_size: IntGauge,

    // Fetcher metrics
    pub fetch_errors: CounterVec,
    pub fetch_duration: Histogram,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let cycles = register_counter_vec_with_registry!(
            Opts::new("fact_cycles_total", "Fetch cycles by outcome"),
            &["outcome"],
            registry
        )?;

        let archive_size = register_int_gauge_with_registry!(
            Opts::new("fact_archive_size", "Facts stored after the last cycle"),
            registry
        )?;

        let fetch_errors = register_counter_vec_with_registry!(
            Opts::new("fact_fetch_errors_total", "Failed fact fetches by kind"),
            &["kind"],
            registry
        )?;

        let fetch_duration = register_histogram_with_registry!(
            "fact_fetch_duration_seconds",
            "Fact fetch duration in seconds, retries included",
            registry
        )?;

        Ok(Self {
            registry,
            cycles,
            archive_size,
            fetch_errors,
            fetch_duration,
        })
    }

    /// Record the outcome of one cycle
    pub fn record_cycle(&self, outcome: &str) {
        self.cycles.with_label_values(&[outcome]).inc();
    }

    /// Cycles recorded so far with the given outcome
    pub fn cycle_count(&self, outcome: &str) -> u64 {
        self.cycles.with_label_values(&[outcome]).get() as u64
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let metrics = Metrics::new();
        assert!(metrics.is_ok());
    }

    #[test]
    fn test_record_cycle() {
        let metrics = Metrics::new().unwrap();
        metrics.record_cycle("added");
        metrics.record_cycle("added");
        metrics.record_cycle("duplicate");

        assert_eq!(metrics.cycle_count("added"), 2);
        assert_eq!(metrics.cycle_count("duplicate"), 1);
        assert_eq!(metrics.cycle_count("fetch_failed"), 0);
    }

    #[test]
    fn test_export_contains_cycle_counter() {
        let metrics = Metrics::new().unwrap();
        metrics.record_cycle("added");
        metrics.archive_size.set(3);

        let text = metrics.export_prometheus();
        assert!(text.contains("fact_cycles_total"));
        assert!(text.contains("fact_archive_size 3"));
    }
}
