use std::{sync::Arc, time::Duration};

use prometheus::{
    Counter, CounterVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    proto::MetricFamily,
};

use klock_core::{MetricsBackend, Outcome};

const NAMESPACE: &str = "klock";

/// Prometheus metrics backend for klock.
///
/// ## Label cardinality
/// Keys are never used as labels. `outcome` is bounded by [`Outcome`].
#[derive(Clone)]
pub struct PrometheusMetrics {
    submitted: Counter,
    settled: CounterVec,
    wait_seconds: Histogram,
    run_seconds: HistogramVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Create a backend registering its collectors into `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let submitted = Counter::with_opts(
            Opts::new("entries_submitted_total", "Calls submitted to a keyed lock")
                .namespace(NAMESPACE),
        )?;
        registry.register(Box::new(submitted.clone()))?;

        let settled = CounterVec::new(
            Opts::new("entries_settled_total", "Calls settled, by outcome").namespace(NAMESPACE),
            &["outcome"],
        )?;
        registry.register(Box::new(settled.clone()))?;

        let wait_seconds = Histogram::with_opts(
            HistogramOpts::new("wait_seconds", "Time spent queued before running")
                .namespace(NAMESPACE)
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]),
        )?;
        registry.register(Box::new(wait_seconds.clone()))?;

        let run_seconds = HistogramVec::new(
            HistogramOpts::new("run_seconds", "Time spent running under the lock")
                .namespace(NAMESPACE)
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(run_seconds.clone()))?;

        Ok(Self {
            submitted,
            settled,
            wait_seconds,
            run_seconds,
            registry,
        })
    }

    /// Create a backend with its own registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Gather all metrics for exposition.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Underlying registry, for registering application metrics next to klock's.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_submitted(&self) {
        self.submitted.inc();
    }

    fn record_started(&self, waited: Duration) {
        self.wait_seconds.observe(waited.as_secs_f64());
    }

    fn record_settled(&self, outcome: Outcome, ran: Duration) {
        self.settled.with_label_values(&[outcome.as_label()]).inc();
        if outcome.did_run() {
            self.run_seconds
                .with_label_values(&[outcome.as_label()])
                .observe(ran.as_secs_f64());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family<'a>(families: &'a [MetricFamily], name: &str) -> Option<&'a MetricFamily> {
        families.iter().find(|f| f.name() == name)
    }

    #[test]
    fn can_create_prometheus_metrics() {
        let _metrics = PrometheusMetrics::new().expect("failed to create metrics");
    }

    #[test]
    fn settled_counter_is_labelled_by_outcome() {
        let metrics = PrometheusMetrics::new().unwrap();

        metrics.record_submitted();
        metrics.record_submitted();
        metrics.record_settled(Outcome::Succeeded, Duration::from_millis(5));
        metrics.record_settled(Outcome::WaitTimeout, Duration::ZERO);

        let families = metrics.gather();
        let settled = family(&families, "klock_entries_settled_total").expect("settled counter");
        assert_eq!(settled.get_metric().len(), 2);
        assert_eq!(metrics.submitted.get(), 2.0);
    }

    #[test]
    fn run_histogram_skips_entries_that_never_ran() {
        let metrics = PrometheusMetrics::new().unwrap();

        metrics.record_settled(Outcome::WaitTimeout, Duration::ZERO);
        metrics.record_settled(Outcome::QueueFull, Duration::ZERO);
        metrics.record_settled(Outcome::RunTimeout, Duration::from_millis(20));

        let ran = |outcome: Outcome| {
            metrics
                .run_seconds
                .with_label_values(&[outcome.as_label()])
                .get_sample_count()
        };
        assert_eq!(ran(Outcome::RunTimeout), 1);
        assert_eq!(ran(Outcome::WaitTimeout), 0);
        assert_eq!(ran(Outcome::QueueFull), 0);
    }

    #[test]
    fn wait_histogram_observes_starts() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.record_started(Duration::from_millis(3));

        assert_eq!(metrics.wait_seconds.get_sample_count(), 1);
        assert!(family(&metrics.gather(), "klock_wait_seconds").is_some());
    }

    #[test]
    fn can_use_custom_registry() {
        let registry = Arc::new(Registry::new());
        let metrics = PrometheusMetrics::new_with_registry(registry.clone()).unwrap();

        metrics.record_submitted();
        assert!(!registry.gather().is_empty());
    }
}
