use std::sync::Arc;

use prometheus::{IntGauge, IntGaugeVec, Opts, Registry, proto::MetricFamily};
use tracing::trace;

use runlens_core::{MetricsSink, aggregator::OVERALL};
use runlens_model::{TaskRunCounts, TaskRunMetric};

const NAMESPACE: &str = "runlens";

/// Exports the latest [`TaskRunMetric`] snapshot as Prometheus gauges.
///
/// Gauges instead of counters: snapshots may be reset between collections, so the
/// exported value is whatever the aggregator reported last.
///
/// `emit` clears the labelled vecs before refilling them, so a scrape that runs
/// concurrently with `emit` may see `runlens_task_runs` and `runlens_task_run_delay_bucket`
/// without any series. The next scrape sees the full snapshot again.
#[derive(Clone)]
pub struct PrometheusSink {
    task_runs: IntGaugeVec,
    delay_buckets: IntGaugeVec,
    delay_samples: IntGauge,
    registry: Arc<Registry>,
}

impl PrometheusSink {
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let task_runs = IntGaugeVec::new(
            Opts::new("task_runs", "Task run counters from the last collection")
                .namespace(NAMESPACE),
            &["scope", "key"],
        )?;
        registry.register(Box::new(task_runs.clone()))?;

        let delay_buckets = IntGaugeVec::new(
            Opts::new(
                "task_run_delay_bucket",
                "Cumulative task run delay histogram in seconds",
            )
            .namespace(NAMESPACE),
            &["le"],
        )?;
        registry.register(Box::new(delay_buckets.clone()))?;

        let delay_samples = IntGauge::with_opts(
            Opts::new("task_run_delay_samples", "Number of recorded run delay samples")
                .namespace(NAMESPACE),
        )?;
        registry.register(Box::new(delay_samples.clone()))?;

        Ok(Self {
            task_runs,
            delay_buckets,
            delay_samples,
            registry,
        })
    }

    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Gather all metric families for exposition.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    fn set_counts(&self, scope: &str, counts: &TaskRunCounts) {
        for (key, value) in counts.entries() {
            self.task_runs
                .with_label_values(&[scope, key])
                .set(clamp(value));
        }
    }
}

impl MetricsSink for PrometheusSink {
    fn emit(&self, metric: &TaskRunMetric) {
        // Drop scopes that vanished since the previous snapshot.
        self.task_runs.reset();
        self.delay_buckets.reset();

        self.set_counts(OVERALL, &metric.overall.counts);
        for (scope, counts) in &metric.by_type {
            self.set_counts(scope, counts);
        }

        let mut cumulative: u64 = 0;
        for (upper, count) in metric.overall.delay.buckets() {
            cumulative = cumulative.saturating_add(count);
            self.delay_buckets
                .with_label_values(&[upper.to_string().as_str()])
                .set(clamp(cumulative));
        }
        self.delay_samples
            .set(clamp(metric.overall.delay_values.len() as u64));

        trace!(scopes = metric.by_type.len() + 1, "prometheus gauges updated");
    }
}

#[inline]
fn clamp(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
