//! Periodic snapshot collection.
//!
//! [`MetricsCollector`] takes a snapshot from an aggregator on every tick, hands it to a
//! [`MetricsSink`] and applies the configured [`ResetPolicy`]. Sinks are injected the same
//! way everywhere: as a [`SinkHandle`].
mod sink;
pub use sink::{MetricsSink, SinkHandle};

mod noop;
pub use noop::NoOpSink;

use std::{sync::Arc, time::Duration};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use runlens_model::TaskRunMetric;

use crate::{aggregator::TaskMetricsAggregator, config::ResetPolicy};

/// Create a no-op sink handle.
#[inline]
pub fn noop_sink() -> SinkHandle {
    Arc::new(NoOpSink)
}

/// Drives `collect()` on an interval and forwards snapshots to a sink.
pub struct MetricsCollector<A: ?Sized> {
    aggregator: Arc<A>,
    sink: SinkHandle,
    policy: ResetPolicy,
}

impl<A> MetricsCollector<A>
where
    A: TaskMetricsAggregator<TaskRunMetric> + ?Sized,
{
    pub fn new(aggregator: Arc<A>, sink: SinkHandle, policy: ResetPolicy) -> Self {
        Self {
            aggregator,
            sink,
            policy,
        }
    }

    #[inline]
    pub fn policy(&self) -> ResetPolicy {
        self.policy
    }

    /// Collect one snapshot, emit it and return it.
    ///
    /// Under [`ResetPolicy::AfterCollect`] the snapshot and the reset happen atomically.
    pub fn tick(&self) -> TaskRunMetric {
        let metric = match self.policy {
            ResetPolicy::Never => self.aggregator.collect(),
            ResetPolicy::AfterCollect => self.aggregator.collect_and_reset(),
        };
        trace!(
            total = metric.overall.counts.total,
            types = metric.by_type.len(),
            delay_samples = metric.overall.delay_values.len(),
            "emitting task run metrics"
        );
        self.sink.emit(&metric);
        metric
    }

    /// Tick every `every` until `cancel` fires, then flush once more.
    ///
    /// Returns the number of emitted snapshots, including the final flush.
    pub async fn run(&self, every: Duration, cancel: CancellationToken) -> u64 {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of an interval completes immediately.
        ticker.tick().await;

        debug!(interval_ms = every.as_millis() as u64, policy = %self.policy, "metrics collector started");
        let mut emitted: u64 = 0;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.tick();
                    emitted += 1;
                    debug!(emitted, "metrics collector stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick();
                    emitted += 1;
                }
            }
        }
        emitted
    }
}
