use std::sync::Arc;

use runlens_model::TaskRunMetric;

/// Destination of collected snapshots.
///
/// Implementations forward snapshots to a metrics backend (prometheus, logs, etc).
/// `emit` runs on the collector task and should not block.
pub trait MetricsSink: Send + Sync + 'static {
    /// Publish one snapshot.
    fn emit(&self, metric: &TaskRunMetric);
}

/// Shared handle to a metrics sink.
pub type SinkHandle = Arc<dyn MetricsSink>;
