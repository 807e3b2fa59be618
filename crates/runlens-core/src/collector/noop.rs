use runlens_model::TaskRunMetric;

use crate::collector::sink::MetricsSink;

/// Sink that discards every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl MetricsSink for NoOpSink {
    #[inline(always)]
    fn emit(&self, _: &TaskRunMetric) {}
}
