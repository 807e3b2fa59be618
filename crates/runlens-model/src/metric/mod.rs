//! Snapshot shapes handed to telemetry collaborators.
mod counts;
pub use counts::TaskRunCounts;

mod histogram;
pub use histogram::SerializedHistogram;

mod snapshot;
pub use snapshot::{OverallTaskRunMetric, TaskRunMetric, TaskRunMetrics};
