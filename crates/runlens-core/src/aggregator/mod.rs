//! Aggregators turning the lifecycle event stream into metric snapshots.
//!
//! An aggregator owns its state and is shared between the event pump (single writer)
//! and the periodic collector (reader). Implementations must apply the effects of one
//! event atomically with respect to `collect()`.
mod key;
pub use key::TaskRunKey;

mod task_run;
pub use task_run::{BY_TYPE, OVERALL, TaskRunMetricsAggregator, classify};

use runlens_model::TaskLifecycleEvent;

/// Metrics aggregator interface.
pub trait TaskMetricsAggregator<T>: Send + Sync + 'static {
    /// Zeroed snapshot, used before anything has been observed.
    fn initial_metric(&self) -> T;

    /// Owned snapshot of the current state.
    fn collect(&self) -> T;

    /// Zero all state in place.
    fn reset(&self);

    /// Snapshot followed by reset, with no event applied in between.
    fn collect_and_reset(&self) -> T;

    /// Ingest one lifecycle event. Unknown or malformed events are ignored.
    fn process_task_lifecycle_event(&self, event: &TaskLifecycleEvent);
}
