pub mod aggregator;
pub mod collector;
pub mod config;
pub mod counter;
pub mod error;
pub mod grouping;
pub mod histogram;
pub mod pump;

pub use aggregator::{TaskMetricsAggregator, TaskRunKey, TaskRunMetricsAggregator};
pub use collector::{MetricsCollector, MetricsSink, NoOpSink, SinkHandle, noop_sink};
pub use config::{MetricsConfig, ResetPolicy};
pub use error::CoreError;

pub mod prelude {
    pub use crate::aggregator::{TaskMetricsAggregator, TaskRunMetricsAggregator};
    pub use crate::collector::{MetricsCollector, MetricsSink};
    pub use crate::config::{MetricsConfig, ResetPolicy};
    pub use crate::error::CoreError;
    pub use crate::pump::{LifecycleEventSender, event_channel, run_event_pump};
}
