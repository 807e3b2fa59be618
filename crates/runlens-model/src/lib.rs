mod error;
pub use error::{ModelError, ModelResult};

mod event;
pub use event::{
    ErrorSource, TaskLifecycleEvent, TaskManagerStat, TaskManagerStatKind, TaskRunError,
    TaskRunEvent, TaskRunOutcome, TaskRunResult,
};

mod metric;
pub use metric::{
    OverallTaskRunMetric, SerializedHistogram, TaskRunCounts, TaskRunMetric, TaskRunMetrics,
};
