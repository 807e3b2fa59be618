//! Lifecycle events consumed by the metrics aggregator.
//!
//! Events are produced by the task runner (one per execution attempt or statistic sample)
//! and may arrive as Rust values or JSON documents tagged by `type`.
mod stat;
pub use stat::{TaskManagerStat, TaskManagerStatKind};

mod task_run;
pub use task_run::{ErrorSource, TaskRunError, TaskRunEvent, TaskRunOutcome, TaskRunResult};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// One notification from the task runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TaskLifecycleEvent {
    /// A task execution attempt completed.
    TaskRun(TaskRunEvent),
    /// A scheduler-level statistic sample.
    TaskManagerStat(TaskManagerStat),
    /// Any event kind this crate does not know about.
    #[serde(other)]
    Other,
}

impl TaskLifecycleEvent {
    /// Decode an event from its JSON representation.
    pub fn from_json(s: &str) -> ModelResult<Self> {
        serde_json::from_str(s).map_err(|e| ModelError::Decode(e.to_string()))
    }

    /// Returns the event kind as a static string (used in logs).
    pub fn kind(&self) -> &'static str {
        match self {
            TaskLifecycleEvent::TaskRun(_) => "taskRun",
            TaskLifecycleEvent::TaskManagerStat(_) => "taskManagerStat",
            TaskLifecycleEvent::Other => "other",
        }
    }
}

impl From<TaskRunEvent> for TaskLifecycleEvent {
    fn from(ev: TaskRunEvent) -> Self {
        TaskLifecycleEvent::TaskRun(ev)
    }
}

impl From<TaskManagerStat> for TaskLifecycleEvent {
    fn from(stat: TaskManagerStat) -> Self {
        TaskLifecycleEvent::TaskManagerStat(stat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_task_run_event() {
        let json = r#"{
            "type": "taskRun",
            "taskId": "1",
            "taskType": "alerting:siem.queryRule",
            "isExpired": true,
            "outcome": { "status": "ran", "result": "successRescheduled" }
        }"#;

        let ev = TaskLifecycleEvent::from_json(json).unwrap();
        let TaskLifecycleEvent::TaskRun(run) = ev else {
            panic!("expected taskRun, got {ev:?}");
        };
        assert!(run.is_expired);
        assert_eq!(run.result(), TaskRunResult::SuccessRescheduled);
    }

    #[test]
    fn decodes_stat_event() {
        let json = r#"{"type":"taskManagerStat","id":"runDelay","value":12.4}"#;
        let ev = TaskLifecycleEvent::from_json(json).unwrap();

        assert_eq!(ev, TaskLifecycleEvent::from(TaskManagerStat::run_delay(12.4)));
        assert_eq!(ev.kind(), "taskManagerStat");
    }

    #[test]
    fn unknown_event_type_is_other() {
        let json = r#"{"type":"taskClaim","claimed":4}"#;
        let ev = TaskLifecycleEvent::from_json(json).unwrap();
        assert_eq!(ev, TaskLifecycleEvent::Other);
    }

    #[test]
    fn malformed_json_is_decode_error() {
        let err = TaskLifecycleEvent::from_json("{not json").unwrap_err();
        assert!(matches!(err, ModelError::Decode(_)));
    }
}
