use std::fmt;

use serde::{Deserialize, Serialize};

/// Disposition of a task run as decided by the task runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskRunResult {
    /// Run finished and the task is done.
    Success,
    /// Run finished and the next occurrence was scheduled.
    SuccessRescheduled,
    /// Run failed and another attempt was scheduled.
    RetryScheduled,
    /// Run failed and no further attempt will be made.
    Failed,
}

impl TaskRunResult {
    /// Returns the result as a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskRunResult::Success => "success",
            TaskRunResult::SuccessRescheduled => "successRescheduled",
            TaskRunResult::RetryScheduled => "retryScheduled",
            TaskRunResult::Failed => "failed",
        }
    }
}

/// Who is to blame for a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorSource {
    /// Caused by the task input or its configuration.
    User,
    /// Internal or unexpected fault of the task framework.
    #[default]
    Framework,
}

/// Error attached to a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunError {
    /// Human readable error message.
    pub message: String,
    /// Error classification. Producers that do not classify default to `framework`.
    #[serde(default)]
    pub source: ErrorSource,
}

impl TaskRunError {
    /// Create an error caused by task input or configuration.
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: ErrorSource::User,
        }
    }

    /// Create an internal framework error.
    pub fn framework(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: ErrorSource::Framework,
        }
    }

    #[inline]
    pub fn is_user_error(&self) -> bool {
        self.source == ErrorSource::User
    }
}

impl fmt::Display for TaskRunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            ErrorSource::User => "user",
            ErrorSource::Framework => "framework",
        };
        write!(f, "{} ({source})", self.message)
    }
}

/// Success/error union carried by a completion event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TaskRunOutcome {
    /// The run completed without error.
    Ran { result: TaskRunResult },
    /// The run returned an error.
    Errored {
        result: TaskRunResult,
        error: TaskRunError,
    },
}

/// Completion of a single task execution attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunEvent {
    /// Identifier of the task instance.
    pub task_id: String,
    /// Declared task type, usually namespaced by its owner (e.g. `"alerting:siem.queryRule"`).
    pub task_type: String,
    /// Whether the run exceeded its deadline.
    #[serde(default)]
    pub is_expired: bool,
    pub outcome: TaskRunOutcome,
}

impl TaskRunEvent {
    /// Build a completion event for a successful run.
    pub fn ran(
        task_id: impl Into<String>,
        task_type: impl Into<String>,
        result: TaskRunResult,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            task_type: task_type.into(),
            is_expired: false,
            outcome: TaskRunOutcome::Ran { result },
        }
    }

    /// Build a completion event for a failed run.
    pub fn errored(
        task_id: impl Into<String>,
        task_type: impl Into<String>,
        result: TaskRunResult,
        error: TaskRunError,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            task_type: task_type.into(),
            is_expired: false,
            outcome: TaskRunOutcome::Errored { result, error },
        }
    }

    /// Mark the run as expired and return the updated event.
    pub fn with_expired(mut self, expired: bool) -> Self {
        self.is_expired = expired;
        self
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, TaskRunOutcome::Ran { .. })
    }

    /// Runner decision for this attempt.
    pub fn result(&self) -> TaskRunResult {
        match &self.outcome {
            TaskRunOutcome::Ran { result } | TaskRunOutcome::Errored { result, .. } => *result,
        }
    }

    /// Error of a failed run, `None` on success.
    pub fn error(&self) -> Option<&TaskRunError> {
        match &self.outcome {
            TaskRunOutcome::Ran { .. } => None,
            TaskRunOutcome::Errored { error, .. } => Some(error),
        }
    }

    /// Returns `true` if the run failed because of task input or configuration.
    pub fn is_user_error(&self) -> bool {
        self.error().is_some_and(TaskRunError::is_user_error)
    }

    /// Returns `true` if the run failed and the runner scheduled another attempt.
    pub fn is_retry_scheduled(&self) -> bool {
        matches!(
            self.outcome,
            TaskRunOutcome::Errored {
                result: TaskRunResult::RetryScheduled,
                ..
            }
        )
    }
}
