use runlens_model::TaskRunCounts;

use crate::counter::{CounterKey, CounterSet};

/// Task run counter names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskRunKey {
    Success,
    NotTimedOut,
    Total,
    TotalErrors,
    RescheduledFailures,
    UserErrors,
    FrameworkErrors,
}

impl CounterKey for TaskRunKey {
    const ALL: &'static [Self] = &[
        TaskRunKey::Success,
        TaskRunKey::NotTimedOut,
        TaskRunKey::Total,
        TaskRunKey::TotalErrors,
        TaskRunKey::RescheduledFailures,
        TaskRunKey::UserErrors,
        TaskRunKey::FrameworkErrors,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    fn as_str(self) -> &'static str {
        match self {
            TaskRunKey::Success => "success",
            TaskRunKey::NotTimedOut => "not_timed_out",
            TaskRunKey::Total => "total",
            TaskRunKey::TotalErrors => "total_errors",
            TaskRunKey::RescheduledFailures => "rescheduled_failures",
            TaskRunKey::UserErrors => "user_errors",
            TaskRunKey::FrameworkErrors => "framework_errors",
        }
    }
}

/// Typed view of one counter set.
pub(crate) fn to_counts(set: &CounterSet<TaskRunKey>) -> TaskRunCounts {
    TaskRunCounts {
        success: set.get(TaskRunKey::Success),
        not_timed_out: set.get(TaskRunKey::NotTimedOut),
        total: set.get(TaskRunKey::Total),
        total_errors: set.get(TaskRunKey::TotalErrors),
        rescheduled_failures: set.get(TaskRunKey::RescheduledFailures),
        user_errors: set.get(TaskRunKey::UserErrors),
        framework_errors: set.get(TaskRunKey::FrameworkErrors),
    }
}
