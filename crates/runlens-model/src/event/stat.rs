use serde::{Deserialize, Serialize};

/// Name of a scheduler-level statistic.
///
/// Unknown names deserialize as [`TaskManagerStatKind::Other`] so new producer-side
/// statistics never break decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskManagerStatKind {
    /// Seconds between the scheduled run time of a task and its actual start.
    RunDelay,
    /// Delay between two polling cycles.
    PollingDelay,
    /// Time spent claiming tasks.
    ClaimDuration,
    /// Share of workers busy during the last cycle.
    WorkerUtilization,
    /// Load of the task manager.
    Load,
    #[serde(other)]
    Other,
}

/// Periodic statistic sample emitted by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskManagerStat {
    pub id: TaskManagerStatKind,
    pub value: f64,
}

impl TaskManagerStat {
    /// Build a `runDelay` sample, in seconds.
    pub fn run_delay(secs: f64) -> Self {
        Self {
            id: TaskManagerStatKind::RunDelay,
            value: secs,
        }
    }
}
