use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ModelError, ModelResult},
    metric::{SerializedHistogram, TaskRunCounts},
};

/// Counter view of the aggregator state: one overall scope plus one scope per task type or group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRunMetrics {
    pub overall: TaskRunCounts,
    #[serde(default)]
    pub by_type: BTreeMap<String, TaskRunCounts>,
}

/// Overall counters extended with the run delay histogram.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallTaskRunMetric {
    #[serde(flatten)]
    pub counts: TaskRunCounts,
    /// Bucketed run delay, in seconds.
    pub delay: SerializedHistogram,
    /// Raw run delay samples, in recording order.
    pub delay_values: Vec<u64>,
}

/// Point-in-time snapshot produced by `collect()`.
///
/// Owns all of its data; later aggregator updates never show up in a snapshot already taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRunMetric {
    pub overall: OverallTaskRunMetric,
    #[serde(default)]
    pub by_type: BTreeMap<String, TaskRunCounts>,
}

impl TaskRunMetric {
    /// Merge counter state and histogram state into one snapshot.
    pub fn from_parts(
        metrics: TaskRunMetrics,
        delay: SerializedHistogram,
        delay_values: Vec<u64>,
    ) -> Self {
        Self {
            overall: OverallTaskRunMetric {
                counts: metrics.overall,
                delay,
                delay_values,
            },
            by_type: metrics.by_type,
        }
    }

    /// Counters for one task type or group key.
    pub fn by_type(&self, key: &str) -> Option<&TaskRunCounts> {
        self.by_type.get(key)
    }

    /// Counter view without the histogram.
    pub fn counts(&self) -> TaskRunMetrics {
        TaskRunMetrics {
            overall: self.overall.counts,
            by_type: self.by_type.clone(),
        }
    }

    /// Encode the snapshot as JSON.
    pub fn to_json(&self) -> ModelResult<String> {
        serde_json::to_string(self).map_err(|e| ModelError::Encode(e.to_string()))
    }
}
