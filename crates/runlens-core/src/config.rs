use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{error::CoreError, grouping::PrefixGrouping, histogram::SimpleHistogram};

/// Run delay histogram range: 90 minutes.
pub const DEFAULT_HISTOGRAM_MAX_SECS: u64 = 5_400;

/// Run delay histogram resolution: 10 seconds.
pub const DEFAULT_HISTOGRAM_BUCKET_SECS: u64 = 10;

/// Period between two snapshot collections.
pub const DEFAULT_COLLECT_INTERVAL_MS: u64 = 10_000;

/// Bounded lifecycle event queue between the producer and the pump.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 1_024;

/// What the periodic collector does with the aggregator state after a snapshot.
///
/// - `AfterCollect`: counts cover the time since the last collection.
/// - `Never`: counts cover the time since process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    Never,
    #[default]
    AfterCollect,
}

impl FromStr for ResetPolicy {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "never" => Ok(Self::Never),
            "after_collect" | "after-collect" => Ok(Self::AfterCollect),
            _ => Err(CoreError::InvalidConfig(format!("unknown reset policy: {s}"))),
        }
    }
}

impl fmt::Display for ResetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResetPolicy::Never => "never",
            ResetPolicy::AfterCollect => "after_collect",
        };
        f.write_str(s)
    }
}

/// Task run metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Upper bound of the run delay histogram, in seconds.
    pub histogram_max_secs: u64,
    /// Width of one run delay bucket, in seconds.
    pub histogram_bucket_secs: u64,
    /// Reset behaviour of the periodic collector.
    pub reset_policy: ResetPolicy,
    /// Period of the collector, in milliseconds.
    pub collect_interval_ms: u64,
    /// Task type prefixes that also aggregate under their own group.
    pub task_type_group_prefixes: Vec<String>,
    /// Capacity of the lifecycle event queue.
    pub event_queue_capacity: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            histogram_max_secs: DEFAULT_HISTOGRAM_MAX_SECS,
            histogram_bucket_secs: DEFAULT_HISTOGRAM_BUCKET_SECS,
            reset_policy: ResetPolicy::default(),
            collect_interval_ms: DEFAULT_COLLECT_INTERVAL_MS,
            task_type_group_prefixes: vec!["alerting".to_string(), "actions".to_string()],
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
        }
    }
}

impl MetricsConfig {
    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), CoreError> {
        SimpleHistogram::bucket_count_for(self.histogram_max_secs, self.histogram_bucket_secs)?;

        if self.collect_interval_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "collect_interval_ms must be greater than zero".into(),
            ));
        }
        if self.event_queue_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "event_queue_capacity must be greater than zero".into(),
            ));
        }
        if let Some(bad) = self
            .task_type_group_prefixes
            .iter()
            .find(|p| p.trim().is_empty())
        {
            return Err(CoreError::InvalidConfig(format!(
                "task type group prefix must not be blank: {bad:?}"
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn collect_interval(&self) -> Duration {
        Duration::from_millis(self.collect_interval_ms)
    }

    /// Grouping built from `task_type_group_prefixes`.
    pub fn grouping(&self) -> PrefixGrouping {
        PrefixGrouping::new(self.task_type_group_prefixes.iter().cloned())
    }
}
