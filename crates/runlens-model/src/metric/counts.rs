use serde::{Deserialize, Serialize};

/// Task run counters for one scope (overall, one task type or one type group).
///
/// Every counter is incremented on its own classification branch; none is derived from
/// another, so e.g. `total_errors == user_errors + framework_errors` is not guaranteed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRunCounts {
    pub success: u64,
    pub not_timed_out: u64,
    pub total: u64,
    pub total_errors: u64,
    pub rescheduled_failures: u64,
    pub user_errors: u64,
    pub framework_errors: u64,
}

impl TaskRunCounts {
    /// Named counters in a stable order, keyed by their serialized names.
    pub fn entries(&self) -> [(&'static str, u64); 7] {
        [
            ("success", self.success),
            ("not_timed_out", self.not_timed_out),
            ("total", self.total),
            ("total_errors", self.total_errors),
            ("rescheduled_failures", self.rescheduled_failures),
            ("user_errors", self.user_errors),
            ("framework_errors", self.framework_errors),
        ]
    }

    /// Returns `true` when every counter is zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_match_serialized_field_names() {
        let counts = TaskRunCounts {
            total: 3,
            success: 2,
            ..Default::default()
        };
        let json = serde_json::to_value(counts).unwrap();

        for (name, value) in counts.entries() {
            assert_eq!(json[name], value, "mismatch for {name}");
        }
    }

    #[test]
    fn default_is_zero() {
        assert!(TaskRunCounts::default().is_zero());
        assert!(!TaskRunCounts { total: 1, ..Default::default() }.is_zero());
    }
}
