//! Task type normalization and type-group derivation.
//!
//! Task types are namespaced by their owner (`"alerting:siem.queryRule"`). Before a type
//! becomes a counter path segment, [`sanitize_task_type`] replaces the path separator so the
//! type never introduces extra nesting. A [`TaskTypeGrouping`] then maps the sanitized type
//! to an optional coarser group whose counters mirror the type's counters.
use std::sync::Arc;

use crate::counter::PATH_SEPARATOR;

/// Replacement for [`PATH_SEPARATOR`] inside task types.
pub const TASK_TYPE_SEPARATOR_REPLACEMENT: &str = "__";

/// Separator between the owner prefix and the rest of a task type.
pub const TASK_TYPE_PREFIX_SEPARATOR: char = ':';

/// Replace every path separator in `task_type` so it can be used as a single path segment.
pub fn sanitize_task_type(task_type: &str) -> String {
    task_type.replace(PATH_SEPARATOR, TASK_TYPE_SEPARATOR_REPLACEMENT)
}

/// Pure mapping from a sanitized task type to its group.
pub trait TaskTypeGrouping: Send + Sync + 'static {
    /// Returns the group of `task_type`, or `None` if the type belongs to no group.
    fn derive_group(&self, task_type: &str) -> Option<String>;
}

impl<F> TaskTypeGrouping for F
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    fn derive_group(&self, task_type: &str) -> Option<String> {
        self(task_type)
    }
}

/// Shared handle to a grouping function.
pub type GroupingHandle = Arc<dyn TaskTypeGrouping>;

/// Grouping that never derives a group.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGrouping;

impl TaskTypeGrouping for NoGrouping {
    #[inline(always)]
    fn derive_group(&self, _: &str) -> Option<String> {
        None
    }
}

/// Groups any type starting with `"<prefix>:"` under `<prefix>` for a fixed list of known prefixes.
#[derive(Debug, Clone, Default)]
pub struct PrefixGrouping {
    prefixes: Vec<String>,
}

impl PrefixGrouping {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl TaskTypeGrouping for PrefixGrouping {
    fn derive_group(&self, task_type: &str) -> Option<String> {
        let (prefix, _) = task_type.split_once(TASK_TYPE_PREFIX_SEPARATOR)?;
        self.prefixes
            .iter()
            .find(|p| p.as_str() == prefix)
            .map(|p| sanitize_task_type(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_every_dot() {
        assert_eq!(sanitize_task_type("a.b.c"), "a__b__c");
        assert_eq!(sanitize_task_type("report"), "report");
        assert_eq!(
            sanitize_task_type("alerting:siem.queryRule"),
            "alerting:siem__queryRule"
        );
    }

    #[test]
    fn prefix_grouping_matches_known_prefixes() {
        let g = PrefixGrouping::new(["alerting", "actions"]);

        assert_eq!(g.derive_group("alerting:siem__queryRule").as_deref(), Some("alerting"));
        assert_eq!(g.derive_group("actions:__email").as_deref(), Some("actions"));
        assert_eq!(g.derive_group("report"), None);
        assert_eq!(g.derive_group("fleet:unenroll"), None);
        assert_eq!(g.derive_group("alerting:").as_deref(), Some("alerting"));
        assert_eq!(g.derive_group("alerting"), None);
    }

    #[test]
    fn closures_are_groupings() {
        let g: GroupingHandle = Arc::new(|t: &str| t.strip_suffix("_v2").map(str::to_string));

        assert_eq!(g.derive_group("export_v2").as_deref(), Some("export"));
        assert_eq!(g.derive_group("export"), None);
    }

    #[test]
    fn no_grouping_never_groups() {
        assert_eq!(NoGrouping.derive_group("alerting:x"), None);
    }
}
