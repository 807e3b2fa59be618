use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::{Level, debug, enabled, trace, warn};

use runlens_model::{
    TaskLifecycleEvent, TaskManagerStat, TaskManagerStatKind, TaskRunEvent, TaskRunMetric,
    TaskRunMetrics,
};

use crate::{
    aggregator::{
        TaskMetricsAggregator,
        key::{TaskRunKey, to_counts},
    },
    config::MetricsConfig,
    counter::{CounterError, CounterSnapshot, MetricCounterService, MetricPath},
    error::CoreError,
    grouping::{GroupingHandle, sanitize_task_type},
    histogram::SimpleHistogram,
};

/// Path of the aggregate scope.
pub const OVERALL: &str = "overall";

/// Parent path of per-type and per-group scopes.
pub const BY_TYPE: &str = "by_type";

/// Counters bumped by one completion event, in application order.
///
/// Branches are independent: a failed run that finished within its deadline
/// counts towards both `total_errors` and `not_timed_out`.
pub fn classify(event: &TaskRunEvent) -> Vec<TaskRunKey> {
    let mut keys = vec![TaskRunKey::Total];

    if event.is_success() {
        keys.push(TaskRunKey::Success);
    } else {
        keys.push(TaskRunKey::TotalErrors);
        if event.is_user_error() {
            keys.push(TaskRunKey::UserErrors);
        } else {
            keys.push(TaskRunKey::FrameworkErrors);
        }
        if event.is_retry_scheduled() {
            keys.push(TaskRunKey::RescheduledFailures);
        }
    }

    if !event.is_expired {
        keys.push(TaskRunKey::NotTimedOut);
    }
    keys
}

struct State {
    counter: MetricCounterService<TaskRunKey>,
    delay: SimpleHistogram,
}

impl State {
    fn snapshot(&self) -> TaskRunMetric {
        TaskRunMetric::from_parts(
            to_metrics(&self.counter.collect()),
            self.delay.serialize(),
            self.delay.get_all_values(),
        )
    }

    fn reset(&mut self) {
        self.counter.reset();
        self.delay.reset();
    }
}

/// Typed counter view of a counter snapshot.
fn to_metrics(snapshot: &CounterSnapshot<TaskRunKey>) -> TaskRunMetrics {
    TaskRunMetrics {
        overall: snapshot.get(OVERALL).map(to_counts).unwrap_or_default(),
        by_type: snapshot
            .children(BY_TYPE)
            .map(|(name, set)| (name.to_string(), to_counts(set)))
            .collect(),
    }
}

/// Aggregator for task run completions and run delay samples.
///
/// Maintains [`TaskRunKey`] counters for the overall scope, for every task type and for
/// every derivable type group, plus a run delay histogram. All state sits behind one mutex
/// held for the duration of a single event or a single snapshot copy.
pub struct TaskRunMetricsAggregator {
    state: Mutex<State>,
    grouping: GroupingHandle,
    overall: MetricPath,
    by_type: MetricPath,
}

impl TaskRunMetricsAggregator {
    /// Create an aggregator using the prefix grouping described by `cfg`.
    pub fn new(cfg: &MetricsConfig) -> Result<Self, CoreError> {
        Self::with_grouping(cfg, Arc::new(cfg.grouping()))
    }

    /// Create an aggregator with an explicit task type grouping.
    pub fn with_grouping(cfg: &MetricsConfig, grouping: GroupingHandle) -> Result<Self, CoreError> {
        cfg.validate()?;

        let state = State {
            counter: MetricCounterService::new(OVERALL)?,
            delay: SimpleHistogram::new(cfg.histogram_max_secs, cfg.histogram_bucket_secs)?,
        };
        Ok(Self {
            state: Mutex::new(state),
            grouping,
            overall: MetricPath::parse(OVERALL)?,
            by_type: MetricPath::parse(BY_TYPE)?,
        })
    }

    /// Mutations never leave the state half-written, so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every scope a run of `task_type` counts towards: overall, the type, and its group.
    fn scopes_for(&self, task_type: &str) -> Result<Vec<MetricPath>, CounterError> {
        let task_type = sanitize_task_type(task_type);
        let mut scopes = vec![self.overall.clone(), self.by_type.join(&task_type)?];

        if let Some(group) = self.grouping.derive_group(&task_type) {
            let group = self.by_type.join(&sanitize_task_type(&group))?;
            if !scopes.contains(&group) {
                scopes.push(group);
            }
        }
        Ok(scopes)
    }

    fn process_task_run_event(&self, event: &TaskRunEvent) {
        let scopes = match self.scopes_for(&event.task_type) {
            Ok(scopes) => scopes,
            Err(e) => {
                warn!(
                    task = %event.task_id,
                    task_type = %event.task_type,
                    error = %e,
                    "skipping task run event with unusable task type"
                );
                return;
            }
        };
        if !event.is_success() {
            debug!(task = %event.task_id, task_type = %event.task_type, "incrementing error counters");
        }

        let keys = classify(event);
        {
            let mut state = self.lock();
            for key in keys {
                for scope in &scopes {
                    state.counter.increment_at(key, scope);
                }
            }
        }

        if enabled!(Level::TRACE) {
            match self.collect().to_json() {
                Ok(json) => trace!(metrics = %json, "collected metrics after processing lifecycle event"),
                Err(e) => trace!(error = %e, "failed to encode metrics"),
            }
        }
    }

    fn process_task_manager_stat(&self, stat: &TaskManagerStat) {
        if stat.id != TaskManagerStatKind::RunDelay {
            trace!(stat = ?stat.id, "ignoring task manager stat");
            return;
        }

        let recorded = self.lock().delay.record_seconds(stat.value);
        if let Err(e) = recorded {
            warn!(value = stat.value, error = %e, "run delay sample rejected");
        }
    }
}

impl TaskMetricsAggregator<TaskRunMetric> for TaskRunMetricsAggregator {
    fn initial_metric(&self) -> TaskRunMetric {
        let state = self.lock();
        TaskRunMetric::from_parts(
            to_metrics(&state.counter.initial_metrics()),
            state.delay.serialize_empty(),
            Vec::new(),
        )
    }

    fn collect(&self) -> TaskRunMetric {
        self.lock().snapshot()
    }

    fn reset(&self) {
        self.lock().reset();
        debug!("task run metrics reset");
    }

    fn collect_and_reset(&self) -> TaskRunMetric {
        let mut state = self.lock();
        let metric = state.snapshot();
        state.reset();
        metric
    }

    fn process_task_lifecycle_event(&self, event: &TaskLifecycleEvent) {
        match event {
            TaskLifecycleEvent::TaskRun(run) => self.process_task_run_event(run),
            TaskLifecycleEvent::TaskManagerStat(stat) => self.process_task_manager_stat(stat),
            TaskLifecycleEvent::Other => {
                debug!(kind = event.kind(), "ignoring unrecognized lifecycle event");
            }
        }
    }
}

impl fmt::Debug for TaskRunMetricsAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("TaskRunMetricsAggregator")
            .field("paths", &state.counter.paths().count())
            .field("delay_samples", &state.delay.len())
            .field("grouping", &"<handle>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use runlens_model::{TaskRunCounts, TaskRunError, TaskRunResult};

    use super::*;
    use crate::grouping::NoGrouping;

    fn aggregator() -> TaskRunMetricsAggregator {
        TaskRunMetricsAggregator::new(&MetricsConfig::default()).unwrap()
    }

    fn success(task_type: &str) -> TaskLifecycleEvent {
        TaskRunEvent::ran("id", task_type, TaskRunResult::Success).into()
    }

    fn failure(task_type: &str, result: TaskRunResult, error: TaskRunError) -> TaskLifecycleEvent {
        TaskRunEvent::errored("id", task_type, result, error).into()
    }

    #[test]
    fn successful_runs_count_as_total_and_success() {
        let agg = aggregator();
        for _ in 0..5 {
            agg.process_task_lifecycle_event(&success("foo"));
        }

        let m = agg.collect();
        assert_eq!(m.overall.counts.total, 5);
        assert_eq!(m.overall.counts.success, 5);
        assert_eq!(m.overall.counts.not_timed_out, 5);
        assert_eq!(m.overall.counts.total_errors, 0);
        assert_eq!(m.by_type("foo").unwrap().total, 5);
        assert_eq!(m.by_type("foo").unwrap().success, 5);
    }

    #[test]
    fn user_error_without_retry() {
        let agg = aggregator();
        agg.process_task_lifecycle_event(&failure(
            "foo",
            TaskRunResult::Failed,
            TaskRunError::user("bad input"),
        ));

        let c = agg.collect().overall.counts;
        assert_eq!(
            c,
            TaskRunCounts {
                total: 1,
                total_errors: 1,
                user_errors: 1,
                not_timed_out: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn retry_scheduled_counts_rescheduled_failure_for_any_source() {
        let agg = aggregator();
        agg.process_task_lifecycle_event(&failure(
            "foo",
            TaskRunResult::RetryScheduled,
            TaskRunError::user("bad input"),
        ));
        agg.process_task_lifecycle_event(&failure(
            "foo",
            TaskRunResult::RetryScheduled,
            TaskRunError::framework("es unavailable"),
        ));

        let c = agg.collect().overall.counts;
        assert_eq!(c.rescheduled_failures, 2);
        assert_eq!(c.user_errors, 1);
        assert_eq!(c.framework_errors, 1);
        assert_eq!(c.total_errors, 2);
    }

    #[test]
    fn expired_runs_skip_not_timed_out() {
        let agg = aggregator();
        let ev = TaskRunEvent::errored(
            "id",
            "foo",
            TaskRunResult::Failed,
            TaskRunError::framework("timeout"),
        )
        .with_expired(true);
        agg.process_task_lifecycle_event(&ev.into());
        agg.process_task_lifecycle_event(&failure(
            "foo",
            TaskRunResult::Failed,
            TaskRunError::framework("boom"),
        ));

        let c = agg.collect().overall.counts;
        assert_eq!(c.total, 2);
        assert_eq!(c.total_errors, 2);
        assert_eq!(c.not_timed_out, 1);
    }

    #[test]
    fn classify_order_is_stable() {
        let ev = TaskRunEvent::errored(
            "id",
            "foo",
            TaskRunResult::RetryScheduled,
            TaskRunError::framework("boom"),
        );
        assert_eq!(
            classify(&ev),
            vec![
                TaskRunKey::Total,
                TaskRunKey::TotalErrors,
                TaskRunKey::FrameworkErrors,
                TaskRunKey::RescheduledFailures,
                TaskRunKey::NotTimedOut,
            ]
        );
    }

    #[test]
    fn dotted_task_type_is_one_segment() {
        let agg = aggregator();
        agg.process_task_lifecycle_event(&success("a.b.c"));

        let first = agg.collect();
        let second = agg.collect();
        assert_eq!(first.by_type.keys().collect::<Vec<_>>(), vec!["a__b__c"]);
        assert_eq!(first, second);
    }

    #[test]
    fn grouped_types_mirror_counts_into_group() {
        let agg = aggregator();
        agg.process_task_lifecycle_event(&success("alerting:siem.queryRule"));
        agg.process_task_lifecycle_event(&failure(
            "alerting:.index-threshold",
            TaskRunResult::Failed,
            TaskRunError::framework("boom"),
        ));
        agg.process_task_lifecycle_event(&success("report"));

        let m = agg.collect();
        assert_eq!(m.by_type("alerting:siem__queryRule").unwrap().total, 1);
        assert_eq!(m.by_type("alerting:__index-threshold").unwrap().total_errors, 1);

        let group = m.by_type("alerting").unwrap();
        assert_eq!(group.total, 2);
        assert_eq!(group.success, 1);
        assert_eq!(group.total_errors, 1);

        assert_eq!(m.overall.counts.total, 3);
        assert_eq!(m.by_type.len(), 4);
    }

    #[test]
    fn group_equal_to_type_is_counted_once() {
        let cfg = MetricsConfig::default();
        let agg = TaskRunMetricsAggregator::with_grouping(
            &cfg,
            Arc::new(|t: &str| Some(t.to_string())),
        )
        .unwrap();
        agg.process_task_lifecycle_event(&success("report"));

        assert_eq!(agg.collect().by_type("report").unwrap().total, 1);
    }

    #[test]
    fn empty_task_type_is_skipped_entirely() {
        let agg = aggregator();
        agg.process_task_lifecycle_event(&success(""));

        let m = agg.collect();
        assert!(m.overall.counts.is_zero());
        assert!(m.by_type.is_empty());
    }

    #[test]
    fn run_delay_goes_to_histogram() {
        let agg = aggregator();
        agg.process_task_lifecycle_event(&TaskManagerStat::run_delay(4.6).into());
        agg.process_task_lifecycle_event(&TaskManagerStat::run_delay(12.0).into());
        agg.process_task_lifecycle_event(&TaskManagerStat::run_delay(9_000.0).into());

        let m = agg.collect();
        assert_eq!(m.overall.delay_values, vec![5, 12, 9_000]);
        assert_eq!(m.overall.delay.counts[0], 1);
        assert_eq!(m.overall.delay.counts[1], 1);
        assert_eq!(m.overall.delay.counts.last(), Some(&1));
        assert!(m.overall.counts.is_zero());
    }

    #[test]
    fn other_stats_and_unknown_events_are_ignored() {
        let agg = aggregator();
        let before = agg.collect();

        agg.process_task_lifecycle_event(&TaskLifecycleEvent::Other);
        agg.process_task_lifecycle_event(
            &TaskManagerStat {
                id: TaskManagerStatKind::WorkerUtilization,
                value: 0.5,
            }
            .into(),
        );
        agg.process_task_lifecycle_event(&TaskManagerStat::run_delay(-4.0).into());

        assert_eq!(agg.collect(), before);
    }

    #[test]
    fn reset_keeps_known_types_zeroed() {
        let agg = aggregator();
        agg.process_task_lifecycle_event(&success("foo"));
        agg.process_task_lifecycle_event(&success("actions:.email"));
        agg.process_task_lifecycle_event(&TaskManagerStat::run_delay(3.0).into());
        agg.reset();

        let m = agg.collect();
        let initial = agg.initial_metric();
        assert_eq!(m.overall, initial.overall);
        assert_eq!(m.by_type.len(), 3);
        assert!(m.by_type.values().all(TaskRunCounts::is_zero));

        agg.process_task_lifecycle_event(&success("foo"));
        assert_eq!(agg.collect().by_type("foo").unwrap().total, 1);
    }

    #[test]
    fn initial_metric_is_zeroed_with_histogram_shape() {
        let agg = aggregator();
        let m = agg.initial_metric();

        assert!(m.overall.counts.is_zero());
        assert!(m.by_type.is_empty());
        assert!(m.overall.delay_values.is_empty());
        assert_eq!(m.overall.delay.counts.len(), 540);
        assert_eq!(m.overall.delay.total(), 0);
    }

    #[test]
    fn collect_and_reset_returns_pre_reset_state() {
        let agg = aggregator();
        agg.process_task_lifecycle_event(&success("foo"));
        agg.process_task_lifecycle_event(&TaskManagerStat::run_delay(1.0).into());

        let taken = agg.collect_and_reset();
        assert_eq!(taken.overall.counts.total, 1);
        assert_eq!(taken.overall.delay_values, vec![1]);

        let after = agg.collect();
        assert!(after.overall.counts.is_zero());
        assert!(after.overall.delay_values.is_empty());
        assert!(after.by_type("foo").unwrap().is_zero());
    }

    #[test]
    fn snapshot_is_detached_from_live_state() {
        let agg = aggregator();
        agg.process_task_lifecycle_event(&success("foo"));

        let snap = agg.collect();
        agg.process_task_lifecycle_event(&success("foo"));
        agg.process_task_lifecycle_event(&success("bar"));

        assert_eq!(snap.overall.counts.total, 1);
        assert!(snap.by_type("bar").is_none());
    }

    #[test]
    fn no_grouping_tracks_exact_types_only() {
        let agg =
            TaskRunMetricsAggregator::with_grouping(&MetricsConfig::default(), Arc::new(NoGrouping))
                .unwrap();
        agg.process_task_lifecycle_event(&success("alerting:x"));

        let m = agg.collect();
        assert_eq!(m.by_type.len(), 1);
        assert!(m.by_type("alerting").is_none());
    }

    #[test]
    fn concurrent_collect_never_sees_partial_events() {
        let agg = Arc::new(aggregator());
        let writer = {
            let agg = Arc::clone(&agg);
            thread::spawn(move || {
                for i in 0..2_000 {
                    let ev = if i % 2 == 0 {
                        success("foo")
                    } else {
                        failure("foo", TaskRunResult::Failed, TaskRunError::user("x"))
                    };
                    agg.process_task_lifecycle_event(&ev);
                }
            })
        };

        for _ in 0..500 {
            let c = agg.collect().overall.counts;
            assert_eq!(c.total, c.success + c.total_errors);
            assert_eq!(c.total, c.not_timed_out);
            assert_eq!(c.total_errors, c.user_errors);
        }
        writer.join().unwrap();

        let c = agg.collect().overall.counts;
        assert_eq!(c.total, 2_000);
        assert_eq!(c.success, 1_000);
    }
}
