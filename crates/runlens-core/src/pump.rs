//! Serial delivery of lifecycle events into an aggregator.
//!
//! Producers push events through a bounded [`LifecycleEventSender`]; a single
//! [`run_event_pump`] task drains the queue and feeds the aggregator one event at a time.
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use runlens_model::TaskLifecycleEvent;

use crate::{aggregator::TaskMetricsAggregator, error::CoreError};

/// Producer side of the lifecycle event queue.
#[derive(Debug, Clone)]
pub struct LifecycleEventSender {
    tx: mpsc::Sender<TaskLifecycleEvent>,
}

impl LifecycleEventSender {
    /// Enqueue without waiting. Fails with [`CoreError::QueueFull`] when the pump lags behind.
    pub fn try_send(&self, event: impl Into<TaskLifecycleEvent>) -> Result<(), CoreError> {
        self.tx.try_send(event.into()).map_err(|e| match e {
            TrySendError::Full(_) => CoreError::QueueFull,
            TrySendError::Closed(_) => CoreError::QueueClosed,
        })
    }

    /// Enqueue, waiting for free capacity.
    pub async fn send(&self, event: impl Into<TaskLifecycleEvent>) -> Result<(), CoreError> {
        self.tx
            .send(event.into())
            .await
            .map_err(|_| CoreError::QueueClosed)
    }

    /// Returns `true` once the pump side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the lifecycle event queue, handed to [`run_event_pump`].
#[derive(Debug)]
pub struct LifecycleEventReceiver {
    rx: mpsc::Receiver<TaskLifecycleEvent>,
}

/// Create a bounded lifecycle event queue. A zero capacity is raised to one.
pub fn event_channel(capacity: usize) -> (LifecycleEventSender, LifecycleEventReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (LifecycleEventSender { tx }, LifecycleEventReceiver { rx })
}

/// Feed queued events into `aggregator` until every sender is dropped or `cancel` fires.
///
/// On cancellation, events already queued are still processed before returning.
/// Returns the number of processed events.
pub async fn run_event_pump<T, A>(
    mut events: LifecycleEventReceiver,
    aggregator: Arc<A>,
    cancel: CancellationToken,
) -> u64
where
    A: TaskMetricsAggregator<T> + ?Sized,
{
    let mut processed: u64 = 0;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                events.rx.close();
                while let Ok(event) = events.rx.try_recv() {
                    aggregator.process_task_lifecycle_event(&event);
                    processed += 1;
                }
                debug!(processed, "event pump cancelled");
                break;
            }
            next = events.rx.recv() => match next {
                Some(event) => {
                    trace!(kind = event.kind(), "lifecycle event received");
                    aggregator.process_task_lifecycle_event(&event);
                    processed += 1;
                }
                None => {
                    debug!(processed, "lifecycle event queue closed");
                    break;
                }
            }
        }
    }
    processed
}

#[cfg(test)]
mod tests {
    use runlens_model::{TaskManagerStat, TaskRunEvent, TaskRunMetric, TaskRunResult};

    use super::*;
    use crate::{aggregator::TaskRunMetricsAggregator, config::MetricsConfig};

    fn aggregator() -> Arc<TaskRunMetricsAggregator> {
        Arc::new(TaskRunMetricsAggregator::new(&MetricsConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn pump_processes_until_senders_drop() {
        let agg = aggregator();
        let (tx, rx) = event_channel(8);

        let pump = tokio::spawn(run_event_pump::<TaskRunMetric, _>(
            rx,
            Arc::clone(&agg),
            CancellationToken::new(),
        ));
        for _ in 0..3 {
            tx.send(TaskRunEvent::ran("id", "foo", TaskRunResult::Success))
                .await
                .unwrap();
        }
        for secs in [2.0, 45.0, 0.0, 17.0, 3.0] {
            tx.send(TaskManagerStat::run_delay(secs)).await.unwrap();
        }
        drop(tx);

        assert_eq!(pump.await.unwrap(), 8);
        let m = agg.collect();
        assert_eq!(m.overall.counts.total, 3);
        assert_eq!(m.overall.delay_values, vec![2, 45, 0, 17, 3]);
    }

    #[tokio::test]
    async fn cancellation_drains_queued_events() {
        let agg = aggregator();
        let (tx, rx) = event_channel(8);
        for _ in 0..5 {
            tx.try_send(TaskRunEvent::ran("id", "foo", TaskRunResult::Success))
                .unwrap();
        }

        let cancel = CancellationToken::new();
        cancel.cancel();
        let processed = run_event_pump::<TaskRunMetric, _>(rx, Arc::clone(&agg), cancel).await;

        assert_eq!(processed, 5);
        assert_eq!(agg.collect().overall.counts.total, 5);
        assert!(tx.is_closed());
        assert!(matches!(
            tx.try_send(TaskLifecycleEvent::Other),
            Err(CoreError::QueueClosed)
        ));
    }

    #[tokio::test]
    async fn try_send_reports_full_queue() {
        let (tx, _rx) = event_channel(1);

        tx.try_send(TaskLifecycleEvent::Other).unwrap();
        assert!(matches!(
            tx.try_send(TaskLifecycleEvent::Other),
            Err(CoreError::QueueFull)
        ));
    }

    #[tokio::test]
    async fn zero_capacity_is_raised_to_one() {
        let (tx, _rx) = event_channel(0);
        assert!(tx.try_send(TaskLifecycleEvent::Other).is_ok());
    }
}
