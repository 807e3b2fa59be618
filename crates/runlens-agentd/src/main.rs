use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::info;

use runlens_core::prelude::*;
use runlens_model::{
    TaskManagerStat, TaskRunError, TaskRunEvent, TaskRunMetric, TaskRunResult,
};
use runlens_observe::{LoggerConfig, init_logger};
use runlens_prometheus::{Encoder, PrometheusSink, TextEncoder};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // 1) logger
    let log_cfg = LoggerConfig::default().with_level_from_env("RUNLENS_LOG")?;
    init_logger(&log_cfg)?;
    info!("logger initialized");

    // 2) aggregator, cumulative so the final exposition covers the whole run
    let cfg = MetricsConfig {
        reset_policy: ResetPolicy::Never,
        collect_interval_ms: 200,
        ..Default::default()
    };
    let aggregator = Arc::new(TaskRunMetricsAggregator::new(&cfg)?);

    // 3) sink + collector
    let sink = Arc::new(PrometheusSink::new()?);
    let collector = MetricsCollector::new(Arc::clone(&aggregator), sink.clone(), cfg.reset_policy);

    // 4) pump
    let cancel = CancellationToken::new();
    let (events, rx) = event_channel(cfg.event_queue_capacity);
    let pump = tokio::spawn(run_event_pump::<TaskRunMetric, _>(
        rx,
        Arc::clone(&aggregator),
        cancel.child_token(),
    ));
    let every = cfg.collect_interval();
    let collecting = tokio::spawn({
        let token = cancel.child_token();
        async move { collector.run(every, token).await }
    });

    // 5) synthetic lifecycle events
    events
        .send(TaskRunEvent::ran("t-1", "report", TaskRunResult::Success))
        .await?;
    events
        .send(TaskRunEvent::ran("t-2", "alerting:siem.queryRule", TaskRunResult::Success))
        .await?;
    events
        .send(TaskRunEvent::errored(
            "t-3",
            "actions:.email",
            TaskRunResult::RetryScheduled,
            TaskRunError::user("smtp rejected recipient"),
        ))
        .await?;
    events
        .send(
            TaskRunEvent::errored(
                "t-4",
                "report",
                TaskRunResult::Failed,
                TaskRunError::framework("worker shut down"),
            )
            .with_expired(true),
        )
        .await?;
    for delay in [0.4, 3.0, 12.5, 61.0] {
        events.send(TaskManagerStat::run_delay(delay)).await?;
    }

    tokio::time::sleep(every * 3).await;

    // 6) shutdown: drain the queue first, then flush the collector
    drop(events);
    let processed = pump.await?;
    cancel.cancel();
    let emitted = collecting.await?;
    info!(processed, emitted, "metrics pipeline stopped");

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&sink.gather(), &mut buffer)?;
    println!("{}", String::from_utf8(buffer)?);
    println!("{}", aggregator.collect().to_json()?);
    Ok(())
}
