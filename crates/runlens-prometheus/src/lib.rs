//! Prometheus sink for runlens task run metrics.
//!
//! [`PrometheusSink`] implements [`runlens_core::MetricsSink`]: every snapshot handed to it by
//! the collector replaces the previously exported values.
//!
//! ## Metrics
//! - `runlens_task_runs{scope, key}`: counter values per scope (`overall` or a task type/group)
//! - `runlens_task_run_delay_bucket{le}`: cumulative run delay histogram, in seconds
//! - `runlens_task_run_delay_samples`: number of raw run delay samples
//!
//! ## HTTP Server
//! No `/metrics` endpoint is provided. Encode [`PrometheusSink::gather`] with a
//! [`TextEncoder`] from whatever server the host application already runs:
//!
//! ```rust,ignore
//! let mut buffer = Vec::new();
//! TextEncoder::new().encode(&sink.gather(), &mut buffer)?;
//! ```

mod sink;
pub use sink::PrometheusSink;

pub use prometheus::{Encoder, Registry, TextEncoder};
