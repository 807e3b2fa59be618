//! Nested counter store keyed by a dot-delimited path and a closed set of counter keys.
//!
//! Paths look like `"overall"` or `"by_type.report"`. Every path carries one
//! [`CounterSet`] holding all legal keys, created at zero on first use.
mod error;
pub use error::CounterError;

mod key;
pub use key::{CounterKey, CounterSet};

mod path;
pub use path::{MetricPath, PATH_SEPARATOR};

mod service;
pub use service::{CounterSnapshot, MetricCounterService};
