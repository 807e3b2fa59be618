use thiserror::Error;

use crate::{counter::CounterError, histogram::HistogramError};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid metrics config: {0}")]
    InvalidConfig(String),

    #[error("histogram error: {0}")]
    Histogram(#[from] HistogramError),

    #[error("counter error: {0}")]
    Counter(#[from] CounterError),

    #[error("lifecycle event queue is full")]
    QueueFull,

    #[error("lifecycle event queue is closed")]
    QueueClosed,
}
