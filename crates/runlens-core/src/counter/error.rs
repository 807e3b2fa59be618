use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CounterError {
    #[error("invalid counter path '{0}': paths must be non-empty dot-separated segments")]
    InvalidPath(String),

    #[error("invalid path segment '{0}': segments must be non-empty and contain no '.'")]
    InvalidSegment(String),
}
