use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to decode lifecycle event: {0}")]
    Decode(String),

    #[error("failed to encode metric snapshot: {0}")]
    Encode(String),
}

pub type ModelResult<T> = Result<T, ModelError>;
