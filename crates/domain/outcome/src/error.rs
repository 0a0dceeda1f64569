use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutcomeError {
    #[error("outcome log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("outcome serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OutcomeError>;
