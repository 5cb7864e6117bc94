//! Task store error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The task file parsed but does not have the expected shape.
    #[error("Invalid task file: {0}")]
    InvalidFormat(String),
}

pub type TaskResult<T> = Result<T, TaskError>;
