//! Request channel error types.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Socket error: {0}")]
    Socket(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server answered with an error object.
    #[error("{message} (code {code})")]
    Remote { code: i32, message: String },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

pub type RpcResult<T> = Result<T, RpcError>;
