//! Error types for the supervisor.

use thiserror::Error;
use tracker_rpc::RpcError;

#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Failed to spawn the tracker process.
    #[error("{0}")]
    Spawn(#[source] std::io::Error),

    /// The spawned process has no stdout pipe.
    #[error("Failed to get stdout from tracker process")]
    NoStdout,

    /// No interpreter configured; names the setting to fill in.
    #[error("Interpreter not set, configure `{0}`")]
    MissingInterpreter(String),

    /// Configuration is incomplete for the selected integration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request to the tracker server failed.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// The tracker server answered with an unexpected payload.
    #[error("Invalid tracker response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

pub type SupervisorResult<T> = Result<T, SupervisorError>;
