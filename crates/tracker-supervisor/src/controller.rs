//! The contract shared by both tracker integrations.

use crate::SupervisorResult;
use async_trait::async_trait;

/// Which integration a controller implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    /// Locally spawned tracker process.
    Process,
    /// Requests to the tracker language server.
    Rpc,
}

/// Start/stop supervision of the tracker.
///
/// Implementations own their session state and drive the status indicator
/// and user notices themselves.
#[async_trait]
pub trait TrackerController: Send + Sync {
    fn kind(&self) -> ControllerKind;

    /// Whether a run is in progress.
    fn is_running(&self) -> bool;

    async fn start(&self) -> SupervisorResult<()>;

    async fn stop(&self) -> SupervisorResult<()>;
}
