//! Command registration and lifecycle around one tracker controller.

use crate::controller::{ControllerKind, TrackerController};
use crate::status::{StatusIndicator, StatusState};
use crate::{SupervisorError, SupervisorResult};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};
use tracker_config::ServerInfo;

/// Owns the status indicator and the controller chosen at composition time,
/// and exposes `<module>.start` / `<module>.stop` as host commands.
pub struct Supervisor {
    server: ServerInfo,
    status: Arc<StatusIndicator>,
    controller: Arc<dyn TrackerController>,
    commands: RwLock<Vec<String>>,
}

impl Supervisor {
    pub fn new(
        server: ServerInfo,
        status: Arc<StatusIndicator>,
        controller: Arc<dyn TrackerController>,
    ) -> Self {
        Self {
            server,
            status,
            controller,
            commands: RwLock::new(Vec::new()),
        }
    }

    /// Show the idle indicator, register the commands and optionally start
    /// the tracker. A failed start is logged; it has already been shown to
    /// the user.
    pub async fn activate(&self, launch_on_startup: bool) {
        self.status.initialize();
        *self.commands.write() = vec![self.server.start_command(), self.server.stop_command()];
        info!(
            server = %self.server.name,
            kind = ?self.controller.kind(),
            launch_on_startup,
            "Supervisor activated"
        );

        if launch_on_startup {
            if let Err(e) = self.controller.start().await {
                warn!(error = %e, "Tracker did not start on activation");
            }
        }
    }

    /// Run a registered command.
    pub async fn execute_command(&self, name: &str) -> SupervisorResult<()> {
        let registered = self.commands.read().iter().any(|c| c == name);
        if !registered {
            return Err(SupervisorError::UnknownCommand(name.to_string()));
        }

        if name == self.server.start_command() {
            self.controller.start().await
        } else if name == self.server.stop_command() {
            self.controller.stop().await
        } else {
            Err(SupervisorError::UnknownCommand(name.to_string()))
        }
    }

    /// Unregister the commands and stop a running tracker.
    pub async fn deactivate(&self) -> SupervisorResult<()> {
        self.commands.write().clear();
        if self.controller.is_running() {
            info!("Stopping tracker on deactivation");
            self.controller.stop().await?;
        }
        Ok(())
    }

    /// Registered command names.
    pub fn commands(&self) -> Vec<String> {
        self.commands.read().clone()
    }

    pub fn status(&self) -> StatusState {
        self.status.state()
    }

    pub fn kind(&self) -> ControllerKind {
        self.controller.kind()
    }

    pub fn server(&self) -> &ServerInfo {
        &self.server
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc_controller::RpcTrackerController;
    use crate::status::RecordingStatusBar;
    use crate::RecordingHost;
    use tracker_protocol::Method;
    use tracker_rpc::ScriptedChannel;

    fn rpc_supervisor() -> (Arc<ScriptedChannel>, Arc<RecordingHost>, Supervisor) {
        let server = ServerInfo::default();
        let channel = Arc::new(ScriptedChannel::new());
        let host = Arc::new(RecordingHost::new());
        let status = Arc::new(StatusIndicator::new(
            Arc::new(RecordingStatusBar::new()),
            &server,
        ));
        let controller = Arc::new(RpcTrackerController::new(
            Some(channel.clone()),
            status.clone(),
            host.clone(),
        ));
        (channel, host, Supervisor::new(server, status, controller))
    }

    #[tokio::test]
    async fn activate_registers_commands() {
        let (channel, _host, supervisor) = rpc_supervisor();
        supervisor.activate(false).await;

        assert_eq!(
            supervisor.commands(),
            vec!["codecarbon.start", "codecarbon.stop"]
        );
        assert_eq!(supervisor.status(), StatusState::Idle);
        assert_eq!(supervisor.kind(), ControllerKind::Rpc);
        assert!(channel.calls().is_empty());
    }

    #[tokio::test]
    async fn activate_launches_on_startup() {
        let (channel, _host, supervisor) = rpc_supervisor();
        supervisor.activate(true).await;
        assert_eq!(channel.methods(), vec![Method::StartTracker]);
        assert_eq!(supervisor.status(), StatusState::Running);
    }

    #[tokio::test]
    async fn commands_dispatch_to_controller() {
        let (channel, host, supervisor) = rpc_supervisor();
        supervisor.activate(false).await;

        supervisor.execute_command("codecarbon.start").await.unwrap();
        supervisor.execute_command("codecarbon.stop").await.unwrap();

        assert_eq!(
            channel.methods(),
            vec![Method::StartTracker, Method::StopTracker]
        );
        assert_eq!(
            host.informations(),
            vec!["CodeCarbon tracker stopped. No emissions detected."]
        );
    }

    #[tokio::test]
    async fn unknown_or_unregistered_commands_fail() {
        let (_channel, _host, supervisor) = rpc_supervisor();
        let err = supervisor
            .execute_command("codecarbon.start")
            .await
            .unwrap_err();
        assert!(matches!(err, SupervisorError::UnknownCommand(_)));

        supervisor.activate(false).await;
        let err = supervisor.execute_command("codecarbon.pause").await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown command: codecarbon.pause");
    }

    #[tokio::test]
    async fn deactivate_stops_running_tracker() {
        let (channel, _host, supervisor) = rpc_supervisor();
        supervisor.activate(true).await;
        supervisor.deactivate().await.unwrap();

        assert_eq!(
            channel.methods(),
            vec![Method::StartTracker, Method::StopTracker]
        );
        assert!(supervisor.commands().is_empty());

        supervisor.deactivate().await.unwrap();
        assert_eq!(channel.methods().len(), 2);
    }
}
