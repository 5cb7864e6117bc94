//! Tracker supervision through the language-server request channel.

use crate::controller::{ControllerKind, TrackerController};
use crate::report::{offer_emissions_file, report_emissions, request_failure_message};
use crate::status::StatusIndicator;
use crate::{EditorHost, SupervisorError, SupervisorResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};
use tracker_protocol::{Method, StopTrackerResult};
use tracker_rpc::RequestChannel;

/// Starts and stops the tracker hosted by the language server.
///
/// Without a channel, start skips the request but still shows the tracker
/// as running, and stop does nothing.
pub struct RpcTrackerController {
    channel: RwLock<Option<Arc<dyn RequestChannel>>>,
    status: Arc<StatusIndicator>,
    host: Arc<dyn EditorHost>,
    active: AtomicBool,
}

impl RpcTrackerController {
    pub fn new(
        channel: Option<Arc<dyn RequestChannel>>,
        status: Arc<StatusIndicator>,
        host: Arc<dyn EditorHost>,
    ) -> Self {
        Self {
            channel: RwLock::new(channel),
            status,
            host,
            active: AtomicBool::new(false),
        }
    }

    /// Attach or detach the request channel.
    pub fn set_channel(&self, channel: Option<Arc<dyn RequestChannel>>) {
        debug!(attached = channel.is_some(), "Tracker channel updated");
        *self.channel.write() = channel;
    }

    pub fn has_channel(&self) -> bool {
        self.channel.read().is_some()
    }

    fn channel(&self) -> Option<Arc<dyn RequestChannel>> {
        self.channel.read().clone()
    }

    fn fail(&self, error: SupervisorError) -> SupervisorResult<()> {
        error!(error = %error, "Tracker request failed");
        self.host.show_error(&request_failure_message(&error));
        Err(error)
    }
}

#[async_trait]
impl TrackerController for RpcTrackerController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Rpc
    }

    fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn start(&self) -> SupervisorResult<()> {
        match self.channel() {
            Some(channel) => {
                if let Err(e) = channel
                    .send_request(Method::StartTracker, serde_json::json!({}))
                    .await
                {
                    return self.fail(e.into());
                }
            }
            None => debug!("No tracker channel, start request skipped"),
        }

        self.active.store(true, Ordering::SeqCst);
        self.status.running();
        info!("Tracker started");
        Ok(())
    }

    async fn stop(&self) -> SupervisorResult<()> {
        let Some(channel) = self.channel() else {
            debug!("No tracker channel, stop skipped");
            return Ok(());
        };

        self.status.stopping();
        let response = channel
            .send_request(Method::StopTracker, serde_json::json!({}))
            .await;
        self.active.store(false, Ordering::SeqCst);
        self.status.confirm_stopped();

        let result = match response
            .map_err(SupervisorError::from)
            .and_then(|value| StopTrackerResult::from_value(value).map_err(Into::into))
        {
            Ok(result) => result,
            Err(e) => return self.fail(e),
        };
        info!(
            emissions = ?result.emissions,
            file = ?result.emissions_file,
            "Tracker stopped"
        );

        if report_emissions(self.host.as_ref(), result.emissions) {
            if let Some(path) = result.emissions_file() {
                offer_emissions_file(self.host.as_ref(), path).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{RecordingStatusBar, StatusState};
    use crate::{HostEvent, RecordingHost};
    use std::path::PathBuf;
    use tracker_config::ServerInfo;
    use tracker_rpc::{RpcError, ScriptedChannel};

    struct Fixture {
        channel: Arc<ScriptedChannel>,
        host: Arc<RecordingHost>,
        bar: Arc<RecordingStatusBar>,
        status: Arc<StatusIndicator>,
        controller: RpcTrackerController,
    }

    fn fixture() -> Fixture {
        let channel = Arc::new(ScriptedChannel::new());
        let host = Arc::new(RecordingHost::new());
        let bar = Arc::new(RecordingStatusBar::new());
        let server = ServerInfo {
            name: "Test".into(),
            module: "test".into(),
        };
        let status = Arc::new(StatusIndicator::new(bar.clone(), &server));
        let controller =
            RpcTrackerController::new(Some(channel.clone()), status.clone(), host.clone());
        Fixture {
            channel,
            host,
            bar,
            status,
            controller,
        }
    }

    #[tokio::test]
    async fn start_sends_request_and_shows_running() {
        let f = fixture();
        f.controller.start().await.unwrap();

        assert_eq!(
            f.channel.calls(),
            vec![(Method::StartTracker, serde_json::json!({}))]
        );
        assert_eq!(f.bar.text(), "$(pulse) Codecarbon (Running)");
        assert_eq!(f.bar.command().as_deref(), Some("test.stop"));
        assert_eq!(f.bar.tooltip(), "Stop CodeCarbon tracker");
        assert!(f.controller.is_running());
    }

    #[tokio::test]
    async fn stop_without_emissions() {
        let f = fixture();
        f.channel
            .push_result(serde_json::json!({ "emissions": 0, "emissions_file": "" }));
        f.status.running();

        f.controller.stop().await.unwrap();

        assert_eq!(f.channel.methods(), vec![Method::StopTracker]);
        assert_eq!(f.bar.text(), "$(pulse) Codecarbon");
        assert_eq!(
            f.host.events(),
            vec![HostEvent::Information(
                "CodeCarbon tracker stopped. No emissions detected.".into()
            )]
        );
    }

    #[tokio::test]
    async fn stop_with_emissions_opens_file() {
        let f = fixture();
        f.channel
            .push_result(serde_json::json!({ "emissions": 0.5, "emissions_file": "f.csv" }));
        f.host.answer_choice(Some("Open"));

        f.controller.stop().await.unwrap();

        assert_eq!(
            f.host.events(),
            vec![
                HostEvent::Information(
                    "CodeCarbon tracker stopped. Emissions: ~ 0.50 kgCO2e.".into()
                ),
                HostEvent::Choice {
                    message: "Emissions file: f.csv".into(),
                    choices: vec!["Open".into(), "Cancel".into()],
                },
                HostEvent::OpenFile(PathBuf::from("f.csv")),
            ]
        );
    }

    #[tokio::test]
    async fn stop_with_emissions_cancelled() {
        let f = fixture();
        f.channel
            .push_result(serde_json::json!({ "emissions": 0.5, "emissions_file": "f.csv" }));
        f.host.answer_choice(Some("Cancel"));

        f.controller.stop().await.unwrap();
        assert!(f.host.opened_files().is_empty());
        assert_eq!(f.host.events().len(), 2);
    }

    #[tokio::test]
    async fn stop_with_emissions_but_empty_file_skips_prompt() {
        let f = fixture();
        f.channel
            .push_result(serde_json::json!({ "emissions": 0.5, "emissions_file": "" }));

        f.controller.stop().await.unwrap();
        assert_eq!(f.host.events().len(), 1);
        assert!(f.host.informations()[0].contains("0.50 kgCO2e"));
    }

    #[tokio::test]
    async fn null_stop_result_means_no_emissions() {
        let f = fixture();
        f.controller.stop().await.unwrap();
        assert_eq!(
            f.host.informations(),
            vec!["CodeCarbon tracker stopped. No emissions detected."]
        );
    }

    #[tokio::test]
    async fn no_channel_skips_requests() {
        let f = fixture();
        f.controller.set_channel(None);
        f.status.initialize();

        f.controller.start().await.unwrap();
        assert_eq!(f.status.state(), StatusState::Running);
        assert_eq!(f.bar.text(), "$(pulse) Codecarbon (Running)");
        assert!(f.controller.is_running());

        f.controller.stop().await.unwrap();
        assert_eq!(f.status.state(), StatusState::Running);

        assert!(f.channel.calls().is_empty());
        assert!(f.host.events().is_empty());
        assert!(!f.controller.has_channel());
    }

    #[tokio::test]
    async fn request_failure_is_reported() {
        let f = fixture();
        f.channel.push_error(RpcError::ConnectionClosed);

        let err = f.controller.start().await.unwrap_err();
        assert!(matches!(err, SupervisorError::Rpc(RpcError::ConnectionClosed)));
        assert_eq!(
            f.host.errors(),
            vec!["CodeCarbon tracker request failed: Connection closed"]
        );
        assert!(!f.controller.is_running());
    }

    #[tokio::test]
    async fn stop_failure_still_returns_to_idle() {
        let f = fixture();
        f.status.running();
        f.channel.push_result(serde_json::json!({ "emissions": "lots" }));

        let err = f.controller.stop().await.unwrap_err();
        assert!(matches!(err, SupervisorError::InvalidResponse(_)));
        assert_eq!(f.status.state(), StatusState::Idle);
        assert_eq!(f.host.errors().len(), 1);
    }
}
