//! Status bar reflection of the tracker state.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;
use tracker_config::ServerInfo;

/// Label shown while the tracker is idle.
pub const STATUS_LABEL: &str = "$(pulse) Codecarbon";

const START_TOOLTIP: &str = "Start CodeCarbon tracker";
const STOP_TOOLTIP: &str = "Stop CodeCarbon tracker";

/// Tracker state as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusState {
    Idle,
    Running,
    Stopping,
}

/// A host status bar entry.
pub trait StatusBarItem: Send + Sync {
    fn set_text(&self, text: &str);
    fn set_command(&self, command: Option<&str>);
    fn set_tooltip(&self, tooltip: &str);
}

/// Owns every write to the status bar item.
///
/// Text, command and tooltip are a function of [`StatusState`] alone.
pub struct StatusIndicator {
    item: Arc<dyn StatusBarItem>,
    start_command: String,
    stop_command: String,
    state: Mutex<StatusState>,
}

impl StatusIndicator {
    pub fn new(item: Arc<dyn StatusBarItem>, server: &ServerInfo) -> Self {
        Self {
            item,
            start_command: server.start_command(),
            stop_command: server.stop_command(),
            state: Mutex::new(StatusState::Idle),
        }
    }

    /// Show the idle label and bind the start command.
    pub fn initialize(&self) {
        self.transition(StatusState::Idle);
    }

    pub fn running(&self) {
        self.transition(StatusState::Running);
    }

    pub fn stopping(&self) {
        self.transition(StatusState::Stopping);
    }

    pub fn idle(&self) {
        self.transition(StatusState::Idle);
    }

    /// Complete a stop: `Stopping -> Idle`. Returns false, changing nothing,
    /// when the state has already moved on.
    pub fn confirm_stopped(&self) -> bool {
        let mut state = self.state.lock();
        if *state != StatusState::Stopping {
            debug!(state = ?*state, "Stop confirmation ignored");
            return false;
        }
        *state = StatusState::Idle;
        self.apply(StatusState::Idle);
        true
    }

    pub fn state(&self) -> StatusState {
        *self.state.lock()
    }

    fn transition(&self, next: StatusState) {
        let mut state = self.state.lock();
        *state = next;
        self.apply(next);
    }

    fn apply(&self, state: StatusState) {
        let (text, command, tooltip) = match state {
            StatusState::Idle => (STATUS_LABEL.to_string(), &self.start_command, START_TOOLTIP),
            StatusState::Running => (
                format!("{} (Running)", STATUS_LABEL),
                &self.stop_command,
                STOP_TOOLTIP,
            ),
            StatusState::Stopping => (
                format!("{} (Stopping)", STATUS_LABEL),
                &self.stop_command,
                STOP_TOOLTIP,
            ),
        };
        self.item.set_text(&text);
        self.item.set_command(Some(command.as_str()));
        self.item.set_tooltip(tooltip);
    }
}

/// A status bar item that records what was written to it.
#[derive(Debug, Default)]
pub struct RecordingStatusBar {
    inner: Mutex<RecordedStatus>,
}

#[derive(Debug, Default)]
struct RecordedStatus {
    text: String,
    command: Option<String>,
    tooltip: String,
    texts: Vec<String>,
}

impl RecordingStatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.inner.lock().text.clone()
    }

    pub fn command(&self) -> Option<String> {
        self.inner.lock().command.clone()
    }

    pub fn tooltip(&self) -> String {
        self.inner.lock().tooltip.clone()
    }

    /// Every text written, oldest first.
    pub fn texts(&self) -> Vec<String> {
        self.inner.lock().texts.clone()
    }
}

impl StatusBarItem for RecordingStatusBar {
    fn set_text(&self, text: &str) {
        let mut inner = self.inner.lock();
        inner.text = text.to_string();
        inner.texts.push(text.to_string());
    }

    fn set_command(&self, command: Option<&str>) {
        self.inner.lock().command = command.map(str::to_string);
    }

    fn set_tooltip(&self, tooltip: &str) {
        self.inner.lock().tooltip = tooltip.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicator() -> (Arc<RecordingStatusBar>, StatusIndicator) {
        let bar = Arc::new(RecordingStatusBar::new());
        let server = ServerInfo {
            name: "Test".into(),
            module: "test".into(),
        };
        let indicator = StatusIndicator::new(bar.clone(), &server);
        (bar, indicator)
    }

    #[test]
    fn initialize_binds_start() {
        let (bar, indicator) = indicator();
        indicator.initialize();
        assert_eq!(bar.text(), "$(pulse) Codecarbon");
        assert_eq!(bar.command().as_deref(), Some("test.start"));
        assert_eq!(bar.tooltip(), "Start CodeCarbon tracker");
        assert_eq!(indicator.state(), StatusState::Idle);
    }

    #[test]
    fn running_and_stopping_bind_stop() {
        let (bar, indicator) = indicator();
        indicator.running();
        assert_eq!(bar.text(), "$(pulse) Codecarbon (Running)");
        assert_eq!(bar.command().as_deref(), Some("test.stop"));
        assert_eq!(bar.tooltip(), "Stop CodeCarbon tracker");

        indicator.stopping();
        assert_eq!(bar.text(), "$(pulse) Codecarbon (Stopping)");
        assert_eq!(bar.command().as_deref(), Some("test.stop"));
        assert_eq!(indicator.state(), StatusState::Stopping);
    }

    #[test]
    fn confirm_stopped_only_from_stopping() {
        let (bar, indicator) = indicator();
        indicator.running();
        assert!(!indicator.confirm_stopped());
        assert_eq!(indicator.state(), StatusState::Running);

        indicator.stopping();
        assert!(indicator.confirm_stopped());
        assert_eq!(indicator.state(), StatusState::Idle);
        assert_eq!(bar.command().as_deref(), Some("test.start"));

        assert!(!indicator.confirm_stopped());
        assert_eq!(
            bar.texts(),
            vec![
                "$(pulse) Codecarbon (Running)",
                "$(pulse) Codecarbon (Stopping)",
                "$(pulse) Codecarbon",
            ]
        );
    }
}
