//! Tracker supervision through a locally spawned process.

use crate::controller::{ControllerKind, TrackerController};
use crate::process::{spawn_tracker, TrackerCommand, TrackerOutput};
use crate::report::{
    offer_emissions_file, report_emissions, spawn_failure_message, ALREADY_RUNNING,
};
use crate::sentinel::{SentinelEvent, SentinelTable};
use crate::session::TrackerSession;
use crate::status::{StatusIndicator, StatusState};
use crate::{EditorHost, SupervisorResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// Runs the tracker as a child process and watches its stdout for the
/// emissions summary and report file.
pub struct ProcessTrackerController {
    command: TrackerCommand,
    session: Arc<Mutex<TrackerSession>>,
    status: Arc<StatusIndicator>,
    host: Arc<dyn EditorHost>,
    sentinels: Arc<SentinelTable>,
    stop_grace: Duration,
}

impl ProcessTrackerController {
    pub fn new(
        command: TrackerCommand,
        status: Arc<StatusIndicator>,
        host: Arc<dyn EditorHost>,
    ) -> Self {
        Self {
            command,
            session: Arc::new(Mutex::new(TrackerSession::new())),
            status,
            host,
            sentinels: Arc::new(SentinelTable::tracker_defaults()),
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }

    /// How long `stop` waits for the process to exit before killing it.
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    /// Pid of the running tracker.
    pub fn pid(&self) -> Option<u32> {
        self.session.lock().handle().and_then(|h| h.pid())
    }

    pub fn last_emissions_file(&self) -> Option<String> {
        self.session.lock().last_emissions_file().map(str::to_string)
    }
}

#[async_trait]
impl TrackerController for ProcessTrackerController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Process
    }

    fn is_running(&self) -> bool {
        self.session.lock().is_running()
    }

    async fn start(&self) -> SupervisorResult<()> {
        let mut session = self.session.lock();
        if session.is_running() {
            drop(session);
            info!("Start requested while tracker is running");
            self.host.show_information(ALREADY_RUNNING);
            return Ok(());
        }

        let generation = session.begin();
        let output = Arc::new(SessionOutput {
            generation,
            session: self.session.clone(),
            status: self.status.clone(),
            host: self.host.clone(),
            sentinels: self.sentinels.clone(),
        });

        // The session stays locked until the handle is attached and the
        // indicator shows Running, so an immediate exit sees both.
        match spawn_tracker(&self.command, output) {
            Ok(handle) => {
                info!(pid = ?handle.pid(), generation, "Tracker started");
                session.attach(handle);
                self.status.running();
                Ok(())
            }
            Err(e) => {
                drop(session);
                error!(error = %e, command = %self.command, "Failed to start tracker");
                self.host.show_error(&spawn_failure_message(&e));
                Err(e)
            }
        }
    }

    async fn stop(&self) -> SupervisorResult<()> {
        let handle = self.session.lock().take_handle();

        match handle {
            Some(handle) => {
                self.status.stopping();
                handle.terminate();

                if !handle.wait_exit(self.stop_grace).await {
                    warn!(
                        pid = ?handle.pid(),
                        grace_ms = self.stop_grace.as_millis() as u64,
                        "Tracker did not exit after SIGTERM"
                    );
                    handle.kill();
                }
                self.status.confirm_stopped();
            }
            None if self.status.state() == StatusState::Stopping => {
                debug!("Tracker stop already in progress");
                return Ok(());
            }
            None => {
                debug!("No tracker process to stop");
                self.status.idle();
            }
        }

        let (last_emissions, emissions_file) = {
            let mut session = self.session.lock();
            (
                session.take_last_emissions(),
                session.last_emissions_file().map(str::to_string),
            )
        };
        if let Some(value) = last_emissions {
            debug!(emissions = value, "Last measured emissions");
        }
        if let Some(path) = emissions_file {
            offer_emissions_file(self.host.as_ref(), &path).await;
        }
        Ok(())
    }
}

/// Output sink for one tracker run.
struct SessionOutput {
    generation: u64,
    session: Arc<Mutex<TrackerSession>>,
    status: Arc<StatusIndicator>,
    host: Arc<dyn EditorHost>,
    sentinels: Arc<SentinelTable>,
}

impl TrackerOutput for SessionOutput {
    fn on_stdout_line(&self, line: &str) {
        match self.sentinels.match_line(line) {
            Some(SentinelEvent::Emissions(value)) => {
                let show = self.session.lock().record_emissions(self.generation, value);
                if show {
                    report_emissions(self.host.as_ref(), value);
                } else {
                    debug!(emissions = ?value, "Emissions summary not reported");
                }
            }
            Some(SentinelEvent::EmissionsFile(path)) => {
                info!(path = %path, "Emissions file announced");
                self.session
                    .lock()
                    .record_emissions_file(self.generation, path);
            }
            None => {}
        }
    }

    fn on_exit(&self, status: Option<ExitStatus>) {
        let cleared = self.session.lock().clear_if_current(self.generation);
        if !cleared {
            debug!(generation = self.generation, "Tracker exit after stop");
            return;
        }

        warn!(status = ?status, "Tracker exited on its own");
        if self.status.state() == StatusState::Running {
            self.status.idle();
        }
    }
}
