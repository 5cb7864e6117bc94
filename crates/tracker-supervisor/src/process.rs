//! Tracker child process management.

use crate::error::{SupervisorError, SupervisorResult};
use crate::sentinel::LineBuffer;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};
use tracker_config::{ServerInfo, TrackerSettings};

const START_ARG: &str = "start";
const READ_CHUNK: usize = 4096;

/// Command line of the tracker process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerCommand {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl TrackerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Build the command from resolved settings.
    ///
    /// A configured `path` launches the tool directly as `<path..> start`.
    /// Otherwise the tracker script runs under the interpreter as
    /// `<interpreter..> <script> start`. Configured `args` follow `start`.
    pub fn from_settings(
        settings: &TrackerSettings,
        script: Option<&Path>,
        server: &ServerInfo,
    ) -> SupervisorResult<Self> {
        let command = if let Some((program, rest)) = settings.path.split_first() {
            Self::new(program.as_str()).args(rest.iter().cloned())
        } else {
            let Some((program, rest)) = settings.interpreter.split_first() else {
                let setting = server.setting_key("interpreter");
                error!(
                    setting = %setting,
                    "Python interpreter missing, set it to launch the tracker"
                );
                return Err(SupervisorError::MissingInterpreter(setting));
            };
            let script = script.ok_or_else(|| {
                SupervisorError::Config("tracker_script is not configured".to_string())
            })?;
            Self::new(program.as_str())
                .args(rest.iter().cloned())
                .arg(script.to_string_lossy())
        };

        Ok(command
            .arg(START_ARG)
            .args(settings.args.iter().cloned())
            .current_dir(&settings.cwd))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }
}

impl std::fmt::Display for TrackerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Signal delivered to the tracker by the monitor task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// Graceful termination (SIGTERM on unix).
    Terminate,
    /// Forced kill.
    Kill,
}

/// Receives what the tracker process produces.
pub trait TrackerOutput: Send + Sync {
    /// A complete stdout line.
    fn on_stdout_line(&self, line: &str);

    /// A stderr line.
    fn on_stderr_line(&self, line: &str) {
        error!(stderr = %line, "Tracker error output");
    }

    /// The process exited (`None` if its status could not be read).
    fn on_exit(&self, status: Option<ExitStatus>);
}

/// Handle to a running tracker process.
#[derive(Debug)]
pub struct TrackerHandle {
    pid: Option<u32>,
    stop_tx: broadcast::Sender<StopSignal>,
    exited: watch::Receiver<bool>,
}

impl TrackerHandle {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the tracker to terminate gracefully. Does not wait.
    pub fn terminate(&self) {
        info!(pid = ?self.pid, "Sending SIGTERM to tracker");
        let _ = self.stop_tx.send(StopSignal::Terminate);
    }

    pub fn kill(&self) {
        warn!(pid = ?self.pid, "Killing tracker");
        let _ = self.stop_tx.send(StopSignal::Kill);
    }

    pub fn has_exited(&self) -> bool {
        *self.exited.borrow()
    }

    /// Wait up to `grace` for the process to exit. Returns whether it did.
    pub async fn wait_exit(&self, grace: Duration) -> bool {
        let mut exited = self.exited.clone();
        let done = matches!(
            tokio::time::timeout(grace, exited.wait_for(|done| *done)).await,
            Ok(Ok(_))
        );
        done
    }
}

/// Spawn the tracker and a task that feeds its output to `output`.
///
/// Stdin is closed. Stdout is reassembled into lines; stderr is forwarded
/// line by line.
pub fn spawn_tracker(
    command: &TrackerCommand,
    output: Arc<dyn TrackerOutput>,
) -> SupervisorResult<TrackerHandle> {
    info!(command = %command, "Spawning tracker process");

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &command.cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(SupervisorError::Spawn)?;
    let pid = child.id();

    let Some(stdout) = child.stdout.take() else {
        let _ = child.start_kill();
        return Err(SupervisorError::NoStdout);
    };

    if let Some(stderr) = child.stderr.take() {
        let output = output.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                output.on_stderr_line(&line);
            }
        });
    }

    let (stop_tx, stop_rx) = broadcast::channel(4);
    let (exited_tx, exited_rx) = watch::channel(false);

    tokio::spawn(monitor(child, stdout, stop_rx, output, exited_tx));
    info!(pid = ?pid, "Tracker process spawned");

    Ok(TrackerHandle {
        pid,
        stop_tx,
        exited: exited_rx,
    })
}

async fn monitor(
    mut child: Child,
    mut stdout: ChildStdout,
    mut stop_rx: broadcast::Receiver<StopSignal>,
    output: Arc<dyn TrackerOutput>,
    exited_tx: watch::Sender<bool>,
) {
    let pid = child.id();
    let mut buf = vec![0u8; READ_CHUNK];
    let mut lines = LineBuffer::new();
    let mut stdout_open = true;
    let mut stop_open = true;

    let status = loop {
        tokio::select! {
            signal = stop_rx.recv(), if stop_open => match signal {
                Ok(signal) => {
                    if let Err(e) = send_signal(&mut child, signal) {
                        warn!(pid = ?pid, error = %e, "Failed to signal tracker");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => stop_open = false,
            },

            read = stdout.read(&mut buf), if stdout_open => match read {
                Ok(0) => {
                    stdout_open = false;
                    if let Some(rest) = lines.finish() {
                        output.on_stdout_line(&rest);
                    }
                }
                Ok(n) => {
                    let chunk = &buf[..n];
                    info!(
                        pid = ?pid,
                        output = %String::from_utf8_lossy(chunk).trim_end(),
                        "Tracker output"
                    );
                    for line in lines.push(chunk) {
                        output.on_stdout_line(&line);
                    }
                }
                Err(e) => {
                    warn!(pid = ?pid, error = %e, "Error reading tracker stdout");
                    stdout_open = false;
                    if let Some(rest) = lines.finish() {
                        output.on_stdout_line(&rest);
                    }
                }
            },

            status = child.wait(), if !stdout_open => break status,
        }
    };

    let status = match status {
        Ok(status) => {
            debug!(pid = ?pid, status = %status, "Tracker process exited");
            Some(status)
        }
        Err(e) => {
            warn!(pid = ?pid, error = %e, "Error waiting for tracker process");
            None
        }
    };

    output.on_exit(status);
    exited_tx.send_replace(true);
}

fn send_signal(child: &mut Child, signal: StopSignal) -> std::io::Result<()> {
    match signal {
        StopSignal::Terminate => terminate(child),
        StopSignal::Kill => child.start_kill(),
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) -> std::io::Result<()> {
    // Already reaped: nothing left to signal.
    let Some(pid) = child.id() else {
        return Ok(());
    };
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}
