//! The interactive `run` loop.

use crate::terminal::{InputLines, TerminalHost, TerminalStatusBar};
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracker_config::{
    affects_configuration, changed_keys, get_global_settings, get_workspace_settings, Config,
    IntegrationMode, Paths, ServerInfo, SettingsDocument, TrackerSettings, WorkspaceFolder,
};
use tracker_rpc::{IpcClient, RequestChannel};
use tracker_supervisor::{
    EditorHost, ProcessTrackerController, RpcTrackerController, StatusIndicator, StatusState,
    Supervisor, SupervisorError, TrackerCommand, TrackerController,
};

pub struct RunOptions {
    pub mode: IntegrationMode,
    pub workspace: Option<PathBuf>,
    pub socket: Option<PathBuf>,
}

/// Where the language server is expected to listen.
struct ServerLink {
    socket: PathBuf,
    timeout: Duration,
}

impl ServerLink {
    /// A request channel if the server socket is present.
    fn connect(&self) -> Option<Arc<dyn RequestChannel>> {
        if !self.socket.exists() {
            debug!(socket = %self.socket.display(), "Tracker server socket not found");
            return None;
        }
        let client: Arc<dyn RequestChannel> =
            Arc::new(IpcClient::new(&self.socket).with_timeout(self.timeout));
        Some(client)
    }
}

/// Settings files as last read, kept to detect changes on `reload`.
struct SettingsSnapshot {
    global: SettingsDocument,
    workspace: SettingsDocument,
}

impl SettingsSnapshot {
    fn read(paths: &Paths, options: &RunOptions) -> anyhow::Result<Self> {
        let global = SettingsDocument::load_global(paths)?;
        let workspace = match &options.workspace {
            Some(dir) => SettingsDocument::load(&Paths::workspace_settings_file(dir))?,
            None => SettingsDocument::default(),
        };
        Ok(Self { global, workspace })
    }

    /// Tracked keys of `namespace` that differ in `newer`.
    fn changed_keys(&self, newer: &SettingsSnapshot, namespace: &str) -> Vec<String> {
        let mut changed = changed_keys(&self.global, &newer.global, namespace);
        for key in changed_keys(&self.workspace, &newer.workspace, namespace) {
            if !changed.contains(&key) {
                changed.push(key);
            }
        }
        changed
    }
}

fn load_settings(
    snapshot: &SettingsSnapshot,
    server: &ServerInfo,
    options: &RunOptions,
) -> anyhow::Result<TrackerSettings> {
    let include_interpreter = options.mode == IntegrationMode::Process;

    let settings = match &options.workspace {
        Some(dir) => {
            let folder = WorkspaceFolder::from_path(dir.clone());
            get_workspace_settings(
                &snapshot.global,
                &server.module,
                &folder,
                std::slice::from_ref(&folder),
                include_interpreter,
            )?
        }
        None => get_global_settings(&snapshot.global, &server.module, include_interpreter),
    };
    debug!(settings = ?settings, "Tracker settings resolved");
    Ok(settings)
}

/// Everything that lives for one composition of the tracker.
struct Session {
    supervisor: Supervisor,
    rpc: Option<Arc<RpcTrackerController>>,
    launch_on_startup: bool,
}

struct Composer {
    config: Config,
    server: ServerInfo,
    mode: IntegrationMode,
    status: Arc<StatusIndicator>,
    host: Arc<dyn EditorHost>,
    link: ServerLink,
}

impl Composer {
    /// Pick the controller for the integration mode.
    fn compose(&self, settings: &TrackerSettings) -> anyhow::Result<Session> {
        let (controller, rpc): (Arc<dyn TrackerController>, Option<Arc<RpcTrackerController>>) =
            match self.mode {
                IntegrationMode::Process => {
                    let command = TrackerCommand::from_settings(
                        settings,
                        self.config.tracker_script.as_deref(),
                        &self.server,
                    )
                    .context("Cannot compose the process tracker")?;
                    info!(command = %command, "Process tracker configured");
                    let controller = ProcessTrackerController::new(
                        command,
                        self.status.clone(),
                        self.host.clone(),
                    )
                    .with_stop_grace(self.config.stop_grace());
                    let controller: Arc<dyn TrackerController> = Arc::new(controller);
                    (controller, None)
                }
                IntegrationMode::Rpc => {
                    info!(
                        socket = %self.link.socket.display(),
                        "Language-server tracker configured"
                    );
                    let controller = Arc::new(RpcTrackerController::new(
                        self.link.connect(),
                        self.status.clone(),
                        self.host.clone(),
                    ));
                    let tracker: Arc<dyn TrackerController> = controller.clone();
                    (tracker, Some(controller))
                }
            };

        Ok(Session {
            supervisor: Supervisor::new(self.server.clone(), self.status.clone(), controller),
            rpc,
            launch_on_startup: settings.launch_on_startup,
        })
    }

    fn refresh_channel(&self, session: &Session) {
        if let Some(rpc) = &session.rpc {
            rpc.set_channel(self.link.connect());
        }
    }
}

/// Run the supervisor until stdin closes, `quit` is entered or Ctrl-C.
pub async fn run_supervisor(
    config: Config,
    paths: Paths,
    options: RunOptions,
) -> anyhow::Result<()> {
    let server = ServerInfo::default();
    let mut snapshot = SettingsSnapshot::read(&paths, &options)?;
    let settings = load_settings(&snapshot, &server, &options)?;

    let input = InputLines::stdin();
    let host: Arc<dyn EditorHost> = Arc::new(TerminalHost::new(input.clone()));
    let status = Arc::new(StatusIndicator::new(
        Arc::new(TerminalStatusBar::new()),
        &server,
    ));

    let link = ServerLink {
        socket: options
            .socket
            .clone()
            .unwrap_or_else(|| config.server_socket(&paths)),
        timeout: config.request_timeout(),
    };
    let composer = Composer {
        config,
        server: server.clone(),
        mode: options.mode,
        status,
        host,
        link,
    };

    let mut session = composer.compose(&settings)?;
    session.supervisor.activate(session.launch_on_startup).await;
    println!("Commands: start, stop, reload, quit");

    loop {
        let line = tokio::select! {
            line = input.next_line() => line,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        let command = match line.as_str() {
            "" => continue,
            "quit" | "exit" => break,
            "reload" => {
                if let Some(next) = reload(&composer, &paths, &options, &mut snapshot).await {
                    let was_running = session.supervisor.status() == StatusState::Running;
                    composer.refresh_channel(&session);
                    if let Err(e) = session.supervisor.deactivate().await {
                        warn!(error = %e, "Tracker did not stop cleanly before reload");
                    }
                    session = next;
                    session.supervisor.activate(was_running).await;
                }
                continue;
            }
            "start" => server.start_command(),
            "stop" => server.stop_command(),
            other => other.to_string(),
        };

        composer.refresh_channel(&session);

        match session.supervisor.execute_command(&command).await {
            Ok(()) => {}
            Err(SupervisorError::UnknownCommand(name)) => {
                eprintln!("Unknown command: {}", name);
            }
            // Already shown to the user by the controller.
            Err(e) => warn!(error = %e, command = %command, "Command failed"),
        }
    }

    composer.refresh_channel(&session);
    session.supervisor.deactivate().await?;
    info!("Supervisor stopped");
    Ok(())
}

/// Re-read the settings files. Returns a new session when a tracked key
/// changed; the current one stays in place otherwise or on failure.
async fn reload(
    composer: &Composer,
    paths: &Paths,
    options: &RunOptions,
    snapshot: &mut SettingsSnapshot,
) -> Option<Session> {
    let namespace = composer.server.module.as_str();
    let newer = match SettingsSnapshot::read(paths, options) {
        Ok(newer) => newer,
        Err(e) => {
            warn!(error = %e, "Cannot re-read tracker settings");
            eprintln!("Cannot re-read settings: {:#}", e);
            return None;
        }
    };

    let changed = snapshot.changed_keys(&newer, namespace);
    *snapshot = newer;
    if !affects_configuration(&changed, namespace) {
        println!("Tracker settings unchanged");
        return None;
    }
    info!(changed = ?changed, "Tracker settings changed");

    let session = load_settings(snapshot, &composer.server, options)
        .and_then(|settings| composer.compose(&settings));
    match session {
        Ok(session) => Some(session),
        Err(e) => {
            warn!(error = %e, "Keeping the current tracker after a failed reload");
            eprintln!("Cannot apply new settings: {:#}", e);
            None
        }
    }
}
