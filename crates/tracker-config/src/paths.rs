//! File system paths for the supervisor.

use crate::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// Runtime directory name under the user's home.
const BASE_DIR_NAME: &str = ".codecarbon-supervisor";
/// Default socket the tracker language server listens on.
const SERVER_SOCKET_NAME: &str = "tracker.sock";

/// Manages file system paths for the supervisor.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.codecarbon-supervisor)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.codecarbon-supervisor`.
    pub fn new() -> ConfigResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| ConfigError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Supervisor configuration (`config.json`).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Global tracker settings (`settings.json`).
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    /// Global user task list (`tasks.json`).
    pub fn tasks_file(&self) -> PathBuf {
        self.base_dir.join("tasks.json")
    }

    /// Logs directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// JSONL log file.
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("supervisor.jsonl")
    }

    /// Default language-server socket.
    pub fn server_socket(&self) -> PathBuf {
        self.base_dir.join(SERVER_SOCKET_NAME)
    }

    /// Workspace-level settings override for a folder.
    pub fn workspace_settings_file(folder: &Path) -> PathBuf {
        folder.join(".codecarbon").join("settings.json")
    }

    /// Ensure the runtime directories exist.
    pub fn ensure_dirs(&self) -> ConfigResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
