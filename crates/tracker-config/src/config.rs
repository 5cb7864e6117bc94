//! Supervisor configuration.

use crate::{ConfigResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const DEFAULT_STOP_GRACE_MS: u64 = 5_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// How the tracker is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMode {
    /// Requests to a language server hosting the tracker.
    #[default]
    Rpc,
    /// A locally spawned tracker process.
    Process,
}

impl FromStr for IntegrationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rpc" | "lsp" => Ok(Self::Rpc),
            "process" => Ok(Self::Process),
            other => Err(format!("unknown integration mode: {}", other)),
        }
    }
}

/// Main supervisor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Which tracker controller to compose.
    #[serde(default)]
    pub integration: IntegrationMode,
    /// Language-server socket; `Paths::server_socket()` when unset.
    #[serde(default)]
    pub server_socket: Option<PathBuf>,
    /// Tracker script launched as `<interpreter> <script> start` in process mode.
    #[serde(default)]
    pub tracker_script: Option<PathBuf>,
    /// How long a process-mode stop waits for the tracker to exit.
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
    /// Watchdog for a single language-server request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_stop_grace_ms() -> u64 {
    DEFAULT_STOP_GRACE_MS
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            integration: IntegrationMode::default(),
            server_socket: None,
            tracker_script: None,
            stop_grace_ms: DEFAULT_STOP_GRACE_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> ConfigResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> ConfigResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("CODECARBON_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// Socket of the tracker language server.
    pub fn server_socket(&self, paths: &Paths) -> PathBuf {
        self.server_socket
            .clone()
            .unwrap_or_else(|| paths.server_socket())
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
