//! Configuration, tracker settings and runtime paths for the CodeCarbon
//! supervisor.

mod config;
mod error;
mod logging;
mod paths;
mod settings;
mod variables;

pub use config::{Config, IntegrationMode, DEFAULT_LOG_LEVEL};
pub use error::{ConfigError, ConfigResult};
pub use logging::init_logging;
pub use paths::Paths;
pub use settings::{
    affects_configuration, changed_keys, get_global_settings, get_workspace_settings,
    ServerInfo, SettingsDocument, SettingsGroup, TrackerSettings, WorkspaceFolder,
};
pub use variables::resolve_variables;
