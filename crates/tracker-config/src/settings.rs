//! Namespaced tracker settings.
//!
//! A settings document maps a namespace (the server module, `codecarbon` by
//! default) to a [`SettingsGroup`]. The global document lives in
//! `settings.json`; a workspace folder may override any key in
//! `<folder>/.codecarbon/settings.json`.

use crate::variables::resolve_variables;
use crate::{ConfigResult, Paths};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_SERVER_NAME: &str = "CodeCarbon";
const DEFAULT_SERVER_MODULE: &str = "codecarbon";

/// Keys whose change requires the tracker integration to be re-evaluated.
const TRACKED_KEYS: [&str; 4] = ["args", "path", "interpreter", "launchOnStartup"];

/// Display name and module of the tracker server.
///
/// The module doubles as command prefix (`<module>.start`) and settings
/// namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub module: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            module: DEFAULT_SERVER_MODULE.to_string(),
        }
    }
}

impl ServerInfo {
    pub fn start_command(&self) -> String {
        format!("{}.start", self.module)
    }

    pub fn stop_command(&self) -> String {
        format!("{}.stop", self.module)
    }

    /// Fully qualified setting key, e.g. `codecarbon.interpreter`.
    pub fn setting_key(&self, key: &str) -> String {
        format!("{}.{}", self.module, key)
    }
}

/// An open workspace folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFolder {
    pub name: String,
    pub path: PathBuf,
}

impl WorkspaceFolder {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }

    /// Folder named after the last path component.
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { name, path }
    }
}

/// Raw values of one settings namespace. `None` means "not set here".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_on_startup: Option<bool>,
}

impl SettingsGroup {
    /// Values of `self`, with gaps filled from `fallback`.
    pub fn or(&self, fallback: &SettingsGroup) -> SettingsGroup {
        SettingsGroup {
            args: self.args.clone().or_else(|| fallback.args.clone()),
            path: self.path.clone().or_else(|| fallback.path.clone()),
            interpreter: self
                .interpreter
                .clone()
                .or_else(|| fallback.interpreter.clone()),
            launch_on_startup: self.launch_on_startup.or(fallback.launch_on_startup),
        }
    }

    fn value_of(&self, key: &str) -> Option<serde_json::Value> {
        match key {
            "args" => self.args.as_ref().map(|v| serde_json::json!(v)),
            "path" => self.path.as_ref().map(|v| serde_json::json!(v)),
            "interpreter" => self.interpreter.as_ref().map(|v| serde_json::json!(v)),
            "launchOnStartup" => self.launch_on_startup.map(serde_json::Value::Bool),
            _ => None,
        }
    }
}

/// A settings file: namespace -> group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsDocument {
    namespaces: BTreeMap<String, SettingsGroup>,
}

impl SettingsDocument {
    /// Load a settings file; a missing file is an empty document.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load the global settings document.
    pub fn load_global(paths: &Paths) -> ConfigResult<Self> {
        Self::load(&paths.settings_file())
    }

    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The group for `namespace`, empty when absent.
    pub fn group(&self, namespace: &str) -> SettingsGroup {
        self.namespaces.get(namespace).cloned().unwrap_or_default()
    }

    pub fn set_group(&mut self, namespace: &str, group: SettingsGroup) {
        self.namespaces.insert(namespace.to_string(), group);
    }
}

/// Fully resolved settings for one workspace (or the global scope).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSettings {
    pub cwd: PathBuf,
    pub workspace: String,
    pub args: Vec<String>,
    pub path: Vec<String>,
    pub interpreter: Vec<String>,
    pub launch_on_startup: bool,
}

/// Resolve settings for `folder`: workspace overrides, then global values,
/// then defaults, with variables substituted.
pub fn get_workspace_settings(
    global: &SettingsDocument,
    namespace: &str,
    folder: &WorkspaceFolder,
    folders: &[WorkspaceFolder],
    include_interpreter: bool,
) -> ConfigResult<TrackerSettings> {
    let workspace_file = Paths::workspace_settings_file(&folder.path);
    let workspace_doc = SettingsDocument::load(&workspace_file)?;
    debug!(
        workspace = %folder.name,
        overrides = workspace_file.exists(),
        "Loading workspace settings"
    );
    let group = workspace_doc
        .group(namespace)
        .or(&global.group(namespace));

    let interpreter = if include_interpreter {
        group.interpreter.clone().unwrap_or_default()
    } else {
        Vec::new()
    };

    Ok(TrackerSettings {
        cwd: folder.path.clone(),
        workspace: folder.path.to_string_lossy().into_owned(),
        args: resolve_variables(&group.args.unwrap_or_default(), Some(folder), folders),
        path: resolve_variables(&group.path.unwrap_or_default(), Some(folder), folders),
        interpreter: resolve_variables(&interpreter, Some(folder), folders),
        launch_on_startup: group.launch_on_startup.unwrap_or(true),
    })
}

/// Settings from the global document only, rooted at the process cwd.
pub fn get_global_settings(
    global: &SettingsDocument,
    namespace: &str,
    include_interpreter: bool,
) -> TrackerSettings {
    let group = global.group(namespace);
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    TrackerSettings {
        workspace: cwd.to_string_lossy().into_owned(),
        cwd,
        args: group.args.unwrap_or_default(),
        path: group.path.unwrap_or_default(),
        interpreter: if include_interpreter {
            group.interpreter.unwrap_or_default()
        } else {
            Vec::new()
        },
        launch_on_startup: group.launch_on_startup.unwrap_or(true),
    }
}

/// Fully qualified keys (`<namespace>.<key>`) that differ between two
/// documents.
pub fn changed_keys(
    old: &SettingsDocument,
    new: &SettingsDocument,
    namespace: &str,
) -> Vec<String> {
    let (old, new) = (old.group(namespace), new.group(namespace));
    TRACKED_KEYS
        .iter()
        .filter(|key| old.value_of(key) != new.value_of(key))
        .map(|key| format!("{}.{}", namespace, key))
        .collect()
}

/// Whether any of `changed` is a tracked key of `namespace`.
pub fn affects_configuration(changed: &[String], namespace: &str) -> bool {
    TRACKED_KEYS
        .iter()
        .map(|key| format!("{}.{}", namespace, key))
        .any(|key| changed.contains(&key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn group_with_interpreter(interpreter: &[&str]) -> SettingsGroup {
        SettingsGroup {
            interpreter: Some(interpreter.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_server_info_defaults() {
        let info = ServerInfo::default();
        assert_eq!(info.name, "CodeCarbon");
        assert_eq!(info.start_command(), "codecarbon.start");
        assert_eq!(info.stop_command(), "codecarbon.stop");
        assert_eq!(info.setting_key("interpreter"), "codecarbon.interpreter");
    }

    #[test]
    fn test_document_parses_camel_case() {
        let doc: SettingsDocument = serde_json::from_str(
            r#"{ "codecarbon": { "launchOnStartup": false, "args": ["--log"] } }"#,
        )
        .unwrap();
        let group = doc.group("codecarbon");
        assert_eq!(group.launch_on_startup, Some(false));
        assert_eq!(group.args, Some(vec!["--log".to_string()]));
        assert!(doc.group("other").interpreter.is_none());
    }

    #[test]
    fn test_workspace_settings_defaults() {
        let dir = tempdir().unwrap();
        let folder = WorkspaceFolder::from_path(dir.path().to_path_buf());

        let settings =
            get_workspace_settings(&SettingsDocument::default(), "codecarbon", &folder, &[], true)
                .unwrap();
        assert!(settings.launch_on_startup);
        assert!(settings.args.is_empty());
        assert!(settings.interpreter.is_empty());
        assert_eq!(settings.cwd, dir.path());
    }

    #[test]
    fn test_workspace_overrides_global() {
        let dir = tempdir().unwrap();
        let folder = WorkspaceFolder::from_path(dir.path().to_path_buf());

        let mut global = SettingsDocument::default();
        global.set_group(
            "codecarbon",
            SettingsGroup {
                launch_on_startup: Some(true),
                ..group_with_interpreter(&["/usr/bin/python3"])
            },
        );

        let mut local = SettingsDocument::default();
        local.set_group(
            "codecarbon",
            SettingsGroup {
                launch_on_startup: Some(false),
                ..group_with_interpreter(&["${workspaceFolder}/.venv/bin/python"])
            },
        );
        local
            .save(&Paths::workspace_settings_file(dir.path()))
            .unwrap();

        let settings =
            get_workspace_settings(&global, "codecarbon", &folder, &[folder.clone()], true)
                .unwrap();
        assert!(!settings.launch_on_startup);
        assert_eq!(
            settings.interpreter,
            vec![format!("{}/.venv/bin/python", dir.path().display())]
        );
    }

    #[test]
    fn test_interpreter_excluded_unless_requested() {
        let dir = tempdir().unwrap();
        let folder = WorkspaceFolder::from_path(dir.path().to_path_buf());
        let mut global = SettingsDocument::default();
        global.set_group("codecarbon", group_with_interpreter(&["python3"]));

        let settings =
            get_workspace_settings(&global, "codecarbon", &folder, &[], false).unwrap();
        assert!(settings.interpreter.is_empty());

        let global_settings = get_global_settings(&global, "codecarbon", true);
        assert_eq!(global_settings.interpreter, vec!["python3".to_string()]);
        assert!(get_global_settings(&global, "codecarbon", false)
            .interpreter
            .is_empty());
    }

    #[test]
    fn test_changed_keys() {
        let old = SettingsDocument::default();
        let mut new = SettingsDocument::default();
        new.set_group(
            "codecarbon",
            SettingsGroup {
                launch_on_startup: Some(false),
                ..group_with_interpreter(&["python3"])
            },
        );

        let changed = changed_keys(&old, &new, "codecarbon");
        assert_eq!(
            changed,
            vec![
                "codecarbon.interpreter".to_string(),
                "codecarbon.launchOnStartup".to_string()
            ]
        );
        assert!(affects_configuration(&changed, "codecarbon"));
        assert!(!affects_configuration(&changed, "other"));
        assert!(changed_keys(&new, &new, "codecarbon").is_empty());
    }

    #[test]
    fn test_document_roundtrip_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(SettingsDocument::load(&path).unwrap(), SettingsDocument::default());

        let mut doc = SettingsDocument::default();
        doc.set_group("codecarbon", group_with_interpreter(&["python3"]));
        doc.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"interpreter\""));
        assert!(!content.contains("launchOnStartup"));
    }
}
