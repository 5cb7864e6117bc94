//! `${...}` substitution in settings values.

use crate::WorkspaceFolder;

/// Substitute `${userHome}`, `${workspaceFolder}`, `${cwd}` and
/// `${workspaceFolder:<name>}` in every value.
///
/// `workspace` is the folder the settings are resolved for; `folders` is
/// every open folder, addressable by name.
pub fn resolve_variables(
    values: &[String],
    workspace: Option<&WorkspaceFolder>,
    folders: &[WorkspaceFolder],
) -> Vec<String> {
    let mut substitutions: Vec<(String, String)> = Vec::new();

    if let Some(home) = dirs::home_dir() {
        substitutions.push(("${userHome}".into(), home.to_string_lossy().into_owned()));
    }
    if let Some(workspace) = workspace {
        substitutions.push((
            "${workspaceFolder}".into(),
            workspace.path.to_string_lossy().into_owned(),
        ));
    }
    if let Ok(cwd) = std::env::current_dir() {
        substitutions.push(("${cwd}".into(), cwd.to_string_lossy().into_owned()));
    }
    for folder in folders {
        substitutions.push((
            format!("${{workspaceFolder:{}}}", folder.name),
            folder.path.to_string_lossy().into_owned(),
        ));
    }

    values
        .iter()
        .map(|value| {
            substitutions
                .iter()
                .fold(value.clone(), |acc, (key, replacement)| {
                    acc.replace(key.as_str(), replacement)
                })
        })
        .collect()
}
