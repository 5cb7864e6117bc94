//! `task create` / `task delete`.

use crate::terminal::{InputLines, TerminalHost};
use global_task::{GlobalTaskRegistrar, JsonTaskStore};
use std::sync::Arc;
use tracing::info;
use tracker_config::Paths;

fn registrar(paths: &Paths) -> GlobalTaskRegistrar {
    let store = Arc::new(JsonTaskStore::new(paths.tasks_file()));
    let host = Arc::new(TerminalHost::new(InputLines::stdin()));
    GlobalTaskRegistrar::new(store, host)
}

/// Add the monitor task, prompting for the binary when `location` is unset.
pub async fn create_task(paths: &Paths, location: Option<String>) -> anyhow::Result<()> {
    let outcome = registrar(paths).create_task_with_location(location).await?;
    info!(outcome = ?outcome, tasks = %paths.tasks_file().display(), "Task create finished");
    Ok(())
}

pub async fn delete_task(paths: &Paths) -> anyhow::Result<()> {
    let outcome = registrar(paths).delete_task().await?;
    info!(outcome = ?outcome, tasks = %paths.tasks_file().display(), "Task delete finished");
    Ok(())
}
