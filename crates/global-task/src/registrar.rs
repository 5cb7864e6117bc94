//! Create and delete the global monitor task.

use crate::task::{has_label, TaskDefinition, GLOBAL_TASK_LABEL};
use crate::{TaskResult, TaskStore};
use std::sync::Arc;
use tracing::{error, info};
use tracker_supervisor::EditorHost;

const LOCATION_PROMPT: &str = "Enter the location of your codecarbon binary";
const LOCATION_PLACEHOLDER: &str = "e.g. /usr/local/bin/codecarbon";

const ALREADY_EXISTS: &str =
    "A global task already exists to monitor your code's carbon emissions.";
const LOCATION_REQUIRED: &str = "Python interpreter location is required";
const CREATED: &str = "A global task has been added to monitor your code's carbon emissions. This task will run every time you open a new workspace. \n See Seetings ==> User Tasks for more details.";
const NOT_FOUND: &str = "No global task exists to monitor your code's carbon emissions.";
const REMOVED: &str = "The global task to monitor your code's carbon emissions has been removed.";

/// What a registrar call did to the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Created,
    AlreadyExists,
    /// No binary location was given.
    Cancelled,
    Removed,
    NotFound,
}

pub struct GlobalTaskRegistrar {
    store: Arc<dyn TaskStore>,
    host: Arc<dyn EditorHost>,
}

impl GlobalTaskRegistrar {
    pub fn new(store: Arc<dyn TaskStore>, host: Arc<dyn EditorHost>) -> Self {
        Self { store, host }
    }

    /// Ask for the binary location and add the monitor task.
    pub async fn create_task(&self) -> TaskResult<TaskOutcome> {
        self.create_task_with_location(None).await
    }

    /// Add the monitor task, prompting for the binary location only when
    /// `location` is `None`. An existing task is left untouched.
    pub async fn create_task_with_location(
        &self,
        location: Option<String>,
    ) -> TaskResult<TaskOutcome> {
        let mut tasks = self.load()?;
        if tasks.iter().any(|t| has_label(t, GLOBAL_TASK_LABEL)) {
            self.host.show_information(ALREADY_EXISTS);
            return Ok(TaskOutcome::AlreadyExists);
        }

        let location = match location {
            Some(location) => Some(location),
            None => {
                self.host
                    .show_input(LOCATION_PROMPT, LOCATION_PLACEHOLDER)
                    .await
            }
        };
        let Some(location) = location.filter(|l| !l.trim().is_empty()) else {
            self.host.show_error(LOCATION_REQUIRED);
            return Ok(TaskOutcome::Cancelled);
        };

        tasks.push(TaskDefinition::monitor(location.trim()).to_value()?);
        self.save(&tasks)?;
        info!(location = %location.trim(), "Global monitor task created");
        self.host.show_information(CREATED);
        Ok(TaskOutcome::Created)
    }

    /// Remove the monitor task, keeping every other task.
    pub async fn delete_task(&self) -> TaskResult<TaskOutcome> {
        let tasks = self.load()?;
        if !tasks.iter().any(|t| has_label(t, GLOBAL_TASK_LABEL)) {
            self.host.show_information(NOT_FOUND);
            return Ok(TaskOutcome::NotFound);
        }

        let remaining: Vec<_> = tasks
            .into_iter()
            .filter(|t| !has_label(t, GLOBAL_TASK_LABEL))
            .collect();
        self.save(&remaining)?;
        info!("Global monitor task removed");
        self.host.show_information(REMOVED);
        Ok(TaskOutcome::Removed)
    }

    fn load(&self) -> TaskResult<Vec<serde_json::Value>> {
        self.store.load().inspect_err(|e| {
            error!(error = %e, "Failed to read task list");
            self.host.show_error(&format!("Failed to read tasks: {}", e));
        })
    }

    fn save(&self, tasks: &[serde_json::Value]) -> TaskResult<()> {
        self.store.save(tasks).inspect_err(|e| {
            error!(error = %e, "Failed to write task list");
            self.host.show_error(&format!("Failed to update tasks: {}", e));
        })
    }
}
