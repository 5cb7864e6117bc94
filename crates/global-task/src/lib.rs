//! Global task registrar.
//!
//! Adds or removes a persisted background task, labelled
//! [`GLOBAL_TASK_LABEL`], that runs `codecarbon monitor` whenever a folder is
//! opened, independently of the supervisor's own lifetime.

mod error;
mod registrar;
mod store;
mod task;

pub use error::{TaskError, TaskResult};
pub use registrar::{GlobalTaskRegistrar, TaskOutcome};
pub use store::{JsonTaskStore, MemoryTaskStore, TaskStore};
pub use task::{TaskDefinition, GLOBAL_TASK_LABEL};
