//! Application wiring for the supervisor binary.

mod run;
mod task;

pub use run::{run_supervisor, RunOptions};
pub use task::{create_task, delete_task};
