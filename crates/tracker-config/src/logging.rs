//! Logging initialization for the supervisor.
//!
//! Thin wrapper over the observability crate: compact output on stderr and,
//! when a path is given, structured JSONL in the log file.

use std::path::PathBuf;

const SERVICE_NAME: &str = "carbon-supervisor";

/// Initialize the logging system.
///
/// `RUST_LOG` takes precedence over `level`.
///
/// ```ignore
/// init_logging("info", Some(paths.log_file()))?;
/// tracing::info!("supervisor started");
/// ```
pub fn init_logging(level: &str, log_path: Option<PathBuf>) -> std::io::Result<()> {
    observability::init_with_config(observability::LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: level.into(),
        log_path,
        also_stderr: true,
    })
}
