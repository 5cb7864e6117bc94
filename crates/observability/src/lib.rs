//! # Observability
//!
//! Logging setup shared by the CodeCarbon supervisor crates.
//!
//! Crates are log producers only: they use `tracing` macros and never decide
//! where output goes. The binary calls [`init_with_config`] once at startup,
//! which installs:
//!
//! - an `EnvFilter` built from `RUST_LOG`, falling back to the configured level
//! - an optional JSONL file sink (one object per line, flushed per line)
//! - a compact stderr layer
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "carbon-supervisor".into(),
//!     default_level: "debug".into(),
//!     log_path: Some(paths.log_file()),
//!     ..Default::default()
//! })?;
//! tracing::info!("ready");
//! ```

mod file;
mod json_layer;

use std::io;
use std::path::PathBuf;

use file::{LogFileWriter, WriterFactory};
use json_layer::JsonLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use json_layer::LogEntry;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name written into every JSONL entry.
    pub service_name: String,

    /// Default filter when `RUST_LOG` is unset (e.g. "info", "debug").
    pub default_level: String,

    /// JSONL file sink. No file output when `None`.
    pub log_path: Option<PathBuf>,

    /// Emit compact human-readable lines on stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: true,
        }
    }
}

/// Initialize logging with only a service name (stderr output, `info` level).
pub fn init(service_name: &str) -> io::Result<()> {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    })
}

/// Initialize logging with custom configuration.
///
/// Fails only when the JSONL file cannot be opened. Calling this twice is
/// harmless: the second subscriber is dropped.
pub fn init_with_config(config: LogConfig) -> io::Result<()> {
    let json_layer = match &config.log_path {
        Some(path) => {
            let writer = LogFileWriter::new(path)?;
            Some(
                JsonLayer::new(config.service_name.clone(), WriterFactory::new(writer))
                    .with_filter(env_filter(&config.default_level)),
            )
        }
        None => None,
    };

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(io::stderr)
            .with_filter(env_filter(&config.default_level))
    });

    let installed = tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(
            service = %config.service_name,
            log_path = ?config.log_path,
            "observability initialized"
        );
    }

    Ok(())
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

pub use tracing::{debug, error, info, instrument, trace, warn, Level};
