//! CodeCarbon supervisor - starts and stops the emissions tracker and reports
//! what it measured.

mod app;
mod terminal;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracker_config::{init_logging, Config, IntegrationMode, Paths};
use tracker_supervisor::{format_emissions, DEFAULT_DECIMALS};

/// CodeCarbon supervisor command-line interface.
#[derive(Parser)]
#[command(name = "carbon-supervisor")]
#[command(about = "Supervise the CodeCarbon emissions tracker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (config, settings, logs). Defaults to ~/.codecarbon-supervisor
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Activate the supervisor and read start/stop commands from stdin
    Run {
        /// Tracker integration (rpc or process); overrides the config file
        #[arg(short, long)]
        mode: Option<IntegrationMode>,

        /// Workspace folder the tracker runs in
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Language-server socket for rpc mode
        #[arg(long)]
        socket: Option<PathBuf>,
    },
    /// Manage the global monitor task
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Print an emissions value the way stop notices show it
    Format {
        /// Emissions in kgCO2e
        #[arg(allow_negative_numbers = true)]
        value: f64,

        /// Digits after the decimal point
        #[arg(short, long, default_value_t = DEFAULT_DECIMALS)]
        decimals: usize,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Add the monitor task to the user task list
    Create {
        /// Location of the codecarbon binary; prompted for when omitted
        #[arg(short, long)]
        path: Option<String>,
    },
    /// Remove the monitor task
    Delete,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;
    let config = Config::load(&paths)?;

    let level = cli.log_level.unwrap_or_else(|| config.log_level.clone());
    init_logging(&level, Some(paths.log_file()))?;

    match cli.command {
        Some(Commands::Run {
            mode,
            workspace,
            socket,
        }) => {
            let options = app::RunOptions {
                mode: mode.unwrap_or(config.integration),
                workspace,
                socket,
            };
            app::run_supervisor(config, paths, options).await?;
        }
        None => {
            let options = app::RunOptions {
                mode: config.integration,
                workspace: None,
                socket: None,
            };
            app::run_supervisor(config, paths, options).await?;
        }
        Some(Commands::Task { action }) => match action {
            TaskAction::Create { path } => app::create_task(&paths, path).await?,
            TaskAction::Delete => app::delete_task(&paths).await?,
        },
        Some(Commands::Format { value, decimals }) => {
            println!("{}", format_emissions(value, decimals));
        }
    }

    Ok(())
}
