//! Command execution and runtime logic.
//!
//! Contains configuration loading, logging initialization and command
//! dispatch.

use anyhow::{Context, Result};
use exo_core::cli::{ExitCode, OutputFormat};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Commands;
use crate::commands;
use crate::config::{AgentConfig, default_config_path};

/// Loads the agent configuration.
///
/// An explicit `path` must exist. Without one, the default location is used
/// if present and built-in defaults otherwise. `plugin_dir` overrides the
/// configured plugin directory.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is invalid.
pub fn load_config(path: Option<&Path>, plugin_dir: Option<PathBuf>) -> Result<AgentConfig> {
    let mut config = match path {
        Some(path) => AgentConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(path) => AgentConfig::load(&path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => AgentConfig::default(),
        },
    };

    if let Some(dir) = plugin_dir {
        config.agent.plugin_dir = dir;
    }
    Ok(config)
}

/// Initializes logging infrastructure.
///
/// Logs go to stderr, keeping stdout for command output. With `log_file`
/// they are also appended to that file through a background writer; keep
/// the returned guard alive until exit so buffered lines are flushed.
///
/// # Errors
///
/// Returns an error if `log_file` has no file name or a global subscriber
/// is already installed.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let (file_writer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("log file {} has no file name", path.display()))?;
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_writer.map(|writer| fmt::layer().with_writer(writer).with_ansi(false)))
        .try_init()
        .context("installing the log subscriber")?;

    Ok(guard)
}

/// Executes the specified CLI command.
///
/// Routes commands to their respective handlers and returns an exit code.
///
/// # Errors
///
/// Returns an error if command execution fails.
pub async fn execute_command(
    command: Commands,
    config: &AgentConfig,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    match command {
        Commands::Discover => commands::discover::run(config, output_format).await,
        Commands::Describe { name } => {
            commands::describe::run_description(config, &name, output_format).await
        }
        Commands::SampleConfig { name } => {
            commands::describe::run_sample_config(config, &name, output_format).await
        }
        Commands::Run { once } => commands::run::run(config, once, output_format).await,
        Commands::Completions { shell } => {
            use crate::cli::Cli;
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            commands::completions::run(shell, &mut cmd).await
        }
    }
}
