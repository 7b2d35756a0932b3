//! Exo telemetry agent.
//!
//! Discovers external plugins, starts them as verified subprocesses and
//! prints the metrics they gather.
//!
//! # Examples
//!
//! ```bash
//! # What is installed, and does it match the checksums?
//! exo-agent discover --plugin-dir /usr/lib/exo/plugins
//!
//! # Paste-ready configuration for one plugin
//! exo-agent sample-config mock
//!
//! # One cycle of every configured input, as line protocol
//! exo-agent --config agent.toml --format text run --once
//! ```

use anyhow::Result;
use clap::Parser;
use exo_agent::cli::Cli;
use exo_agent::runner::{execute_command, init_logging, load_config};
use exo_core::cli::OutputFormat;

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let output_format = cli
        .format
        .parse::<OutputFormat>()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let config = load_config(cli.config.as_deref(), cli.plugin_dir.clone())?;

    // Dropping the guard flushes the log file
    let guard = init_logging(cli.verbose, config.agent.log_file.as_deref())?;

    let exit_code = execute_command(cli.command, &config, output_format).await?;

    drop(guard);
    std::process::exit(exit_code.as_i32());
}
