//! CLI argument definitions and parsing.
//!
//! Defines the command-line interface structure using clap:
//! - `Cli` - Main CLI entry point
//! - `Commands` - Available subcommands

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Exo telemetry agent.
///
/// Collects metrics from external input plugins: standalone executables
/// discovered under the plugin directory, started as subprocesses and driven
/// over an authenticated pipe.
#[derive(Parser, Debug)]
#[command(name = "exo-agent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (json, text, pretty)
    #[arg(long = "format", global = true, default_value = "pretty")]
    pub format: String,

    /// Configuration file
    ///
    /// Default: <config dir>/exo-agent/agent.toml, if it exists
    #[arg(short, long, global = true, env = "EXO_AGENT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Plugin directory, overriding `[agent] plugin_dir`
    #[arg(long, global = true)]
    pub plugin_dir: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List plugins found under the plugin directory.
    ///
    /// Shows every executable in the inputs, outputs, processors and
    /// aggregators folders together with the result of checking it against
    /// the folder's `checksums` manifest.
    ///
    /// # Examples
    ///
    /// ```bash
    /// exo-agent discover --plugin-dir /usr/lib/exo/plugins
    /// ```
    Discover,

    /// Start an external input and print its description.
    Describe {
        /// Input plugin name
        name: String,
    },

    /// Start an external input and print its sample configuration.
    SampleConfig {
        /// Input plugin name
        name: String,
    },

    /// Run every configured input and print gathered metrics.
    ///
    /// Each `[[inputs.<name>]]` block of the configuration file starts one
    /// plugin instance. Inputs that fail to start are reported and skipped.
    ///
    /// # Examples
    ///
    /// ```bash
    /// # One collection cycle as line protocol
    /// exo-agent --format text run --once
    ///
    /// # Collect until interrupted
    /// exo-agent --config agent.toml run
    /// ```
    Run {
        /// Gather once and exit
        #[arg(long)]
        once: bool,
    },

    /// Generate shell completions.
    ///
    /// Generates completion scripts for various shells that can be
    /// sourced or saved to enable tab completion for this CLI.
    Completions {
        /// Target shell for completion generation
        #[arg(value_enum)]
        shell: Shell,
    },
}
