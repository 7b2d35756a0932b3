//! `describe` and `sample-config` commands.
//!
//! Both start the named external input, ask it one static question and
//! stop it again. Neither configures nor initializes the plugin.

use anyhow::{Context, Result};
use exo_bridge::{ExternalRegistry, InputWrapper};
use exo_core::Input;
use exo_core::cli::{ExitCode, OutputFormat};
use exo_discovery::discover;
use serde::Serialize;
use tracing::error;

use crate::config::AgentConfig;

/// Result of the `describe` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Description {
    /// Plugin name
    pub name: String,
    /// Text reported by the plugin
    pub description: String,
}

/// Result of the `sample-config` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleConfig {
    /// Plugin name
    pub name: String,
    /// Example configuration block, header included
    pub sample_config: String,
}

fn open(config: &AgentConfig, name: &str) -> Result<exo_core::Result<InputWrapper>> {
    let root = &config.agent.plugin_dir;
    let registration = discover(root)
        .with_context(|| format!("discovering plugins under {}", root.display()))?;
    let registry = ExternalRegistry::from_registration(&registration, config.launch_config());
    Ok(registry.create(name, format!("[[inputs.{name}]]\n")))
}

fn report_failure(name: &str, err: &exo_core::Error) -> ExitCode {
    error!(plugin = %name, error = %err, "command failed");
    if let Some(source) = std::error::Error::source(err) {
        error!(plugin = %name, cause = %source, "caused by");
    }
    ExitCode::for_error(err)
}

/// Runs the describe command.
///
/// # Errors
///
/// Returns an error if discovery fails or the output cannot be formatted.
pub async fn run_description(
    config: &AgentConfig,
    name: &str,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let input = match open(config, name)? {
        Ok(input) => input,
        Err(e) => return Ok(report_failure(name, &e)),
    };

    let result = input.description().await;
    input.stop().await;

    match result {
        Ok(description) => {
            let report = Description {
                name: name.to_string(),
                description,
            };
            println!("{}", crate::formatters::format_output(&report, output_format)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report_failure(name, &e)),
    }
}

/// Runs the sample-config command.
///
/// Outside JSON mode the block is printed as is, ready to paste into the
/// configuration file.
///
/// # Errors
///
/// Returns an error if discovery fails or the output cannot be formatted.
pub async fn run_sample_config(
    config: &AgentConfig,
    name: &str,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let input = match open(config, name)? {
        Ok(input) => input,
        Err(e) => return Ok(report_failure(name, &e)),
    };

    let result = input.sample_config().await;
    input.stop().await;

    match result {
        Ok(sample) => {
            let report = SampleConfig {
                name: name.to_string(),
                sample_config: format!("[[inputs.{name}]]\n{sample}"),
            };
            if output_format == OutputFormat::Json {
                println!("{}", crate::formatters::format_output(&report, output_format)?);
            } else {
                print!("{}", report.sample_config);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report_failure(name, &e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(dir: &std::path::Path) -> AgentConfig {
        let mut config = AgentConfig::default();
        config.agent.plugin_dir = dir.to_path_buf();
        config
    }

    #[tokio::test]
    async fn test_unknown_plugin_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let code = run_description(&config_for(dir.path()), "nope", OutputFormat::Json)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::INVALID_INPUT);
    }

    #[tokio::test]
    async fn test_missing_plugin_dir_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("absent"));
        let code = run_sample_config(&config, "nope", OutputFormat::Text)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::INVALID_INPUT);
    }
}
