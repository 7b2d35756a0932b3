//! Run command implementation.
//!
//! Starts one external input per configured block, then gathers from all of
//! them on every tick and prints the metrics. A plugin that fails to start
//! is reported and left out; a failed gather is logged and retried on the
//! next tick.

use anyhow::{Context, Result};
use exo_bridge::{ExternalRegistry, InputWrapper};
use exo_core::cli::{ExitCode, OutputFormat};
use exo_core::{Input, Metric};
use exo_discovery::discover;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::config::AgentConfig;
use crate::formatters::format_metrics;

/// Summary of one gather cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Inputs that gathered successfully
    pub succeeded: usize,
    /// Inputs whose gather failed
    pub failed: usize,
    /// Metrics collected in total
    pub metrics: usize,
}

/// Creates and initializes one input per configured block.
///
/// Unknown names and failed starts are logged and skipped.
pub async fn start_inputs(
    registry: &ExternalRegistry,
    config: &AgentConfig,
) -> Vec<InputWrapper> {
    let mut started = Vec::new();
    for block in &config.inputs {
        let input = match registry.create(&block.name, block.raw.as_str()) {
            Ok(input) => input,
            Err(e) => {
                error!(plugin = %block.name, error = %e, "no such external input");
                continue;
            }
        };

        match input.init().await {
            Ok(()) => started.push(input),
            Err(e) => {
                let cause = std::error::Error::source(&e).map(ToString::to_string);
                error!(plugin = %block.name, error = %e, cause = ?cause, "failed to start input");
            }
        }
    }
    started
}

/// Gathers once from every input, in order, into `metrics`.
pub async fn gather_cycle(inputs: &[InputWrapper], metrics: &mut Vec<Metric>) -> CycleOutcome {
    let mut outcome = CycleOutcome::default();
    for input in inputs {
        let before = metrics.len();
        match input.gather(metrics).await {
            Ok(()) => outcome.succeeded += 1,
            Err(e) => {
                outcome.failed += 1;
                warn!(plugin = %input.name(), error = %e, "gather failed");
            }
        }
        outcome.metrics += metrics.len() - before;
    }
    outcome
}

async fn stop_all(inputs: &[InputWrapper]) {
    for input in inputs {
        input.stop().await;
        let stats = input.stats();
        info!(
            plugin = %input.name(),
            gathers = stats.gathers,
            failures = stats.gather_failures,
            metrics = stats.metrics_forwarded,
            "input stopped"
        );
    }
}

fn print_metrics(metrics: &[Metric], output_format: OutputFormat) -> Result<()> {
    if !metrics.is_empty() {
        println!("{}", format_metrics(metrics, output_format)?);
    }
    Ok(())
}

/// Runs the run command.
///
/// With `once`, exits after a single cycle with [`ExitCode::PLUGIN_ERROR`]
/// if any gather failed. Otherwise gathers every interval until Ctrl-C.
///
/// # Errors
///
/// Returns an error if discovery fails or metrics cannot be formatted.
pub async fn run(config: &AgentConfig, once: bool, output_format: OutputFormat) -> Result<ExitCode> {
    if config.inputs.is_empty() {
        warn!("no [[inputs.<name>]] blocks configured, nothing to do");
        return Ok(ExitCode::SUCCESS);
    }

    let root = &config.agent.plugin_dir;
    let registration = discover(root)
        .with_context(|| format!("discovering plugins under {}", root.display()))?;
    let registry = ExternalRegistry::from_registration(&registration, config.launch_config());

    let inputs = start_inputs(&registry, config).await;
    if inputs.is_empty() {
        error!("no input could be started");
        return Ok(ExitCode::LAUNCH_ERROR);
    }
    info!(
        started = inputs.len(),
        configured = config.inputs.len(),
        "inputs started"
    );

    let result = if once {
        let mut metrics = Vec::new();
        let outcome = gather_cycle(&inputs, &mut metrics).await;
        print_metrics(&metrics, output_format).map(|()| {
            if outcome.failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::PLUGIN_ERROR
            }
        })
    } else {
        run_loop(config, &inputs, output_format).await
    };

    stop_all(&inputs).await;
    result
}

async fn run_loop(
    config: &AgentConfig,
    inputs: &[InputWrapper],
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let mut ticker = tokio::time::interval(config.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mut metrics = Vec::new();
                let outcome = gather_cycle(inputs, &mut metrics).await;
                print_metrics(&metrics, output_format)?;
                if outcome.failed > 0 {
                    warn!(failed = outcome.failed, succeeded = outcome.succeeded, "gather cycle incomplete");
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for Ctrl-C")?;
                info!("interrupted, stopping inputs");
                return Ok(ExitCode::SUCCESS);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exo_bridge::LaunchConfig;

    #[tokio::test]
    async fn test_no_inputs_configured_is_success() {
        let config = AgentConfig::default();
        let code = run(&config, true, OutputFormat::Text).await.unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[tokio::test]
    async fn test_unknown_inputs_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let registration = discover(dir.path()).unwrap();
        let registry = ExternalRegistry::from_registration(&registration, LaunchConfig::default());
        let config: AgentConfig = "[[inputs.ghost]]\nvalue = 1\n".parse().unwrap();

        let inputs = start_inputs(&registry, &config).await;
        assert!(inputs.is_empty());
    }

    #[tokio::test]
    async fn test_gather_cycle_over_nothing() {
        let mut metrics = Vec::new();
        let outcome = gather_cycle(&[], &mut metrics).await;
        assert_eq!(outcome, CycleOutcome::default());
    }
}
