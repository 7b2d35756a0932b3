//! Shell completion generation command.

use anyhow::Result;
use clap::Command;
use clap_complete::{Shell, generate};
use exo_core::cli::ExitCode;
use std::io::{self, Write};
use tracing::debug;

/// Writes the completion script for `shell` to `out`.
///
/// # Examples
///
/// ```
/// use clap::Command;
/// use clap_complete::Shell;
/// use exo_agent::commands::completions::generate_completions;
///
/// let mut cmd = Command::new("exo-agent").subcommand(Command::new("discover"));
/// let mut script = Vec::new();
/// generate_completions(Shell::Bash, &mut cmd, &mut script);
///
/// assert!(String::from_utf8(script).unwrap().contains("discover"));
/// ```
pub fn generate_completions(shell: Shell, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    debug!(%shell, %name, "generating completions");
    generate(shell, cmd, name, out);
}

/// Runs the completions command, printing the script to stdout.
///
/// # Errors
///
/// Never fails; the `Result` keeps the command signatures uniform.
pub async fn run(shell: Shell, cmd: &mut Command) -> Result<ExitCode> {
    generate_completions(shell, cmd, &mut io::stdout());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::CommandFactory;

    fn script(shell: Shell) -> String {
        let mut out = Vec::new();
        generate_completions(shell, &mut Cli::command(), &mut out);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_bash_script_lists_subcommands() {
        let script = script(Shell::Bash);
        for sub in ["discover", "describe", "sample-config", "run", "completions"] {
            assert!(script.contains(sub), "missing {sub}");
        }
    }

    #[test]
    fn test_every_shell_produces_output() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell, Shell::Elvish] {
            assert!(script(shell).contains("exo-agent"), "{shell}");
        }
    }
}
