//! Agent configuration file.
//!
//! The file has one `[agent]` table and any number of `[[inputs.<name>]]`
//! blocks. Each input block is kept as raw text, header line included,
//! because that text is what the plugin's `Configure` receives.
//!
//! ```toml
//! [agent]
//! plugin_dir = "/usr/lib/exo/plugins"
//! interval_seconds = 10
//!
//! [[inputs.mock]]
//! metric_name = "demo"
//! ```

use exo_bridge::LaunchConfig;
use exo_core::{Error, HandshakeConfig, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default plugin root.
pub const DEFAULT_PLUGIN_DIR: &str = "/usr/lib/exo/plugins";

/// The `[agent]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentSettings {
    /// Root of the plugin directory tree
    pub plugin_dir: PathBuf,
    /// Seconds between gather cycles
    pub interval_seconds: u64,
    /// Upper bound on plugin spawn plus handshake, in milliseconds
    pub start_timeout_ms: u64,
    /// Also write logs to this file
    pub log_file: Option<PathBuf>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            plugin_dir: PathBuf::from(DEFAULT_PLUGIN_DIR),
            interval_seconds: 10,
            start_timeout_ms: 1000,
            log_file: None,
        }
    }
}

/// One `[[inputs.<name>]]` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputBlock {
    /// Plugin name from the header
    pub name: String,
    /// Block text, header line first
    pub raw: String,
}

/// Parsed agent configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentConfig {
    /// Agent settings
    pub agent: AgentSettings,
    /// Input blocks in file order
    pub inputs: Vec<InputBlock>,
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    agent: AgentSettings,
    #[serde(default)]
    inputs: BTreeMap<String, Vec<toml::Table>>,
}

impl AgentConfig {
    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the file cannot be read or is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::ConfigError {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        text.parse()
    }

    /// Launch settings derived from `[agent]`.
    #[must_use]
    pub fn launch_config(&self) -> LaunchConfig {
        LaunchConfig::new(HandshakeConfig::standard())
            .with_start_timeout(Duration::from_millis(self.agent.start_timeout_ms))
    }

    /// Gather interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.agent.interval_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.agent.interval_seconds == 0 {
            return Err(Error::ConfigError {
                message: "interval_seconds must be positive".to_string(),
            });
        }
        if self.agent.start_timeout_ms == 0 {
            return Err(Error::ConfigError {
                message: "start_timeout_ms must be positive".to_string(),
            });
        }
        Ok(())
    }
}

impl FromStr for AgentConfig {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let document: Document = toml::from_str(text).map_err(|e| Error::ConfigError {
            message: e.to_string(),
        })?;

        let inputs = split_input_blocks(text);

        let mut found: BTreeMap<&str, usize> = BTreeMap::new();
        for block in &inputs {
            *found.entry(block.name.as_str()).or_default() += 1;
        }
        for (name, tables) in &document.inputs {
            if found.get(name.as_str()).copied().unwrap_or_default() != tables.len() {
                return Err(Error::ConfigError {
                    message: format!(
                        "inputs.{name} must be written as [[inputs.{name}]] table headers"
                    ),
                });
            }
        }

        let config = Self {
            agent: document.agent,
            inputs,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Default configuration file location.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("exo-agent").join("agent.toml"))
}

fn input_header(line: &str) -> Option<&str> {
    let name = line
        .trim()
        .strip_prefix("[[inputs.")?
        .strip_suffix("]]")?
        .trim();
    let name = name.trim_matches('"');
    (!name.is_empty() && !name.contains('.')).then_some(name)
}

/// Cuts the raw text of every `[[inputs.<name>]]` block out of `text`.
///
/// A block runs from its header to the next table header that is not one
/// of its own subtables (`[inputs.<name>.tags]` stays in the block).
///
/// # Examples
///
/// ```
/// use exo_agent::config::split_input_blocks;
///
/// let text = "[agent]\ninterval_seconds = 5\n\n[[inputs.foo]]\nbar = 1\n";
/// let blocks = split_input_blocks(text);
///
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].name, "foo");
/// assert_eq!(blocks[0].raw, "[[inputs.foo]]\nbar = 1\n");
/// ```
#[must_use]
pub fn split_input_blocks(text: &str) -> Vec<InputBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<InputBlock> = None;

    for line in text.split_inclusive('\n') {
        if let Some(name) = input_header(line) {
            blocks.extend(current.take());
            current = Some(InputBlock {
                name: name.to_string(),
                raw: format!("{}\n", line.trim()),
            });
            continue;
        }

        let trimmed = line.trim_start();
        if let Some(block) = current.as_mut() {
            if trimmed.starts_with('[') && !is_subtable_of(trimmed, &block.name) {
                blocks.extend(current.take());
            } else {
                block.raw.push_str(line);
            }
        }
    }
    blocks.extend(current);

    for block in &mut blocks {
        let kept = block.raw.trim_end().len();
        block.raw.truncate(kept);
        block.raw.push('\n');
    }
    blocks
}

fn is_subtable_of(header: &str, name: &str) -> bool {
    let inner = header.trim_start_matches('[');
    inner
        .strip_prefix("inputs.")
        .and_then(|rest| rest.strip_prefix(name))
        .is_some_and(|rest| rest.starts_with('.'))
}
