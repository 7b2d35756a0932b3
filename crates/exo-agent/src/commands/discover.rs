//! Discover command implementation.
//!
//! Lists every plugin executable under the plugin directory and checks it
//! against its category's checksum manifest.

use anyhow::{Context, Result};
use exo_core::Category;
use exo_core::cli::{ExitCode, OutputFormat};
use exo_discovery::checksum::{constant_time_eq, decode_digest, digest_file};
use exo_discovery::{Registration, discover};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::AgentConfig;

/// Outcome of checking an executable against the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumStatus {
    /// The digest matches the manifest entry
    Verified,
    /// The digest differs from the manifest entry
    Mismatch,
    /// The manifest has no entry for this executable
    Unlisted,
    /// The manifest entry is not a SHA-256 hex digest
    Invalid,
    /// The executable could not be read
    Unreadable,
}

/// One discovered plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginEntry {
    /// Plugin category
    pub category: Category,
    /// Executable name
    pub name: String,
    /// Full path
    pub path: PathBuf,
    /// Expected digest from the manifest
    pub checksum: Option<String>,
    /// Verification result
    pub status: ChecksumStatus,
}

/// Result of the discover command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoverReport {
    /// Plugin directory that was scanned
    pub root: PathBuf,
    /// Plugins in category, then name order
    pub plugins: Vec<PluginEntry>,
}

/// Checks every discovered executable against its manifest entry.
#[must_use]
pub fn build_report(registration: &Registration) -> DiscoverReport {
    let mut plugins = Vec::new();
    for (category, found) in registration.iter() {
        for name in &found.executables {
            let path = registration.plugin_path(category, name);
            let checksum = found.manifest.get(name).map(str::to_string);
            let status = checksum
                .as_deref()
                .map_or(ChecksumStatus::Unlisted, |expected| verify(&path, expected));
            plugins.push(PluginEntry {
                category,
                name: name.clone(),
                path,
                checksum,
                status,
            });
        }
    }

    DiscoverReport {
        root: registration.root().to_path_buf(),
        plugins,
    }
}

fn verify(path: &std::path::Path, expected: &str) -> ChecksumStatus {
    let Some(expected) = decode_digest(expected) else {
        return ChecksumStatus::Invalid;
    };
    match digest_file(path) {
        Ok(actual) if constant_time_eq(&actual, &expected) => ChecksumStatus::Verified,
        Ok(_) => ChecksumStatus::Mismatch,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot hash plugin");
            ChecksumStatus::Unreadable
        }
    }
}

/// Runs the discover command.
///
/// # Errors
///
/// Returns an error if the plugin directory cannot be scanned or a manifest
/// is malformed.
pub async fn run(config: &AgentConfig, output_format: OutputFormat) -> Result<ExitCode> {
    let root = &config.agent.plugin_dir;
    let registration = discover(root)
        .with_context(|| format!("discovering plugins under {}", root.display()))?;
    info!(root = %root.display(), plugins = registration.len(), "discovery finished");

    let report = build_report(&registration);
    let formatted = crate::formatters::format_output(&report, output_format)?;
    println!("{formatted}");

    Ok(ExitCode::SUCCESS)
}
