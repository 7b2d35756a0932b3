//! Verified launch of plugin subprocesses.
//!
//! Bring-up order:
//!
//! 1. Validate the executable path
//! 2. If a checksum is configured, hash the executable with SHA-256 and
//!    refuse to spawn on mismatch
//! 3. Spawn with piped stdio and the magic cookie in the environment
//! 4. Relay stderr into the host log
//! 5. Run the handshake under the start timeout
//!
//! A failure at any step after spawning kills and reaps the child before the
//! error is returned.

use crate::client::{InputClient, PluginClient, PluginProcess};
use crate::error::{LaunchError, Result};
use crate::relay::spawn_stderr_relay;
use exo_core::{HandshakeConfig, validate_executable};
use exo_discovery::checksum::{constant_time_eq, decode_digest, digest_file};
use exo_protocol::{Transport, host_handshake};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Settings shared by every launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Handshake agreement expected from plugins
    pub handshake: HandshakeConfig,
    /// Upper bound on spawn plus handshake
    pub start_timeout: Duration,
}

impl LaunchConfig {
    /// Default start timeout.
    pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(1);

    /// Creates settings with the default start timeout.
    #[must_use]
    pub const fn new(handshake: HandshakeConfig) -> Self {
        Self {
            handshake,
            start_timeout: Self::DEFAULT_START_TIMEOUT,
        }
    }

    /// Overrides the start timeout.
    #[must_use]
    pub const fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self::new(HandshakeConfig::standard())
    }
}

/// Launches one plugin executable.
///
/// # Examples
///
/// ```no_run
/// use exo_bridge::{LaunchConfig, PluginLauncher};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let launcher = PluginLauncher::new(
///     "mock",
///     "/usr/lib/exo/plugins/inputs/mock",
///     LaunchConfig::default(),
/// )
/// .with_checksum("9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08");
///
/// let mut client = launcher.launch().await?;
/// let description = client.service().description().await?;
/// println!("{description}");
/// client.kill().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PluginLauncher {
    name: String,
    path: PathBuf,
    checksum: Option<String>,
    config: LaunchConfig,
}

impl PluginLauncher {
    /// Creates a launcher for the executable at `path`.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, config: LaunchConfig) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            checksum: None,
            config,
        }
    }

    /// Requires the executable to match a hex SHA-256 digest.
    #[must_use]
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }

    /// Plugin name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Executable path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Expected digest, if verification is enabled.
    #[must_use]
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    /// Starts the plugin and completes the handshake.
    ///
    /// # Errors
    ///
    /// Returns a [`LaunchError`] describing the first failed step. Checksum
    /// failures are detected before anything is spawned.
    pub async fn launch(&self) -> Result<PluginClient> {
        validate_executable(&self.path).map_err(LaunchError::Executable)?;

        if let Some(expected) = &self.checksum {
            self.verify_checksum(expected).await?;
        }

        let mut child = Command::new(&self.path)
            .env(
                &self.config.handshake.cookie_key,
                &self.config.handshake.cookie_value,
            )
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                path: self.path.clone(),
                source,
            })?;

        debug!(plugin = %self.name, pid = ?child.id(), "plugin process spawned");

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            reap(&self.name, &mut child).await;
            return Err(LaunchError::Spawn {
                path: self.path.clone(),
                source: std::io::Error::other("child stdio was not captured"),
            });
        };

        let relay = spawn_stderr_relay(self.name.clone(), stderr);

        let handshake = tokio::time::timeout(
            self.config.start_timeout,
            host_handshake(Transport::new(stdout, stdin), &self.config.handshake),
        )
        .await;

        let channel = match handshake {
            Ok(Ok(channel)) => channel,
            Ok(Err(e)) => {
                reap(&self.name, &mut child).await;
                return Err(if e.is_handshake_mismatch() {
                    LaunchError::HandshakeMismatch(e)
                } else {
                    LaunchError::Handshake(e)
                });
            }
            Err(_) => {
                reap(&self.name, &mut child).await;
                return Err(LaunchError::Timeout {
                    timeout: self.config.start_timeout,
                });
            }
        };

        info!(plugin = %self.name, pid = ?child.id(), "external plugin started");

        Ok(PluginClient::launched(
            self.name.clone(),
            Box::new(InputClient::new(channel)),
            PluginProcess { child, relay },
        ))
    }

    async fn verify_checksum(&self, expected: &str) -> Result<()> {
        let expected_digest = decode_digest(expected).ok_or_else(|| LaunchError::InvalidChecksum {
            checksum: expected.to_string(),
        })?;

        let path = self.path.clone();
        let digest = tokio::task::spawn_blocking(move || digest_file(&path))
            .await
            .map_err(|e| LaunchError::Digest {
                path: self.path.clone(),
                source: std::io::Error::other(e),
            })?
            .map_err(|source| LaunchError::Digest {
                path: self.path.clone(),
                source,
            })?;

        if !constant_time_eq(&digest, &expected_digest) {
            return Err(LaunchError::ChecksumMismatch {
                path: self.path.clone(),
                expected: expected.to_ascii_lowercase(),
                actual: hex::encode(digest),
            });
        }

        debug!(plugin = %self.name, "checksum verified");
        Ok(())
    }
}

async fn reap(name: &str, child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!(plugin = %name, error = %e, "failed to kill plugin after failed launch");
    }
}
