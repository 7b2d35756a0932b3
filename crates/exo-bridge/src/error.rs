//! Launch error types.

use exo_protocol::ProtocolError;
use std::path::PathBuf;
use std::time::Duration;

/// Result type for launch operations.
pub type Result<T> = std::result::Result<T, LaunchError>;

/// Reasons a plugin subprocess could not be brought up.
///
/// Whatever the variant, no subprocess is left running once the error is
/// returned.
#[derive(thiserror::Error, Debug)]
pub enum LaunchError {
    /// The plugin file failed validation before launch.
    #[error("plugin executable rejected")]
    Executable(#[source] exo_core::Error),

    /// The expected checksum is not a hex SHA-256 digest.
    #[error("decoding checksum failed: {checksum:?} is not a hex SHA-256 digest")]
    InvalidChecksum {
        /// Checksum as supplied
        checksum: String,
    },

    /// The executable could not be read for hashing.
    #[error("cannot hash {}: {source}", path.display())]
    Digest {
        /// Executable path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The executable's digest differs from the expected checksum.
    #[error("checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        /// Executable path
        path: PathBuf,
        /// Expected hex digest
        expected: String,
        /// Actual hex digest
        actual: String,
    },

    /// The process could not be started.
    #[error("failed to start {}: {source}", path.display())]
    Spawn {
        /// Executable path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The handshake did not finish within the start timeout.
    #[error("plugin did not complete the handshake within {timeout:?}")]
    Timeout {
        /// Configured start timeout
        timeout: Duration,
    },

    /// The process answered with an incompatible version or cookie.
    #[error("incompatible plugin: {0}")]
    HandshakeMismatch(#[source] ProtocolError),

    /// The process did not speak the handshake protocol.
    #[error("handshake failed: {0}")]
    Handshake(#[source] ProtocolError),
}

impl LaunchError {
    /// Returns `true` if the executable's integrity check failed.
    #[must_use]
    pub const fn is_checksum_error(&self) -> bool {
        matches!(
            self,
            Self::ChecksumMismatch { .. } | Self::InvalidChecksum { .. } | Self::Digest { .. }
        )
    }

    /// Returns `true` if the process started but the handshake failed.
    #[must_use]
    pub const fn is_handshake_error(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::HandshakeMismatch(_) | Self::Handshake(_)
        )
    }

    /// Returns `true` if a process was never spawned.
    ///
    /// # Examples
    ///
    /// ```
    /// use exo_bridge::LaunchError;
    ///
    /// let err = LaunchError::InvalidChecksum { checksum: "xyz".into() };
    /// assert!(err.is_pre_spawn());
    /// ```
    #[must_use]
    pub const fn is_pre_spawn(&self) -> bool {
        matches!(
            self,
            Self::Executable(_)
                | Self::InvalidChecksum { .. }
                | Self::Digest { .. }
                | Self::ChecksumMismatch { .. }
                | Self::Spawn { .. }
        )
    }
}
