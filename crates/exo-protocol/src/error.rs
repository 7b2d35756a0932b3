//! Protocol-level error types.

use thiserror::Error;

/// Errors raised by framing, authentication, handshake and codec layers.
///
/// Every variant is a transport-class failure: none of them carries a
/// plugin-reported domain error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Underlying pipe I/O failed, or a frame exceeded the size limit.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Peer closed its end of the connection.
    #[error("connection closed by peer")]
    Closed,

    /// Message could not be encoded or decoded.
    #[error("malformed message: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A frame failed MAC verification.
    ///
    /// Raised for forged, replayed, reordered and reflected frames alike.
    #[error("frame {seq} failed authentication")]
    Authentication {
        /// Sequence number the receiver expected
        seq: u64,
    },

    /// A frame was too short to hold a MAC.
    #[error("truncated frame of {len} bytes")]
    TruncatedFrame {
        /// Received frame length
        len: usize,
    },

    /// Peer speaks a different protocol version.
    #[error("protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version this side speaks
        expected: u32,
        /// Version announced by the peer
        actual: u32,
    },

    /// Peer echoed a wrong magic cookie.
    #[error("magic cookie mismatch for key {key}")]
    CookieMismatch {
        /// Cookie key announced by the peer
        key: String,
    },

    /// Peer could not prove possession of the session key.
    #[error("session key proof rejected")]
    BadProof,

    /// Session key material was not 32 hex-encoded bytes.
    #[error("invalid session key: {reason}")]
    InvalidKey {
        /// Description of the problem
        reason: String,
    },

    /// Metric timestamp cannot be represented as `i64` nanoseconds.
    #[error("timestamp of metric {name} is out of range")]
    TimestampOutOfRange {
        /// Metric name
        name: String,
    },
}

impl ProtocolError {
    /// Returns `true` if the peer closed the connection.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns `true` if the failure happened during the handshake.
    ///
    /// # Examples
    ///
    /// ```
    /// use exo_protocol::ProtocolError;
    ///
    /// let err = ProtocolError::VersionMismatch { expected: 1, actual: 2 };
    /// assert!(err.is_handshake_mismatch());
    /// assert!(!ProtocolError::Closed.is_handshake_mismatch());
    /// ```
    #[must_use]
    pub const fn is_handshake_mismatch(&self) -> bool {
        matches!(
            self,
            Self::VersionMismatch { .. } | Self::CookieMismatch { .. } | Self::BadProof
        )
    }
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
