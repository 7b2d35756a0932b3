//! Error types for the exo telemetry agent.
//!
//! The hierarchy separates the four failure classes a plugin can produce:
//! launch failures, transport failures, domain failures reported by the
//! plugin itself, and local state-machine violations that never reach the
//! plugin process.
//!
//! # Examples
//!
//! ```
//! use exo_core::{Error, Result};
//!
//! fn require_initialized(initialized: bool) -> Result<()> {
//!     if !initialized {
//!         return Err(Error::InvalidState {
//!             plugin: "cpu".to_string(),
//!             message: "gather called before init".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = require_initialized(false).unwrap_err();
//! assert!(err.is_invalid_state());
//! ```

use thiserror::Error;

/// Main error type for the exo agent.
///
/// All host-facing plugin operations return this type, so the scheduler can
/// tell launch, transport and domain failures apart without inspecting
/// messages.
#[derive(Error, Debug)]
pub enum Error {
    /// External plugin could not be launched.
    ///
    /// Covers spawn failures, checksum mismatches and handshake failures. A
    /// launch error is fatal for the affected plugin instance only.
    #[error("failed to launch external plugin {plugin}")]
    Launch {
        /// Name of the plugin that failed to launch
        plugin: String,
        /// Underlying launch failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// RPC transport failure.
    ///
    /// The connection was lost, a frame could not be (de)serialized or failed
    /// authentication. Always treated as harder than a domain error.
    #[error("transport failure talking to plugin {plugin}: {message}")]
    Transport {
        /// Name of the plugin whose connection failed
        plugin: String,
        /// Description of the transport failure
        message: String,
        /// Underlying error cause
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failure reported by the plugin inside a successful RPC response.
    #[error("plugin {plugin} reported: {message}")]
    Domain {
        /// Name of the plugin that reported the failure
        plugin: String,
        /// Message sent by the plugin
        message: String,
    },

    /// Operation called in the wrong plugin lifecycle state.
    ///
    /// Raised locally, without contacting the plugin process.
    #[error("invalid state for plugin {plugin}: {message}")]
    InvalidState {
        /// Name of the plugin
        plugin: String,
        /// Description of the violated ordering
        message: String,
    },

    /// Security policy violation.
    ///
    /// Raised when a plugin executable fails validation before launch.
    #[error("Security policy violation: {reason}")]
    SecurityViolation {
        /// Description of the security violation
        reason: String,
    },

    /// Resource not found error.
    ///
    /// Occurs when a plugin that was not discovered is requested.
    #[error("Resource not found: {resource}")]
    ResourceNotFound {
        /// Identifier of the missing resource
        resource: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// Invalid argument error.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Returns `true` if this is a launch error.
    ///
    /// # Examples
    ///
    /// ```
    /// use exo_core::Error;
    ///
    /// let err = Error::Launch {
    ///     plugin: "cpu".to_string(),
    ///     source: "no such file".into(),
    /// };
    /// assert!(err.is_launch_error());
    /// ```
    #[must_use]
    pub const fn is_launch_error(&self) -> bool {
        matches!(self, Self::Launch { .. })
    }

    /// Returns `true` if this is a transport error.
    ///
    /// # Examples
    ///
    /// ```
    /// use exo_core::Error;
    ///
    /// let err = Error::Transport {
    ///     plugin: "cpu".to_string(),
    ///     message: "connection closed".to_string(),
    ///     source: None,
    /// };
    /// assert!(err.is_transport_error());
    /// ```
    #[must_use]
    pub const fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Returns `true` if this is a domain error reported by the plugin.
    ///
    /// # Examples
    ///
    /// ```
    /// use exo_core::Error;
    ///
    /// let err = Error::Domain {
    ///     plugin: "cpu".to_string(),
    ///     message: "sensor unavailable".to_string(),
    /// };
    /// assert!(err.is_domain_error());
    /// ```
    #[must_use]
    pub const fn is_domain_error(&self) -> bool {
        matches!(self, Self::Domain { .. })
    }

    /// Returns `true` if this is a local lifecycle violation.
    #[must_use]
    pub const fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    /// Returns `true` if this is a security violation error.
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(self, Self::SecurityViolation { .. })
    }

    /// Returns `true` if this is a resource not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound { .. })
    }

    /// Returns `true` if this is a configuration error.
    ///
    /// # Examples
    ///
    /// ```
    /// use exo_core::Error;
    ///
    /// let err = Error::ConfigError {
    ///     message: "missing plugin_dir".to_string(),
    /// };
    /// assert!(err.is_config_error());
    /// ```
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// Returns the plugin name carried by plugin-scoped errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use exo_core::Error;
    ///
    /// let err = Error::Domain {
    ///     plugin: "disk".to_string(),
    ///     message: "boom".to_string(),
    /// };
    /// assert_eq!(err.plugin(), Some("disk"));
    ///
    /// let err = Error::InvalidArgument("x".to_string());
    /// assert_eq!(err.plugin(), None);
    /// ```
    #[must_use]
    pub fn plugin(&self) -> Option<&str> {
        match self {
            Self::Launch { plugin, .. }
            | Self::Transport { plugin, .. }
            | Self::Domain { plugin, .. }
            | Self::InvalidState { plugin, .. } => Some(plugin),
            _ => None,
        }
    }
}

/// Result type alias for exo operations.
///
/// # Examples
///
/// ```
/// use exo_core::{Result, Error};
///
/// fn validate_interval(seconds: u64) -> Result<u64> {
///     if seconds == 0 {
///         return Err(Error::ConfigError {
///             message: "interval must be positive".to_string(),
///         });
///     }
///     Ok(seconds)
/// }
///
/// assert!(validate_interval(10).is_ok());
/// assert!(validate_interval(0).is_err());
/// ```
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_error_detection() {
        let err = Error::Launch {
            plugin: "cpu".to_string(),
            source: "checksum mismatch".into(),
        };
        assert!(err.is_launch_error());
        assert!(!err.is_transport_error());
        assert!(!err.is_domain_error());
    }

    #[test]
    fn test_transport_error_detection() {
        let err = Error::Transport {
            plugin: "cpu".to_string(),
            message: "broken pipe".to_string(),
            source: None,
        };
        assert!(err.is_transport_error());
        assert!(!err.is_domain_error());
    }

    #[test]
    fn test_domain_error_detection() {
        let err = Error::Domain {
            plugin: "cpu".to_string(),
            message: "no sensor".to_string(),
        };
        assert!(err.is_domain_error());
        assert!(!err.is_launch_error());
    }

    #[test]
    fn test_invalid_state_detection() {
        let err = Error::InvalidState {
            plugin: "cpu".to_string(),
            message: "gather before init".to_string(),
        };
        assert!(err.is_invalid_state());
        assert_eq!(err.plugin(), Some("cpu"));
    }

    #[test]
    fn test_error_display_includes_plugin_and_cause() {
        let err = Error::Domain {
            plugin: "mock".to_string(),
            message: "sensor offline".to_string(),
        };
        let display = format!("{err}");
        assert!(display.contains("mock"));
        assert!(display.contains("sensor offline"));
    }

    #[test]
    fn test_launch_error_exposes_source() {
        use std::error::Error as _;

        let err = Error::Launch {
            plugin: "mock".to_string(),
            source: "handshake timed out".into(),
        };
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("handshake timed out"));
    }
}
