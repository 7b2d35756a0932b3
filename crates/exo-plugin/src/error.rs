//! Errors raised by plugin implementations and by the serving loop.

use exo_protocol::ProtocolError;
use thiserror::Error;

/// Failure reported by a plugin operation.
///
/// Sent to the host as a domain error; the connection stays up.
#[derive(Error, Debug)]
pub enum PluginError {
    /// Configuration could not be parsed or was rejected.
    #[error("invalid configuration: {message}")]
    Config {
        /// What was wrong with the configuration
        message: String,
    },

    /// Operation called out of order.
    #[error("{operation} called {reason}")]
    OutOfOrder {
        /// Operation that was called
        operation: &'static str,
        /// Ordering that was violated
        reason: &'static str,
    },

    /// Any other plugin failure.
    #[error("{0}")]
    Failed(String),
}

impl PluginError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a generic failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use exo_plugin::PluginError;
    ///
    /// let err = PluginError::failed("sensor offline");
    /// assert_eq!(err.to_string(), "sensor offline");
    /// ```
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Returns `true` for configuration errors.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

impl From<toml::de::Error> for PluginError {
    fn from(error: toml::de::Error) -> Self {
        Self::config(error.message())
    }
}

/// Reasons [`serve`](crate::serve) stopped before the host hung up.
#[derive(Error, Debug)]
pub enum ServeError {
    /// The process was not started by an exo host.
    #[error("the {key} environment variable is missing or does not match")]
    NotLaunchedByHost {
        /// Cookie environment variable that was checked
        key: String,
    },

    /// Handshake or transport failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ServeError {
    /// Returns `true` if the magic cookie check failed.
    #[must_use]
    pub const fn is_not_launched_by_host(&self) -> bool {
        matches!(self, Self::NotLaunchedByHost { .. })
    }
}
