//! The RPC surface shared by the host-side stub and the plugin-side server.

use crate::error::ProtocolError;
use async_trait::async_trait;
use exo_core::Metric;
use thiserror::Error;

/// Failure of a single RPC.
///
/// `Domain` means the call completed and the plugin reported a failure;
/// `Transport` means the call itself did not complete.
#[derive(Error, Debug)]
pub enum RpcError {
    /// Plugin-reported failure carried in the response.
    #[error("{0}")]
    Domain(String),

    /// Connection, framing or serialization failure.
    #[error("RPC call failed: {message}")]
    Transport {
        /// Description of the failure
        message: String,
        /// Underlying protocol error, if any
        #[source]
        source: Option<ProtocolError>,
    },
}

impl RpcError {
    /// Creates a transport error without an underlying cause.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` if the plugin reported this failure.
    #[must_use]
    pub const fn is_domain(&self) -> bool {
        matches!(self, Self::Domain(_))
    }

    /// Returns `true` if the call did not complete.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<ProtocolError> for RpcError {
    fn from(error: ProtocolError) -> Self {
        Self::Transport {
            message: error.to_string(),
            source: Some(error),
        }
    }
}

/// The five input operations.
///
/// Every operation returns either its value or an [`RpcError`] telling a
/// plugin-reported failure apart from a broken call.
#[async_trait]
pub trait InputService: Send {
    /// Static description text.
    async fn description(&mut self) -> Result<String, RpcError>;

    /// Static example configuration.
    async fn sample_config(&mut self) -> Result<String, RpcError>;

    /// Applies a raw configuration block whose first line is a table header.
    async fn configure(&mut self, config: &str) -> Result<(), RpcError>;

    /// One-time setup, after exactly one `configure`.
    async fn init(&mut self) -> Result<(), RpcError>;

    /// One collection cycle.
    async fn gather(&mut self) -> Result<Vec<Metric>, RpcError>;
}
