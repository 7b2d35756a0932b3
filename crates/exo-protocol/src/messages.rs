//! Request, response and handshake messages.

use crate::wire::{WireError, WireMetric};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Service name of input plugins.
///
/// Requests name their service so other plugin categories can share the
/// transport later.
pub const SERVICE_INPUT: &str = "input";

/// A request addressed to a named service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Target service
    pub service: String,
    /// Operation to run
    pub request: Request,
}

impl Envelope {
    /// Wraps a request for the input service.
    #[must_use]
    pub fn input(request: Request) -> Self {
        Self {
            service: SERVICE_INPUT.to_string(),
            request,
        }
    }
}

/// The five input operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Static description text
    Description,
    /// Static example configuration
    SampleConfig,
    /// Apply a raw configuration block, header line included
    Configure {
        /// Raw configuration text
        config: String,
    },
    /// One-time setup after configuration
    Init,
    /// One collection cycle
    Gather,
}

impl Request {
    /// Operation name, used in logs and mismatch errors.
    #[must_use]
    pub const fn op(&self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::SampleConfig => "sample_config",
            Self::Configure { .. } => "configure",
            Self::Init => "init",
            Self::Gather => "gather",
        }
    }
}

/// Response to a [`Request`].
///
/// `Fault` is a transport-level rejection (unknown service, request the
/// server could not dispatch); plugin failures travel in the `error` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Response {
    /// Answer to `Description`
    Description {
        /// Description text
        description: String,
    },
    /// Answer to `SampleConfig`
    SampleConfig {
        /// Example configuration
        config: String,
    },
    /// Answer to `Configure`
    Configure {
        /// Domain error channel
        #[serde(default)]
        error: WireError,
    },
    /// Answer to `Init`
    Init {
        /// Domain error channel
        #[serde(default)]
        error: WireError,
    },
    /// Answer to `Gather`
    Gather {
        /// Collected metrics in order
        #[serde(default)]
        metrics: Vec<WireMetric>,
        /// Domain error channel
        #[serde(default)]
        error: WireError,
    },
    /// Request rejected before reaching the plugin
    Fault {
        /// Reason for the rejection
        message: String,
    },
}

impl Response {
    /// Operation name, matching [`Request::op`] for regular answers.
    #[must_use]
    pub const fn op(&self) -> &'static str {
        match self {
            Self::Description { .. } => "description",
            Self::SampleConfig { .. } => "sample_config",
            Self::Configure { .. } => "configure",
            Self::Init { .. } => "init",
            Self::Gather { .. } => "gather",
            Self::Fault { .. } => "fault",
        }
    }
}

/// First frame, sent by the host over the child's stdin.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostHello {
    /// Protocol version spoken by the host
    pub protocol_version: u32,
    /// Hex-encoded 32-byte session key
    pub session_key: String,
}

impl fmt::Debug for HostHello {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostHello")
            .field("protocol_version", &self.protocol_version)
            .field("session_key", &"[REDACTED]")
            .finish()
    }
}

/// Handshake reply written by the plugin on stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginHello {
    /// Protocol version spoken by the plugin
    pub protocol_version: u32,
    /// Cookie key the plugin was built for
    pub cookie_key: String,
    /// Cookie value the plugin was built for
    pub cookie_value: String,
    /// Hex-encoded keyed hash proving possession of the session key
    pub proof: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_tagging() {
        let json = serde_json::to_value(Envelope::input(Request::Configure {
            config: "[[inputs.foo]]\nbar = 1\n".into(),
        }))
        .unwrap();
        assert_eq!(json["service"], "input");
        assert_eq!(json["request"]["op"], "configure");
        assert_eq!(json["request"]["config"], "[[inputs.foo]]\nbar = 1\n");
    }

    #[test]
    fn test_unit_request_parses() {
        let req: Request = serde_json::from_str(r#"{"op":"gather"}"#).unwrap();
        assert_eq!(req, Request::Gather);
        assert_eq!(req.op(), "gather");
    }

    #[test]
    fn test_response_error_defaults_to_success() {
        let resp: Response = serde_json::from_str(r#"{"op":"init"}"#).unwrap();
        assert_eq!(
            resp,
            Response::Init {
                error: WireError::ok()
            }
        );
    }

    #[test]
    fn test_host_hello_debug_redacts_key() {
        let hello = HostHello {
            protocol_version: 1,
            session_key: "00ff".repeat(16),
        };
        let debug = format!("{hello:?}");
        assert!(!debug.contains("00ff"));
        assert!(debug.contains("REDACTED"));
    }
}
