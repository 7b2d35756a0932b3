//! Handshake constant shared by the host launcher and the plugin server.

use serde::{Deserialize, Serialize};

/// Environment variable name of the magic cookie used by official plugins.
pub const STANDARD_COOKIE_KEY: &str = "EXO_PLUGIN";

/// Magic cookie value used by official plugins.
pub const STANDARD_COOKIE_VALUE: &str = "3b0f8a52-6c1e-4d7a-9a43-2f5e0c7b91d4";

/// Protocol version spoken by this release.
pub const PROTOCOL_VERSION: u32 = 1;

/// Agreement between a host and the plugins it launches.
///
/// Both sides must hold an identical value. The host exports the cookie to
/// the child environment, the child refuses to serve without it and echoes
/// all three values back during the handshake.
///
/// The value is passed explicitly to the launcher and to the plugin server;
/// there is no process-wide instance.
///
/// # Examples
///
/// ```
/// use exo_core::HandshakeConfig;
///
/// let host = HandshakeConfig::standard();
/// let plugin = HandshakeConfig::standard();
/// assert_eq!(host, plugin);
/// assert_eq!(host.protocol_version, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandshakeConfig {
    /// Protocol version; mismatch aborts the launch
    pub protocol_version: u32,
    /// Environment variable name carrying the cookie
    pub cookie_key: String,
    /// Expected cookie value
    pub cookie_value: String,
}

impl HandshakeConfig {
    /// Creates a handshake agreement with custom values.
    #[must_use]
    pub fn new(
        protocol_version: u32,
        cookie_key: impl Into<String>,
        cookie_value: impl Into<String>,
    ) -> Self {
        Self {
            protocol_version,
            cookie_key: cookie_key.into(),
            cookie_value: cookie_value.into(),
        }
    }

    /// The agreement used by the agent and its bundled plugins.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(PROTOCOL_VERSION, STANDARD_COOKIE_KEY, STANDARD_COOKIE_VALUE)
    }

    /// Returns `true` if the given values describe the same protocol.
    #[must_use]
    pub fn matches(&self, version: u32, cookie_key: &str, cookie_value: &str) -> bool {
        self.protocol_version == version
            && self.cookie_key == cookie_key
            && self.cookie_value == cookie_value
    }
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_matches_itself() {
        let hs = HandshakeConfig::standard();
        assert!(hs.matches(1, STANDARD_COOKIE_KEY, STANDARD_COOKIE_VALUE));
    }

    #[test]
    fn test_version_mismatch() {
        let hs = HandshakeConfig::standard();
        assert!(!hs.matches(2, STANDARD_COOKIE_KEY, STANDARD_COOKIE_VALUE));
    }

    #[test]
    fn test_cookie_mismatch() {
        let hs = HandshakeConfig::new(1, "K", "v1");
        assert!(!hs.matches(1, "K", "v2"));
        assert!(!hs.matches(1, "J", "v1"));
    }
}
