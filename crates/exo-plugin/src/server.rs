//! Server-side adapter from [`ExternalInput`] to the RPC surface.

use crate::error::PluginError;
use crate::input::ExternalInput;
use async_trait::async_trait;
use exo_core::Metric;
use exo_protocol::{InputService, RpcError};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unconfigured,
    Configured,
    Initialized,
}

/// Serves one [`ExternalInput`] and enforces the call order.
///
/// Out-of-order calls are answered with domain errors and never reach the
/// plugin.
#[derive(Debug)]
pub struct InputServer<P> {
    plugin: P,
    phase: Phase,
}

impl<P: ExternalInput> InputServer<P> {
    /// Wraps a plugin in its initial, unconfigured state.
    #[must_use]
    pub const fn new(plugin: P) -> Self {
        Self {
            plugin,
            phase: Phase::Unconfigured,
        }
    }

    /// The wrapped plugin.
    #[must_use]
    pub const fn plugin(&self) -> &P {
        &self.plugin
    }

    /// Consumes the server, returning the plugin.
    pub fn into_inner(self) -> P {
        self.plugin
    }

    /// Strips the header line and applies the rest of `raw`.
    ///
    /// A block without a line break carries no settings and is accepted
    /// as is.
    fn apply(&mut self, raw: &str) -> Result<(), PluginError> {
        let Some((header, body)) = raw.split_once('\n') else {
            debug!("configuration has no body, keeping defaults");
            return Ok(());
        };
        debug!(header, "applying configuration");

        let config: P::Config = toml::from_str(body)?;
        self.plugin.apply_config(config)
    }
}

fn domain(error: PluginError) -> RpcError {
    RpcError::Domain(error.to_string())
}

#[async_trait]
impl<P: ExternalInput> InputService for InputServer<P> {
    async fn description(&mut self) -> Result<String, RpcError> {
        Ok(self.plugin.description())
    }

    async fn sample_config(&mut self) -> Result<String, RpcError> {
        Ok(self.plugin.sample_config())
    }

    async fn configure(&mut self, config: &str) -> Result<(), RpcError> {
        if self.phase != Phase::Unconfigured {
            return Err(domain(PluginError::OutOfOrder {
                operation: "configure",
                reason: "more than once",
            }));
        }
        self.apply(config).map_err(domain)?;
        self.phase = Phase::Configured;
        Ok(())
    }

    async fn init(&mut self) -> Result<(), RpcError> {
        match self.phase {
            Phase::Unconfigured => {
                return Err(domain(PluginError::OutOfOrder {
                    operation: "init",
                    reason: "before configure",
                }));
            }
            Phase::Initialized => {
                return Err(domain(PluginError::OutOfOrder {
                    operation: "init",
                    reason: "more than once",
                }));
            }
            Phase::Configured => {}
        }
        self.plugin.init().await.map_err(domain)?;
        self.phase = Phase::Initialized;
        Ok(())
    }

    async fn gather(&mut self) -> Result<Vec<Metric>, RpcError> {
        if self.phase != Phase::Initialized {
            return Err(domain(PluginError::OutOfOrder {
                operation: "gather",
                reason: "before init",
            }));
        }
        self.plugin.gather().await.map_err(domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Config {
        bar: i64,
    }

    #[derive(Debug, Default)]
    struct Recorder {
        bar: Option<i64>,
        inits: usize,
    }

    #[async_trait]
    impl ExternalInput for Recorder {
        type Config = Config;

        fn description(&self) -> String {
            "records".into()
        }

        fn sample_config(&self) -> String {
            "bar = 1\n".into()
        }

        fn apply_config(&mut self, config: Config) -> Result<(), PluginError> {
            self.bar = Some(config.bar);
            Ok(())
        }

        async fn init(&mut self) -> Result<(), PluginError> {
            self.inits += 1;
            Ok(())
        }

        async fn gather(&mut self) -> Result<Vec<Metric>, PluginError> {
            Ok(vec![
                Metric::builder("recorder")
                    .field("bar", self.bar.unwrap_or_default())
                    .build(),
            ])
        }
    }

    #[tokio::test]
    async fn test_header_line_is_discarded() {
        let mut server = InputServer::new(Recorder::default());
        server.configure("[[inputs.foo]]\nbar = 1\n").await.unwrap();
        assert_eq!(server.plugin().bar, Some(1));
    }

    #[tokio::test]
    async fn test_header_only_keeps_defaults() {
        let mut server = InputServer::new(Recorder::default());
        server.configure("[[inputs.foo]]").await.unwrap();
        assert_eq!(server.plugin().bar, None);
        server.init().await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_body_is_domain_error() {
        let mut server = InputServer::new(Recorder::default());
        let err = server
            .configure("[[inputs.foo]]\nbar = \"one\"\n")
            .await
            .unwrap_err();
        assert!(err.is_domain());

        // still unconfigured, so a corrected block is accepted
        server.configure("[[inputs.foo]]\nbar = 2\n").await.unwrap();
        assert_eq!(server.plugin().bar, Some(2));
    }

    #[tokio::test]
    async fn test_unknown_key_is_rejected() {
        let mut server = InputServer::new(Recorder::default());
        let err = server
            .configure("[[inputs.foo]]\nbaz = 1\n")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("baz"));
    }

    #[tokio::test]
    async fn test_init_before_configure() {
        let mut server = InputServer::new(Recorder::default());
        let err = server.init().await.unwrap_err();
        assert_eq!(err.to_string(), "init called before configure");
        assert_eq!(server.plugin().inits, 0);
    }

    #[tokio::test]
    async fn test_gather_before_init() {
        let mut server = InputServer::new(Recorder::default());
        server.configure("[[inputs.foo]]\nbar = 1\n").await.unwrap();
        let err = server.gather().await.unwrap_err();
        assert_eq!(err.to_string(), "gather called before init");
    }

    #[tokio::test]
    async fn test_full_sequence() {
        let mut server = InputServer::new(Recorder::default());
        server.configure("[[inputs.foo]]\nbar = 7\n").await.unwrap();
        server.init().await.unwrap();
        assert!(server.init().await.is_err());

        let metrics = server.gather().await.unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].field("bar"), Some(&exo_core::FieldValue::Int(7)));
        assert_eq!(server.into_inner().inits, 1);
    }
}
