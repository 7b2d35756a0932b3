//! The trait plugin authors implement.

use crate::error::PluginError;
use async_trait::async_trait;
use exo_core::Metric;
use serde::de::DeserializeOwned;

/// An input plugin running in its own process.
///
/// The host drives the plugin through a fixed sequence: one
/// [`apply_config`](Self::apply_config), one [`init`](Self::init), then any
/// number of [`gather`](Self::gather) calls. The server enforces that order,
/// so implementations can rely on it.
///
/// Plugins must not write to stdout, which carries the RPC stream. Anything
/// written to stderr (including `tracing` output set up with
/// [`init_logging`](crate::init_logging)) ends up in the host log.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use exo_core::Metric;
/// use exo_plugin::{ExternalInput, PluginError};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// #[serde(deny_unknown_fields)]
/// struct Config {
///     greeting: String,
/// }
///
/// #[derive(Default)]
/// struct Hello {
///     greeting: String,
/// }
///
/// #[async_trait]
/// impl ExternalInput for Hello {
///     type Config = Config;
///
///     fn description(&self) -> String {
///         "Says hello".to_string()
///     }
///
///     fn sample_config(&self) -> String {
///         "greeting = \"hi\"\n".to_string()
///     }
///
///     fn apply_config(&mut self, config: Config) -> Result<(), PluginError> {
///         self.greeting = config.greeting;
///         Ok(())
///     }
///
///     async fn gather(&mut self) -> Result<Vec<Metric>, PluginError> {
///         Ok(vec![Metric::builder("hello").field("text", self.greeting.as_str()).build()])
///     }
/// }
/// ```
#[async_trait]
pub trait ExternalInput: Send {
    /// Configuration table the plugin accepts, without its header line.
    type Config: DeserializeOwned + Send;

    /// Short description of what the plugin collects.
    fn description(&self) -> String;

    /// Example configuration body.
    fn sample_config(&self) -> String;

    /// Applies a parsed configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the values are unacceptable.
    fn apply_config(&mut self, config: Self::Config) -> Result<(), PluginError>;

    /// One-time setup after configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin cannot start collecting.
    async fn init(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Collects one batch of metrics.
    ///
    /// # Errors
    ///
    /// Returns an error if collection failed. Metrics are not sent alongside
    /// an error.
    async fn gather(&mut self) -> Result<Vec<Metric>, PluginError>;
}
