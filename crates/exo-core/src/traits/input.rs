//! Input plugin lifecycle trait.

use crate::{Accumulator, Result};
use async_trait::async_trait;

/// An input plugin as seen by the scheduler.
///
/// The lifecycle is `init` once, then any number of `gather` calls, then
/// `stop`. `description` and `sample_config` may be called at any time.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use exo_core::{Accumulator, Input, Metric, Result};
///
/// struct Constant;
///
/// #[async_trait]
/// impl Input for Constant {
///     async fn description(&self) -> Result<String> {
///         Ok("emits a constant".to_string())
///     }
///
///     async fn sample_config(&self) -> Result<String> {
///         Ok(String::new())
///     }
///
///     async fn init(&self) -> Result<()> {
///         Ok(())
///     }
///
///     async fn gather(&self, acc: &mut dyn Accumulator) -> Result<()> {
///         acc.add_metric(Metric::builder("constant").field("value", 1_i64).build());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Input: Send + Sync {
    /// One-line human readable description.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin cannot be reached.
    async fn description(&self) -> Result<String>;

    /// Example configuration block, TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin cannot be reached.
    async fn sample_config(&self) -> Result<String>;

    /// Prepares the plugin for gathering.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or initialization fails, or if the
    /// plugin was already initialized.
    async fn init(&self) -> Result<()>;

    /// Collects one batch of metrics into `acc`.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin is not initialized or fails to gather.
    async fn gather(&self, acc: &mut dyn Accumulator) -> Result<()>;

    /// Releases resources held by the plugin.
    async fn stop(&self) {}
}
