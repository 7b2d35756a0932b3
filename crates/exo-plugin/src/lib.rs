//! SDK for external input plugins of the exo telemetry agent.
//!
//! A plugin is an ordinary executable placed in the agent's
//! `<plugin_dir>/inputs/` directory. It implements [`ExternalInput`] and
//! hands itself to [`run`], which performs the handshake over stdin and
//! stdout and then answers the host's requests until the host hangs up.
//!
//! # Examples
//!
//! ```no_run
//! use async_trait::async_trait;
//! use exo_core::{HandshakeConfig, Metric};
//! use exo_plugin::{ExternalInput, PluginError};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Config {
//!     level: f64,
//! }
//!
//! #[derive(Default)]
//! struct Tank {
//!     level: f64,
//! }
//!
//! #[async_trait]
//! impl ExternalInput for Tank {
//!     type Config = Config;
//!
//!     fn description(&self) -> String {
//!         "Reports a fixed tank level".to_string()
//!     }
//!
//!     fn sample_config(&self) -> String {
//!         "level = 0.5\n".to_string()
//!     }
//!
//!     fn apply_config(&mut self, config: Config) -> Result<(), PluginError> {
//!         self.level = config.level;
//!         Ok(())
//!     }
//!
//!     async fn gather(&mut self) -> Result<Vec<Metric>, PluginError> {
//!         Ok(vec![Metric::builder("tank").field("level", self.level).build()])
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::process::ExitCode {
//!     exo_plugin::init_logging();
//!     exo_plugin::run(Tank::default(), &HandshakeConfig::standard()).await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod error;
mod input;
mod logging;
mod serve;
mod server;

pub use error::{PluginError, ServeError};
pub use input::ExternalInput;
pub use logging::init_logging;
pub use serve::{check_cookie, run, serve, serve_io};
pub use server::InputServer;
