//! Host side of the external plugin bridge.
//!
//! Turns a discovered plugin executable into an ordinary [`exo_core::Input`]:
//!
//! - [`PluginLauncher`] verifies the executable, spawns it and runs the
//!   handshake
//! - [`InputClient`] is the RPC stub over the authenticated channel
//! - [`InputWrapper`] owns one subprocess and enforces the
//!   configure, init, gather ordering
//! - [`ExternalRegistry`] maps discovered input names to launchers
//!
//! # Examples
//!
//! ```no_run
//! use exo_bridge::{ExternalRegistry, LaunchConfig};
//! use exo_core::{Input, Metric};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registration = exo_discovery::discover(Path::new("/usr/lib/exo/plugins"))?;
//! let registry = ExternalRegistry::from_registration(&registration, LaunchConfig::default());
//!
//! let input = registry.create("mock", "[[inputs.mock]]\nvalue = 3\n")?;
//! input.init().await?;
//!
//! let mut metrics: Vec<Metric> = Vec::new();
//! input.gather(&mut metrics).await?;
//! input.stop().await;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod client;
mod error;
mod launcher;
mod registry;
pub mod relay;
mod wrapper;

pub use client::{InputClient, PluginClient};
pub use error::{LaunchError, Result};
pub use launcher::{LaunchConfig, PluginLauncher};
pub use registry::ExternalRegistry;
pub use wrapper::{InputWrapper, WrapperStats};
