//! Plugin discovery for the exo telemetry agent.
//!
//! Scans a plugin root for executables in the `inputs`, `outputs`,
//! `processors` and `aggregators` subfolders and reads the optional
//! `checksums` manifest of each folder.
//!
//! # Examples
//!
//! ```no_run
//! use exo_core::Category;
//! use exo_discovery::discover;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registration = discover(Path::new("/usr/lib/exo/plugins"))?;
//!
//! for name in registration.executables(Category::Inputs) {
//!     let checksum = registration.checksum(Category::Inputs, name);
//!     println!("{name}: {}", checksum.unwrap_or("unverified"));
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod checksum;
pub mod discover;
pub mod error;
pub mod manifest;

pub use discover::{CategoryRegistration, Registration, discover};
pub use error::{DiscoveryError, Result};
pub use manifest::{MANIFEST_FILE, Manifest, read_manifest};
