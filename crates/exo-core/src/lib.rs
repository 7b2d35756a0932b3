//! Core types, traits, and errors for the exo telemetry agent.
//!
//! This crate provides the foundational types shared by the host agent and by
//! external plugin processes.
//!
//! # Architecture
//!
//! The core consists of:
//! - The metric model (`Metric`, `FieldValue`, `MetricKind`) with a closed set
//!   of field value kinds
//! - The host-side plugin contracts (`Input`, `Accumulator`)
//! - The handshake constant (`HandshakeConfig`) passed to launcher and server
//! - Error hierarchy with contextual information
//! - Executable validation for plugin binaries

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod cli;
mod command;
mod error;
mod handshake;
mod metric;
mod types;

pub mod traits;

pub use command::validate_executable;
pub use error::{Error, Result};
pub use handshake::HandshakeConfig;
pub use metric::{Field, FieldValue, Metric, MetricBuilder, MetricKind, Tag};
pub use traits::{Accumulator, Input};
pub use types::{Category, PluginName};
