//! Exo agent library.
//!
//! Exposes the command implementations, configuration handling and output
//! formatters behind the `exo-agent` binary, plus the reference plugin run
//! by the `exo-mock-input` binary.

#![allow(clippy::unused_async)]
#![allow(clippy::unnecessary_wraps)] // commands share a Result<ExitCode> signature

pub mod cli;
pub mod commands;
pub mod config;
pub mod formatters;
pub mod mock;
pub mod runner;
