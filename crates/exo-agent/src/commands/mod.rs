//! Subcommand implementations.
//!
//! Each module runs one subcommand and formats its output according to the
//! requested format. Plugin failures are logged and turned into an exit
//! code; only unexpected failures are returned as errors.

pub mod completions;
pub mod describe;
pub mod discover;
pub mod run;
