//! Reference external input plugin.
//!
//! Install it under `<plugin_dir>/inputs/mock` and configure it with an
//! `[[inputs.mock]]` block. Running it by hand only prints a notice.

use exo_agent::mock::MockInput;
use exo_core::HandshakeConfig;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    exo_plugin::init_logging();
    exo_plugin::run(MockInput::default(), &HandshakeConfig::standard()).await
}
