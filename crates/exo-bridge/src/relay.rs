//! Forwards a plugin's standard error into the host log.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Log target of relayed lines.
pub const STDERR_TARGET: &str = "exo_bridge::stderr";

/// Trims spaces, tabs and line terminators; blank lines yield `None`.
///
/// # Examples
///
/// ```
/// use exo_bridge::relay::clean_line;
///
/// assert_eq!(clean_line("  disk full\t\r\n"), Some("disk full"));
/// assert_eq!(clean_line(" \t \n"), None);
/// ```
#[must_use]
pub fn clean_line(line: &str) -> Option<&str> {
    let trimmed = line.trim_matches([' ', '\t', '\r', '\n']);
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Spawns a task relaying `stderr` line by line until end of stream.
///
/// Lines are logged at `INFO` on [`STDERR_TARGET`]; invalid UTF-8 is
/// replaced rather than ending the relay.
pub fn spawn_stderr_relay<R>(plugin: String, stderr: R) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stderr);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    if let Some(line) = clean_line(&line) {
                        info!(target: STDERR_TARGET, plugin = %plugin, "{line}");
                    }
                }
                Err(e) => {
                    debug!(plugin = %plugin, error = %e, "stderr relay stopped");
                    break;
                }
            }
        }
    })
}
