//! Host-side RPC stub and subprocess handle.

use async_trait::async_trait;
use exo_core::Metric;
use exo_protocol::{
    Envelope, InputService, Request, Response, RpcError, SecureChannel, decode_metrics,
};
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// RPC stub speaking the input service over an authenticated channel.
///
/// Calls are strictly sequential. If a call future is dropped before its
/// response arrives, the stub refuses further calls: the stale response
/// would otherwise be read as the answer to the next request.
#[derive(Debug)]
pub struct InputClient<R, W> {
    channel: SecureChannel<R, W>,
    in_flight: bool,
}

impl<R, W> InputClient<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Wraps a channel that completed the host handshake.
    #[must_use]
    pub const fn new(channel: SecureChannel<R, W>) -> Self {
        Self {
            channel,
            in_flight: false,
        }
    }

    async fn call(&mut self, request: Request) -> Result<Response, RpcError> {
        if self.in_flight {
            return Err(RpcError::transport(
                "connection out of sync after an abandoned call",
            ));
        }

        let op = request.op();
        debug!(op, "sending request");

        self.in_flight = true;
        self.channel.send(&Envelope::input(request)).await?;
        let response: Response = self.channel.recv().await?;
        self.in_flight = false;

        match response {
            Response::Fault { message } => Err(RpcError::transport(format!(
                "plugin rejected {op}: {message}"
            ))),
            response if response.op() == op => Ok(response),
            other => Err(RpcError::transport(format!(
                "expected {op} response, got {}",
                other.op()
            ))),
        }
    }
}

fn unexpected(response: &Response) -> RpcError {
    RpcError::transport(format!("unexpected {} response", response.op()))
}

#[async_trait]
impl<R, W> InputService for InputClient<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn description(&mut self) -> Result<String, RpcError> {
        match self.call(Request::Description).await? {
            Response::Description { description } => Ok(description),
            other => Err(unexpected(&other)),
        }
    }

    async fn sample_config(&mut self) -> Result<String, RpcError> {
        match self.call(Request::SampleConfig).await? {
            Response::SampleConfig { config } => Ok(config),
            other => Err(unexpected(&other)),
        }
    }

    async fn configure(&mut self, config: &str) -> Result<(), RpcError> {
        let request = Request::Configure {
            config: config.to_string(),
        };
        match self.call(request).await? {
            Response::Configure { error } => error.into_result().map_err(RpcError::Domain),
            other => Err(unexpected(&other)),
        }
    }

    async fn init(&mut self) -> Result<(), RpcError> {
        match self.call(Request::Init).await? {
            Response::Init { error } => error.into_result().map_err(RpcError::Domain),
            other => Err(unexpected(&other)),
        }
    }

    async fn gather(&mut self) -> Result<Vec<Metric>, RpcError> {
        match self.call(Request::Gather).await? {
            Response::Gather { metrics, error } => {
                error.into_result().map_err(RpcError::Domain)?;
                Ok(decode_metrics(metrics))
            }
            other => Err(unexpected(&other)),
        }
    }
}

/// Stand-in for a stub whose connection was released by [`PluginClient::kill`].
#[derive(Debug)]
struct Released;

impl Released {
    fn error() -> RpcError {
        RpcError::transport("plugin connection was closed")
    }
}

#[async_trait]
impl InputService for Released {
    async fn description(&mut self) -> Result<String, RpcError> {
        Err(Self::error())
    }

    async fn sample_config(&mut self) -> Result<String, RpcError> {
        Err(Self::error())
    }

    async fn configure(&mut self, _config: &str) -> Result<(), RpcError> {
        Err(Self::error())
    }

    async fn init(&mut self) -> Result<(), RpcError> {
        Err(Self::error())
    }

    async fn gather(&mut self) -> Result<Vec<Metric>, RpcError> {
        Err(Self::error())
    }
}

/// A running plugin subprocess and its stderr relay.
#[derive(Debug)]
pub(crate) struct PluginProcess {
    pub(crate) child: Child,
    pub(crate) relay: JoinHandle<()>,
}

/// An open connection to one plugin instance.
///
/// Owns the RPC stub and, when launched by this process, the subprocess.
/// Dropping the client kills the subprocess.
pub struct PluginClient {
    name: String,
    service: Box<dyn InputService>,
    process: Option<PluginProcess>,
}

impl PluginClient {
    pub(crate) fn launched(
        name: String,
        service: Box<dyn InputService>,
        process: PluginProcess,
    ) -> Self {
        Self {
            name,
            service,
            process: Some(process),
        }
    }

    /// Wraps an already-connected service with no subprocess attached.
    #[must_use]
    pub fn from_service(name: impl Into<String>, service: Box<dyn InputService>) -> Self {
        Self {
            name: name.into(),
            service,
            process: None,
        }
    }

    /// Plugin name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The RPC surface.
    pub fn service(&mut self) -> &mut dyn InputService {
        self.service.as_mut()
    }

    /// OS process id, while the subprocess is alive.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(|p| p.child.id())
    }

    /// Returns `true` while the subprocess has not exited.
    ///
    /// Always `false` for clients without a subprocess.
    pub fn is_running(&mut self) -> bool {
        self.process
            .as_mut()
            .is_some_and(|p| matches!(p.child.try_wait(), Ok(None)))
    }

    /// Closes the connection, then forcibly terminates the subprocess and
    /// waits for it to exit.
    ///
    /// Later calls through [`service`](Self::service) fail with a transport
    /// error. Calling it again is a no-op.
    pub async fn kill(&mut self) {
        // Dropping the stub closes the child's stdin and stdout
        drop(std::mem::replace(&mut self.service, Box::new(Released)));

        let Some(mut process) = self.process.take() else {
            return;
        };
        if let Err(e) = process.child.kill().await {
            warn!(plugin = %self.name, error = %e, "failed to kill plugin process");
        }
        // The relay drains what is left in the pipe and ends on EOF
        drop(process.relay);
        debug!(plugin = %self.name, "plugin process terminated");
    }
}

impl fmt::Debug for PluginClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginClient")
            .field("name", &self.name)
            .field("service", &"InputService{..}")
            .field("pid", &self.pid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exo_protocol::{ProtocolError, Role, SessionKey, Transport};

    #[tokio::test]
    async fn test_kill_releases_the_connection() {
        let (host_end, plugin_end) = tokio::io::duplex(4096);
        let (hr, hw) = tokio::io::split(host_end);
        let (pr, pw) = tokio::io::split(plugin_end);
        let key = [3_u8; 32];
        let channel = Transport::new(hr, hw).into_secure(SessionKey::from_bytes(key), Role::Host);
        let mut plugin =
            Transport::new(pr, pw).into_secure(SessionKey::from_bytes(key), Role::Plugin);

        let mut client =
            PluginClient::from_service("mock", Box::new(InputClient::new(channel)));
        client.kill().await;

        let err = plugin.recv::<Envelope>().await.unwrap_err();
        assert!(matches!(err, ProtocolError::Closed));

        let err = client.service().gather().await.unwrap_err();
        assert!(err.is_transport());

        client.kill().await;
        assert!(!client.is_running());
    }
}
