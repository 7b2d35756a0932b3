//! Plugin process entry points.

use crate::error::ServeError;
use crate::input::ExternalInput;
use crate::server::InputServer;
use exo_core::HandshakeConfig;
use exo_protocol::{
    Envelope, InputService, ProtocolError, Request, Response, SERVICE_INPUT, SecureChannel,
    Transport, WireError, encode_metrics, plugin_handshake,
};
use std::process::ExitCode;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

/// Checks that the host exported the handshake cookie.
///
/// # Errors
///
/// Returns [`ServeError::NotLaunchedByHost`] if the variable is unset or
/// holds another value.
pub fn check_cookie(config: &HandshakeConfig) -> Result<(), ServeError> {
    match std::env::var(&config.cookie_key) {
        Ok(value) if value == config.cookie_value => Ok(()),
        _ => Err(ServeError::NotLaunchedByHost {
            key: config.cookie_key.clone(),
        }),
    }
}

/// Serves `plugin` over the process's stdin and stdout until the host hangs
/// up.
///
/// # Errors
///
/// Fails if the process was not launched by a host, or on a handshake or
/// transport failure.
pub async fn serve<P: ExternalInput>(plugin: P, config: &HandshakeConfig) -> Result<(), ServeError> {
    check_cookie(config)?;
    serve_io(plugin, config, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serves `plugin` over arbitrary streams, skipping the cookie check.
///
/// Returns `Ok(())` when the host closes the connection.
///
/// # Errors
///
/// Fails on a handshake or transport failure.
pub async fn serve_io<P, R, W>(
    plugin: P,
    config: &HandshakeConfig,
    reader: R,
    writer: W,
) -> Result<(), ServeError>
where
    P: ExternalInput,
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let mut channel = plugin_handshake(Transport::new(reader, writer), config).await?;
    debug!("handshake completed, serving requests");

    let mut server = InputServer::new(plugin);
    loop {
        let envelope: Envelope = match channel.recv().await {
            Ok(envelope) => envelope,
            Err(ProtocolError::Closed) => {
                info!("host closed the connection");
                return Ok(());
            }
            Err(ProtocolError::Serialization(e)) => {
                warn!(error = %e, "malformed request");
                reply(&mut channel, &Response::Fault {
                    message: format!("malformed request: {e}"),
                })
                .await?;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let response = if envelope.service == SERVICE_INPUT {
            dispatch(&mut server, envelope.request).await
        } else {
            warn!(service = %envelope.service, "request for unknown service");
            Response::Fault {
                message: format!("unknown service {:?}", envelope.service),
            }
        };
        reply(&mut channel, &response).await?;
    }
}

async fn reply<R, W>(channel: &mut SecureChannel<R, W>, response: &Response) -> Result<(), ServeError>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    channel.send(response).await.map_err(ServeError::from)
}

async fn dispatch<S: InputService + ?Sized>(service: &mut S, request: Request) -> Response {
    let op = request.op();
    debug!(op, "dispatching request");

    match request {
        Request::Description => match service.description().await {
            Ok(description) => Response::Description { description },
            Err(e) => Response::Fault {
                message: e.to_string(),
            },
        },
        Request::SampleConfig => match service.sample_config().await {
            Ok(config) => Response::SampleConfig { config },
            Err(e) => Response::Fault {
                message: e.to_string(),
            },
        },
        Request::Configure { config } => Response::Configure {
            error: service.configure(&config).await.into(),
        },
        Request::Init => Response::Init {
            error: service.init().await.into(),
        },
        Request::Gather => match service.gather().await {
            Ok(metrics) => match encode_metrics(&metrics) {
                Ok(metrics) => Response::Gather {
                    metrics,
                    error: WireError::ok(),
                },
                Err(e) => Response::Fault {
                    message: format!("encoding metrics failed: {e}"),
                },
            },
            Err(e) => Response::Gather {
                metrics: Vec::new(),
                error: WireError::error(e.to_string()),
            },
        },
    }
}

/// Runs `plugin` as the whole process and returns its exit status.
///
/// Meant to be returned from `main`. When started by hand rather than by a
/// host, prints a notice to stderr and exits with status 1.
///
/// # Examples
///
/// ```ignore
/// #[tokio::main]
/// async fn main() -> std::process::ExitCode {
///     exo_plugin::init_logging();
///     exo_plugin::run(MyInput::default(), &exo_core::HandshakeConfig::standard()).await
/// }
/// ```
pub async fn run<P: ExternalInput>(plugin: P, config: &HandshakeConfig) -> ExitCode {
    match serve(plugin, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(ServeError::NotLaunchedByHost { .. }) => {
            eprintln!(
                "This binary is an exo agent plugin and is not meant to be run directly.\n\
                 Point the agent's plugin_dir at the directory holding it instead."
            );
            ExitCode::from(1)
        }
        Err(e) => {
            error!(error = %e, "plugin stopped");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_check_rejects_unknown_variable() {
        let config = HandshakeConfig::new(1, "EXO_TEST_COOKIE_THAT_IS_NEVER_SET", "x");
        let err = check_cookie(&config).unwrap_err();
        assert!(err.is_not_launched_by_host());
        assert!(err.to_string().contains("EXO_TEST_COOKIE_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_cookie_check_accepts_matching_variable() {
        // PATH is always set, so use its current value as the cookie
        let value = std::env::var("PATH").unwrap();
        let config = HandshakeConfig::new(1, "PATH", value);
        assert!(check_cookie(&config).is_ok());
    }
}
