//! Version and magic-cookie handshake with session key exchange.
//!
//! 1. Host generates a fresh [`SessionKey`] and sends [`HostHello`] over the
//!    child's private stdin pipe.
//! 2. Plugin answers with [`PluginHello`]: its protocol version, its cookie
//!    pair and a keyed hash of the cookie value proving it received the key.
//! 3. Both sides switch to a [`SecureChannel`] keyed with the session key.
//!
//! Any mismatch is fatal; the caller is expected to bound the exchange with
//! a timeout.

use crate::channel::{Role, SecureChannel, SessionKey};
use crate::error::{ProtocolError, Result};
use crate::frame::Transport;
use crate::messages::{HostHello, PluginHello};
use exo_core::HandshakeConfig;
use tokio::io::{AsyncRead, AsyncWrite};

/// Runs the host half of the handshake.
///
/// # Errors
///
/// Returns `VersionMismatch`, `CookieMismatch` or `BadProof` when the peer is
/// not a compatible plugin, and I/O or serialization errors when it does not
/// speak the framing at all.
pub async fn host_handshake<R, W>(
    mut transport: Transport<R, W>,
    config: &HandshakeConfig,
) -> Result<SecureChannel<R, W>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let key = SessionKey::generate();
    transport
        .send_plain(&HostHello {
            protocol_version: config.protocol_version,
            session_key: key.to_hex(),
        })
        .await?;

    let reply: PluginHello = transport.recv_plain().await?;

    if !config.matches(reply.protocol_version, &reply.cookie_key, &reply.cookie_value) {
        return Err(if reply.protocol_version == config.protocol_version {
            ProtocolError::CookieMismatch {
                key: reply.cookie_key,
            }
        } else {
            ProtocolError::VersionMismatch {
                expected: config.protocol_version,
                actual: reply.protocol_version,
            }
        });
    }

    let mut proof = [0_u8; blake3::OUT_LEN];
    hex::decode_to_slice(&reply.proof, &mut proof).map_err(|_| ProtocolError::BadProof)?;
    if key.proof(&config.cookie_value) != blake3::Hash::from_bytes(proof) {
        return Err(ProtocolError::BadProof);
    }

    tracing::debug!(version = reply.protocol_version, "plugin handshake completed");
    Ok(transport.into_secure(key, Role::Host))
}

/// Runs the plugin half of the handshake.
///
/// The plugin always answers with its own values, so a host with a
/// different version reports the mismatch too.
///
/// # Errors
///
/// Returns `VersionMismatch` if the host speaks another version,
/// `InvalidKey` if the session key is malformed, and I/O or serialization
/// errors on a broken pipe.
pub async fn plugin_handshake<R, W>(
    mut transport: Transport<R, W>,
    config: &HandshakeConfig,
) -> Result<SecureChannel<R, W>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let hello: HostHello = transport.recv_plain().await?;
    let key = SessionKey::from_hex(&hello.session_key)?;

    transport
        .send_plain(&PluginHello {
            protocol_version: config.protocol_version,
            cookie_key: config.cookie_key.clone(),
            cookie_value: config.cookie_value.clone(),
            proof: hex::encode(key.proof(&config.cookie_value).as_bytes()),
        })
        .await?;

    if hello.protocol_version != config.protocol_version {
        return Err(ProtocolError::VersionMismatch {
            expected: config.protocol_version,
            actual: hello.protocol_version,
        });
    }

    Ok(transport.into_secure(key, Role::Plugin))
}
