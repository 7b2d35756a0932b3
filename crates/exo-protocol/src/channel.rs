//! Authenticated framing with a per-subprocess session key.
//!
//! Each frame is `MAC (32 bytes) || JSON payload`, where the MAC is a BLAKE3
//! keyed hash over the sender's direction tag, the frame sequence number
//! (big-endian `u64`) and the payload. Sequence numbers count independently
//! in each direction, starting at zero after the handshake.
//!
//! A frame replayed, reordered, reflected back at its sender, or produced
//! without the key fails verification on the receiving side.

use crate::error::{ProtocolError, Result};
use crate::frame::Transport;
use bytes::{Bytes, BytesMut};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretBox};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncWrite};

/// Length of the frame MAC.
pub const MAC_LEN: usize = blake3::OUT_LEN;

/// Length of the session key.
pub const KEY_LEN: usize = blake3::KEY_LEN;

const PROOF_CONTEXT: &[u8] = b"exo-handshake\0";

/// Which end of the pipe pair this channel is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The agent process
    Host,
    /// The plugin subprocess
    Plugin,
}

impl Role {
    const fn send_tag(self) -> u8 {
        match self {
            Self::Host => 0x01,
            Self::Plugin => 0x02,
        }
    }

    const fn recv_tag(self) -> u8 {
        match self {
            Self::Host => 0x02,
            Self::Plugin => 0x01,
        }
    }
}

/// Ephemeral 32-byte key shared by exactly one host/plugin pairing.
#[derive(Debug)]
pub struct SessionKey(SecretBox<[u8; KEY_LEN]>);

impl SessionKey {
    /// Generates a fresh key from the operating system RNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0_u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self::from_bytes(bytes)
    }

    /// Wraps existing key material.
    #[must_use]
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(SecretBox::new(Box::new(bytes)))
    }

    /// Parses a hex-encoded key.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidKey` unless `encoded` is exactly 64 hex
    /// digits.
    ///
    /// # Examples
    ///
    /// ```
    /// use exo_protocol::SessionKey;
    ///
    /// assert!(SessionKey::from_hex(&"ab".repeat(32)).is_ok());
    /// assert!(SessionKey::from_hex("abcd").is_err());
    /// assert!(SessionKey::from_hex(&"zz".repeat(32)).is_err());
    /// ```
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let mut bytes = [0_u8; KEY_LEN];
        hex::decode_to_slice(encoded, &mut bytes).map_err(|e| ProtocolError::InvalidKey {
            reason: e.to_string(),
        })?;
        Ok(Self::from_bytes(bytes))
    }

    /// Hex-encodes the key for the initial handshake frame.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.expose_secret())
    }

    /// Keyed hash proving possession of the key, bound to `cookie_value`.
    #[must_use]
    pub fn proof(&self, cookie_value: &str) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new_keyed(self.0.expose_secret());
        hasher.update(PROOF_CONTEXT);
        hasher.update(cookie_value.as_bytes());
        hasher.finalize()
    }

    fn mac(&self, tag: u8, seq: u64, payload: &[u8]) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new_keyed(self.0.expose_secret());
        hasher.update(&[tag]);
        hasher.update(&seq.to_be_bytes());
        hasher.update(payload);
        hasher.finalize()
    }
}

/// Authenticated message channel over a [`Transport`].
#[derive(Debug)]
pub struct SecureChannel<R, W> {
    transport: Transport<R, W>,
    key: SessionKey,
    role: Role,
    send_seq: u64,
    recv_seq: u64,
}

impl<R, W> SecureChannel<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub(crate) const fn new(transport: Transport<R, W>, key: SessionKey, role: Role) -> Self {
        Self {
            transport,
            key,
            role,
            send_seq: 0,
            recv_seq: 0,
        }
    }

    /// Returns which end of the pairing this is.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Serializes, authenticates and sends a message.
    ///
    /// # Errors
    ///
    /// Propagates serialization and I/O failures.
    pub async fn send<T: Serialize + Sync>(&mut self, message: &T) -> Result<()> {
        let payload = serde_json::to_vec(message)?;
        let mac = self.key.mac(self.role.send_tag(), self.send_seq, &payload);

        let mut frame = BytesMut::with_capacity(MAC_LEN + payload.len());
        frame.extend_from_slice(mac.as_bytes());
        frame.extend_from_slice(&payload);

        self.transport.send_frame(frame.freeze()).await?;
        self.send_seq = self.send_seq.wrapping_add(1);
        Ok(())
    }

    /// Receives, verifies and deserializes the next message.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Closed` on end of stream,
    /// `ProtocolError::Authentication` if the MAC does not verify, and
    /// propagates I/O and deserialization failures.
    pub async fn recv<T: DeserializeOwned>(&mut self) -> Result<T> {
        let frame = self.transport.recv_frame().await?;
        let payload = self.verify(frame.freeze())?;
        Ok(serde_json::from_slice(&payload)?)
    }

    fn verify(&mut self, frame: Bytes) -> Result<Bytes> {
        if frame.len() < MAC_LEN {
            return Err(ProtocolError::TruncatedFrame { len: frame.len() });
        }
        let mut received = [0_u8; MAC_LEN];
        received.copy_from_slice(&frame[..MAC_LEN]);
        let payload = frame.slice(MAC_LEN..);

        let expected = self.key.mac(self.role.recv_tag(), self.recv_seq, &payload);
        // blake3::Hash equality is constant time
        if expected != blake3::Hash::from_bytes(received) {
            return Err(ProtocolError::Authentication { seq: self.recv_seq });
        }
        self.recv_seq = self.recv_seq.wrapping_add(1);
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{DuplexStream, ReadHalf, WriteHalf};

    type Half = Transport<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

    fn pipe() -> (Half, Half) {
        let (a, b) = tokio::io::duplex(64 * 1024);
        let (ra, wa) = tokio::io::split(a);
        let (rb, wb) = tokio::io::split(b);
        (Transport::new(ra, wa), Transport::new(rb, wb))
    }

    const KEY: [u8; KEY_LEN] = [7; KEY_LEN];

    #[tokio::test]
    async fn test_messages_flow_both_ways() {
        let (h, p) = pipe();
        let mut host = h.into_secure(SessionKey::from_bytes(KEY), Role::Host);
        let mut plugin = p.into_secure(SessionKey::from_bytes(KEY), Role::Plugin);

        host.send(&"ping").await.unwrap();
        host.send(&"ping2").await.unwrap();
        assert_eq!(plugin.recv::<String>().await.unwrap(), "ping");
        assert_eq!(plugin.recv::<String>().await.unwrap(), "ping2");

        plugin.send(&42_u32).await.unwrap();
        assert_eq!(host.recv::<u32>().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_wrong_key_fails_authentication() {
        let (h, p) = pipe();
        let mut host = h.into_secure(SessionKey::from_bytes(KEY), Role::Host);
        let mut plugin = p.into_secure(SessionKey::from_bytes([8; KEY_LEN]), Role::Plugin);

        host.send(&"hello").await.unwrap();
        let err = plugin.recv::<String>().await.unwrap_err();
        assert!(matches!(err, ProtocolError::Authentication { seq: 0 }));
    }

    #[tokio::test]
    async fn test_reflected_frame_is_rejected() {
        let (h, p) = pipe();
        let mut sender = h.into_secure(SessionKey::from_bytes(KEY), Role::Host);
        // A receiver that also believes it is the host sees its own direction tag
        let mut reflected = p.into_secure(SessionKey::from_bytes(KEY), Role::Host);

        sender.send(&"loop").await.unwrap();
        assert!(reflected.recv::<String>().await.is_err());
    }

    #[tokio::test]
    async fn test_replayed_frame_is_rejected() {
        let (mut raw, p) = pipe();
        let key = SessionKey::from_bytes(KEY);
        let mut plugin = p.into_secure(SessionKey::from_bytes(KEY), Role::Plugin);

        let payload = serde_json::to_vec(&"once").unwrap();
        let mac = key.mac(Role::Host.send_tag(), 0, &payload);
        let mut frame = BytesMut::new();
        frame.extend_from_slice(mac.as_bytes());
        frame.extend_from_slice(&payload);
        let frame = frame.freeze();

        raw.send_frame(frame.clone()).await.unwrap();
        raw.send_frame(frame).await.unwrap();

        assert_eq!(plugin.recv::<String>().await.unwrap(), "once");
        let err = plugin.recv::<String>().await.unwrap_err();
        assert!(matches!(err, ProtocolError::Authentication { seq: 1 }));
    }

    #[tokio::test]
    async fn test_tampered_payload_is_rejected() {
        let (mut raw, p) = pipe();
        let key = SessionKey::from_bytes(KEY);
        let mut plugin = p.into_secure(SessionKey::from_bytes(KEY), Role::Plugin);

        let mac = key.mac(Role::Host.send_tag(), 0, b"\"good\"");
        let mut frame = BytesMut::new();
        frame.extend_from_slice(mac.as_bytes());
        frame.extend_from_slice(b"\"evil\"");
        raw.send_frame(frame.freeze()).await.unwrap();

        assert!(plugin.recv::<String>().await.is_err());
    }

    #[tokio::test]
    async fn test_short_frame_is_truncated() {
        let (mut raw, p) = pipe();
        let mut plugin = p.into_secure(SessionKey::from_bytes(KEY), Role::Plugin);

        raw.send_frame(Bytes::from_static(b"tiny")).await.unwrap();
        let err = plugin.recv::<String>().await.unwrap_err();
        assert!(matches!(err, ProtocolError::TruncatedFrame { len: 4 }));
    }

    #[test]
    fn test_hex_round_trip() {
        let key = SessionKey::generate();
        let again = SessionKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(key.proof("c"), again.proof("c"));
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let key = SessionKey::from_bytes([0xab; KEY_LEN]);
        assert!(!format!("{key:?}").contains("ab, ab"));
        assert!(!format!("{key:?}").contains("171"));
    }
}
