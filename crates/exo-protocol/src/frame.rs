//! Length-prefixed framing over a pair of byte streams.
//!
//! ```text
//! +----------------------------+------------------+
//! | Length (4 bytes, BE)       | Payload          |
//! +----------------------------+------------------+
//! ```
//!
//! Handshake messages travel as bare JSON payloads; after the handshake the
//! transport is upgraded into a [`SecureChannel`](crate::SecureChannel).

use crate::channel::{Role, SecureChannel, SessionKey};
use crate::error::{ProtocolError, Result};
use bytes::{Bytes, BytesMut};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

/// Largest accepted frame, in bytes.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

fn codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .big_endian()
        .max_frame_length(MAX_FRAME_LEN)
        .new_codec()
}

/// Framed reader/writer pair, typically a child's stdout and stdin.
#[derive(Debug)]
pub struct Transport<R, W> {
    reader: FramedRead<R, LengthDelimitedCodec>,
    writer: FramedWrite<W, LengthDelimitedCodec>,
}

impl<R, W> Transport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Wraps a reader and writer.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: FramedRead::new(reader, codec()),
            writer: FramedWrite::new(writer, codec()),
        }
    }

    /// Sends a raw frame and flushes it.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Io` if the pipe is broken or the frame is too
    /// large.
    pub async fn send_frame(&mut self, frame: Bytes) -> Result<()> {
        self.writer.send(frame).await?;
        Ok(())
    }

    /// Receives the next raw frame.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Closed` on end of stream and
    /// `ProtocolError::Io` on a read failure or oversized frame.
    pub async fn recv_frame(&mut self) -> Result<BytesMut> {
        let frame = self.reader.next().await.ok_or(ProtocolError::Closed)??;
        Ok(frame)
    }

    /// Sends an unauthenticated JSON message.
    ///
    /// # Errors
    ///
    /// Propagates serialization and I/O failures.
    pub async fn send_plain<T: Serialize + Sync>(&mut self, message: &T) -> Result<()> {
        let payload = serde_json::to_vec(message)?;
        self.send_frame(Bytes::from(payload)).await
    }

    /// Receives an unauthenticated JSON message.
    ///
    /// # Errors
    ///
    /// Propagates framing, I/O and deserialization failures.
    pub async fn recv_plain<T: DeserializeOwned>(&mut self) -> Result<T> {
        let frame = self.recv_frame().await?;
        Ok(serde_json::from_slice(&frame)?)
    }

    /// Upgrades into an authenticated channel keyed with `key`.
    #[must_use]
    pub fn into_secure(self, key: SessionKey, role: Role) -> SecureChannel<R, W> {
        SecureChannel::new(self, key, role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_plain_message_round_trip() {
        let (a, b) = tokio::io::duplex(4096);
        let (ra, wa) = tokio::io::split(a);
        let (rb, wb) = tokio::io::split(b);
        let mut left = Transport::new(ra, wa);
        let mut right = Transport::new(rb, wb);

        left.send_plain(&vec![1_u32, 2, 3]).await.unwrap();
        let got: Vec<u32> = right.recv_plain().await.unwrap();
        assert_eq!(got, [1, 2, 3]);
    }

    #[tokio::test]
    async fn test_eof_is_closed() {
        let (a, b) = tokio::io::duplex(64);
        let (rb, wb) = tokio::io::split(b);
        let mut right = Transport::new(rb, wb);
        drop(a);

        let err = right.recv_frame().await.unwrap_err();
        assert!(err.is_closed());
    }

    #[tokio::test]
    async fn test_oversized_length_prefix_is_rejected() {
        let (mut a, b) = tokio::io::duplex(64);
        let (rb, wb) = tokio::io::split(b);
        let mut right = Transport::new(rb, wb);

        // "hell" read as a big-endian length is far beyond the limit
        a.write_all(b"hello world\n").await.unwrap();

        let err = right.recv_frame().await.unwrap_err();
        assert!(matches!(err, ProtocolError::Io(_)));
    }
}
