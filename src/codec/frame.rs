//! Frame codec - sends length-prefixed payloads and reads replies.
//!
//! Reply reading is structured: the length prefix is read first, then the
//! whole declared payload, and only then are marker, opcode and status
//! inspected. A reply with a non-zero status is therefore consumed in full
//! and the link stays in sync.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{LcpError, Result};
use crate::protocol::{
    build_frame, decode_length, Reply, LENGTH_PREFIX_SIZE, MAX_PAYLOAD_SIZE, REPLY_HEADER_SIZE,
};
use crate::transport::Transport;

/// Owns the transport and moves whole frames across it.
pub struct FrameCodec<S> {
    transport: Transport<S>,
}

impl<S> FrameCodec<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a codec over an opened transport.
    pub fn new(transport: Transport<S>) -> Self {
        Self { transport }
    }

    /// Write `payload` behind its length prefix as one write.
    pub async fn send(&mut self, payload: &[u8]) -> Result<()> {
        let frame = build_frame(payload)?;
        tracing::trace!("-> {:02X?}", &frame[..]);
        self.transport.write_all(&frame).await
    }

    /// Read one reply to `opcode`.
    ///
    /// Fails with `FrameMismatch` when the length is implausible, the marker
    /// or opcode is wrong, or a successful reply's length differs from
    /// `expected_len`. A non-zero status is returned in the `Reply` for the
    /// caller to act on.
    pub async fn read_reply(&mut self, opcode: u8, expected_len: usize) -> Result<Reply> {
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        self.transport.read_exact(&mut prefix).await?;

        let len = decode_length(prefix);
        if !(REPLY_HEADER_SIZE..=MAX_PAYLOAD_SIZE).contains(&len) {
            return Err(LcpError::FrameMismatch {
                opcode,
                detail: format!("implausible reply length {} (expected {})", len, expected_len),
            });
        }

        let mut payload = BytesMut::zeroed(len);
        self.transport.read_exact(&mut payload).await?;
        tracing::trace!("<- {:02X?}", &payload[..]);

        let reply = Reply::parse(opcode, payload.freeze())?;
        if reply.is_success() && len != expected_len {
            return Err(LcpError::FrameMismatch {
                opcode,
                detail: format!("reply length {} (expected {})", len, expected_len),
            });
        }
        Ok(reply)
    }

    /// Close the underlying transport (idempotent).
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }

    /// Check if the transport is still open.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }
}
