//! Outbound frame building and parsed replies.
//!
//! Uses `bytes::Bytes` so reply data can be handed to decoders without copying.
//!
//! # Example
//!
//! ```
//! use nxt_lcp::protocol::{build_frame, Reply};
//! use bytes::Bytes;
//!
//! let frame = build_frame(&[0x00, 0x0B]).unwrap();
//! assert_eq!(&frame[..], &[0x02, 0x00, 0x00, 0x0B]);
//!
//! let reply = Reply::parse(0x0B, Bytes::from_static(&[0x02, 0x0B, 0x00, 0xE8, 0x1C])).unwrap();
//! assert_eq!(reply.data(), &[0xE8, 0x1C]);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::{encode_length, ReplyHeader, LENGTH_PREFIX_SIZE, REPLY_HEADER_SIZE};
use crate::error::{LcpError, Result};

/// A reply payload whose marker and opcode have been checked.
#[derive(Debug, Clone)]
pub struct Reply {
    /// Decoded reply header.
    pub header: ReplyHeader,
    /// Operation-specific data following the status byte.
    pub data: Bytes,
}

impl Reply {
    /// Parse a reply payload (everything after the length prefix).
    ///
    /// Fails with `FrameMismatch` if the payload is shorter than the reply
    /// header or does not answer `expected_opcode`. A non-zero status is
    /// kept in the header for the caller to inspect.
    pub fn parse(expected_opcode: u8, mut payload: Bytes) -> Result<Self> {
        let header = ReplyHeader::decode(&payload).ok_or_else(|| LcpError::FrameMismatch {
            opcode: expected_opcode,
            detail: format!(
                "reply payload of {} bytes is shorter than its header",
                payload.len()
            ),
        })?;
        header.validate(expected_opcode)?;

        let data = payload.split_off(REPLY_HEADER_SIZE);
        Ok(Self { header, data })
    }

    /// Get a reference to the reply data.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the echoed opcode.
    #[inline]
    pub fn opcode(&self) -> u8 {
        self.header.opcode
    }

    /// Get the status byte.
    #[inline]
    pub fn status(&self) -> u8 {
        self.header.status
    }

    /// Check if the brick reported success.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.header.is_success()
    }

    /// Reply length as carried in the length prefix.
    #[inline]
    pub fn wire_len(&self) -> usize {
        REPLY_HEADER_SIZE + self.data.len()
    }

    /// Turn a non-zero status into a `DeviceStatus` error.
    pub fn into_success(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(LcpError::DeviceStatus {
                opcode: self.header.opcode,
                status: self.header.status,
            })
        }
    }
}

/// Build a complete frame (length prefix + payload) as one contiguous buffer.
///
/// The brick treats a short read as more data pending, so the prefix and
/// payload are written with a single write call.
pub fn build_frame(payload: &[u8]) -> Result<Bytes> {
    let prefix = encode_length(payload.len())?;
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.put_slice(&prefix);
    buf.put_slice(payload);
    Ok(buf.freeze())
}
