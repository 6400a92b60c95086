//! Command set - per-operation payload builders and reply decoders.
//!
//! Each operation is a [`Request`] (class byte, opcode, argument bytes) built
//! by a function in [`direct`] or [`system`], plus, for queries, a decoder
//! that turns the reply data into a typed value. Argument validation happens
//! while building, so a rejected request never reaches the wire.
//!
//! # Example
//!
//! ```
//! use nxt_lcp::command::direct;
//!
//! let request = direct::play_tone(440, 500);
//! assert_eq!(&request.payload()[..], &[0x80, 0x03, 0xB8, 0x01, 0xF4, 0x01]);
//! assert!(!request.expects_reply());
//! ```

pub mod direct;
mod opcode;
pub mod system;

use bytes::{BufMut, Bytes, BytesMut};

pub use opcode::Opcode;

use crate::error::{LcpError, Result};

/// An encoded command ready to be framed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    opcode: Opcode,
    args: Bytes,
}

impl Request {
    /// Create a request with the given argument bytes.
    pub fn new(opcode: Opcode, args: Bytes) -> Self {
        Self { opcode, args }
    }

    /// Create a request that carries no arguments.
    pub fn bare(opcode: Opcode) -> Self {
        Self::new(opcode, Bytes::new())
    }

    /// Get the opcode.
    #[inline]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Get the argument bytes (after class and opcode).
    #[inline]
    pub fn args(&self) -> &[u8] {
        &self.args
    }

    /// Check if the brick will answer this request.
    #[inline]
    pub fn expects_reply(&self) -> bool {
        self.opcode.reply_len().is_some()
    }

    /// Full payload: class byte, opcode byte, arguments.
    pub fn payload(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(2 + self.args.len());
        buf.put_u8(self.opcode.class());
        buf.put_u8(self.opcode.code());
        buf.put_slice(&self.args);
        buf.freeze()
    }
}

/// Check that reply data holds at least `needed` bytes.
pub(crate) fn ensure_data_len(opcode: Opcode, data: &[u8], needed: usize) -> Result<()> {
    if data.len() < needed {
        return Err(LcpError::FrameMismatch {
            opcode: opcode.code(),
            detail: format!("reply data of {} bytes, need {}", data.len(), needed),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_request_payload() {
        let request = Request::bare(Opcode::GetBatteryLevel);
        assert_eq!(&request.payload()[..], &[0x00, 0x0B]);
        assert!(request.expects_reply());
        assert!(request.args().is_empty());
    }

    #[test]
    fn test_system_request_payload() {
        let request = Request::bare(Opcode::GetDeviceInfo);
        assert_eq!(&request.payload()[..], &[0x01, 0x9B]);
    }

    #[test]
    fn test_no_reply_request_payload() {
        let request = Request::bare(Opcode::KeepAlive);
        assert_eq!(&request.payload()[..], &[0x80, 0x0D]);
        assert!(!request.expects_reply());
    }

    #[test]
    fn test_ensure_data_len() {
        assert!(ensure_data_len(Opcode::GetBatteryLevel, &[1, 2], 2).is_ok());
        let err = ensure_data_len(Opcode::GetBatteryLevel, &[1], 2).unwrap_err();
        assert!(matches!(err, LcpError::FrameMismatch { opcode: 0x0B, .. }));
    }
}
