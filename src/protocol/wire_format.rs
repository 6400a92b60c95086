//! Wire format encoding and decoding.
//!
//! Every LCP frame is a little-endian length prefix followed by the payload:
//! ```text
//! ┌──────────┬──────────────────────────────┐
//! │ Length   │ Payload                      │
//! │ 2 bytes  │ `Length` bytes               │
//! │ uint16 LE│                              │
//! └──────────┴──────────────────────────────┘
//! ```
//!
//! Request payloads start with a command class byte and an opcode. Reply
//! payloads start with the reply marker, the echoed opcode and a status byte:
//! ```text
//! ┌──────────┬────────┬────────┬────────┬──────────────┐
//! │ Length   │ 0x02   │ Opcode │ Status │ Data         │
//! │ 2 bytes  │ 1 byte │ 1 byte │ 1 byte │ Length - 3   │
//! └──────────┴────────┴────────┴────────┴──────────────┘
//! ```

use crate::error::{LcpError, Result};

/// Length prefix size in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Reply marker, opcode and status bytes at the start of every reply payload.
pub const REPLY_HEADER_SIZE: usize = 3;

/// Largest payload the brick accepts or produces over Bluetooth/serial.
pub const MAX_PAYLOAD_SIZE: usize = 64;

/// First byte of every reply payload.
pub const REPLY_MARKER: u8 = 0x02;

/// Status byte value for a successful command.
pub const STATUS_SUCCESS: u8 = 0x00;

/// Command class byte values.
pub mod class {
    /// Direct command expecting a reply.
    pub const DIRECT: u8 = 0x00;
    /// System command expecting a reply.
    pub const SYSTEM: u8 = 0x01;
    /// Set on the class byte when no reply is requested.
    pub const NO_REPLY: u8 = 0x80;

    /// Direct command without reply: 0x80
    pub const DIRECT_NO_REPLY: u8 = DIRECT | NO_REPLY;
    /// System command without reply: 0x81
    pub const SYSTEM_NO_REPLY: u8 = SYSTEM | NO_REPLY;

    /// Check whether the class byte asks the brick for a reply.
    #[inline]
    pub fn expects_reply(class: u8) -> bool {
        class & NO_REPLY == 0
    }
}

/// Encode a payload length as the 2-byte little-endian prefix.
pub fn encode_length(len: usize) -> Result<[u8; LENGTH_PREFIX_SIZE]> {
    if len > MAX_PAYLOAD_SIZE {
        return Err(LcpError::Validation(format!(
            "Payload size {} exceeds maximum {}",
            len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok((len as u16).to_le_bytes())
}

/// Decode a 2-byte little-endian length prefix.
#[inline]
pub fn decode_length(buf: [u8; LENGTH_PREFIX_SIZE]) -> usize {
    u16::from_le_bytes(buf) as usize
}

/// Decoded reply marker, opcode and status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyHeader {
    /// Reply marker byte (0x02 on a valid reply).
    pub marker: u8,
    /// Echoed opcode.
    pub opcode: u8,
    /// Command status (0 = success).
    pub status: u8,
}

impl ReplyHeader {
    /// Decode the reply header from the start of a reply payload.
    ///
    /// Returns `None` if the payload is too short.
    pub fn decode(payload: &[u8]) -> Option<Self> {
        if payload.len() < REPLY_HEADER_SIZE {
            return None;
        }
        Some(Self {
            marker: payload[0],
            opcode: payload[1],
            status: payload[2],
        })
    }

    /// Validate marker and opcode against the command awaiting a reply.
    ///
    /// The status byte is not checked here: a non-zero status is reported by
    /// the device on an otherwise well-formed frame.
    pub fn validate(&self, expected_opcode: u8) -> Result<()> {
        if self.marker != REPLY_MARKER {
            return Err(LcpError::FrameMismatch {
                opcode: expected_opcode,
                detail: format!(
                    "expected reply marker 0x{:02X}, got 0x{:02X}",
                    REPLY_MARKER, self.marker
                ),
            });
        }
        if self.opcode != expected_opcode {
            return Err(LcpError::FrameMismatch {
                opcode: expected_opcode,
                detail: format!("reply echoes opcode 0x{:02X}", self.opcode),
            });
        }
        Ok(())
    }

    /// Check if the brick reported success.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Human readable description of an LCP status byte.
pub fn status_description(status: u8) -> &'static str {
    match status {
        0x00 => "Success",
        0x20 => "Pending communication transaction in progress",
        0x40 => "Specified mailbox queue is empty",
        0x81 => "No more handles",
        0x82 => "No space",
        0x83 => "No more files",
        0x84 => "End of file expected",
        0x85 => "End of file",
        0x86 => "Not a linear file",
        0x87 => "File not found",
        0x88 => "Handle already closed",
        0x89 => "No linear space",
        0x8A => "Undefined error",
        0x8B => "File is busy",
        0x8C => "No write buffers",
        0x8D => "Append not possible",
        0x8E => "File is full",
        0x8F => "File exists",
        0x90 => "Module not found",
        0x91 => "Out of boundary",
        0x92 => "Illegal file name",
        0x93 => "Illegal handle",
        0xBD => "Request failed (e.g. specified file not found)",
        0xBE => "Unknown command opcode",
        0xBF => "Insane packet",
        0xC0 => "Data contains out-of-range values",
        0xDD => "Communication bus error",
        0xDE => "No free memory in communication buffer",
        0xDF => "Specified channel/connection is not valid",
        0xE0 => "Specified channel/connection not configured or busy",
        0xEC => "No active program",
        0xED => "Illegal size specified",
        0xEE => "Illegal mailbox queue ID specified",
        0xEF => "Attempted to access invalid field of a structure",
        0xF0 => "Bad input or output specified",
        0xFB => "Insufficient memory available",
        0xFF => "Bad arguments",
        _ => "Unknown status",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_prefix_little_endian() {
        assert_eq!(encode_length(2).unwrap(), [0x02, 0x00]);
        assert_eq!(encode_length(22).unwrap(), [0x16, 0x00]);

        assert_eq!(decode_length([0x21, 0x00]), 33);
        assert_eq!(decode_length([0x00, 0x01]), 256);
    }

    #[test]
    fn test_encode_length_rejects_oversized_payload() {
        assert!(encode_length(MAX_PAYLOAD_SIZE).is_ok());
        let err = encode_length(MAX_PAYLOAD_SIZE + 1).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_class_bytes() {
        assert_eq!(class::DIRECT_NO_REPLY, 0x80);
        assert_eq!(class::SYSTEM_NO_REPLY, 0x81);
        assert!(class::expects_reply(class::DIRECT));
        assert!(class::expects_reply(class::SYSTEM));
        assert!(!class::expects_reply(class::DIRECT_NO_REPLY));
        assert!(!class::expects_reply(class::SYSTEM_NO_REPLY));
    }

    #[test]
    fn test_reply_header_decode() {
        let header = ReplyHeader::decode(&[0x02, 0x0B, 0x00, 0xE8, 0x1C]).unwrap();
        assert_eq!(header.marker, REPLY_MARKER);
        assert_eq!(header.opcode, 0x0B);
        assert!(header.is_success());
        assert!(header.validate(0x0B).is_ok());
    }

    #[test]
    fn test_reply_header_too_short() {
        assert!(ReplyHeader::decode(&[0x02, 0x0B]).is_none());
    }

    #[test]
    fn test_reply_header_wrong_marker() {
        let header = ReplyHeader::decode(&[0x01, 0x0B, 0x00]).unwrap();
        let err = header.validate(0x0B).unwrap_err();
        assert!(matches!(err, LcpError::FrameMismatch { opcode: 0x0B, .. }));
        assert!(err.to_string().contains("reply marker"));
    }

    #[test]
    fn test_reply_header_wrong_opcode() {
        let header = ReplyHeader::decode(&[0x02, 0x06, 0x00]).unwrap();
        let err = header.validate(0x07).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("0x06"));
    }

    #[test]
    fn test_non_zero_status_is_not_a_framing_error() {
        let header = ReplyHeader::decode(&[0x02, 0x01, 0xEC]).unwrap();
        assert!(header.validate(0x01).is_ok());
        assert!(!header.is_success());
    }

    #[test]
    fn test_status_descriptions() {
        assert_eq!(status_description(0x00), "Success");
        assert_eq!(status_description(0xEC), "No active program");
        assert_eq!(status_description(0x87), "File not found");
        assert_eq!(status_description(0x42), "Unknown status");
    }
}
