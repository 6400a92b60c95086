//! Error types for nxt-lcp.

use std::time::Duration;

use thiserror::Error;

use crate::protocol::status_description;

/// Main error type for all brick operations.
#[derive(Debug, Error)]
pub enum LcpError {
    /// I/O error on the serial channel.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A read or write exceeded its deadline.
    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        /// Which half of the channel stalled ("read" or "write").
        operation: &'static str,
        /// The deadline that elapsed.
        after: Duration,
    },

    /// Reply framing disagrees with the request (link desync).
    #[error("Frame mismatch for opcode 0x{opcode:02X}: {detail}")]
    FrameMismatch {
        /// Opcode of the command awaiting a reply.
        opcode: u8,
        /// Expected vs. actual description.
        detail: String,
    },

    /// The brick answered with a non-zero status byte.
    #[error("Device reported status 0x{status:02X} for opcode 0x{opcode:02X}: {}", describe_status(.status))]
    DeviceStatus {
        /// Opcode echoed in the reply.
        opcode: u8,
        /// Raw status byte.
        status: u8,
    },

    /// Caller-supplied value rejected before anything was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A reply byte fell outside a closed protocol enumeration.
    #[error("Cannot decode {field} from byte 0x{value:02X}")]
    Decode {
        /// Name of the field being decoded.
        field: &'static str,
        /// Offending byte.
        value: u8,
    },

    /// The previous command was cancelled before its reply was read.
    #[error("Link out of sync after a cancelled command, refusing opcode 0x{opcode:02X}")]
    Desynced {
        /// Opcode of the command that was refused.
        opcode: u8,
    },

    /// The session is closed; open a new one to continue.
    #[error("Session closed")]
    SessionClosed,

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON configuration could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LcpError {
    /// Whether this error leaves the channel in an unknown state.
    ///
    /// Fatal errors close the session. Device status, validation and decode
    /// errors arrive on a well-formed frame and leave the link usable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LcpError::Io(_)
                | LcpError::Timeout { .. }
                | LcpError::FrameMismatch { .. }
                | LcpError::Desynced { .. }
        )
    }
}

fn describe_status(status: &u8) -> &'static str {
    status_description(*status)
}

/// Result type alias using LcpError.
pub type Result<T> = std::result::Result<T, LcpError>;
