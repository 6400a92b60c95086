//! Protocol module - wire format, framing, and reply parsing.
//!
//! This module implements the LCP framing used on the serial link:
//! - 2-byte little-endian length prefix
//! - Command class bytes (direct/system, reply requested or not)
//! - Reply header (marker, echoed opcode, status) with status catalogue

mod frame;
mod wire_format;

pub use frame::{build_frame, Reply};
pub use wire_format::{
    class, decode_length, encode_length, status_description, ReplyHeader, LENGTH_PREFIX_SIZE,
    MAX_PAYLOAD_SIZE, REPLY_HEADER_SIZE, REPLY_MARKER, STATUS_SUCCESS,
};
