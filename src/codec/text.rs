//! Text codec - fixed-size zero-padded buffers.
//!
//! The brick stores names in fixed buffers terminated by a zero byte.
//! Encoding truncates on a UTF-8 character boundary so the visible text
//! always fits in `size - 1` bytes; decoding stops at the first zero.
//!
//! # Example
//!
//! ```
//! use nxt_lcp::codec::TextCodec;
//!
//! let buf = TextCodec::encode_fixed("NXT", 16);
//! assert_eq!(buf.len(), 16);
//! assert_eq!(TextCodec::decode_terminated(&buf), "NXT");
//! ```

/// Codec for zero-terminated text fields.
pub struct TextCodec;

impl TextCodec {
    /// Longest prefix of `text` that fits in `max_bytes` bytes.
    pub fn truncate(text: &str, max_bytes: usize) -> &str {
        if text.len() <= max_bytes {
            return text;
        }
        let mut end = max_bytes;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }

    /// Encode into a zero-padded buffer of exactly `size` bytes.
    ///
    /// Text longer than `size - 1` bytes is truncated; the last byte is
    /// always zero.
    pub fn encode_fixed(text: &str, size: usize) -> Vec<u8> {
        let mut buf = vec![0u8; size];
        if size == 0 {
            return buf;
        }
        let visible = Self::truncate(text, size - 1);
        buf[..visible.len()].copy_from_slice(visible.as_bytes());
        buf
    }

    /// Decode the bytes before the first zero byte.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; the brick only ever
    /// stores ASCII here.
    pub fn decode_terminated(buf: &[u8]) -> String {
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        String::from_utf8_lossy(&buf[..end]).into_owned()
    }
}
