//! Codec module - moving frames and text fields on and off the wire.
//!
//! - [`FrameCodec`] - owns the transport, writes length-prefixed payloads,
//!   reads and validates replies
//! - [`TextCodec`] - fixed-size zero-padded text buffers
//!
//! # Design
//!
//! `TextCodec` is a marker struct with static methods; `FrameCodec` holds the
//! exclusively owned transport for the lifetime of a session.

mod frame;
mod text;

pub use frame::FrameCodec;
pub use text::TextCodec;
