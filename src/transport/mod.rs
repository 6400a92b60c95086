//! Transport module - the duplex byte channel to the brick.
//!
//! Provides:
//! - [`Transport`]: exclusive owner of any `AsyncRead + AsyncWrite` stream,
//!   enforcing independent read and write deadlines
//! - [`open_device`]: opens a serial/RFCOMM device node (e.g. `/dev/rfcomm0`)

mod serial;

pub use serial::{
    open_device, open_device_with_timeouts, Transport, DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT,
};
