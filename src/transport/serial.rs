//! Deadline-enforcing byte channel.
//!
//! The serial port itself (baud rate, line discipline, pairing) is set up
//! outside this crate. Anything that is `AsyncRead + AsyncWrite + Unpin` can be
//! wrapped: a device node opened with [`open_device`], a `tokio::io::duplex`
//! pipe in tests, or a third-party serial stream.
//!
//! # Example
//!
//! ```ignore
//! use nxt_lcp::transport::open_device;
//!
//! let mut transport = open_device("/dev/rfcomm0").await?;
//! transport.write_all(&[0x02, 0x00, 0x80, 0x0D]).await?;
//! transport.close().await?;
//! ```

use std::path::Path;
use std::time::Duration;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::error::{LcpError, Result};

/// Default read deadline.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1500);

/// Default write deadline.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Exclusively owned duplex channel with read and write deadlines.
///
/// A timed-out operation is terminal: no partial data is handed back and the
/// caller is expected to close the channel.
pub struct Transport<S> {
    stream: Option<S>,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a stream with the default 1500 ms deadlines.
    pub fn new(stream: S) -> Self {
        Self::with_timeouts(stream, DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT)
    }

    /// Wrap a stream with explicit deadlines.
    pub fn with_timeouts(stream: S, read_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            stream: Some(stream),
            read_timeout,
            write_timeout,
        }
    }

    /// Check if the channel has not been closed yet.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Get the read deadline.
    #[inline]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Get the write deadline.
    #[inline]
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Write the whole buffer and flush it, within the write deadline.
    pub async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let deadline = self.write_timeout;
        let stream = self.stream.as_mut().ok_or(LcpError::SessionClosed)?;

        let write = async {
            stream.write_all(buf).await?;
            stream.flush().await
        };

        match timeout(deadline, write).await {
            Ok(result) => result.map_err(LcpError::Io),
            Err(_) => Err(LcpError::Timeout {
                operation: "write",
                after: deadline,
            }),
        }
    }

    /// Fill `buf` completely, within the read deadline.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let deadline = self.read_timeout;
        let stream = self.stream.as_mut().ok_or(LcpError::SessionClosed)?;

        match timeout(deadline, stream.read_exact(buf)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(LcpError::Io(e)),
            Err(_) => Err(LcpError::Timeout {
                operation: "read",
                after: deadline,
            }),
        }
    }

    /// Close the channel.
    ///
    /// The stream is released on the first call whether or not the shutdown
    /// handshake succeeds; later calls are no-ops.
    pub async fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };

        let result = match timeout(self.write_timeout, stream.shutdown()).await {
            Ok(result) => result.map_err(LcpError::Io),
            Err(_) => Err(LcpError::Timeout {
                operation: "write",
                after: self.write_timeout,
            }),
        };
        drop(stream);
        result
    }
}

/// Open a serial device node (tty or RFCOMM) with the default deadlines.
pub async fn open_device(path: impl AsRef<Path>) -> Result<Transport<File>> {
    open_device_with_timeouts(path, DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT).await
}

/// Open a serial device node with explicit deadlines.
pub async fn open_device_with_timeouts(
    path: impl AsRef<Path>,
    read_timeout: Duration,
    write_timeout: Duration,
) -> Result<Transport<File>> {
    let path = path.as_ref();
    let file = OpenOptions::new().read(true).write(true).open(path).await?;
    tracing::debug!("Opened serial device {}", path.display());
    Ok(Transport::with_timeouts(file, read_timeout, write_timeout))
}
