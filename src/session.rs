//! Brick session and builder.
//!
//! The [`BrickBuilder`] configures deadlines and opens the channel. The
//! [`Brick`] owns that channel for its whole lifetime and exposes one method
//! per protocol operation. Every method borrows the session mutably and
//! completes its request/reply exchange before returning, so at most one
//! command is ever in flight.
//!
//! # Lifecycle
//!
//! ```text
//! connect ──► Idle ⇄ AwaitingResponse ──► Closed
//!                 │                        ▲
//!                 └── disconnect() ────────┘
//! ```
//!
//! A timeout, I/O failure or malformed reply leaves stale bytes on the link,
//! so the session closes its channel immediately and every later call fails
//! with [`LcpError::SessionClosed`] without touching the channel. A non-zero
//! status byte arrives on a well-formed reply and leaves the session usable.
//!
//! # Example
//!
//! ```ignore
//! use nxt_lcp::{Brick, OutputCommand};
//!
//! let mut brick = Brick::builder().open("/dev/rfcomm0").await?;
//! println!("battery: {:.2} V", brick.get_battery_level().await?);
//! brick.set_output_state(&OutputCommand::run(0, 75)).await?;
//! brick.disconnect().await?;
//! ```

use std::path::Path;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::codec::{FrameCodec, TextCodec};
use crate::command::{direct, system, Request};
use crate::config::SessionConfig;
use crate::error::{LcpError, Result};
use crate::protocol::Reply;
use crate::transport::{open_device_with_timeouts, Transport};
use crate::types::{
    DeviceInfo, InputValue, OutputCommand, OutputState, SensorKind, SensorMode, VersionInfo,
    MOTOR_PORT_COUNT, SENSOR_PORT_COUNT,
};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, no command in flight.
    Idle,
    /// A command was sent and its reply is being read.
    AwaitingResponse,
    /// Channel released; open a new session to continue.
    Closed,
}

/// Builder for configuring and connecting a [`Brick`] session.
#[derive(Debug, Clone, Default)]
pub struct BrickBuilder {
    config: SessionConfig,
}

impl BrickBuilder {
    /// Create a builder with the default 1500 ms deadlines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the read deadline.
    ///
    /// Default: 1500 ms
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set the write deadline.
    ///
    /// Default: 1500 ms
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    /// Start a session over an already opened stream.
    pub fn connect<S>(self, stream: S) -> Result<Brick<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.config.validate()?;
        let transport = Transport::with_timeouts(
            stream,
            self.config.read_timeout,
            self.config.write_timeout,
        );
        Ok(Brick::from_transport(transport, self.config))
    }

    /// Open a serial device node and start a session over it.
    pub async fn open(self, path: impl AsRef<Path>) -> Result<Brick<File>> {
        self.config.validate()?;
        let transport = open_device_with_timeouts(
            path,
            self.config.read_timeout,
            self.config.write_timeout,
        )
        .await?;
        Ok(Brick::from_transport(transport, self.config))
    }
}

/// A connected brick.
///
/// Call [`disconnect`](Brick::disconnect) to release sensors and motors before
/// dropping the session; dropping only closes the channel.
pub struct Brick<S> {
    codec: FrameCodec<S>,
    state: SessionState,
    config: SessionConfig,
}

impl Brick<File> {
    /// Create a new session builder.
    ///
    /// The builder can also [`connect`](BrickBuilder::connect) any other stream.
    pub fn builder() -> BrickBuilder {
        BrickBuilder::new()
    }

    /// Open a serial device node with the default configuration.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        BrickBuilder::new().open(path).await
    }
}

impl<S> Brick<S> {
    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if the session can no longer issue commands.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// The configuration this session was opened with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl<S> Brick<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Start a session over `stream` with the default configuration.
    pub fn connect(stream: S) -> Self {
        Self::from_transport(Transport::new(stream), SessionConfig::default())
    }

    /// Start a session over an existing transport.
    pub fn from_transport(transport: Transport<S>, config: SessionConfig) -> Self {
        tracing::info!("Brick session connected");
        Self {
            codec: FrameCodec::new(transport),
            state: SessionState::Idle,
            config,
        }
    }

    /// Send a request and, if it has one, read its reply.
    ///
    /// The session stays `AwaitingResponse` from before the first byte is
    /// written until the reply is fully read. If this future is dropped
    /// midway the marker remains, and the next command refuses to run.
    async fn exchange(&mut self, request: &Request) -> Result<Option<Reply>> {
        let opcode = request.opcode();
        self.state = SessionState::AwaitingResponse;
        self.codec.send(&request.payload()).await?;

        let Some(expected_len) = opcode.reply_len() else {
            self.state = SessionState::Idle;
            tracing::debug!("Sent {}", opcode);
            return Ok(None);
        };

        let reply = self.codec.read_reply(opcode.code(), expected_len).await?;
        self.state = SessionState::Idle;
        tracing::debug!("Sent {}, reply status 0x{:02X}", opcode, reply.status());

        reply.into_success().map(Some)
    }

    /// Run one command, closing the session on fatal errors.
    async fn execute(&mut self, request: &Request) -> Result<Option<Reply>> {
        match self.state {
            SessionState::Closed => return Err(LcpError::SessionClosed),
            SessionState::AwaitingResponse => {
                let e = LcpError::Desynced {
                    opcode: request.opcode().code(),
                };
                tracing::error!("Previous command was cancelled, closing session");
                self.abort().await;
                return Err(e);
            }
            SessionState::Idle => {}
        }

        match self.exchange(request).await {
            Ok(reply) => Ok(reply),
            Err(e) if e.is_fatal() => {
                tracing::error!("{} failed, closing session: {}", request.opcode(), e);
                self.abort().await;
                Err(e)
            }
            Err(e) => {
                tracing::warn!("{} rejected: {}", request.opcode(), e);
                Err(e)
            }
        }
    }

    async fn query(&mut self, request: &Request) -> Result<Reply> {
        self.execute(request)
            .await?
            .ok_or_else(|| LcpError::FrameMismatch {
                opcode: request.opcode().code(),
                detail: "no reply read for a query".to_string(),
            })
    }

    async fn command(&mut self, request: &Request) -> Result<()> {
        self.execute(request).await.map(|_| ())
    }

    /// Release the channel after a fatal error.
    async fn abort(&mut self) {
        self.state = SessionState::Closed;
        if let Err(e) = self.codec.close().await {
            tracing::debug!("Closing desynced channel failed: {}", e);
        }
    }

    /// Query name, Bluetooth address, signal strength and free memory.
    pub async fn get_device_info(&mut self) -> Result<DeviceInfo> {
        let reply = self.query(&system::get_device_info()).await?;
        system::decode_device_info(reply.data())
    }

    /// Query protocol and firmware versions.
    pub async fn get_version(&mut self) -> Result<VersionInfo> {
        let reply = self.query(&system::get_version()).await?;
        system::decode_version(reply.data())
    }

    /// Battery voltage in volts.
    pub async fn get_battery_level(&mut self) -> Result<f32> {
        let reply = self.query(&direct::get_battery_level()).await?;
        direct::decode_battery_level(reply.data())
    }

    /// Rename the brick; names longer than 15 bytes are truncated.
    pub async fn set_brick_name(&mut self, name: &str) -> Result<()> {
        let visible = TextCodec::truncate(name, system::MAX_BRICK_NAME_LEN);
        if visible.len() < name.len() {
            tracing::debug!("Brick name truncated to '{}'", visible);
        }
        self.command(&system::set_brick_name(name)).await
    }

    /// Play a tone (no reply).
    pub async fn play_tone(&mut self, frequency: u16, duration_ms: u16) -> Result<()> {
        self.command(&direct::play_tone(frequency, duration_ms)).await
    }

    /// Configure a sensor port (no reply).
    pub async fn set_input_mode(
        &mut self,
        port: u8,
        kind: SensorKind,
        mode: SensorMode,
    ) -> Result<()> {
        let request = direct::set_input_mode(port, kind, mode)?;
        self.command(&request).await
    }

    /// Read a sensor port.
    pub async fn get_input_values(&mut self, port: u8) -> Result<InputValue> {
        let request = direct::get_input_values(port)?;
        let reply = self.query(&request).await?;
        direct::decode_input_values(reply.data())
    }

    /// Reset a sensor port's scaled value (no reply).
    pub async fn reset_input_scaled_value(&mut self, port: u8) -> Result<()> {
        let request = direct::reset_input_scaled_value(port)?;
        self.command(&request).await
    }

    /// Drive one motor port, or all with [`ALL_MOTOR_PORTS`](crate::types::ALL_MOTOR_PORTS).
    pub async fn set_output_state(&mut self, command: &OutputCommand) -> Result<()> {
        let request = direct::set_output_state(command)?;
        self.command(&request).await
    }

    /// Read a motor port.
    pub async fn get_output_state(&mut self, port: u8) -> Result<OutputState> {
        let request = direct::get_output_state(port)?;
        let reply = self.query(&request).await?;
        direct::decode_output_state(reply.data())
    }

    /// Reset a motor's position counter (no reply).
    pub async fn reset_motor_position(&mut self, port: u8, relative: bool) -> Result<()> {
        let request = direct::reset_motor_position(port, relative)?;
        self.command(&request).await
    }

    /// Write to a mailbox; text longer than 59 bytes is truncated.
    pub async fn message_write(&mut self, mailbox: u8, text: &str) -> Result<()> {
        let request = direct::message_write(mailbox, text)?;
        self.command(&request).await
    }

    /// Start a stored program. Names over 19 bytes fail before anything is sent.
    pub async fn start_program(&mut self, name: &str) -> Result<()> {
        let request = direct::start_program(name)?;
        self.command(&request).await
    }

    /// Stop the running program.
    pub async fn stop_program(&mut self) -> Result<()> {
        self.command(&direct::stop_program()).await
    }

    /// Keep the brick awake (no reply).
    pub async fn keep_alive(&mut self) -> Result<()> {
        self.command(&direct::keep_alive()).await
    }

    /// Put the brick in a safe state and close the channel.
    ///
    /// Sets all four sensor ports to no sensor, then all three motor ports to
    /// zero power with idle regulation and run state, then closes. A failing
    /// step does not stop the sequence. Once the link is out of sync the
    /// remaining steps are still written but their replies are not awaited.
    /// Returns the first step failure, if any, once the channel is closed.
    /// Calling this on a closed session is a no-op.
    pub async fn disconnect(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        tracing::info!("Disconnecting brick session");

        let mut cleanup = Cleanup {
            in_sync: self.state == SessionState::Idle,
            first_error: None,
        };

        for port in 0..SENSOR_PORT_COUNT {
            let request = direct::set_input_mode(port, SensorKind::NoSensor, SensorMode::Raw);
            self.cleanup_step(request, &mut cleanup).await;
        }
        for port in 0..MOTOR_PORT_COUNT {
            let request = direct::set_output_state(&OutputCommand::idle(port));
            self.cleanup_step(request, &mut cleanup).await;
        }
        let first_error = cleanup.first_error;

        self.state = SessionState::Closed;
        let closed = self.codec.close().await;

        match first_error {
            Some(e) => Err(e),
            None => closed,
        }
    }

    async fn cleanup_step(&mut self, request: Result<Request>, cleanup: &mut Cleanup) {
        let outcome = match request {
            Ok(request) if cleanup.in_sync => self.exchange(&request).await.map(|_| ()),
            Ok(request) => self.codec.send(&request.payload()).await,
            Err(e) => Err(e),
        };
        if let Err(e) = outcome {
            tracing::warn!("Cleanup step failed, continuing: {}", e);
            if e.is_fatal() {
                cleanup.in_sync = false;
            }
            cleanup.first_error.get_or_insert(e);
        }
    }
}

/// Progress of the shutdown sequence.
struct Cleanup {
    /// Replies can still be matched to requests.
    in_sync: bool,
    first_error: Option<LcpError>,
}

impl<S> Drop for Brick<S> {
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            tracing::warn!("Brick session dropped without disconnect; motors were not released");
        }
    }
}
