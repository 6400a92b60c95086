//! # nxt-lcp
//!
//! Async driver for the NXT brick's LCP command protocol over a serial link.
//!
//! This crate lets a host query the brick's identity, battery and firmware,
//! configure sensor ports, drive and query motors, start and stop programs,
//! and write mailbox messages, returning the brick to a safe state when the
//! session ends.
//!
//! ## Architecture
//!
//! - **Transport**: exclusively owned byte channel with read/write deadlines
//! - **Frame codec**: 2-byte little-endian length prefix, structured replies
//! - **Command set**: per-opcode payload builders and typed reply decoders
//! - **Session** ([`Brick`]): one method per operation, shutdown sequence
//! - **Drive task**: keep-latest motor command queue for gesture input
//!
//! ## Example
//!
//! ```ignore
//! use nxt_lcp::{Brick, SensorKind, SensorMode};
//!
//! #[tokio::main]
//! async fn main() -> nxt_lcp::Result<()> {
//!     let mut brick = Brick::open("/dev/rfcomm0").await?;
//!
//!     let info = brick.get_device_info().await?;
//!     println!("{} at {:.2} V", info.name, brick.get_battery_level().await?);
//!
//!     brick.set_input_mode(0, SensorKind::Switch, SensorMode::Boolean).await?;
//!     let touch = brick.get_input_values(0).await?;
//!     println!("pressed: {}", touch.scaled != 0);
//!
//!     brick.disconnect().await
//! }
//! ```

pub mod codec;
pub mod command;
pub mod config;
pub mod drive;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod types;

mod session;

pub use config::SessionConfig;
pub use drive::{gesture_to_power, spawn_drive_task, DriveConfig, DriveHandle};
pub use error::{LcpError, Result};
pub use session::{Brick, BrickBuilder, SessionState};
pub use types::{
    DeviceInfo, InputValue, OutputCommand, OutputMode, OutputState, RegulationMode, RunState,
    SensorKind, SensorMode, Version, VersionInfo, ALL_MOTOR_PORTS,
};
