//! Dedicated drive task for high-frequency motor commands.
//!
//! A gesture tracker produces new control values faster than the brick can
//! acknowledge `SetOutputState` commands. Instead of queueing every update,
//! producers write into one pending slot per motor port and the drive task
//! forwards whatever is newest when the link is free.
//!
//! # Architecture
//!
//! ```text
//! Gesture source ─┐
//! Other producer ─┼─► DriveHandle::submit ─► [slot A][slot B][slot C][all] ─► Drive Task ─► Brick
//!                 │        (replaces the pending command for that port)
//! ```
//!
//! - **Bounded**: at most one pending command per port plus one for all ports
//! - **Keep latest**: a newer command for a port supersedes the pending one
//! - **Never blocks the producer**: `submit` only takes a short lock

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::error::{LcpError, Result};
use crate::session::Brick;
use crate::types::{OutputCommand, ALL_MOTOR_PORTS, MAX_POWER, MIN_POWER, MOTOR_PORT_COUNT};

/// Default factor mapping a gesture value to motor power.
pub const DEFAULT_GESTURE_SCALE: f32 = 200.0;

const SLOT_COUNT: usize = MOTOR_PORT_COUNT as usize + 1;
const ALL_PORTS_SLOT: usize = MOTOR_PORT_COUNT as usize;

/// Configuration for the drive task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveConfig {
    /// Gesture value multiplier before rounding and clamping.
    pub gesture_scale: f32,
    /// Motor port receiving the first (left) gesture value.
    pub left_port: u8,
    /// Motor port receiving the second (right) gesture value.
    pub right_port: u8,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            gesture_scale: DEFAULT_GESTURE_SCALE,
            left_port: 0,
            right_port: 1,
        }
    }
}

/// Map a gesture value (roughly `[-1.0, 1.0]`) to a motor power.
///
/// `power = round(value × scale)`, clamped to `[-100, 100]`. Non-finite values
/// map to zero.
pub fn gesture_to_power(value: f32, scale: f32) -> i8 {
    let power = value * scale;
    if !power.is_finite() {
        return 0;
    }
    power.round().clamp(MIN_POWER as f32, MAX_POWER as f32) as i8
}

#[derive(Default)]
struct Slots {
    pending: [Option<OutputCommand>; SLOT_COUNT],
    stopped: bool,
}

impl Slots {
    fn take_batch(&mut self) -> Vec<OutputCommand> {
        // All-ports first so per-port commands submitted after it still win.
        let mut batch = Vec::with_capacity(SLOT_COUNT);
        if let Some(command) = self.pending[ALL_PORTS_SLOT].take() {
            batch.push(command);
        }
        batch.extend(self.pending[..ALL_PORTS_SLOT].iter_mut().filter_map(Option::take));
        batch
    }
}

struct Shared {
    slots: Mutex<Slots>,
    notify: Notify,
    superseded: AtomicUsize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handle for submitting motor commands to the drive task.
///
/// This is cheaply cloneable and can be shared across producers.
#[derive(Clone)]
pub struct DriveHandle {
    shared: Arc<Shared>,
    config: DriveConfig,
}

impl DriveHandle {
    /// Queue a motor command, replacing any pending command for the same port.
    ///
    /// An all-ports command also replaces every pending per-port command.
    /// Returns `true` if a pending command was superseded.
    pub fn submit_command(&self, command: OutputCommand) -> Result<bool> {
        let index = if command.port == ALL_MOTOR_PORTS {
            ALL_PORTS_SLOT
        } else if command.port < MOTOR_PORT_COUNT {
            command.port as usize
        } else {
            return Err(LcpError::Validation(format!(
                "Motor port {} out of range 0..{}",
                command.port, MOTOR_PORT_COUNT
            )));
        };

        let superseded = {
            let mut slots = self.shared.lock();
            if slots.stopped {
                return Err(LcpError::SessionClosed);
            }
            let mut superseded = 0;
            if index == ALL_PORTS_SLOT {
                for slot in slots.pending[..ALL_PORTS_SLOT].iter_mut() {
                    superseded += slot.take().is_some() as usize;
                }
            }
            superseded += slots.pending[index].replace(command).is_some() as usize;
            superseded
        };

        self.shared.notify.notify_one();

        if superseded > 0 {
            self.shared.superseded.fetch_add(superseded, Ordering::Relaxed);
            tracing::trace!(
                "Superseded {} pending command(s) for port {}",
                superseded,
                command.port
            );
        }
        Ok(superseded > 0)
    }

    /// Run `port` at `power` with no regulation and no tacho limit.
    pub fn submit(&self, port: u8, power: i8) -> Result<bool> {
        self.submit_command(OutputCommand::run(port, power))
    }

    /// Map one gesture update onto the left and right motor ports.
    pub fn submit_gesture(&self, left: f32, right: f32) -> Result<()> {
        let scale = self.config.gesture_scale;
        self.submit(self.config.left_port, gesture_to_power(left, scale))?;
        self.submit(self.config.right_port, gesture_to_power(right, scale))?;
        Ok(())
    }

    /// Number of commands dropped because a newer one replaced them.
    pub fn superseded_count(&self) -> usize {
        self.shared.superseded.load(Ordering::Relaxed)
    }

    /// Number of commands waiting for the drive task.
    pub fn pending_count(&self) -> usize {
        self.shared.lock().pending.iter().filter(|slot| slot.is_some()).count()
    }

    /// Stop accepting commands. The task forwards what is pending, then ends.
    pub fn stop(&self) {
        self.shared.lock().stopped = true;
        self.shared.notify.notify_one();
    }
}

/// Spawn the drive task and return a handle for submitting commands.
///
/// The task owns the session until [`DriveHandle::stop`] is called, then hands
/// it back through the `JoinHandle` so the caller can
/// [`disconnect`](Brick::disconnect). A fatal session error ends the task with
/// that error and rejects further submissions.
pub fn spawn_drive_task<S>(
    brick: Brick<S>,
    config: DriveConfig,
) -> (DriveHandle, JoinHandle<Result<Brick<S>>>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let shared = Arc::new(Shared {
        slots: Mutex::new(Slots::default()),
        notify: Notify::new(),
        superseded: AtomicUsize::new(0),
    });

    let handle = DriveHandle {
        shared: shared.clone(),
        config,
    };
    let task = tokio::spawn(drive_loop(brick, shared));

    (handle, task)
}

/// Main drive loop - forwards the newest command per port to the brick.
async fn drive_loop<S>(mut brick: Brick<S>, shared: Arc<Shared>) -> Result<Brick<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let (batch, stopped) = {
            let mut slots = shared.lock();
            (slots.take_batch(), slots.stopped)
        };

        if batch.is_empty() {
            if stopped {
                tracing::debug!("Drive task stopped");
                return Ok(brick);
            }
            shared.notify.notified().await;
            continue;
        }

        for command in batch {
            match brick.set_output_state(&command).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() || brick.is_closed() => {
                    shared.lock().stopped = true;
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("Motor command for port {} failed: {}", command.port, e);
                }
            }
        }
    }
}
