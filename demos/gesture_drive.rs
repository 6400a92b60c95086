//! Gesture Drive - steer two motors from a stream of gesture values.
//!
//! This example demonstrates:
//! - Handing a session to the drive task with `spawn_drive_task`
//! - Submitting gesture updates faster than the brick acknowledges them
//! - Taking the session back and releasing the motors
//!
//! Each stdin line holds two values in roughly `[-1.0, 1.0]`, one per motor:
//!
//! ```text
//! $ some-hand-tracker | cargo run --example gesture_drive -- --device /dev/rfcomm0
//! 0.10 0.12
//! 0.25 -0.25
//! ```

use std::path::PathBuf;

use clap::Parser;
use nxt_lcp::{spawn_drive_task, Brick, DriveConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "gesture_drive")]
#[command(about = "Drive NXT motors from gesture values on stdin", long_about = None)]
struct Args {
    /// Serial device the brick is paired on
    #[arg(short, long, default_value = "/dev/rfcomm0")]
    device: PathBuf,

    /// Motor port for the first value (0 = A)
    #[arg(long, default_value_t = 0)]
    left: u8,

    /// Motor port for the second value (1 = B)
    #[arg(long, default_value_t = 1)]
    right: u8,

    /// Multiplier applied before clamping to [-100, 100]
    #[arg(long, default_value_t = nxt_lcp::drive::DEFAULT_GESTURE_SCALE)]
    scale: f32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nxt_lcp=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = DriveConfig {
        gesture_scale: args.scale,
        left_port: args.left,
        right_port: args.right,
    };

    let brick = Brick::open(&args.device).await?;
    let (handle, task) = spawn_drive_task(brick, config);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let values: Vec<f32> = line
            .split_whitespace()
            .filter_map(|v| v.parse().ok())
            .collect();
        let [left, right] = values[..] else {
            tracing::warn!("Skipping malformed gesture line: {:?}", line);
            continue;
        };
        if let Err(e) = handle.submit_gesture(left, right) {
            tracing::error!("Drive task stopped: {}", e);
            break;
        }
    }

    handle.stop();
    tracing::info!("{} gesture updates superseded", handle.superseded_count());

    let mut brick = task.await??;
    brick.disconnect().await?;
    Ok(())
}
