//! Brick Info - query a brick's identity and state.
//!
//! This example demonstrates:
//! - Opening a session with the builder and a JSON config file
//! - Issuing queries and handling a rejected command
//! - Releasing the brick with `disconnect`
//!
//! # Running
//!
//! ```text
//! cargo run --example brick_info -- --device /dev/rfcomm0 --json
//! RUST_LOG=nxt_lcp=debug cargo run --example brick_info -- --rename ROVER
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use nxt_lcp::{Brick, SessionConfig, SensorKind, SensorMode};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "brick_info")]
#[command(about = "Print NXT brick identity, firmware, battery and port state", long_about = None)]
struct Args {
    /// Serial device the brick is paired on
    #[arg(short, long, default_value = "/dev/rfcomm0")]
    device: PathBuf,

    /// JSON session config (read_timeout_ms, write_timeout_ms)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the read deadline in milliseconds
    #[arg(long)]
    read_timeout_ms: Option<u64>,

    /// Rename the brick before querying it
    #[arg(long)]
    rename: Option<String>,

    /// Print a single JSON document instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    device: nxt_lcp::DeviceInfo,
    version: nxt_lcp::VersionInfo,
    battery_volts: f32,
    inputs: Vec<nxt_lcp::InputValue>,
    outputs: Vec<nxt_lcp::OutputState>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nxt_lcp=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SessionConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => SessionConfig::default(),
    };
    if let Some(ms) = args.read_timeout_ms {
        config.read_timeout = Duration::from_millis(ms);
    }

    let mut brick = Brick::builder().config(config).open(&args.device).await?;

    if let Some(name) = &args.rename {
        brick.set_brick_name(name).await?;
    }

    let device = brick.get_device_info().await?;
    let version = brick.get_version().await?;
    let battery_volts = brick.get_battery_level().await?;

    let mut inputs = Vec::new();
    for port in 0..4 {
        inputs.push(brick.get_input_values(port).await?);
    }
    let mut outputs = Vec::new();
    for port in 0..3 {
        outputs.push(brick.get_output_state(port).await?);
    }

    // Fails with a status error when no program is running, which is fine.
    if let Err(e) = brick.stop_program().await {
        tracing::info!("No program stopped: {}", e);
    }

    let report = Report {
        device,
        version,
        battery_volts,
        inputs,
        outputs,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let address: Vec<String> = report
            .device
            .bluetooth_address
            .iter()
            .take(6)
            .map(|b| format!("{:02X}", b))
            .collect();
        println!("Name:      {}", report.device.name);
        println!("Address:   {}", address.join(":"));
        println!("Signal:    {}", report.device.signal_strength);
        println!("Free:      {} bytes", report.device.free_memory);
        println!("Protocol:  {}", report.version.protocol);
        println!("Firmware:  {}", report.version.firmware);
        println!("Battery:   {:.2} V", report.battery_volts);
        for input in &report.inputs {
            let kind = if input.kind == SensorKind::NoSensor && input.mode == SensorMode::Raw {
                "none".to_string()
            } else {
                format!("{:?}/{:?}", input.kind, input.mode)
            };
            println!("Sensor {}:  {} raw={} scaled={}", input.port + 1, kind, input.raw, input.scaled);
        }
        for output in &report.outputs {
            println!(
                "Motor {}:   power={} tacho={}",
                (b'A' + output.port) as char,
                output.power,
                output.tacho_count
            );
        }
    }

    brick.disconnect().await?;
    Ok(())
}
