//! Drive task forwarding against a scripted brick.

mod common;

use common::{FakeBrick, SET_OUTPUT_STATE};
use nxt_lcp::{spawn_drive_task, Brick, DriveConfig, LcpError};
use tokio::io::duplex;

/// `(port, power)` of every `SetOutputState` the brick received.
fn motor_commands(received: &[Vec<u8>]) -> Vec<(u8, i8)> {
    received
        .iter()
        .filter(|payload| payload[1] == SET_OUTPUT_STATE)
        .map(|payload| (payload[2], payload[3] as i8))
        .collect()
}

#[tokio::test]
async fn test_newest_command_per_port_wins() {
    let (client, server) = duplex(256);
    let fake = FakeBrick::spawn(server);
    let (handle, task) = spawn_drive_task(Brick::connect(client), DriveConfig::default());

    // The drive task cannot run until this test yields.
    for power in [10, 20, 30, 40, 50] {
        handle.submit(0, power).unwrap();
    }
    assert!(!handle.submit(1, -30).unwrap());
    assert_eq!(handle.superseded_count(), 4);
    assert_eq!(handle.pending_count(), 2);

    handle.stop();
    let mut brick = task.await.unwrap().unwrap();
    assert_eq!(motor_commands(&fake.received()), vec![(0, 50), (1, -30)]);

    brick.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_gesture_maps_to_left_and_right_ports() {
    let (client, server) = duplex(256);
    let fake = FakeBrick::spawn(server);
    let config = DriveConfig {
        left_port: 2,
        right_port: 0,
        ..DriveConfig::default()
    };
    let (handle, task) = spawn_drive_task(Brick::connect(client), config);

    handle.submit_gesture(0.25, -0.6).unwrap();
    handle.stop();

    let mut brick = task.await.unwrap().unwrap();
    let mut commands = motor_commands(&fake.received());
    commands.sort();
    assert_eq!(commands, vec![(0, -100), (2, 50)]);

    brick.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_submit_after_stop_rejected() {
    let (client, server) = duplex(256);
    let _fake = FakeBrick::spawn(server);
    let (handle, task) = spawn_drive_task(Brick::connect(client), DriveConfig::default());

    handle.stop();
    assert!(matches!(handle.submit(0, 10), Err(LcpError::SessionClosed)));
    assert!(matches!(handle.submit(7, 10), Err(LcpError::Validation(_))));

    let mut brick = task.await.unwrap().unwrap();
    brick.disconnect().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_fatal_error_ends_drive_task() {
    let (client, server) = duplex(256);
    let _fake = FakeBrick::silent(server);
    let (handle, task) = spawn_drive_task(Brick::connect(client), DriveConfig::default());

    handle.submit(0, 60).unwrap();

    let err = task.await.unwrap().err().unwrap();
    assert!(matches!(err, LcpError::Timeout { .. }));
    assert!(matches!(handle.submit(0, 0), Err(LcpError::SessionClosed)));
}
