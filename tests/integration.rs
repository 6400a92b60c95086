//! Integration tests for nxt-lcp.
//!
//! These tests verify the integration between the command builders, the
//! frame layer and the reply decoders.

use bytes::Bytes;
use nxt_lcp::command::{direct, system, Opcode};
use nxt_lcp::protocol::{build_frame, class, Reply, MAX_PAYLOAD_SIZE};
use nxt_lcp::{LcpError, OutputCommand, SensorKind, SensorMode};

/// Every operation's class byte, opcode and reply length on the wire.
#[test]
fn test_command_table() {
    let cases = [
        (direct::start_program("a.rxe").unwrap(), class::DIRECT, 0x00, Some(3)),
        (direct::stop_program(), class::DIRECT, 0x01, Some(3)),
        (direct::play_tone(440, 200), class::DIRECT_NO_REPLY, 0x03, None),
        (
            direct::set_output_state(&OutputCommand::run(0, 50)).unwrap(),
            class::DIRECT,
            0x04,
            Some(3),
        ),
        (
            direct::set_input_mode(0, SensorKind::Switch, SensorMode::Boolean).unwrap(),
            class::DIRECT_NO_REPLY,
            0x05,
            None,
        ),
        (direct::get_output_state(0).unwrap(), class::DIRECT, 0x06, Some(25)),
        (direct::get_input_values(0).unwrap(), class::DIRECT, 0x07, Some(16)),
        (direct::reset_input_scaled_value(0).unwrap(), class::DIRECT_NO_REPLY, 0x08, None),
        (direct::message_write(0, "hi").unwrap(), class::DIRECT, 0x09, Some(3)),
        (direct::reset_motor_position(0, true).unwrap(), class::DIRECT_NO_REPLY, 0x0A, None),
        (direct::get_battery_level(), class::DIRECT, 0x0B, Some(5)),
        (direct::keep_alive(), class::DIRECT_NO_REPLY, 0x0D, None),
        (system::get_version(), class::SYSTEM, 0x88, Some(7)),
        (system::set_brick_name("NXT"), class::SYSTEM, 0x98, Some(3)),
        (system::get_device_info(), class::SYSTEM, 0x9B, Some(33)),
    ];

    for (request, class_byte, code, reply_len) in cases {
        let payload = request.payload();
        assert_eq!(payload[0], class_byte, "{}", request.opcode());
        assert_eq!(payload[1], code, "{}", request.opcode());
        assert_eq!(request.opcode().reply_len(), reply_len, "{}", request.opcode());
        assert_eq!(request.expects_reply(), reply_len.is_some());

        let frame = build_frame(&payload).unwrap();
        assert_eq!(frame[..2], (payload.len() as u16).to_le_bytes());
        assert!(frame.len() - 2 <= MAX_PAYLOAD_SIZE);
    }
}

/// Golden bytes for a regulated motor command.
#[test]
fn test_set_output_state_frame() {
    let mut command = OutputCommand::run(1, -60);
    command.tacho_limit = 0x0102_0304;

    let frame = build_frame(&direct::set_output_state(&command).unwrap().payload()).unwrap();
    assert_eq!(
        &frame[..],
        &[
            0x0C, 0x00, // length
            0x00, 0x04, // direct, SetOutputState
            0x01, 0xC4, // port 1, power -60
            0x01, 0x00, 0x00, 0x20, // motor on, idle regulation, no turn, running
            0x04, 0x03, 0x02, 0x01, // tacho limit
        ]
    );
}

/// A query's reply flows through parsing and decoding.
#[test]
fn test_output_state_reply_decodes() {
    let mut reply = vec![0x02, Opcode::GetOutputState.code(), 0x00];
    reply.extend([0x02, 0x32, 0x05, 0x01, 0x00, 0x20]);
    reply.extend(0u32.to_le_bytes());
    reply.extend(1080i32.to_le_bytes());
    reply.extend((-15i32).to_le_bytes());
    reply.extend(1080i32.to_le_bytes());
    assert_eq!(reply.len(), Opcode::GetOutputState.reply_len().unwrap());

    let reply = Reply::parse(0x06, Bytes::from(reply)).unwrap().into_success().unwrap();
    let state = direct::decode_output_state(reply.data()).unwrap();
    assert_eq!(state.port, 2);
    assert_eq!(state.power, 50);
    assert_eq!(state.tacho_count, 1080);
    assert_eq!(state.block_tacho_count, -15);
}

/// A rejected command surfaces its status and opcode.
#[test]
fn test_status_error_reply() {
    let reply = Reply::parse(0x00, Bytes::from_static(&[0x02, 0x00, 0x8F])).unwrap();
    assert!(!reply.is_success());

    let err = reply.into_success().unwrap_err();
    assert!(matches!(err, LcpError::DeviceStatus { opcode: 0x00, status: 0x8F }));
    assert!(!err.is_fatal());
    assert!(err.to_string().contains("0x8F"));
}

/// A reply to a different command is a framing error.
#[test]
fn test_reply_for_wrong_command() {
    let err = Reply::parse(0x0B, Bytes::from_static(&[0x02, 0x06, 0x00])).unwrap_err();
    assert!(matches!(err, LcpError::FrameMismatch { .. }));
    assert!(err.is_fatal());
}

/// Decoded readings serialize for logging and tooling.
#[test]
fn test_readings_serialize_to_json() {
    let data = [0x00, 0x01, 0x00, 0x01, 0x20, 0xB7, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];
    let value = direct::decode_input_values(&data).unwrap();

    let json = serde_json::to_value(value).unwrap();
    assert_eq!(json["kind"], "Switch");
    assert_eq!(json["mode"], "Boolean");
    assert_eq!(json["raw"], 183);
    assert_eq!(json["scaled"], 1);
}
