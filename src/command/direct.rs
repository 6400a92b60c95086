//! Direct commands: motors, sensors, sound, programs and mailboxes.

use bytes::{Buf, BufMut, BytesMut};

use super::{ensure_data_len, Opcode, Request};
use crate::codec::TextCodec;
use crate::error::{LcpError, Result};
use crate::types::{
    InputValue, OutputCommand, OutputMode, OutputState, RegulationMode, RunState, SensorKind,
    SensorMode, ALL_MOTOR_PORTS, MAX_POWER, MIN_POWER, MOTOR_PORT_COUNT, SENSOR_PORT_COUNT,
};

/// Size of the program file name buffer.
pub const FILENAME_BUFFER_SIZE: usize = 20;

/// Longest program file name (one byte is reserved for the terminator).
pub const MAX_PROGRAM_NAME_LEN: usize = FILENAME_BUFFER_SIZE - 1;

/// Longest mailbox message (one byte is reserved for the terminator).
pub const MAX_MESSAGE_LEN: usize = 59;

/// Number of mailboxes on the brick.
pub const MAILBOX_COUNT: u8 = 10;

const OUTPUT_STATE_DATA_LEN: usize = 22;
const INPUT_VALUES_DATA_LEN: usize = 13;
const BATTERY_DATA_LEN: usize = 2;

fn check_sensor_port(port: u8) -> Result<()> {
    if port >= SENSOR_PORT_COUNT {
        return Err(LcpError::Validation(format!(
            "Sensor port {} out of range 0..{}",
            port, SENSOR_PORT_COUNT
        )));
    }
    Ok(())
}

fn check_motor_port(port: u8, allow_all: bool) -> Result<()> {
    if port < MOTOR_PORT_COUNT || (allow_all && port == ALL_MOTOR_PORTS) {
        return Ok(());
    }
    Err(LcpError::Validation(format!(
        "Motor port {} out of range 0..{}",
        port, MOTOR_PORT_COUNT
    )))
}

fn check_percent(name: &str, value: i8) -> Result<()> {
    if !(MIN_POWER..=MAX_POWER).contains(&value) {
        return Err(LcpError::Validation(format!(
            "{} {} out of range {}..={}",
            name, value, MIN_POWER, MAX_POWER
        )));
    }
    Ok(())
}

/// Start the program stored as `name` (e.g. `"demo.rxe"`).
///
/// Names longer than 19 bytes are rejected, not truncated: a truncated name
/// would start a different file.
pub fn start_program(name: &str) -> Result<Request> {
    if name.len() > MAX_PROGRAM_NAME_LEN {
        return Err(LcpError::Validation(format!(
            "Program name '{}' is {} bytes, maximum is {}",
            name,
            name.len(),
            MAX_PROGRAM_NAME_LEN
        )));
    }
    let args = TextCodec::encode_fixed(name, FILENAME_BUFFER_SIZE);
    Ok(Request::new(Opcode::StartProgram, args.into()))
}

/// Stop the running program.
pub fn stop_program() -> Request {
    Request::bare(Opcode::StopProgram)
}

/// Play a tone of `frequency` Hz for `duration_ms` milliseconds.
pub fn play_tone(frequency: u16, duration_ms: u16) -> Request {
    let mut args = BytesMut::with_capacity(4);
    args.put_u16_le(frequency);
    args.put_u16_le(duration_ms);
    Request::new(Opcode::PlayTone, args.freeze())
}

/// Drive a motor port, or all of them with [`ALL_MOTOR_PORTS`].
pub fn set_output_state(command: &OutputCommand) -> Result<Request> {
    check_motor_port(command.port, true)?;
    check_percent("Power", command.power)?;
    check_percent("Turn ratio", command.turn_ratio)?;

    let mut args = BytesMut::with_capacity(10);
    args.put_u8(command.port);
    args.put_i8(command.power);
    args.put_u8(command.mode.bits());
    args.put_u8(command.regulation.into());
    args.put_i8(command.turn_ratio);
    args.put_u8(command.run_state.bits());
    args.put_u32_le(command.tacho_limit);
    Ok(Request::new(Opcode::SetOutputState, args.freeze()))
}

/// Configure the sensor attached to an input port.
pub fn set_input_mode(port: u8, kind: SensorKind, mode: SensorMode) -> Result<Request> {
    check_sensor_port(port)?;
    let args = vec![port, kind.into(), mode.into()];
    Ok(Request::new(Opcode::SetInputMode, args.into()))
}

/// Query a motor port.
pub fn get_output_state(port: u8) -> Result<Request> {
    check_motor_port(port, false)?;
    Ok(Request::new(Opcode::GetOutputState, vec![port].into()))
}

/// Decode the data of a `GetOutputState` reply.
pub fn decode_output_state(data: &[u8]) -> Result<OutputState> {
    ensure_data_len(Opcode::GetOutputState, data, OUTPUT_STATE_DATA_LEN)?;
    let mut buf = data;

    let port = buf.get_u8();
    let power = buf.get_i8();
    if !(MIN_POWER..=MAX_POWER).contains(&power) {
        return Err(LcpError::Decode {
            field: "power",
            value: power as u8,
        });
    }
    let mode = OutputMode::try_from(buf.get_u8())?;
    let regulation = RegulationMode::try_from(buf.get_u8())?;
    let turn_ratio = buf.get_i8();
    let run_state = RunState::try_from(buf.get_u8())?;

    Ok(OutputState {
        port,
        power,
        mode,
        regulation,
        turn_ratio,
        run_state,
        tacho_limit: buf.get_u32_le(),
        tacho_count: buf.get_i32_le(),
        block_tacho_count: buf.get_i32_le(),
        rotation_count: buf.get_i32_le(),
    })
}

/// Query a sensor port.
pub fn get_input_values(port: u8) -> Result<Request> {
    check_sensor_port(port)?;
    Ok(Request::new(Opcode::GetInputValues, vec![port].into()))
}

/// Decode the data of a `GetInputValues` reply.
pub fn decode_input_values(data: &[u8]) -> Result<InputValue> {
    ensure_data_len(Opcode::GetInputValues, data, INPUT_VALUES_DATA_LEN)?;
    let mut buf = data;

    let port = buf.get_u8();
    let valid = buf.get_u8() != 0;
    let calibrated = buf.get_u8() != 0;
    let kind = SensorKind::try_from(buf.get_u8())?;
    let mode = SensorMode::try_from(buf.get_u8())?;

    Ok(InputValue {
        port,
        valid,
        calibrated,
        kind,
        mode,
        raw: buf.get_u16_le(),
        normalized: buf.get_u16_le(),
        scaled: buf.get_i16_le(),
        calibrated_value: buf.get_i16_le(),
    })
}

/// Reset the scaled value (e.g. a transition counter) of a sensor port.
pub fn reset_input_scaled_value(port: u8) -> Result<Request> {
    check_sensor_port(port)?;
    Ok(Request::new(Opcode::ResetInputScaledValue, vec![port].into()))
}

/// Send `text` to a mailbox, truncating it to 59 bytes.
pub fn message_write(mailbox: u8, text: &str) -> Result<Request> {
    if mailbox >= MAILBOX_COUNT {
        return Err(LcpError::Validation(format!(
            "Mailbox {} out of range 0..{}",
            mailbox, MAILBOX_COUNT
        )));
    }
    let message = TextCodec::truncate(text, MAX_MESSAGE_LEN);

    let mut args = BytesMut::with_capacity(message.len() + 3);
    args.put_u8(mailbox);
    args.put_u8(message.len() as u8 + 1);
    args.put_slice(message.as_bytes());
    args.put_u8(0);
    Ok(Request::new(Opcode::MessageWrite, args.freeze()))
}

/// Reset a motor's position counter, relative to the last movement or absolute.
pub fn reset_motor_position(port: u8, relative: bool) -> Result<Request> {
    check_motor_port(port, false)?;
    Ok(Request::new(
        Opcode::ResetMotorPosition,
        vec![port, relative as u8].into(),
    ))
}

/// Query the battery voltage.
pub fn get_battery_level() -> Request {
    Request::bare(Opcode::GetBatteryLevel)
}

/// Decode the raw millivolt reading of a `GetBatteryLevel` reply.
pub fn decode_battery_millivolts(data: &[u8]) -> Result<u16> {
    ensure_data_len(Opcode::GetBatteryLevel, data, BATTERY_DATA_LEN)?;
    let mut buf = data;
    Ok(buf.get_u16_le())
}

/// Decode a `GetBatteryLevel` reply to volts.
pub fn decode_battery_level(data: &[u8]) -> Result<f32> {
    Ok(decode_battery_millivolts(data)? as f32 / 1000.0)
}

/// Keep the brick from entering sleep mode.
pub fn keep_alive() -> Request {
    Request::bare(Opcode::KeepAlive)
}
