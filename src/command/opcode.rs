//! Opcode table.

use std::fmt;

use crate::protocol::class;

/// Every operation the driver issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    StartProgram,
    StopProgram,
    PlayTone,
    SetOutputState,
    SetInputMode,
    GetOutputState,
    GetInputValues,
    ResetInputScaledValue,
    MessageWrite,
    ResetMotorPosition,
    GetBatteryLevel,
    KeepAlive,
    GetVersion,
    SetBrickName,
    GetDeviceInfo,
}

impl Opcode {
    /// Opcode byte (payload byte 1).
    pub const fn code(self) -> u8 {
        match self {
            Opcode::StartProgram => 0x00,
            Opcode::StopProgram => 0x01,
            Opcode::PlayTone => 0x03,
            Opcode::SetOutputState => 0x04,
            Opcode::SetInputMode => 0x05,
            Opcode::GetOutputState => 0x06,
            Opcode::GetInputValues => 0x07,
            Opcode::ResetInputScaledValue => 0x08,
            Opcode::MessageWrite => 0x09,
            Opcode::ResetMotorPosition => 0x0A,
            Opcode::GetBatteryLevel => 0x0B,
            Opcode::KeepAlive => 0x0D,
            Opcode::GetVersion => 0x88,
            Opcode::SetBrickName => 0x98,
            Opcode::GetDeviceInfo => 0x9B,
        }
    }

    /// Command class byte (payload byte 0), including the no-reply bit.
    pub const fn class(self) -> u8 {
        match self {
            Opcode::PlayTone
            | Opcode::SetInputMode
            | Opcode::ResetInputScaledValue
            | Opcode::ResetMotorPosition
            | Opcode::KeepAlive => class::DIRECT_NO_REPLY,
            Opcode::GetVersion | Opcode::SetBrickName | Opcode::GetDeviceInfo => class::SYSTEM,
            _ => class::DIRECT,
        }
    }

    /// Expected reply length prefix, or `None` for fire-and-forget commands.
    pub const fn reply_len(self) -> Option<usize> {
        match self {
            Opcode::StartProgram
            | Opcode::StopProgram
            | Opcode::SetOutputState
            | Opcode::MessageWrite
            | Opcode::SetBrickName => Some(3),
            Opcode::GetBatteryLevel => Some(5),
            Opcode::GetVersion => Some(7),
            Opcode::GetInputValues => Some(16),
            Opcode::GetOutputState => Some(25),
            Opcode::GetDeviceInfo => Some(33),
            Opcode::PlayTone
            | Opcode::SetInputMode
            | Opcode::ResetInputScaledValue
            | Opcode::ResetMotorPosition
            | Opcode::KeepAlive => None,
        }
    }

    /// Operation name for logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            Opcode::StartProgram => "StartProgram",
            Opcode::StopProgram => "StopProgram",
            Opcode::PlayTone => "PlayTone",
            Opcode::SetOutputState => "SetOutputState",
            Opcode::SetInputMode => "SetInputMode",
            Opcode::GetOutputState => "GetOutputState",
            Opcode::GetInputValues => "GetInputValues",
            Opcode::ResetInputScaledValue => "ResetInputScaledValue",
            Opcode::MessageWrite => "MessageWrite",
            Opcode::ResetMotorPosition => "ResetMotorPosition",
            Opcode::GetBatteryLevel => "GetBatteryLevel",
            Opcode::KeepAlive => "KeepAlive",
            Opcode::GetVersion => "GetVersion",
            Opcode::SetBrickName => "SetBrickName",
            Opcode::GetDeviceInfo => "GetDeviceInfo",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), self.code())
    }
}
