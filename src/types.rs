//! Typed values exchanged with the brick.
//!
//! Enumerations decode from a single byte with `TryFrom<u8>`; a byte outside
//! the known set is a [`LcpError::Decode`] error. Bit-flag fields
//! ([`OutputMode`], [`RunState`]) are newtypes composed with `|`.

use std::fmt;
use std::ops::BitOr;

use serde::Serialize;

use crate::error::LcpError;

/// Number of sensor input ports on the brick.
pub const SENSOR_PORT_COUNT: u8 = 4;

/// Number of motor output ports on the brick.
pub const MOTOR_PORT_COUNT: u8 = 3;

/// Motor port value addressing every output at once.
pub const ALL_MOTOR_PORTS: u8 = 0xFF;

/// Valid motor power range (percent).
pub const MIN_POWER: i8 = -100;
/// Valid motor power range (percent).
pub const MAX_POWER: i8 = 100;

macro_rules! byte_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)+
        }

        impl TryFrom<u8> for $name {
            type Error = LcpError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok($name::$variant),)+
                    _ => Err(LcpError::Decode { field: $field, value }),
                }
            }
        }

        impl From<$name> for u8 {
            #[inline]
            fn from(value: $name) -> u8 {
                value as u8
            }
        }
    };
}

byte_enum! {
    /// Kind of sensor attached to an input port.
    SensorKind, "sensor kind" {
        /// Nothing attached.
        NoSensor = 0x00,
        Switch = 0x01,
        Temperature = 0x02,
        Reflection = 0x03,
        Angle = 0x04,
        LightActive = 0x05,
        LightInactive = 0x06,
        SoundDb = 0x07,
        SoundDba = 0x08,
        Custom = 0x09,
        /// I2C sensor.
        LowSpeed = 0x0A,
        /// I2C sensor powered with 9V.
        LowSpeed9V = 0x0B,
        ColorFull = 0x0D,
        ColorRed = 0x0E,
        ColorGreen = 0x0F,
        ColorBlue = 0x10,
        ColorNone = 0x11,
    }
}

byte_enum! {
    /// How the brick converts a raw sensor reading into the scaled value.
    SensorMode, "sensor mode" {
        Raw = 0x00,
        Boolean = 0x20,
        TransitionCount = 0x40,
        PeriodCount = 0x60,
        PercentFullScale = 0x80,
        Celsius = 0xA0,
        Fahrenheit = 0xC0,
        AngleSteps = 0xE0,
    }
}

byte_enum! {
    /// Motor speed regulation.
    RegulationMode, "regulation mode" {
        Idle = 0x00,
        MotorSpeed = 0x01,
        MotorSync = 0x02,
    }
}

macro_rules! byte_flags {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$cmeta:meta])* $flag:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
        pub struct $name(u8);

        impl $name {
            $($(#[$cmeta])* pub const $flag: $name = $name($value);)+

            /// Union of every known flag.
            pub const ALL: $name = $name(0 $(| $value)+);

            /// No flags set.
            #[inline]
            pub const fn empty() -> Self {
                $name(0)
            }

            /// Raw byte value.
            #[inline]
            pub const fn bits(self) -> u8 {
                self.0
            }

            /// Check if every flag in `other` is set.
            #[inline]
            pub const fn contains(self, other: $name) -> bool {
                self.0 & other.0 == other.0
            }

            /// Check if no flag is set.
            #[inline]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }
        }

        impl BitOr for $name {
            type Output = $name;

            #[inline]
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl TryFrom<u8> for $name {
            type Error = LcpError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                if value & !Self::ALL.0 != 0 {
                    return Err(LcpError::Decode { field: $field, value });
                }
                Ok($name(value))
            }
        }

        impl From<$name> for u8 {
            #[inline]
            fn from(value: $name) -> u8 {
                value.0
            }
        }
    };
}

byte_flags! {
    /// Motor output mode bits.
    OutputMode, "output mode" {
        /// Power the motor.
        MOTOR_ON = 0x01,
        /// Brake between PWM pulses.
        BRAKE = 0x02,
        /// Enable the regulation selected by [`RegulationMode`].
        REGULATED = 0x04,
    }
}

byte_flags! {
    /// Motor run state bits.
    RunState, "run state" {
        RAMP_UP = 0x10,
        RUNNING = 0x20,
        RAMP_DOWN = 0x40,
    }
}

impl RunState {
    /// Motor idle (no bits set).
    pub const IDLE: RunState = RunState::empty();
}

/// One sensor port reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputValue {
    pub port: u8,
    /// The brick considers the reading valid.
    pub valid: bool,
    pub calibrated: bool,
    pub kind: SensorKind,
    pub mode: SensorMode,
    pub raw: u16,
    pub normalized: u16,
    pub scaled: i16,
    /// Value scaled using the calibration curve (currently unused by firmware).
    pub calibrated_value: i16,
}

/// Parameters of a `SetOutputState` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputCommand {
    /// Motor port, or [`ALL_MOTOR_PORTS`].
    pub port: u8,
    /// Power percentage in `[-100, 100]`.
    pub power: i8,
    pub mode: OutputMode,
    pub regulation: RegulationMode,
    /// Turn ratio in `[-100, 100]`, used with [`RegulationMode::MotorSync`].
    pub turn_ratio: i8,
    pub run_state: RunState,
    /// Degrees to run before stopping, 0 = run forever.
    pub tacho_limit: u32,
}

impl OutputCommand {
    /// Run the motor at `power` with no regulation and no tacho limit.
    pub fn run(port: u8, power: i8) -> Self {
        Self {
            port,
            power,
            mode: OutputMode::MOTOR_ON,
            regulation: RegulationMode::Idle,
            turn_ratio: 0,
            run_state: RunState::RUNNING,
            tacho_limit: 0,
        }
    }

    /// Zero power, idle regulation and run state.
    pub fn idle(port: u8) -> Self {
        Self {
            port,
            power: 0,
            mode: OutputMode::empty(),
            regulation: RegulationMode::Idle,
            turn_ratio: 0,
            run_state: RunState::IDLE,
            tacho_limit: 0,
        }
    }
}

/// One motor port status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputState {
    pub port: u8,
    pub power: i8,
    pub mode: OutputMode,
    pub regulation: RegulationMode,
    pub turn_ratio: i8,
    pub run_state: RunState,
    pub tacho_limit: u32,
    /// Count since the last motor reset.
    pub tacho_count: i32,
    /// Count relative to the last programmed movement.
    pub block_tacho_count: i32,
    /// Count relative to the last position reset.
    pub rotation_count: i32,
}

/// Brick identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub bluetooth_address: [u8; 7],
    pub signal_strength: u32,
    /// Free user flash in bytes.
    pub free_memory: u32,
}

/// A `major.minor` version pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    /// The version as the real number `major.minor` (1.124 for firmware 1.124).
    pub fn as_f32(&self) -> f32 {
        self.to_string().parse().unwrap_or(self.major as f32)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Protocol and firmware versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub protocol: Version,
    pub firmware: Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_kind_decode() {
        assert_eq!(SensorKind::try_from(0x00).unwrap(), SensorKind::NoSensor);
        assert_eq!(SensorKind::try_from(0x05).unwrap(), SensorKind::LightActive);
        assert_eq!(SensorKind::try_from(0x11).unwrap(), SensorKind::ColorNone);
        assert_eq!(u8::from(SensorKind::LowSpeed9V), 0x0B);
    }

    #[test]
    fn test_unknown_sensor_kind_rejected() {
        let err = SensorKind::try_from(0x0C).unwrap_err();
        assert!(matches!(
            err,
            LcpError::Decode {
                field: "sensor kind",
                value: 0x0C
            }
        ));
        assert!(SensorKind::try_from(0x12).is_err());
    }

    #[test]
    fn test_sensor_mode_decode() {
        assert_eq!(SensorMode::try_from(0x80).unwrap(), SensorMode::PercentFullScale);
        assert_eq!(SensorMode::try_from(0xE0).unwrap(), SensorMode::AngleSteps);
        // Slope bits are not part of the closed set.
        assert!(SensorMode::try_from(0x81).is_err());
    }

    #[test]
    fn test_regulation_mode_decode() {
        assert_eq!(RegulationMode::try_from(2).unwrap(), RegulationMode::MotorSync);
        assert!(RegulationMode::try_from(3).is_err());
    }

    #[test]
    fn test_output_mode_bit_composition() {
        let mode = OutputMode::MOTOR_ON | OutputMode::BRAKE | OutputMode::REGULATED;
        assert_eq!(mode.bits(), 0x07);
        assert!(mode.contains(OutputMode::BRAKE));
        assert_eq!(OutputMode::try_from(0x07).unwrap(), mode);
        assert_eq!(OutputMode::try_from(0x05).unwrap(), OutputMode::MOTOR_ON | OutputMode::REGULATED);
    }

    #[test]
    fn test_output_mode_unknown_bits_rejected() {
        assert!(OutputMode::try_from(0x08).is_err());
        assert!(OutputMode::try_from(0x81).is_err());
    }

    #[test]
    fn test_run_state_flags() {
        assert!(RunState::IDLE.is_empty());
        assert_eq!(RunState::try_from(0x20).unwrap(), RunState::RUNNING);
        assert_eq!(
            RunState::try_from(0x30).unwrap(),
            RunState::RAMP_UP | RunState::RUNNING
        );
        assert!(RunState::try_from(0x01).is_err());
        assert!(RunState::try_from(0x80).is_err());
    }

    #[test]
    fn test_version_display_and_real_number() {
        let firmware = Version { major: 1, minor: 124 };
        assert_eq!(firmware.to_string(), "1.124");
        assert!((firmware.as_f32() - 1.124).abs() < 1e-6);

        let protocol = Version { major: 1, minor: 5 };
        assert!((protocol.as_f32() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_output_command_presets() {
        let run = OutputCommand::run(1, -40);
        assert_eq!(run.mode, OutputMode::MOTOR_ON);
        assert_eq!(run.run_state, RunState::RUNNING);
        assert_eq!(run.tacho_limit, 0);

        let idle = OutputCommand::idle(2);
        assert_eq!(idle.power, 0);
        assert!(idle.mode.is_empty());
        assert_eq!(idle.regulation, RegulationMode::Idle);
        assert!(idle.run_state.is_empty());
    }
}
