//! System commands: identity and firmware.

use bytes::Buf;

use super::{ensure_data_len, Opcode, Request};
use crate::codec::TextCodec;
use crate::types::{DeviceInfo, Version, VersionInfo};
use crate::error::Result;

/// Size of the brick name buffer in `SetBrickName`.
pub const BRICK_NAME_BUFFER_SIZE: usize = 16;

/// Longest brick name; longer names are truncated.
pub const MAX_BRICK_NAME_LEN: usize = BRICK_NAME_BUFFER_SIZE - 1;

const DEVICE_NAME_FIELD_LEN: usize = 15;
const BLUETOOTH_ADDRESS_LEN: usize = 7;
const DEVICE_INFO_DATA_LEN: usize = DEVICE_NAME_FIELD_LEN + BLUETOOTH_ADDRESS_LEN + 8;
const VERSION_DATA_LEN: usize = 4;

/// Query protocol and firmware versions.
pub fn get_version() -> Request {
    Request::bare(Opcode::GetVersion)
}

/// Decode a `GetVersion` reply. Each version is sent minor byte first.
pub fn decode_version(data: &[u8]) -> Result<VersionInfo> {
    ensure_data_len(Opcode::GetVersion, data, VERSION_DATA_LEN)?;
    let protocol = Version {
        minor: data[0],
        major: data[1],
    };
    let firmware = Version {
        minor: data[2],
        major: data[3],
    };
    Ok(VersionInfo { protocol, firmware })
}

/// Rename the brick. Names longer than 15 bytes are truncated.
pub fn set_brick_name(name: &str) -> Request {
    let args = TextCodec::encode_fixed(name, BRICK_NAME_BUFFER_SIZE);
    Request::new(Opcode::SetBrickName, args.into())
}

/// Query name, Bluetooth address, signal strength and free memory.
pub fn get_device_info() -> Request {
    Request::bare(Opcode::GetDeviceInfo)
}

/// Decode a `GetDeviceInfo` reply.
pub fn decode_device_info(data: &[u8]) -> Result<DeviceInfo> {
    ensure_data_len(Opcode::GetDeviceInfo, data, DEVICE_INFO_DATA_LEN)?;

    let name = TextCodec::decode_terminated(&data[..DEVICE_NAME_FIELD_LEN]);
    let mut bluetooth_address = [0u8; BLUETOOTH_ADDRESS_LEN];
    bluetooth_address.copy_from_slice(
        &data[DEVICE_NAME_FIELD_LEN..DEVICE_NAME_FIELD_LEN + BLUETOOTH_ADDRESS_LEN],
    );

    let mut buf = &data[DEVICE_NAME_FIELD_LEN + BLUETOOTH_ADDRESS_LEN..];
    let signal_strength = buf.get_u32_le();
    let free_memory = buf.get_u32_le();

    Ok(DeviceInfo {
        name,
        bluetooth_address,
        signal_strength,
        free_memory,
    })
}
