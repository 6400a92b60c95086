//! Session configuration.
//!
//! Defaults match the brick's Bluetooth serial link. Configuration can be
//! built in code (see [`BrickBuilder`](crate::BrickBuilder)) or loaded from
//! JSON, with every field optional:
//!
//! ```
//! use nxt_lcp::SessionConfig;
//! use std::time::Duration;
//!
//! let config = SessionConfig::from_json_str(r#"{ "read_timeout_ms": 2000 }"#).unwrap();
//! assert_eq!(config.read_timeout, Duration::from_millis(2000));
//! assert_eq!(config.write_timeout, Duration::from_millis(1500));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LcpError, Result};
use crate::transport::{DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT};

/// Timeouts applied to the session's channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Deadline for each blocking read.
    #[serde(rename = "read_timeout_ms", with = "millis")]
    pub read_timeout: Duration,
    /// Deadline for each write + flush.
    #[serde(rename = "write_timeout_ms", with = "millis")]
    pub write_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject zero deadlines, which would fail every operation.
    pub fn validate(&self) -> Result<()> {
        if self.read_timeout.is_zero() {
            return Err(LcpError::Config("read timeout must be non-zero".to_string()));
        }
        if self.write_timeout.is_zero() {
            return Err(LcpError::Config("write timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
