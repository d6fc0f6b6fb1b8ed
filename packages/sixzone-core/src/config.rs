//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol_constants::{DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT};
use crate::transport::SerialSettings;

/// Configuration shared by the blocking and async clients.
///
/// All fields have sensible defaults for the amplifier's stock firmware.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Serial line speed.
    pub baud_rate: u32,

    /// How long to wait for each reply line.
    #[serde(with = "crate::transport::serial::millis")]
    pub read_timeout: Duration,

    /// How long a single write may take. A write that runs out of time is
    /// reported as a timeout.
    #[serde(with = "crate::transport::serial::millis")]
    pub write_timeout: Duration,
}

impl ClientConfig {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.baud_rate == 0 {
            return Err("baud_rate must be >= 1".to_string());
        }
        if self.read_timeout.is_zero() {
            return Err("read_timeout must be > 0 (a zero timeout never sees a reply)".to_string());
        }
        if self.write_timeout.is_zero() {
            return Err("write_timeout must be > 0".to_string());
        }
        Ok(())
    }

    /// Port settings derived from this configuration.
    #[must_use]
    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings {
            baud_rate: self.baud_rate,
            timeout: self.write_timeout,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_TIMEOUT,
        }
    }
}
