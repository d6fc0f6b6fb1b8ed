//! CLI configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use sixzone_core::protocol_constants::{DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT};
use sixzone_core::ClientConfig;

/// CLI configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Serial device, e.g. `/dev/ttyUSB0` or `COM3`.
    /// Override: `SIXZONE_PORT`
    pub port: Option<String>,

    /// Override: `SIXZONE_BAUD_RATE`
    pub baud_rate: u32,

    /// Reply timeout in milliseconds.
    /// Override: `SIXZONE_TIMEOUT_MS`
    pub timeout_ms: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl CliConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies overrides from `lookup`; unparsable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("SIXZONE_PORT").filter(|p| !p.is_empty()) {
            self.port = Some(port);
        }

        if let Some(rate) = lookup("SIXZONE_BAUD_RATE").and_then(|v| v.parse().ok()) {
            self.baud_rate = rate;
        }

        if let Some(ms) = lookup("SIXZONE_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.timeout_ms = ms;
        }
    }

    /// Converts to sixzone-core's client configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        let timeout = Duration::from_millis(self.timeout_ms);
        ClientConfig {
            baud_rate: self.baud_rate,
            read_timeout: timeout,
            write_timeout: timeout,
        }
    }
}
