//! Configuration schema definitions.
//!
//! All sections default field-by-field, so a file only needs to name what
//! differs from the built-in values.

use super::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How to reach the instrument
    pub connection: ConnectionConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Check the values the controller relies on.
    pub fn validate(&self) -> ConfigResult<()> {
        self.connection.validate()
    }
}

/// Which physical link to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// RS-232 / USB virtual COM port
    #[default]
    Serial,
    /// TCP socket
    Net,
}

impl std::str::FromStr for ConnectionKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serial" => Ok(Self::Serial),
            "net" | "tcp" => Ok(Self::Net),
            other => Err(ConfigError::validation(
                "connection.kind",
                format!("expected 'serial' or 'net', got '{other}'"),
            )),
        }
    }
}

/// Connection section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Link type
    pub kind: ConnectionKind,
    /// Serial device path, used when `kind = "serial"`
    pub serial_port: String,
    /// Serial baud rate
    pub baud_rate: u32,
    /// Remote host, used when `kind = "net"`
    pub host: String,
    /// Remote TCP port
    pub port: u16,
    /// Read deadline per response, in milliseconds
    pub read_timeout_ms: u64,
    /// TCP connect timeout, in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            kind: ConnectionKind::Serial,
            serial_port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            host: "127.0.0.1".to_string(),
            port: 5000,
            read_timeout_ms: 500,
            connect_timeout_ms: 2000,
        }
    }
}

impl ConnectionConfig {
    /// Read deadline as a Duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Connect timeout as a Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "connection.read_timeout_ms",
                "must be greater than zero",
            ));
        }

        match self.kind {
            ConnectionKind::Serial => {
                if self.serial_port.trim().is_empty() {
                    return Err(ConfigError::validation(
                        "connection.serial_port",
                        "required when kind = \"serial\"",
                    ));
                }
                if self.baud_rate == 0 {
                    return Err(ConfigError::validation(
                        "connection.baud_rate",
                        "must be greater than zero",
                    ));
                }
            }
            ConnectionKind::Net => {
                if self.host.trim().is_empty() {
                    return Err(ConfigError::validation(
                        "connection.host",
                        "required when kind = \"net\"",
                    ));
                }
                if self.port == 0 {
                    return Err(ConfigError::validation(
                        "connection.port",
                        "must be greater than zero",
                    ));
                }
                if self.connect_timeout_ms == 0 {
                    return Err(ConfigError::validation(
                        "connection.connect_timeout_ms",
                        "must be greater than zero",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(ConfigError::validation(
                "logging.format",
                format!("expected 'json', 'pretty' or 'compact', got '{other}'"),
            )),
        }
    }
}
