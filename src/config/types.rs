//! Configuration type definitions for gpiolease
//!
//! All types implement serde traits for JSON serialization and have sensible defaults,
//! so a partial (or missing) config file is always valid.

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;
use crate::board::Board;
use crate::i2c::I2cDevice;

/// Main configuration struct for gpiolease
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Board whose header table resolves logical pins
    pub board: Board,
    /// Hardware backend to drive
    pub backend: BackendKind,
    /// Software PWM defaults
    pub pwm: PwmConfig,
    /// I2C probe settings
    pub i2c: I2cConfig,
    /// Logging output
    pub logging: LoggingConfig,
}

// ============================================================================
// PWM Configuration
// ============================================================================

/// Default cycle length, in 100µs units (100 → 100Hz).
pub const DEFAULT_PWM_RANGE: u32 = 100;

/// Software PWM defaults used by the CLI when no range is given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PwmConfig {
    pub default_range: u32,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            default_range: DEFAULT_PWM_RANGE,
        }
    }
}

// ============================================================================
// I2C Configuration
// ============================================================================

/// I2C probe settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct I2cConfig {
    /// Device to probe; `None` falls back to the board's default bus.
    pub device: Option<I2cDevice>,
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable tracing output
    Pretty,
    /// `[timestamp] [LEVEL] target message {fields}`
    #[default]
    Component,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "component" => Ok(LogFormat::Component),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format: {other}")),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Default filter level when `RUST_LOG` is unset
    pub level: String,
    /// Append JSON logs to this file instead of stderr
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Component,
            level: "info".to_string(),
            file: None,
        }
    }
}
