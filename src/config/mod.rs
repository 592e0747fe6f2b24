//! Configuration management for gpiolease
//!
//! Configuration is loaded from `~/.gpiolease/config.json` with environment variable overrides.

mod types;
pub mod validate;

pub use types::*;

use crate::backend::BackendKind;
use crate::error::Result;
use crate::i2c::I2cDevice;
use std::path::{Path, PathBuf};

impl Config {
    /// Returns the gpiolease configuration directory path (~/.gpiolease)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".gpiolease")
    }

    /// Returns the path to the config file (~/.gpiolease/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// If the config file doesn't exist, returns default configuration.
    /// Environment variables can override config values using the pattern:
    /// `GPIOLEASE_SECTION_KEY`
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse the file at `path` without applying overrides.
    fn read_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Config::default())
        }
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`. Unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("GPIOLEASE_BOARD") {
            if let Ok(board) = val.parse() {
                self.board = board;
            }
        }
        if let Some(val) = lookup("GPIOLEASE_BACKEND") {
            if let Ok(kind) = <BackendKind as clap::ValueEnum>::from_str(&val, true) {
                self.backend = kind;
            }
        }

        // PWM
        if let Some(val) = lookup("GPIOLEASE_PWM_DEFAULT_RANGE") {
            if let Ok(v) = val.parse() {
                self.pwm.default_range = v;
            }
        }

        // I2C
        if let Some(val) = lookup("GPIOLEASE_I2C_DEVICE") {
            if let Ok(device) = <I2cDevice as clap::ValueEnum>::from_str(&val, true) {
                self.i2c.device = Some(device);
            }
        }

        // Logging
        if let Some(val) = lookup("GPIOLEASE_LOGGING_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = lookup("GPIOLEASE_LOGGING_FORMAT") {
            if let Ok(format) = val.parse() {
                self.logging.format = format;
            }
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
