//! Hardware backends -- the raw register/bus surface the leasing core drives.
//!
//! A backend knows nothing about leases or handles. It reads and writes
//! lines by [`Address`], programs PWM registers and runs I2C transactions.
//! Everything above it (registry, handles, PWM loops) talks to a backend
//! only through the [`HardwareBackend`] trait.
//!
//! # Feature Gates
//!
//! - `rpi`: Enables [`RppalBackend`] (Linux only, via rppal)
//!
//! Without feature flags, only the in-memory [`SimBackend`] is compiled.

pub mod sim;

#[cfg(all(feature = "rpi", target_os = "linux"))]
pub mod rpi;

pub use sim::{BackendEvent, EventKind, SimBackend};

#[cfg(all(feature = "rpi", target_os = "linux"))]
pub use rpi::RppalBackend;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::BackendError;
use crate::pin::{Pull, Value};

/// Backend-specific line number resolved from a [`BoardProfile`](crate::board::BoardProfile).
pub type Address = u32;

/// Result type for backend calls.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Electrical mode of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Input,
    Output,
    PwmOutput,
    /// Inert: no driver attached, PWM peripheral detached.
    Off,
}

/// Opaque handle to an opened I2C connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct I2cHandle(pub u32);

/// The raw capability surface of a board.
///
/// Implementations must be callable from any thread: a software PWM loop
/// drives its pin from a dedicated thread while the owner may still lease
/// other pins.
#[cfg_attr(test, mockall::automock)]
pub trait HardwareBackend: Send + Sync {
    /// Short identifier used in logs (e.g. `"sim"`, `"rppal"`).
    fn name(&self) -> &str;

    fn set_mode(&self, address: Address, mode: Mode) -> BackendResult<()>;

    fn read(&self, address: Address) -> BackendResult<Value>;

    fn write(&self, address: Address, value: Value) -> BackendResult<()>;

    fn set_pull(&self, address: Address, pull: Pull) -> BackendResult<()>;

    /// Write the duty register of the PWM peripheral behind `address`.
    fn pwm_write_duty(&self, address: Address, value: u32) -> BackendResult<()>;

    /// Set the shared PWM range register (duty value for 100%).
    fn pwm_set_range(&self, range: u32) -> BackendResult<()>;

    /// Write the tone frequency register; `0` silences it.
    fn pwm_write_tone(&self, address: Address, frequency: u32) -> BackendResult<()>;

    /// Open a connection to `bus_address` on `device` (e.g. `/dev/i2c-1`), or
    /// on the board's default bus when `device` is `None`.
    fn i2c_open<'a>(
        &self,
        device: Option<&'a str>,
        bus_address: u16,
    ) -> BackendResult<I2cHandle>;

    /// Write a single byte. Returns the backend's result code; negative
    /// means the device did not acknowledge.
    fn i2c_write(&self, handle: I2cHandle, byte: u8) -> i32;

    fn i2c_read_reg8(&self, handle: I2cHandle, register: u8) -> BackendResult<u8>;

    fn i2c_close(&self, handle: I2cHandle);
}

/// Which backend implementation to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-memory simulation (no hardware access)
    #[default]
    Sim,
    /// Raspberry Pi via rppal (requires the `rpi` feature)
    Rpi,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Sim => write!(f, "sim"),
            BackendKind::Rpi => write!(f, "rpi"),
        }
    }
}

/// Construct the backend selected by `kind`.
///
/// Fails with [`BackendError::Unavailable`] when `kind` is `Rpi` but the
/// crate was built without the `rpi` feature or the GPIO device cannot be
/// opened.
pub fn open_backend(kind: BackendKind) -> BackendResult<Arc<dyn HardwareBackend>> {
    match kind {
        BackendKind::Sim => Ok(Arc::new(SimBackend::new())),
        #[cfg(all(feature = "rpi", target_os = "linux"))]
        BackendKind::Rpi => Ok(Arc::new(RppalBackend::new()?)),
        #[cfg(not(all(feature = "rpi", target_os = "linux")))]
        BackendKind::Rpi => Err(BackendError::Unavailable(
            "built without the `rpi` feature".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_sim_backend() {
        let backend = open_backend(BackendKind::Sim).unwrap();
        assert_eq!(backend.name(), "sim");
    }

    #[cfg(not(all(feature = "rpi", target_os = "linux")))]
    #[test]
    fn test_open_rpi_backend_without_feature() {
        let err = open_backend(BackendKind::Rpi).err().unwrap();
        assert!(matches!(err, BackendError::Unavailable(_)));
    }

    #[test]
    fn test_backend_kind_serde() {
        assert_eq!(serde_json::to_string(&BackendKind::Rpi).unwrap(), "\"rpi\"");
        let kind: BackendKind = serde_json::from_str("\"sim\"").unwrap();
        assert_eq!(kind, BackendKind::Sim);
        assert_eq!(BackendKind::default(), BackendKind::Sim);
    }
}
