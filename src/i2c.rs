//! I2C bus probe for the on-board ADC.
//!
//! There is no way to ask which address the converter answers on, so
//! [`I2c::open`] tries each candidate in order, validating it with a single
//! zero-byte write, and keeps the first one that acknowledges.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::{HardwareBackend, I2cHandle};
use crate::error::I2cError;

/// Bus addresses probed by [`I2c::open`], in order.
pub const CANDIDATE_ADDRESSES: [u16; 2] = [0x48, 0x4b];

/// The I2C device node to open.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum I2cDevice {
    /// `/dev/i2c-0`, used by the earliest Raspberry Pi revisions
    Old,
    /// `/dev/i2c-1`
    New,
}

impl I2cDevice {
    pub fn path(self) -> &'static str {
        match self {
            I2cDevice::Old => "/dev/i2c-0",
            I2cDevice::New => "/dev/i2c-1",
        }
    }
}

impl fmt::Display for I2cDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Analog input channels of the converter, one register each.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum I2cPin {
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
}

impl I2cPin {
    pub const ALL: [I2cPin; 8] = [
        I2cPin::A0,
        I2cPin::A1,
        I2cPin::A2,
        I2cPin::A3,
        I2cPin::A4,
        I2cPin::A5,
        I2cPin::A6,
        I2cPin::A7,
    ];

    /// Register number backing this input.
    pub fn register(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for I2cPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}", self.register())
    }
}

/// A validated connection to the converter. Closed on drop.
pub struct I2c {
    address: u16,
    handle: I2cHandle,
    backend: Arc<dyn HardwareBackend>,
}

impl I2c {
    /// Probe [`CANDIDATE_ADDRESSES`] on `device` (or the backend's default
    /// bus when `None`) and keep the first that acknowledges.
    pub fn open(
        backend: Arc<dyn HardwareBackend>,
        device: Option<I2cDevice>,
    ) -> Result<Self, I2cError> {
        let path = device.map(I2cDevice::path);

        for address in CANDIDATE_ADDRESSES {
            let handle = match backend.i2c_open(path, address) {
                Ok(handle) => handle,
                Err(e) => {
                    debug!(address = format_args!("0x{address:02x}"), error = %e, "I2C open failed");
                    continue;
                }
            };

            let result = backend.i2c_write(handle, 0);
            if result >= 0 {
                info!(
                    address = format_args!("0x{address:02x}"),
                    device = path.unwrap_or("default"),
                    "I2C bus validated"
                );
                return Ok(Self {
                    address,
                    handle,
                    backend,
                });
            }

            debug!(address = format_args!("0x{address:02x}"), result, "I2C address did not respond");
            backend.i2c_close(handle);
        }

        Err(I2cError::NotReachable)
    }

    /// The bus address that answered the probe.
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Read the register behind `pin`.
    pub fn read(&self, pin: I2cPin) -> Result<u8, I2cError> {
        let register = pin.register();
        self.backend
            .i2c_read_reg8(self.handle, register)
            .map_err(|source| I2cError::ReadFailed { register, source })
    }

    /// Read the register behind `pin`, substituting `0` on failure.
    ///
    /// This is lossy: a failed read is indistinguishable from a genuine zero.
    /// Prefer [`I2c::read`] unless that ambiguity is acceptable.
    pub fn read_or_zero(&self, pin: I2cPin) -> u8 {
        self.read(pin).unwrap_or(0)
    }
}

impl Drop for I2c {
    fn drop(&mut self) {
        self.backend.i2c_close(self.handle);
        debug!(address = format_args!("0x{:02x}", self.address), "I2C bus closed");
    }
}

impl fmt::Debug for I2c {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("I2c")
            .field("address", &format_args!("0x{:02x}", self.address))
            .field("handle", &self.handle)
            .finish()
    }
}
