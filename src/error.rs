//! Error types for gpiolease
//!
//! Each component surfaces a small, closed error enum so callers can match
//! on the exact condition. [`Error`] wraps all of them for code that only
//! needs to propagate with `?`.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use thiserror::Error;

use crate::pin::Pin;
use crate::pwm::PwmChannel;

// ============================================================================
// Backend Errors
// ============================================================================

/// Failure reported by a [`HardwareBackend`](crate::backend::HardwareBackend).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be initialised (missing device, permissions, etc.)
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The address is not something this backend can drive
    #[error("Invalid address: {0}")]
    InvalidAddress(u32),

    /// The operation is not supported by this backend for the given address
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The underlying device call failed
    #[error("IO error: {0}")]
    Io(String),
}

// ============================================================================
// Component Errors
// ============================================================================

/// Errors raised when leasing a pin.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LeaseError {
    /// A live handle for this pin already exists
    #[error("Pin in use: {0}")]
    PinInUse(Pin),

    /// The current board does not expose this pin
    #[error("Pin not found on this board: {0}")]
    PinNotFound(Pin),

    /// Configuring the pin on the backend failed; nothing was leased
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Errors raised when creating a software or hardware PWM.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PwmError {
    /// The pin is not one of the fixed hardware PWM pins
    #[error("No hardware PWM on pin {0}")]
    NotFound(Pin),

    /// The hardware channel behind the pin is already leased
    #[error("Hardware PWM channel in use: {0}")]
    InUse(PwmChannel),

    /// A software PWM needs a cycle of at least one 100µs unit
    #[error("Invalid PWM range: {0}")]
    InvalidRange(u32),

    /// Software PWM frequencies must be within 1..=10000 Hz
    #[error("Invalid PWM frequency: {0} Hz (must be 1-10000)")]
    InvalidFrequency(u32),

    /// The timing thread could not be spawned
    #[error("Failed to start PWM thread: {0}")]
    Spawn(String),

    /// Leasing the underlying pin failed
    #[error(transparent)]
    Lease(#[from] LeaseError),

    /// Programming the PWM registers failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Errors raised by the I2C bus probe and register reads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum I2cError {
    /// No candidate address answered the validation write
    #[error("I2C bus not reachable")]
    NotReachable,

    /// Reading a register from a validated bus failed
    #[error("I2C read of register {register} failed: {source}")]
    ReadFailed {
        register: u8,
        #[source]
        source: BackendError,
    },
}

// ============================================================================
// Primary Error Type
// ============================================================================

/// The primary error type for gpiolease operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors (invalid config, unknown board, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pin lease errors
    #[error("Lease error: {0}")]
    Lease(#[from] LeaseError),

    /// PWM errors
    #[error("PWM error: {0}")]
    Pwm(#[from] PwmError),

    /// I2C errors
    #[error("I2C error: {0}")]
    I2c(#[from] I2cError),

    /// Backend errors outside of a lease
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for gpiolease operations.
pub type Result<T> = std::result::Result<T, Error>;
