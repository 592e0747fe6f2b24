//! gpiolease - exclusive, drop-safe access to GPIO pins, PWM and I2C
//!
//! A [`GpioController`] hands out handles for the pins of one [`Board`].
//! At most one live handle exists per pin (and per hardware PWM channel);
//! dropping a handle parks its output and makes the resource available again
//! without any release call.
//!
//! ```
//! use std::sync::Arc;
//! use gpiolease::{Board, Direction, GpioController, Pin, SimBackend, Value};
//!
//! let ctl = GpioController::new(Board::RaspberryPi3, Arc::new(SimBackend::new()));
//! let led = ctl.gpio(Pin::P17, Direction::Out, Value::On).unwrap();
//! assert!(ctl.gpio(Pin::P17, Direction::Out, Value::On).is_err());
//! drop(led);
//! assert!(ctl.gpio(Pin::P17, Direction::Out, Value::On).is_ok());
//! ```

pub mod backend;
pub mod board;
pub mod config;
pub mod controller;
pub mod error;
pub mod gpio;
pub mod i2c;
pub mod pin;
pub mod pwm;
pub mod registry;
pub mod timing;
pub mod utils;

pub use backend::{open_backend, BackendKind, HardwareBackend, Mode, SimBackend};
pub use board::{Board, BoardProfile};
pub use config::Config;
pub use controller::GpioController;
pub use error::{BackendError, Error, I2cError, LeaseError, PwmError, Result};
pub use gpio::Gpio;
pub use i2c::{I2c, I2cDevice, I2cPin};
pub use pin::{Direction, Pin, Pull, Value};
pub use pwm::{HardwarePwm, HardwarePwmPin, PulseWidthModulation, PwmChannel, SoftwarePwm};
pub use registry::{Lease, LeaseRegistry};
