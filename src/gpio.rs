//! Pin handle -- a leased, configured pin.
//!
//! A [`Gpio`] is only created by [`GpioController::gpio`](crate::GpioController::gpio).
//! Every setter goes straight to the backend; nothing is buffered. When the
//! handle is dropped while configured as output it drives the pin `Off`
//! before the lease is given back.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::backend::{Address, BackendResult, HardwareBackend, Mode};
use crate::pin::{Direction, Pin, Pull, Value};
use crate::registry::Lease;

/// Represents and controls a pin on the board.
pub struct Gpio {
    pin: Pin,
    address: Address,
    direction: Direction,
    /// Last commanded output value.
    commanded: Value,
    pull: Pull,
    backend: Arc<dyn HardwareBackend>,
    // Declared last: dropped after `Drop::drop` has parked the pin.
    _lease: Lease<Pin>,
}

impl Gpio {
    /// Configure the backend line and wrap it. Called with the pin lease
    /// already granted; on error the lease is dropped with the partial handle.
    pub(crate) fn configure(
        lease: Lease<Pin>,
        address: Address,
        direction: Direction,
        value: Value,
        backend: Arc<dyn HardwareBackend>,
    ) -> BackendResult<Self> {
        let gpio = Self {
            pin: lease.key(),
            address,
            direction,
            commanded: value,
            pull: Pull::Neither,
            backend,
            _lease: lease,
        };
        gpio.backend.set_mode(address, mode_for(direction))?;
        if direction == Direction::Out {
            gpio.backend.write(address, value)?;
        }
        Ok(gpio)
    }

    /// The logical pin this handle represents.
    pub fn pin(&self) -> Pin {
        self.pin
    }

    /// The backend address the pin resolved to.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Reconfigure the pin mode. Switching to output re-drives the last
    /// commanded value.
    pub fn set_direction(&mut self, direction: Direction) -> BackendResult<()> {
        self.backend.set_mode(self.address, mode_for(direction))?;
        self.direction = direction;
        if direction == Direction::Out {
            self.backend.write(self.address, self.commanded)?;
        }
        Ok(())
    }

    /// Current value: sampled from the line in input mode, the last
    /// commanded value in output mode.
    pub fn value(&self) -> BackendResult<Value> {
        match self.direction {
            Direction::In => self.backend.read(self.address),
            Direction::Out => Ok(self.commanded),
        }
    }

    /// Drive the pin. In input mode the value is still sent to the backend
    /// and remembered for the next switch to output.
    pub fn set_value(&mut self, value: Value) -> BackendResult<()> {
        self.backend.write(self.address, value)?;
        self.commanded = value;
        Ok(())
    }

    /// Flip the commanded output value.
    pub fn toggle(&mut self) -> BackendResult<()> {
        self.set_value(self.commanded.toggled())
    }

    pub fn pull(&self) -> Pull {
        self.pull
    }

    /// Set the pull resistor. Only meaningful in input mode, but accepted in
    /// output mode too.
    pub fn set_pull(&mut self, pull: Pull) -> BackendResult<()> {
        self.backend.set_pull(self.address, pull)?;
        self.pull = pull;
        Ok(())
    }
}

fn mode_for(direction: Direction) -> Mode {
    match direction {
        Direction::In => Mode::Input,
        Direction::Out => Mode::Output,
    }
}

impl Drop for Gpio {
    fn drop(&mut self) {
        // Outputs are parked off before the lease is released.
        if self.direction == Direction::Out {
            if let Err(e) = self.backend.write(self.address, Value::Off) {
                warn!(pin = %self.pin, error = %e, "failed to park output pin");
            }
        }
    }
}

impl fmt::Debug for Gpio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gpio")
            .field("pin", &self.pin)
            .field("address", &self.address)
            .field("direction", &self.direction)
            .field("commanded", &self.commanded)
            .field("pull", &self.pull)
            .finish()
    }
}
