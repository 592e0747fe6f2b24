//! Raspberry Pi backend -- native rppal access.
//!
//! Only compiled when the `rpi` feature is enabled and target is Linux.
//! Addresses are BCM GPIO numbers. Hardware PWM goes through the kernel
//! PWM driver (`dtoverlay=pwm-2chan`), so the duty/range registers are
//! emulated here and translated to a duty-cycle fraction.

#![cfg(all(feature = "rpi", target_os = "linux"))]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use rppal::gpio::{Gpio, IoPin, Level, Mode as GpioMode, PullUpDown};
use rppal::i2c::I2c;
use rppal::pwm::{Channel, Polarity, Pwm};
use tracing::debug;

use super::{Address, BackendResult, HardwareBackend, I2cHandle, Mode};
use crate::error::BackendError;
use crate::pin::{Pull, Value};

/// Carrier frequency used until a tone frequency is written.
const DEFAULT_PWM_FREQUENCY_HZ: f64 = 1_000.0;

/// Range register value after reset.
const DEFAULT_PWM_RANGE: u32 = 1024;

struct PwmState {
    pwm: Pwm,
    duty: u32,
}

/// RPi backend -- direct access via rppal.
pub struct RppalBackend {
    gpio: Gpio,
    pins: Mutex<HashMap<Address, IoPin>>,
    pwm: Mutex<HashMap<u8, PwmState>>,
    pwm_range: AtomicU32,
    buses: Mutex<HashMap<u32, I2c>>,
    next_handle: AtomicU32,
}

fn io_err(e: impl std::fmt::Display) -> BackendError {
    BackendError::Io(e.to_string())
}

fn bcm(address: Address) -> BackendResult<u8> {
    u8::try_from(address).map_err(|_| BackendError::InvalidAddress(address))
}

/// PWM channel and pin function for the four PWM-capable BCM lines.
fn pwm_route(address: Address) -> BackendResult<(Channel, GpioMode)> {
    match address {
        12 => Ok((Channel::Pwm0, GpioMode::Alt0)),
        18 => Ok((Channel::Pwm0, GpioMode::Alt5)),
        13 => Ok((Channel::Pwm1, GpioMode::Alt0)),
        19 => Ok((Channel::Pwm1, GpioMode::Alt5)),
        _ => Err(BackendError::Unsupported(format!(
            "no PWM peripheral on BCM {address}"
        ))),
    }
}

fn channel_key(channel: Channel) -> u8 {
    match channel {
        Channel::Pwm0 => 0,
        _ => 1,
    }
}

fn bus_for_device(device: &str) -> BackendResult<u8> {
    device
        .strip_prefix("/dev/i2c-")
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| BackendError::Unsupported(format!("not an I2C device path: {device}")))
}

impl RppalBackend {
    /// Open `/dev/gpiomem`.
    pub fn new() -> BackendResult<Self> {
        let gpio = Gpio::new().map_err(|e| BackendError::Unavailable(format!("GPIO init: {e}")))?;
        Ok(Self {
            gpio,
            pins: Mutex::new(HashMap::new()),
            pwm: Mutex::new(HashMap::new()),
            pwm_range: AtomicU32::new(DEFAULT_PWM_RANGE),
            buses: Mutex::new(HashMap::new()),
            next_handle: AtomicU32::new(0),
        })
    }

    fn with_pin<T>(
        &self,
        address: Address,
        f: impl FnOnce(&mut IoPin) -> BackendResult<T>,
    ) -> BackendResult<T> {
        let mut pins = self.pins.lock().unwrap();
        if !pins.contains_key(&address) {
            let pin = self
                .gpio
                .get(bcm(address)?)
                .map_err(|e| io_err(format!("GPIO get pin {address}: {e}")))?
                .into_io(GpioMode::Input);
            pins.insert(address, pin);
        }
        let pin = pins
            .get_mut(&address)
            .ok_or(BackendError::InvalidAddress(address))?;
        f(pin)
    }

    fn duty_fraction(&self, duty: u32) -> f64 {
        let range = self.pwm_range.load(Ordering::SeqCst).max(1);
        (duty.min(range) as f64) / (range as f64)
    }

    fn enable_pwm(&self, address: Address) -> BackendResult<()> {
        let (channel, function) = pwm_route(address)?;
        self.with_pin(address, |pin| {
            pin.set_mode(function);
            Ok(())
        })?;
        let pwm = Pwm::with_frequency(channel, DEFAULT_PWM_FREQUENCY_HZ, 0.0, Polarity::Normal, true)
            .map_err(io_err)?;
        self.pwm
            .lock()
            .unwrap()
            .insert(channel_key(channel), PwmState { pwm, duty: 0 });
        Ok(())
    }

    fn release_line(&self, address: Address) {
        if let Ok((channel, _)) = pwm_route(address) {
            if let Some(state) = self.pwm.lock().unwrap().remove(&channel_key(channel)) {
                let _ = state.pwm.disable();
            }
        }
        // Dropping the IoPin restores the line's previous mode.
        self.pins.lock().unwrap().remove(&address);
    }
}

impl HardwareBackend for RppalBackend {
    fn name(&self) -> &str {
        "rppal"
    }

    fn set_mode(&self, address: Address, mode: Mode) -> BackendResult<()> {
        debug!(address, ?mode, "rppal set_mode");
        match mode {
            Mode::Input => self.with_pin(address, |pin| {
                pin.set_mode(GpioMode::Input);
                Ok(())
            }),
            Mode::Output => self.with_pin(address, |pin| {
                pin.set_mode(GpioMode::Output);
                Ok(())
            }),
            Mode::PwmOutput => self.enable_pwm(address),
            Mode::Off => {
                self.release_line(address);
                Ok(())
            }
        }
    }

    fn read(&self, address: Address) -> BackendResult<Value> {
        self.with_pin(address, |pin| {
            Ok(match pin.read() {
                Level::High => Value::On,
                Level::Low => Value::Off,
            })
        })
    }

    fn write(&self, address: Address, value: Value) -> BackendResult<()> {
        let level = match value {
            Value::On => Level::High,
            Value::Off => Level::Low,
        };
        self.with_pin(address, |pin| {
            pin.write(level);
            Ok(())
        })
    }

    fn set_pull(&self, address: Address, pull: Pull) -> BackendResult<()> {
        let pud = match pull {
            Pull::Up => PullUpDown::PullUp,
            Pull::Down => PullUpDown::PullDown,
            Pull::Neither => PullUpDown::Off,
        };
        self.with_pin(address, |pin| {
            pin.set_pullupdown(pud);
            Ok(())
        })
    }

    fn pwm_write_duty(&self, address: Address, value: u32) -> BackendResult<()> {
        let (channel, _) = pwm_route(address)?;
        let fraction = self.duty_fraction(value);
        let mut channels = self.pwm.lock().unwrap();
        match channels.get_mut(&channel_key(channel)) {
            Some(state) => {
                state.pwm.set_duty_cycle(fraction).map_err(io_err)?;
                state.duty = value;
                Ok(())
            }
            // The duty register is written before the pin is switched to
            // PWM; there is nothing to program yet.
            None => Ok(()),
        }
    }

    fn pwm_set_range(&self, range: u32) -> BackendResult<()> {
        self.pwm_range.store(range, Ordering::SeqCst);
        Ok(())
    }

    fn pwm_write_tone(&self, address: Address, frequency: u32) -> BackendResult<()> {
        if frequency == 0 {
            return Ok(());
        }
        let (channel, _) = pwm_route(address)?;
        let channels = self.pwm.lock().unwrap();
        if let Some(state) = channels.get(&channel_key(channel)) {
            let fraction = self.duty_fraction(state.duty);
            state
                .pwm
                .set_frequency(frequency as f64, fraction)
                .map_err(io_err)?;
        }
        Ok(())
    }

    fn i2c_open<'a>(
        &self,
        device: Option<&'a str>,
        bus_address: u16,
    ) -> BackendResult<I2cHandle> {
        let mut i2c = match device {
            Some(path) => I2c::with_bus(bus_for_device(path)?).map_err(io_err)?,
            None => I2c::new().map_err(io_err)?,
        };
        i2c.set_slave_address(bus_address).map_err(io_err)?;
        let handle = self.next_handle.fetch_add(1, Ordering::SeqCst);
        self.buses.lock().unwrap().insert(handle, i2c);
        Ok(I2cHandle(handle))
    }

    fn i2c_write(&self, handle: I2cHandle, byte: u8) -> i32 {
        let mut buses = self.buses.lock().unwrap();
        let Some(i2c) = buses.get_mut(&handle.0) else {
            return -1;
        };
        match i2c.write(&[byte]) {
            Ok(written) => written as i32,
            Err(e) => {
                debug!(handle = handle.0, error = %e, "I2C write failed");
                -1
            }
        }
    }

    fn i2c_read_reg8(&self, handle: I2cHandle, register: u8) -> BackendResult<u8> {
        let buses = self.buses.lock().unwrap();
        let i2c = buses
            .get(&handle.0)
            .ok_or_else(|| BackendError::Io(format!("I2C handle {} not open", handle.0)))?;
        i2c.smbus_read_byte(register).map_err(io_err)
    }

    fn i2c_close(&self, handle: I2cHandle) {
        self.buses.lock().unwrap().remove(&handle.0);
    }
}
