//! GpioController -- the entry point for leasing pins and PWM channels.
//!
//! A controller binds a [`Board`] (which logical pins exist and where they
//! live) to a [`HardwareBackend`] (how to drive them) and owns the two lease
//! registries: one keyed by [`Pin`], one keyed by [`PwmChannel`]. Every
//! handle it issues carries the lease that makes it exclusive.

use std::sync::Arc;

use tracing::debug;

use crate::backend::HardwareBackend;
use crate::board::Board;
use crate::error::{I2cError, LeaseError, PwmError};
use crate::gpio::Gpio;
use crate::i2c::{I2c, I2cDevice};
use crate::log_component;
use crate::pin::{Direction, Pin, Value};
use crate::pwm::{HardwarePwm, HardwarePwmPin, PwmChannel, SoftwarePwm};
use crate::registry::LeaseRegistry;
use crate::timing::range_for_hz;

/// Leases pins and PWM channels of one board.
pub struct GpioController {
    board: Board,
    backend: Arc<dyn HardwareBackend>,
    pins: LeaseRegistry<Pin>,
    channels: LeaseRegistry<PwmChannel>,
}

impl GpioController {
    pub fn new(board: Board, backend: Arc<dyn HardwareBackend>) -> Self {
        log_component!(
            info,
            "controller",
            "GPIO controller ready",
            board = board.profile().name,
            backend = backend.name()
        );
        Self {
            board,
            backend,
            pins: LeaseRegistry::new(),
            channels: LeaseRegistry::new(),
        }
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn backend(&self) -> &Arc<dyn HardwareBackend> {
        &self.backend
    }

    /// Lease `pin` and configure it.
    ///
    /// The backend mode is set (and, for outputs, `value` driven) before the
    /// handle is returned. Fails with [`LeaseError::PinInUse`] while another
    /// handle for `pin` is alive and with [`LeaseError::PinNotFound`] when
    /// the board has no such pin.
    pub fn gpio(&self, pin: Pin, direction: Direction, value: Value) -> Result<Gpio, LeaseError> {
        let profile = self.board.profile();
        self.pins.acquire(pin, LeaseError::PinInUse, |lease| {
            let address = profile
                .address_of(pin)
                .ok_or(LeaseError::PinNotFound(pin))?;
            let gpio = Gpio::configure(lease, address, direction, value, Arc::clone(&self.backend))?;
            debug!(pin = %pin, address, ?direction, "pin leased");
            Ok(gpio)
        })
    }

    /// Start a software PWM on `pin` with a cycle of `range` 100µs units.
    pub fn software_pwm(&self, pin: Pin, duty: f32, range: u32) -> Result<SoftwarePwm, PwmError> {
        if range == 0 {
            return Err(PwmError::InvalidRange(range));
        }
        let gpio = self.gpio(pin, Direction::Out, Value::Off)?;
        SoftwarePwm::start(gpio, duty, range)
    }

    /// Start a software PWM on `pin` at `hz` (range `10_000 / hz`).
    pub fn software_pwm_hz(&self, pin: Pin, duty: f32, hz: u32) -> Result<SoftwarePwm, PwmError> {
        let range = range_for_hz(hz).ok_or(PwmError::InvalidFrequency(hz))?;
        self.software_pwm(pin, duty, range)
    }

    /// Program the hardware PWM channel behind `pin`.
    ///
    /// The channel is leased before the pin, so a second pin aliasing a busy
    /// channel fails with [`PwmError::InUse`] rather than a pin error.
    pub fn hardware_pwm(&self, pin: Pin) -> Result<HardwarePwm, PwmError> {
        let hw_pin = match HardwarePwmPin::for_pin(pin) {
            Some(hw_pin) if self.board.is_raspberry_pi() => hw_pin,
            _ => return Err(PwmError::NotFound(pin)),
        };
        let profile = self.board.profile();

        self.channels
            .acquire(hw_pin.channel(), PwmError::InUse, |channel_lease| {
                self.pins
                    .acquire(pin, |p| LeaseError::PinInUse(p).into(), |pin_lease| {
                        let address = profile
                            .address_of(pin)
                            .ok_or(LeaseError::PinNotFound(pin))?;
                        let pwm = HardwarePwm::configure(
                            hw_pin,
                            address,
                            Arc::clone(&self.backend),
                            channel_lease,
                            pin_lease,
                        )?;
                        Ok(pwm)
                    })
            })
    }

    /// Probe the I2C bus. `None` uses the board's default device.
    pub fn i2c(&self, device: Option<I2cDevice>) -> Result<I2c, I2cError> {
        let device = device.unwrap_or(self.board.profile().default_i2c);
        I2c::open(Arc::clone(&self.backend), Some(device))
    }

    /// Pins with a live handle, sorted.
    pub fn leased_pins(&self) -> Vec<Pin> {
        let mut pins = self.pins.active_keys();
        pins.sort();
        pins
    }

    /// Hardware PWM channels with a live session.
    pub fn leased_channels(&self) -> Vec<PwmChannel> {
        let mut channels = self.channels.active_keys();
        channels.sort_by_key(|c| *c as u8);
        channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{EventKind, Mode, SimBackend};
    use crate::pwm::PulseWidthModulation;

    fn controller(board: Board) -> (GpioController, Arc<SimBackend>) {
        let sim = Arc::new(SimBackend::new());
        (GpioController::new(board, sim.clone()), sim)
    }

    #[test]
    fn test_gpio_lease_configures_before_return() {
        let (ctl, sim) = controller(Board::RaspberryPi3);
        let gpio = ctl.gpio(Pin::P17, Direction::Out, Value::On).unwrap();
        assert_eq!(gpio.address(), 17);
        assert_eq!(sim.mode(17), Some(Mode::Output));
        assert_eq!(sim.level(17), Value::On);
        assert_eq!(ctl.leased_pins(), vec![Pin::P17]);
    }

    #[test]
    fn test_gpio_in_use_then_reclaimed() {
        let (ctl, _sim) = controller(Board::RaspberryPi3);
        let first = ctl.gpio(Pin::P4, Direction::In, Value::Off).unwrap();
        assert_eq!(
            ctl.gpio(Pin::P4, Direction::Out, Value::On).unwrap_err(),
            LeaseError::PinInUse(Pin::P4)
        );
        drop(first);
        assert!(ctl.gpio(Pin::P4, Direction::Out, Value::On).is_ok());
    }

    #[test]
    fn test_unsupported_pin_is_not_found() {
        let (ctl, sim) = controller(Board::Chip);
        for _ in 0..2 {
            assert_eq!(
                ctl.gpio(Pin::P40, Direction::Out, Value::Off).unwrap_err(),
                LeaseError::PinNotFound(Pin::P40)
            );
        }
        assert!(sim.events().is_empty());
        assert!(ctl.leased_pins().is_empty());
    }

    #[test]
    fn test_software_pwm_rejects_bad_range_without_leasing() {
        let (ctl, sim) = controller(Board::RaspberryPi3);
        assert_eq!(
            ctl.software_pwm(Pin::P5, 10.0, 0).unwrap_err(),
            PwmError::InvalidRange(0)
        );
        assert_eq!(
            ctl.software_pwm_hz(Pin::P5, 10.0, 0).unwrap_err(),
            PwmError::InvalidFrequency(0)
        );
        assert_eq!(
            ctl.software_pwm_hz(Pin::P5, 10.0, 20_000).unwrap_err(),
            PwmError::InvalidFrequency(20_000)
        );
        assert!(sim.events().is_empty());
    }

    #[test]
    fn test_software_pwm_holds_pin() {
        let (ctl, _sim) = controller(Board::RaspberryPi3);
        let mut pwm = ctl.software_pwm_hz(Pin::P6, 0.0, 100).unwrap();
        assert_eq!(pwm.range(), 100);
        assert!(matches!(
            ctl.gpio(Pin::P6, Direction::Out, Value::Off).unwrap_err(),
            LeaseError::PinInUse(Pin::P6)
        ));
        assert!(matches!(
            ctl.software_pwm(Pin::P6, 0.0, 10).unwrap_err(),
            PwmError::Lease(LeaseError::PinInUse(Pin::P6))
        ));
        pwm.stop();
        assert!(ctl.gpio(Pin::P6, Direction::Out, Value::Off).is_ok());
    }

    #[test]
    fn test_hardware_pwm_channel_aliasing() {
        let (ctl, _sim) = controller(Board::RaspberryPi3);
        let pwm = ctl.hardware_pwm(Pin::P12).unwrap();
        assert_eq!(pwm.channel(), PwmChannel::One);
        assert_eq!(
            ctl.hardware_pwm(Pin::P18).unwrap_err(),
            PwmError::InUse(PwmChannel::One)
        );
        assert!(ctl.hardware_pwm(Pin::P13).is_ok());
        drop(pwm);
        assert!(ctl.hardware_pwm(Pin::P18).is_ok());
    }

    #[test]
    fn test_hardware_pwm_not_found() {
        let (ctl, _sim) = controller(Board::RaspberryPi3);
        assert_eq!(
            ctl.hardware_pwm(Pin::P17).unwrap_err(),
            PwmError::NotFound(Pin::P17)
        );
        let (chip, _sim) = controller(Board::Chip);
        assert_eq!(
            chip.hardware_pwm(Pin::P12).unwrap_err(),
            PwmError::NotFound(Pin::P12)
        );
    }

    #[test]
    fn test_hardware_pwm_pin_already_leased_releases_channel() {
        let (ctl, _sim) = controller(Board::RaspberryPi3);
        let _gpio = ctl.gpio(Pin::P18, Direction::Out, Value::Off).unwrap();
        assert_eq!(
            ctl.hardware_pwm(Pin::P18).unwrap_err(),
            PwmError::Lease(LeaseError::PinInUse(Pin::P18))
        );
        assert!(ctl.leased_channels().is_empty());
        assert!(ctl.hardware_pwm(Pin::P12).is_ok());
    }

    #[test]
    fn test_hardware_pwm_drop_resets_registers() {
        let (ctl, sim) = controller(Board::RaspberryPi4);
        let mut pwm = ctl.hardware_pwm(Pin::P19).unwrap();
        pwm.set_duty(50.0);
        sim.clear_events();
        drop(pwm);
        assert_eq!(
            sim.event_kinds(),
            vec![
                EventKind::PwmDuty(19, 0),
                EventKind::PwmTone(19, 0),
                EventKind::SetMode(19, Mode::Off),
            ]
        );
        assert!(ctl.leased_pins().is_empty());
    }

    #[test]
    fn test_i2c_uses_board_default_device() {
        let sim = Arc::new(SimBackend::new().with_i2c_responders(&[0x48]));
        let ctl = GpioController::new(Board::RaspberryPiRev1, sim.clone());
        let bus = ctl.i2c(None).unwrap();
        assert_eq!(bus.address(), 0x48);
        assert!(sim.event_kinds().contains(&EventKind::I2cOpen {
            device: Some("/dev/i2c-0".to_string()),
            bus_address: 0x48,
        }));
    }
}
