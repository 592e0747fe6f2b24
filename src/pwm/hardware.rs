//! Hardware PWM channel multiplexer.
//!
//! The Raspberry Pi has two PWM channels, each routable to two header pins:
//! GPIO12/GPIO18 share channel 1, GPIO13/GPIO19 share channel 2. A session
//! holds a lease on its channel *and* on its pin, so the aliasing pin is
//! refused with [`PwmError::InUse`](crate::error::PwmError::InUse) and the
//! pin itself cannot be leased as a plain GPIO meanwhile.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{PulseWidthModulation, PwmChannel};
use crate::backend::{Address, BackendResult, HardwareBackend, Mode};
use crate::pin::Pin;
use crate::registry::Lease;

/// Value written to the range register; a duty of 100% maps to this.
pub const PWM_REGISTER_RANGE: u32 = 1024;

/// The fixed set of hardware PWM capable pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwarePwmPin {
    Gpio12,
    Gpio18,
    Gpio13,
    Gpio19,
}

impl HardwarePwmPin {
    pub const ALL: [HardwarePwmPin; 4] = [
        HardwarePwmPin::Gpio12,
        HardwarePwmPin::Gpio18,
        HardwarePwmPin::Gpio13,
        HardwarePwmPin::Gpio19,
    ];

    /// The hardware PWM pin for a logical pin, if it is one.
    pub fn for_pin(pin: Pin) -> Option<Self> {
        Self::ALL.into_iter().find(|hw| hw.pin() == pin)
    }

    pub fn pin(self) -> Pin {
        match self {
            HardwarePwmPin::Gpio12 => Pin::P12,
            HardwarePwmPin::Gpio13 => Pin::P13,
            HardwarePwmPin::Gpio18 => Pin::P18,
            HardwarePwmPin::Gpio19 => Pin::P19,
        }
    }

    pub fn channel(self) -> PwmChannel {
        match self {
            HardwarePwmPin::Gpio12 | HardwarePwmPin::Gpio18 => PwmChannel::One,
            HardwarePwmPin::Gpio13 | HardwarePwmPin::Gpio19 => PwmChannel::Two,
        }
    }
}

/// A hardware PWM session. Duty is a percentage in `[0, 100]`.
pub struct HardwarePwm {
    pin: HardwarePwmPin,
    address: Address,
    duty: f32,
    backend: Arc<dyn HardwareBackend>,
    // Dropped after `Drop::drop` has reset the registers.
    _pin_lease: Lease<Pin>,
    _channel_lease: Lease<PwmChannel>,
}

impl HardwarePwm {
    /// Zero the duty register, fix the range and switch the pin to PWM.
    pub(crate) fn configure(
        pin: HardwarePwmPin,
        address: Address,
        backend: Arc<dyn HardwareBackend>,
        channel_lease: Lease<PwmChannel>,
        pin_lease: Lease<Pin>,
    ) -> BackendResult<Self> {
        let pwm = Self {
            pin,
            address,
            duty: 0.0,
            backend,
            _pin_lease: pin_lease,
            _channel_lease: channel_lease,
        };
        pwm.backend.pwm_write_duty(address, 0)?;
        pwm.backend.pwm_set_range(PWM_REGISTER_RANGE)?;
        pwm.backend.set_mode(address, Mode::PwmOutput)?;
        debug!(pin = %pin.pin(), channel = %pin.channel(), "hardware PWM configured");
        Ok(pwm)
    }

    pub fn pin(&self) -> Pin {
        self.pin.pin()
    }

    pub fn channel(&self) -> PwmChannel {
        self.pin.channel()
    }

    /// Set the duty percentage, reporting backend failures.
    pub fn try_set_duty(&mut self, duty: f32) -> BackendResult<()> {
        let duty = if duty.is_nan() {
            0.0
        } else {
            duty.clamp(0.0, 100.0)
        };
        self.backend
            .pwm_write_duty(self.address, register_value(duty))?;
        self.duty = duty;
        Ok(())
    }

    /// Program the tone frequency register; `0` silences it.
    pub fn set_tone(&mut self, frequency: u32) -> BackendResult<()> {
        self.backend.pwm_write_tone(self.address, frequency)
    }
}

/// Scale a percentage to the register range, rounding to nearest.
fn register_value(percent: f32) -> u32 {
    (PWM_REGISTER_RANGE as f32 * percent / 100.0).round() as u32
}

impl PulseWidthModulation for HardwarePwm {
    fn duty(&self) -> f32 {
        self.duty
    }

    fn set_duty(&mut self, duty: f32) {
        if let Err(e) = self.try_set_duty(duty) {
            warn!(pin = %self.pin(), error = %e, "hardware PWM duty write failed");
        }
    }
}

impl Drop for HardwarePwm {
    fn drop(&mut self) {
        // The PWM registers outlive the pin mode, so reset them explicitly.
        let steps = [
            self.backend.pwm_write_duty(self.address, 0),
            self.backend.pwm_write_tone(self.address, 0),
            self.backend.set_mode(self.address, Mode::Off),
        ];
        for result in steps {
            if let Err(e) = result {
                warn!(pin = %self.pin(), error = %e, "hardware PWM cleanup failed");
            }
        }
        debug!(pin = %self.pin(), channel = %self.channel(), "hardware PWM released");
    }
}

impl fmt::Debug for HardwarePwm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HardwarePwm")
            .field("pin", &self.pin)
            .field("channel", &self.channel())
            .field("duty", &self.duty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockHardwareBackend;
    use crate::registry::LeaseRegistry;
    use std::sync::Mutex;

    #[test]
    fn test_pin_table() {
        assert_eq!(HardwarePwmPin::for_pin(Pin::P12), Some(HardwarePwmPin::Gpio12));
        assert_eq!(HardwarePwmPin::for_pin(Pin::P19), Some(HardwarePwmPin::Gpio19));
        assert!(HardwarePwmPin::for_pin(Pin::P17).is_none());
        assert_eq!(HardwarePwmPin::Gpio12.channel(), PwmChannel::One);
        assert_eq!(HardwarePwmPin::Gpio18.channel(), PwmChannel::One);
        assert_eq!(HardwarePwmPin::Gpio13.channel(), PwmChannel::Two);
        assert_eq!(HardwarePwmPin::Gpio19.channel(), PwmChannel::Two);
    }

    #[test]
    fn test_register_value_rounds() {
        assert_eq!(register_value(0.0), 0);
        assert_eq!(register_value(50.0), 512);
        assert_eq!(register_value(100.0), 1024);
        // 1024 * 33 / 100 = 337.92
        assert_eq!(register_value(33.0), 338);
    }

    #[test]
    fn test_configure_and_drop_register_sequence() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut mock = MockHardwareBackend::new();
        let log = Arc::clone(&calls);
        mock.expect_pwm_write_duty().returning(move |address, value| {
            log.lock().unwrap().push(format!("duty {address} {value}"));
            Ok(())
        });
        let log = Arc::clone(&calls);
        mock.expect_pwm_set_range().returning(move |range| {
            log.lock().unwrap().push(format!("range {range}"));
            Ok(())
        });
        let log = Arc::clone(&calls);
        mock.expect_pwm_write_tone().returning(move |address, frequency| {
            log.lock().unwrap().push(format!("tone {address} {frequency}"));
            Ok(())
        });
        let log = Arc::clone(&calls);
        mock.expect_set_mode().returning(move |address, mode| {
            log.lock().unwrap().push(format!("mode {address} {mode:?}"));
            Ok(())
        });

        let channels = LeaseRegistry::new();
        let pins = LeaseRegistry::new();
        let channel_lease = channels
            .acquire(PwmChannel::One, |_| (), Ok::<_, ()>)
            .unwrap();
        let pin_lease = pins.acquire(Pin::P18, |_| (), Ok::<_, ()>).unwrap();

        let mut pwm = HardwarePwm::configure(
            HardwarePwmPin::Gpio18,
            18,
            Arc::new(mock),
            channel_lease,
            pin_lease,
        )
        .unwrap();
        pwm.set_duty(25.0);
        assert_eq!(pwm.duty(), 25.0);
        drop(pwm);

        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                "duty 18 0",
                "range 1024",
                "mode 18 PwmOutput",
                "duty 18 256",
                "duty 18 0",
                "tone 18 0",
                "mode 18 Off",
            ]
        );
        assert!(!channels.is_leased(PwmChannel::One));
        assert!(!pins.is_leased(Pin::P18));
    }

    #[test]
    fn test_duty_clamped_to_percent() {
        let mut mock = MockHardwareBackend::new();
        mock.expect_pwm_write_duty().returning(|_, _| Ok(()));
        mock.expect_pwm_set_range().returning(|_| Ok(()));
        mock.expect_pwm_write_tone().returning(|_, _| Ok(()));
        mock.expect_set_mode().returning(|_, _| Ok(()));

        let channels = LeaseRegistry::new();
        let pins = LeaseRegistry::new();
        let mut pwm = HardwarePwm::configure(
            HardwarePwmPin::Gpio13,
            13,
            Arc::new(mock),
            channels.acquire(PwmChannel::Two, |_| (), Ok::<_, ()>).unwrap(),
            pins.acquire(Pin::P13, |_| (), Ok::<_, ()>).unwrap(),
        )
        .unwrap();

        pwm.set_duty(150.0);
        assert_eq!(pwm.duty(), 100.0);
        pwm.set_duty(-1.0);
        assert_eq!(pwm.duty(), 0.0);
    }
}
