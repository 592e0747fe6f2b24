//! Software PWM -- bit-bangs a duty cycle on any leased pin.
//!
//! Each session owns its [`Gpio`] and moves it into a dedicated thread. The
//! thread alternates the pin between `On` for `duty` units and `Off` for
//! `range - duty` units (one unit is 100µs), re-reading the duty at the start
//! of every cycle. Phase sleeps wait on a stop channel, so [`SoftwarePwm::stop`]
//! (or dropping the session) ends the loop within one phase. The thread then
//! drops the `Gpio`, which parks the pin `Off` and releases its lease.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use super::PulseWidthModulation;
use crate::error::PwmError;
use crate::gpio::Gpio;
use crate::pin::{Pin, Value};
use crate::timing::pwm_units;

/// A software-implemented PWM session.
pub struct SoftwarePwm {
    pin: Pin,
    range: u32,
    /// `f32` bit pattern of the clamped duty, shared with the loop.
    duty: Arc<AtomicU32>,
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl SoftwarePwm {
    /// Start the timing loop on an output pin.
    pub(crate) fn start(gpio: Gpio, duty: f32, range: u32) -> Result<Self, PwmError> {
        if range == 0 {
            return Err(PwmError::InvalidRange(range));
        }

        let pin = gpio.pin();
        let shared = Arc::new(AtomicU32::new(clamp(duty, range).to_bits()));
        let (stop_tx, stop_rx) = mpsc::channel();

        let loop_duty = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name(format!("soft-pwm-{pin}"))
            .spawn(move || run(gpio, range, loop_duty, stop_rx))
            .map_err(|e| PwmError::Spawn(e.to_string()))?;

        debug!(pin = %pin, range, duty, "software PWM started");
        Ok(Self {
            pin,
            range,
            duty: shared,
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// The pin being driven.
    pub fn pin(&self) -> Pin {
        self.pin
    }

    /// Cycle length in 100µs units.
    pub fn range(&self) -> u32 {
        self.range
    }

    /// Whether the timing loop is still running.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the loop and wait for it to exit. The pin is parked `Off` and
    /// its lease released before this returns. Idempotent.
    pub fn stop(&mut self) {
        // Disconnecting the channel wakes the loop out of its phase sleep.
        self.stop_tx.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(pin = %self.pin, "software PWM thread panicked");
            }
            debug!(pin = %self.pin, "software PWM stopped");
        }
    }
}

impl PulseWidthModulation for SoftwarePwm {
    fn duty(&self) -> f32 {
        f32::from_bits(self.duty.load(Ordering::Acquire))
    }

    /// Clamp to `[0, range]` and publish; takes effect at the next cycle.
    fn set_duty(&mut self, duty: f32) {
        self.duty
            .store(clamp(duty, self.range).to_bits(), Ordering::Release);
    }
}

impl Drop for SoftwarePwm {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for SoftwarePwm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwarePwm")
            .field("pin", &self.pin)
            .field("range", &self.range)
            .field("duty", &self.duty())
            .field("running", &self.is_running())
            .finish()
    }
}

fn clamp(duty: f32, range: u32) -> f32 {
    if duty.is_nan() {
        return 0.0;
    }
    duty.clamp(0.0, range as f32)
}

/// Sleep for `duration` unless a stop is requested first.
fn stopped(stop: &Receiver<()>, duration: Duration) -> bool {
    !matches!(stop.recv_timeout(duration), Err(RecvTimeoutError::Timeout))
}

fn run(mut gpio: Gpio, range: u32, duty: Arc<AtomicU32>, stop: Receiver<()>) {
    loop {
        let mark = (f32::from_bits(duty.load(Ordering::Acquire)).floor() as u32).min(range);
        let space = range - mark;

        if mark != 0 {
            if let Err(e) = gpio.set_value(Value::On) {
                warn!(pin = %gpio.pin(), error = %e, "software PWM write failed, stopping");
                return;
            }
            if stopped(&stop, pwm_units(mark)) {
                return;
            }
        }

        if space != 0 {
            if let Err(e) = gpio.set_value(Value::Off) {
                warn!(pin = %gpio.pin(), error = %e, "software PWM write failed, stopping");
                return;
            }
            if stopped(&stop, pwm_units(space)) {
                return;
            }
        }
    }
}
