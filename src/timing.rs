//! Sleep helpers and PWM time units.

use std::thread;
use std::time::Duration;

/// Length of one PWM duty/range unit.
pub const PWM_UNIT: Duration = Duration::from_micros(100);

/// PWM units per second (`1s / 100µs`).
pub const PWM_UNITS_PER_SECOND: u32 = 10_000;

/// Duration of `units` PWM units.
pub fn pwm_units(units: u32) -> Duration {
    PWM_UNIT * units
}

/// Cycle length in PWM units for a frequency in Hz (`10_000 / hz`).
///
/// Returns `None` for `0` Hz and for frequencies above 10kHz, where the cycle
/// would be shorter than one unit.
pub fn range_for_hz(hz: u32) -> Option<u32> {
    if hz == 0 {
        return None;
    }
    match PWM_UNITS_PER_SECOND / hz {
        0 => None,
        range => Some(range),
    }
}

pub fn sleep_s(s: u64) {
    thread::sleep(Duration::from_secs(s));
}

pub fn sleep_ms(ms: u64) {
    thread::sleep(Duration::from_millis(ms));
}

pub fn sleep_us(us: u64) {
    thread::sleep(Duration::from_micros(us));
}

/// Sleep for one period of `hz`, so repeated calls tick at that rate.
/// `0` Hz does not sleep.
pub fn sleep_hz(hz: u32) {
    if hz > 0 {
        thread::sleep(Duration::from_secs(1) / hz);
    }
}
