//! Pulse-width modulation.
//!
//! Pins are binary, but oscillating between `On` and `Off` lets a pin stand
//! in for values between the two, e.g. a lamp at 50% brightness or a motor
//! at 10% speed. A cycle is `range` units long and the pin is `On` for
//! `duty` of them.
//!
//! Two implementations share the [`PulseWidthModulation`] trait:
//!
//! - [`SoftwarePwm`] bit-bangs any leased pin from a dedicated thread.
//! - [`HardwarePwm`] programs one of the two Raspberry Pi PWM channels;
//!   the peripheral free-runs, so no thread is needed.

pub mod hardware;
pub mod software;

pub use hardware::{HardwarePwm, HardwarePwmPin};
pub use software::SoftwarePwm;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A duty-cycle output.
pub trait PulseWidthModulation {
    /// Current duty. Units depend on the implementation: 100µs units for
    /// [`SoftwarePwm`], percent for [`HardwarePwm`].
    fn duty(&self) -> f32;

    /// Change the duty. Out-of-range values saturate.
    fn set_duty(&mut self, duty: f32);
}

/// A hardware PWM channel. Two pins alias each channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PwmChannel {
    One,
    Two,
}

impl fmt::Display for PwmChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PwmChannel::One => write!(f, "channel 1"),
            PwmChannel::Two => write!(f, "channel 2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_display() {
        assert_eq!(PwmChannel::One.to_string(), "channel 1");
        assert_eq!(PwmChannel::Two.to_string(), "channel 2");
    }
}
