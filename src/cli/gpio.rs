//! Pin, PWM and I2C command handlers.

use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use gpiolease::timing::{range_for_hz, sleep_ms};
use gpiolease::{Config, Direction, Gpio, I2cDevice, I2cPin, Pin, PulseWidthModulation, Pull, Value};

use super::common::controller;

/// List the pins of the configured board.
pub(crate) fn cmd_pins(config: &Config) {
    let profile = config.board.profile();
    println!("Board: {} ({} pins)", profile.name, profile.pin_count());
    println!("Default I2C device: {}", profile.default_i2c);
    println!();
    for (pin, address) in profile.pins {
        println!("  {:<4} -> {}", pin.to_string(), address);
    }
}

/// Lease `pin` as input and print its value.
pub(crate) fn cmd_read(config: &Config, pin: Pin, pull: Pull) -> Result<()> {
    let ctl = controller(config)?;
    let mut gpio = ctl.gpio(pin, Direction::In, Value::Off)?;
    if pull != Pull::Neither {
        gpio.set_pull(pull)
            .with_context(|| format!("Failed to set pull on {}", pin))?;
    }
    let value = gpio
        .value()
        .with_context(|| format!("Failed to read {}", pin))?;
    println!("{} = {}", pin, value);
    Ok(())
}

/// Drive `pin`, optionally holding it before release parks it off.
pub(crate) fn cmd_write(config: &Config, pin: Pin, value: Value, hold_ms: u64) -> Result<()> {
    let ctl = controller(config)?;
    let gpio = ctl.gpio(pin, Direction::Out, value)?;
    println!("{} <- {}", pin, value);
    if hold_ms > 0 {
        sleep_ms(hold_ms);
    }
    drop(gpio);
    Ok(())
}

pub(crate) fn cmd_blink(config: &Config, pin: Pin, count: u32, interval_ms: u64) -> Result<()> {
    let ctl = controller(config)?;
    let mut gpio = ctl.gpio(pin, Direction::Out, Value::Off)?;
    blink(&mut gpio, count, interval_ms)?;
    println!("{} blinked {} time(s)", pin, count);
    Ok(())
}

/// One on/off pair per count, leaving the pin where it started.
fn blink(gpio: &mut Gpio, count: u32, interval_ms: u64) -> Result<()> {
    let pin = gpio.pin();
    for _ in 0..count {
        for _ in 0..2 {
            gpio.toggle()
                .with_context(|| format!("Failed to toggle {}", pin))?;
            sleep_ms(interval_ms);
        }
    }
    Ok(())
}

pub(crate) fn cmd_pwm(
    config: &Config,
    pin: Pin,
    duty: f32,
    range: Option<u32>,
    hz: Option<u32>,
    duration_ms: u64,
) -> Result<()> {
    let range = match (range, hz) {
        (Some(range), _) => range,
        (None, Some(hz)) => match range_for_hz(hz) {
            Some(range) => range,
            None => bail!("Frequency must be between 1 and 10000 Hz, got {}", hz),
        },
        (None, None) => config.pwm.default_range,
    };

    let ctl = controller(config)?;
    let mut pwm = ctl.software_pwm(pin, duty, range)?;
    println!(
        "{}: software PWM duty {}/{} for {}ms",
        pin,
        pwm.duty(),
        pwm.range(),
        duration_ms
    );
    thread::sleep(Duration::from_millis(duration_ms));
    pwm.stop();
    Ok(())
}

pub(crate) fn cmd_hw_pwm(
    config: &Config,
    pin: Pin,
    duty: f32,
    tone: Option<u32>,
    duration_ms: u64,
) -> Result<()> {
    let ctl = controller(config)?;
    let mut pwm = ctl.hardware_pwm(pin)?;
    pwm.try_set_duty(duty)
        .with_context(|| format!("Failed to set duty on {}", pin))?;
    if let Some(frequency) = tone {
        pwm.set_tone(frequency)
            .with_context(|| format!("Failed to set tone on {}", pin))?;
        println!("{}: tone {} Hz", pin, frequency);
    }
    println!(
        "{}: hardware PWM {} at {}% for {}ms",
        pin,
        pwm.channel(),
        pwm.duty(),
        duration_ms
    );
    thread::sleep(Duration::from_millis(duration_ms));
    Ok(())
}

pub(crate) fn cmd_i2c_read(config: &Config, input: I2cPin, device: Option<I2cDevice>) -> Result<()> {
    let ctl = controller(config)?;
    let bus = ctl.i2c(device.or(config.i2c.device))?;
    let byte = bus.read(input)?;
    println!("{} @ 0x{:02x} = {}", input, bus.address(), byte);
    Ok(())
}
