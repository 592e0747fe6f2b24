//! CLI module - command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

pub mod common;
pub mod config;
pub mod gpio;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};

use gpiolease::{BackendKind, Board, I2cDevice, I2cPin, Pin, Pull, Value};

#[derive(Parser)]
#[command(name = "gpiolease")]
#[command(version)]
#[command(about = "Exclusive, drop-safe GPIO, PWM and I2C access", long_about = None)]
struct Cli {
    /// Hardware backend (overrides config)
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendKind>,
    /// Board header layout (overrides config)
    #[arg(long, global = true, value_enum)]
    board: Option<Board>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the pins of the selected board and their backend addresses
    Pins,
    /// Read a pin as input
    Read {
        /// Pin to read (P0..P47)
        pin: Pin,
        /// Pull resistor to enable before sampling
        #[arg(long, value_enum, default_value_t = Pull::Neither)]
        pull: Pull,
    },
    /// Drive a pin as output
    Write {
        /// Pin to drive (P0..P47)
        pin: Pin,
        /// Value to drive (1/0, on/off, high/low)
        value: Value,
        /// Keep the pin driven this long before releasing it (it is parked off on release)
        #[arg(long, default_value_t = 0)]
        hold_ms: u64,
    },
    /// Toggle an output pin on and off
    Blink {
        /// Pin to blink (P0..P47)
        pin: Pin,
        /// Number of on/off cycles
        #[arg(long, default_value_t = 5)]
        count: u32,
        /// Time between toggles
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
    /// Run a software PWM on any pin
    Pwm {
        /// Pin to drive (P0..P47)
        pin: Pin,
        /// On-time per cycle, in 100µs units
        #[arg(long)]
        duty: f32,
        /// Cycle length in 100µs units (defaults to `pwm.default_range`)
        #[arg(long, conflicts_with = "hz")]
        range: Option<u32>,
        /// Cycle frequency; sets the range to 10000 / hz
        #[arg(long)]
        hz: Option<u32>,
        /// How long to run before stopping
        #[arg(long, default_value_t = 1000)]
        duration_ms: u64,
    },
    /// Run a hardware PWM channel (Raspberry Pi GPIO12/13/18/19)
    HwPwm {
        /// Pin to drive (P12, P13, P18 or P19)
        pin: Pin,
        /// Duty cycle in percent
        #[arg(long)]
        duty: f32,
        /// Tone frequency register value; reset to 0 on release
        #[arg(long)]
        tone: Option<u32>,
        /// How long to run before stopping
        #[arg(long, default_value_t = 1000)]
        duration_ms: u64,
    },
    /// Read one analog input of the I2C converter
    I2cRead {
        /// Converter input (a0..a7)
        #[arg(value_enum)]
        input: I2cPin,
        /// I2C device (defaults to `i2c.device`, then the board default)
        #[arg(long, value_enum)]
        device: Option<I2cDevice>,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as JSON
    Show,
    /// Check the config file for unknown fields and invalid values
    Check,
    /// Print the config file path
    Path,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Only logging falls back to defaults; commands load the config strictly.
    let logging = gpiolease::Config::load()
        .map(|c| c.logging)
        .unwrap_or_default();
    gpiolease::utils::init_logging(&logging)?;

    let (backend, board) = (cli.backend, cli.board);
    let effective = || -> Result<gpiolease::Config> {
        let mut config =
            gpiolease::Config::load().with_context(|| "Failed to load configuration")?;
        if let Some(backend) = backend {
            config.backend = backend;
        }
        if let Some(board) = board {
            config.board = board;
        }
        Ok(config)
    };

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
        }
        Some(Commands::Version) => {
            cmd_version();
        }
        Some(Commands::Pins) => {
            gpio::cmd_pins(&effective()?);
        }
        Some(Commands::Read { pin, pull }) => {
            gpio::cmd_read(&effective()?, pin, pull)?;
        }
        Some(Commands::Write {
            pin,
            value,
            hold_ms,
        }) => {
            gpio::cmd_write(&effective()?, pin, value, hold_ms)?;
        }
        Some(Commands::Blink {
            pin,
            count,
            interval_ms,
        }) => {
            gpio::cmd_blink(&effective()?, pin, count, interval_ms)?;
        }
        Some(Commands::Pwm {
            pin,
            duty,
            range,
            hz,
            duration_ms,
        }) => {
            gpio::cmd_pwm(&effective()?, pin, duty, range, hz, duration_ms)?;
        }
        Some(Commands::HwPwm {
            pin,
            duty,
            tone,
            duration_ms,
        }) => {
            gpio::cmd_hw_pwm(&effective()?, pin, duty, tone, duration_ms)?;
        }
        Some(Commands::I2cRead { input, device }) => {
            gpio::cmd_i2c_read(&effective()?, input, device)?;
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Show => config::cmd_config_show(&effective()?)?,
            ConfigAction::Check => config::cmd_config_check()?,
            ConfigAction::Path => config::cmd_config_path(),
        },
    }

    Ok(())
}

fn cmd_version() {
    println!("gpiolease {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Exclusive, drop-safe GPIO, PWM and I2C access");
    if cfg!(all(feature = "rpi", target_os = "linux")) {
        println!("Backends: sim, rpi");
    } else {
        println!("Backends: sim");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gpiolease",
            "read",
            "P4",
            "--backend",
            "sim",
            "--board",
            "chip",
        ])
        .unwrap();
        assert_eq!(cli.backend, Some(BackendKind::Sim));
        assert_eq!(cli.board, Some(Board::Chip));
        assert!(matches!(
            cli.command,
            Some(Commands::Read {
                pin: Pin::P4,
                pull: Pull::Neither
            })
        ));
    }

    #[test]
    fn test_cli_pwm_range_conflicts_with_hz() {
        let result = Cli::try_parse_from([
            "gpiolease", "pwm", "P5", "--duty", "10", "--range", "100", "--hz", "50",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_pin() {
        assert!(Cli::try_parse_from(["gpiolease", "read", "P99"]).is_err());
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }
}
