//! gpiolease CLI - lease pins, run PWM and probe I2C from the shell
//!
//! All CLI logic lives in the `cli` module. This file is just the entry point.

mod cli;

fn main() -> anyhow::Result<()> {
    cli::run()
}
