//! Shared CLI helpers used across multiple command handlers.

use anyhow::{Context, Result};
use tracing::info;

use gpiolease::{open_backend, Config, GpioController};

/// Open the configured backend and bind it to the configured board.
pub(crate) fn controller(config: &Config) -> Result<GpioController> {
    let backend = open_backend(config.backend)
        .with_context(|| format!("Failed to open '{}' backend", config.backend))?;
    info!(board = %config.board, backend = %config.backend, "controller opened");
    Ok(GpioController::new(config.board, backend))
}
