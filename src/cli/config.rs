//! Config command handlers.

use anyhow::{Context, Result};

use gpiolease::config::validate::{validate_config, DiagnosticLevel};
use gpiolease::config::Config;

/// Print the effective configuration as JSON.
pub(crate) fn cmd_config_show(effective: &Config) -> Result<()> {
    let json =
        serde_json::to_string_pretty(effective).context("Failed to serialize configuration")?;
    println!("{}", json);
    Ok(())
}

pub(crate) fn cmd_config_path() {
    println!("{}", Config::path().display());
}

/// Validate the raw config file. Works on files that fail to load.
pub(crate) fn cmd_config_check() -> Result<()> {
    let config_path = Config::path();
    println!("Config file: {}", config_path.display());

    if !config_path.exists() {
        println!("[OK] No config file found (using defaults)");
        return Ok(());
    }

    let content = std::fs::read_to_string(&config_path).context("Failed to read config file")?;

    let raw: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            println!("[ERROR] Invalid JSON: {}", e);
            std::process::exit(1);
        }
    };

    let diagnostics = validate_config(&raw);
    for diag in &diagnostics {
        println!("{}", diag);
    }

    let errors = diagnostics
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Error)
        .count();
    let warnings = diagnostics
        .iter()
        .filter(|d| d.level == DiagnosticLevel::Warn)
        .count();

    if errors == 0 && warnings == 0 {
        println!("\nConfiguration looks good!");
    } else {
        println!("\nFound {} error(s), {} warning(s)", errors, warnings);
    }
    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}
