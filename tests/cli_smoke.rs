//! CLI smoke tests - verify the commands against the simulated backend.
//!
//! These tests run the compiled binary and verify exit codes and output.
//! Each run gets an empty HOME so a developer's own config never leaks in.

use std::path::Path;
use std::process::Command;

/// Helper: run gpiolease with given args and return (exit_code, stdout, stderr).
fn run_cli_in(home: &Path, args: &[&str]) -> (i32, String, String) {
    let bin = env!("CARGO_BIN_EXE_gpiolease");
    let output = Command::new(bin)
        .args(args)
        .env("HOME", home)
        .env("RUST_LOG", "off") // suppress tracing noise
        .env_remove("GPIOLEASE_BOARD")
        .env_remove("GPIOLEASE_BACKEND")
        .output()
        .expect("failed to execute gpiolease binary");
    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

fn run_cli(args: &[&str]) -> (i32, String, String) {
    let home = tempfile::tempdir().unwrap();
    run_cli_in(home.path(), args)
}

// ============================================================================
// Help & Version
// ============================================================================

#[test]
fn cli_no_args_shows_help() {
    let (code, stdout, _stderr) = run_cli(&[]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("gpiolease"));
}

#[test]
fn cli_help_lists_commands() {
    let (code, stdout, _stderr) = run_cli(&["--help"]);
    assert_eq!(code, 0);
    for command in ["pins", "read", "write", "blink", "pwm", "hw-pwm", "i2c-read", "config"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn cli_version_command() {
    let (code, stdout, _stderr) = run_cli(&["version"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("gpiolease"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

// ============================================================================
// Pins
// ============================================================================

#[test]
fn cli_pins_default_board() {
    let (code, stdout, _stderr) = run_cli(&["pins"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("raspberry-pi-3"));
    assert!(stdout.contains("28 pins"));
}

#[test]
fn cli_pins_board_flag() {
    let (code, stdout, _stderr) = run_cli(&["pins", "--board", "chip"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("chip (8 pins)"));
    assert!(stdout.contains("1013"));
}

#[test]
fn cli_unknown_board_rejected() {
    let (code, _stdout, stderr) = run_cli(&["pins", "--board", "raspberry-pi-9"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("invalid value"));
}

// ============================================================================
// GPIO on the simulated backend
// ============================================================================

#[test]
fn cli_read_sim() {
    let (code, stdout, _stderr) = run_cli(&["read", "P4", "--pull", "up"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("P4 = "));
}

#[test]
fn cli_write_sim() {
    let (code, stdout, _stderr) = run_cli(&["write", "17", "on"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("P17 <- 1"));
}

#[test]
fn cli_write_missing_pin_fails() {
    let (code, _stdout, stderr) = run_cli(&["--board", "chip", "write", "P20", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Pin not found on this board: P20"));
}

#[test]
fn cli_blink_sim() {
    let (code, stdout, _stderr) =
        run_cli(&["blink", "P5", "--count", "2", "--interval-ms", "1"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("P5 blinked 2 time(s)"));
}

// ============================================================================
// PWM
// ============================================================================

#[test]
fn cli_pwm_sim() {
    let (code, stdout, _stderr) =
        run_cli(&["pwm", "P6", "--duty", "30", "--hz", "100", "--duration-ms", "20"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("software PWM duty 30/100"));
}

#[test]
fn cli_pwm_invalid_hz() {
    let (code, _stdout, stderr) = run_cli(&["pwm", "P6", "--duty", "1", "--hz", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("between 1 and 10000 Hz"));
}

#[test]
fn cli_hw_pwm_sim() {
    let (code, stdout, _stderr) =
        run_cli(&["hw-pwm", "P18", "--duty", "40", "--duration-ms", "1"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("channel 1 at 40%"));
}

#[test]
fn cli_hw_pwm_tone() {
    let (code, stdout, _stderr) = run_cli(&[
        "hw-pwm", "P13", "--duty", "50", "--tone", "440", "--duration-ms", "1",
    ]);
    assert_eq!(code, 0);
    assert!(stdout.contains("P13: tone 440 Hz"));
    assert!(stdout.contains("channel 2 at 50%"));
}

#[test]
fn cli_hw_pwm_not_capable() {
    let (code, _stdout, stderr) = run_cli(&["hw-pwm", "P4", "--duty", "40"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("No hardware PWM on pin P4"));
}

// ============================================================================
// I2C
// ============================================================================

#[test]
fn cli_i2c_read_not_reachable() {
    // The simulated bus has no devices attached.
    let (code, _stdout, stderr) = run_cli(&["i2c-read", "a0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("I2C bus not reachable"));
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn cli_config_path() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _stderr) = run_cli_in(home.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with(".gpiolease/config.json"));
}

#[test]
fn cli_config_show_reflects_flags() {
    let (code, stdout, _stderr) = run_cli(&["--board", "orange-pi", "config", "show"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("\"board\": \"orange-pi\""));
    assert!(stdout.contains("\"backend\": \"sim\""));
}

#[test]
fn cli_config_check_no_file() {
    let (code, stdout, _stderr) = run_cli(&["config", "check"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("No config file found"));
}

#[test]
fn cli_config_check_reports_unknown_field() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join(".gpiolease");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.json"), r#"{"bord": "chip"}"#).unwrap();

    let (code, stdout, _stderr) = run_cli_in(home.path(), &["config", "check"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("Unknown field 'bord'"));
    assert!(stdout.contains("did you mean 'board'?"));
}

#[test]
fn cli_config_file_selects_board() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join(".gpiolease");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.json"), r#"{"board": "chip"}"#).unwrap();

    let (code, stdout, _stderr) = run_cli_in(home.path(), &["pins"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("chip (8 pins)"));
}

fn home_with_config(content: &str) -> tempfile::TempDir {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join(".gpiolease");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.json"), content).unwrap();
    home
}

#[test]
fn cli_bad_board_in_config_fails_instead_of_defaulting() {
    let home = home_with_config(r#"{"board": "chipp", "backend": "sim"}"#);
    // P20 exists on the default raspberry-pi-3 table.
    let (code, stdout, stderr) = run_cli_in(home.path(), &["write", "P20", "1"]);
    assert_eq!(code, 1);
    assert!(!stdout.contains("P20 <- 1"));
    assert!(stderr.contains("Failed to load configuration"));
}

#[test]
fn cli_malformed_config_fails_every_config_driven_command() {
    let home = home_with_config("{not json");
    for args in [
        &["pins"][..],
        &["read", "P4"],
        &["pwm", "P6", "--duty", "1", "--duration-ms", "1"],
        &["hw-pwm", "P18", "--duty", "1", "--duration-ms", "1"],
        &["i2c-read", "a0"],
        &["config", "show"],
    ] {
        let (code, _stdout, stderr) = run_cli_in(home.path(), args);
        assert_eq!(code, 1, "{args:?}");
        assert!(stderr.contains("Failed to load configuration"), "{args:?}");
    }
}

#[test]
fn cli_config_check_and_path_still_work_on_bad_config() {
    let home = home_with_config(r#"{"board": "chipp"}"#);
    let (code, stdout, _stderr) = run_cli_in(home.path(), &["config", "check"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("chipp"));

    let (code, stdout, _stderr) = run_cli_in(home.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with(".gpiolease/config.json"));
}
