//! Configuration validation with unknown field detection.

use serde_json::Value;
use std::collections::HashSet;

use crate::board::Board;

/// Known top-level config field names.
const KNOWN_TOP_LEVEL: &[&str] = &["board", "backend", "pwm", "i2c", "logging"];

/// Known fields for each section.
const KNOWN_PWM: &[&str] = &["default_range"];
const KNOWN_I2C: &[&str] = &["device"];
const KNOWN_LOGGING: &[&str] = &["format", "level", "file"];

/// A validation diagnostic.
#[derive(Debug)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub path: String,
    pub message: String,
}

#[derive(Debug, PartialEq)]
pub enum DiagnosticLevel {
    Ok,
    Warn,
    Error,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            DiagnosticLevel::Ok => "[OK]",
            DiagnosticLevel::Warn => "[WARN]",
            DiagnosticLevel::Error => "[ERROR]",
        };
        if self.path.is_empty() {
            write!(f, "{} {}", prefix, self.message)
        } else {
            write!(f, "{} {}: {}", prefix, self.path, self.message)
        }
    }
}

/// Simple Levenshtein distance for "did you mean?" suggestions.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.iter().enumerate() {
        let mut row = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            row[j + 1] = (prev[j + 1] + 1).min(row[j] + 1).min(prev[j] + cost);
        }
        prev = row;
    }
    prev[b.len()]
}

/// Suggest the closest known name (if distance <= 3).
pub fn suggest_field(unknown: &str, known: &[&str]) -> Option<String> {
    known
        .iter()
        .map(|k| (k, levenshtein(unknown, k)))
        .filter(|(_, d)| *d <= 3)
        .min_by_key(|(_, d)| *d)
        .map(|(k, _)| format!("did you mean '{}'?", k))
}

fn unknown_field(path: String, key: &str, known: &[&str]) -> Diagnostic {
    let message = match suggest_field(key, known) {
        Some(suggestion) => format!("Unknown field '{}', {}", key, suggestion),
        None => format!("Unknown field '{}'", key),
    };
    Diagnostic {
        level: DiagnosticLevel::Error,
        path,
        message,
    }
}

/// Validate a raw JSON config value against known field names.
pub fn validate_config(raw: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    // Check it's an object
    let obj = match raw.as_object() {
        Some(o) => o,
        None => {
            diagnostics.push(Diagnostic {
                level: DiagnosticLevel::Error,
                path: String::new(),
                message: "Config must be a JSON object".to_string(),
            });
            return diagnostics;
        }
    };

    diagnostics.push(Diagnostic {
        level: DiagnosticLevel::Ok,
        path: String::new(),
        message: "Valid JSON".to_string(),
    });

    let mut has_unknown = false;

    let known_set: HashSet<&str> = KNOWN_TOP_LEVEL.iter().copied().collect();
    for key in obj.keys() {
        if !known_set.contains(key.as_str()) {
            has_unknown = true;
            diagnostics.push(unknown_field(key.clone(), key, KNOWN_TOP_LEVEL));
        }
    }

    for (section, known) in [
        ("pwm", KNOWN_PWM),
        ("i2c", KNOWN_I2C),
        ("logging", KNOWN_LOGGING),
    ] {
        let Some(fields) = obj.get(section).and_then(|v| v.as_object()) else {
            continue;
        };
        for key in fields.keys() {
            if !known.contains(&key.as_str()) {
                has_unknown = true;
                diagnostics.push(unknown_field(format!("{}.{}", section, key), key, known));
            }
        }
    }

    // Board names get the same suggestion treatment as field names.
    if let Some(board) = obj.get("board").and_then(|v| v.as_str()) {
        if board.parse::<Board>().is_err() {
            let names: Vec<&str> = Board::ALL.iter().map(|b| b.profile().name).collect();
            let message = match suggest_field(board, &names) {
                Some(suggestion) => format!("Unknown board '{}', {}", board, suggestion),
                None => format!("Unknown board '{}'", board),
            };
            diagnostics.push(Diagnostic {
                level: DiagnosticLevel::Error,
                path: "board".to_string(),
                message,
            });
        }
    }

    if !has_unknown {
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Ok,
            path: String::new(),
            message: "All fields recognized".to_string(),
        });
    }

    // A zero range can never start a software PWM.
    if obj
        .get("pwm")
        .and_then(|p| p.get("default_range"))
        .and_then(|v| v.as_u64())
        == Some(0)
    {
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Warn,
            path: "pwm.default_range".to_string(),
            message: "0 is rejected when starting a software PWM".to_string(),
        });
    }

    // Hardware access without the feature compiled in fails at startup.
    if obj.get("backend").and_then(|v| v.as_str()) == Some("rpi")
        && !cfg!(all(feature = "rpi", target_os = "linux"))
    {
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Warn,
            path: "backend".to_string(),
            message: "this build lacks the `rpi` feature".to_string(),
        });
    }

    diagnostics
}
