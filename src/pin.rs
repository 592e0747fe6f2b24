//! Logical pin vocabulary shared by every board.
//!
//! A [`Pin`] names a position on a board header, not an electrical line.
//! Each board maps the subset it exposes to backend addresses through its
//! [`BoardProfile`](crate::board::BoardProfile).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! pins {
    ($($name:ident = $idx:literal),+ $(,)?) => {
        /// A pin on the board header.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum Pin {
            $($name),+
        }

        impl Pin {
            const ALL: [Pin; 48] = [$(Pin::$name),+];

            /// Position of the pin in the `P0..=P47` range.
            pub fn index(self) -> u8 {
                match self {
                    $(Pin::$name => $idx),+
                }
            }
        }
    };
}

pins! {
    P0 = 0, P1 = 1, P2 = 2, P3 = 3, P4 = 4, P5 = 5, P6 = 6, P7 = 7, P8 = 8, P9 = 9,
    P10 = 10, P11 = 11, P12 = 12, P13 = 13, P14 = 14, P15 = 15, P16 = 16, P17 = 17,
    P18 = 18, P19 = 19, P20 = 20, P21 = 21, P22 = 22, P23 = 23, P24 = 24, P25 = 25,
    P26 = 26, P27 = 27, P28 = 28, P29 = 29, P30 = 30, P31 = 31, P32 = 32, P33 = 33,
    P34 = 34, P35 = 35, P36 = 36, P37 = 37, P38 = 38, P39 = 39, P40 = 40, P41 = 41,
    P42 = 42, P43 = 43, P44 = 44, P45 = 45, P46 = 46, P47 = 47,
}

impl Pin {
    /// Look up a pin by its index. Returns `None` above 47.
    pub fn from_index(index: u8) -> Option<Pin> {
        Self::ALL.get(index as usize).copied()
    }

    /// Iterate over every logical pin in index order.
    pub fn all() -> impl Iterator<Item = Pin> {
        Self::ALL.into_iter()
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.index())
    }
}

/// Accepts `P17`, `p17` or a bare `17`.
impl FromStr for Pin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix(['P', 'p']).unwrap_or(s);
        digits
            .parse::<u8>()
            .ok()
            .and_then(Pin::from_index)
            .ok_or_else(|| format!("Unknown pin: {s} (expected P0..P47)"))
    }
}

/// The IO direction of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

/// The logic value of a pin. `On` corresponds to `1`, `Off` to `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    On,
    Off,
}

impl Value {
    /// Flip the value in place.
    pub fn toggle(&mut self) {
        *self = self.toggled();
    }

    /// Returns the opposite value.
    pub fn toggled(self) -> Value {
        match self {
            Value::On => Value::Off,
            Value::Off => Value::On,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        if value {
            Value::On
        } else {
            Value::Off
        }
    }
}

impl From<Value> for bool {
    fn from(value: Value) -> Self {
        matches!(value, Value::On)
    }
}

/// Accepts `1`/`0`, `on`/`off`, `high`/`low` and `true`/`false`.
impl FromStr for Value {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "on" | "high" | "true" => Ok(Value::On),
            "0" | "off" | "low" | "false" => Ok(Value::Off),
            other => Err(format!("Invalid pin value: {other}")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::On => write!(f, "1"),
            Value::Off => write!(f, "0"),
        }
    }
}

/// The resting state of an input pin.
///
/// With `Up` and nothing driving the line, an input reads [`Value::On`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Pull {
    Up,
    Down,
    Neither,
}
