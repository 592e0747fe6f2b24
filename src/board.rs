//! Supported boards and their header tables.
//!
//! Each [`Board`] has a static [`BoardProfile`] mapping the logical pins it
//! exposes to backend addresses (BCM numbers on the Raspberry Pi family,
//! kernel GPIO numbers elsewhere). Everything that leases a pin resolves the
//! address here first; a pin missing from the table is reported as
//! [`LeaseError::PinNotFound`](crate::error::LeaseError::PinNotFound).
//!
//! # Example
//!
//! ```
//! use gpiolease::board::{profile_for, Board};
//! use gpiolease::pin::Pin;
//!
//! let profile = profile_for("raspberry-pi-3").unwrap();
//! assert_eq!(profile.address_of(Pin::P17), Some(17));
//! assert!(Board::Chip.profile().address_of(Pin::P17).is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::backend::Address;
use crate::i2c::I2cDevice;
use crate::pin::Pin;
use crate::pin::Pin::*;

/// The boards that are supported.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Board {
    /// Pi A,B Revision 1
    RaspberryPiRev1,
    /// Pi A,B Revision 2
    RaspberryPiRev2,
    /// Pi A+,B+,Zero with 40 pin header
    RaspberryPiPlusZero,
    /// Pi 2 with 40 pin header
    #[serde(rename = "raspberry-pi-2")]
    #[value(name = "raspberry-pi-2")]
    RaspberryPi2,
    /// Pi 3 with 40 pin header
    #[default]
    #[serde(rename = "raspberry-pi-3")]
    #[value(name = "raspberry-pi-3")]
    RaspberryPi3,
    /// Pi 4 with 40 pin header
    #[serde(rename = "raspberry-pi-4")]
    #[value(name = "raspberry-pi-4")]
    RaspberryPi4,
    Chip,
    #[serde(rename = "beaglebone-black")]
    #[value(name = "beaglebone-black")]
    BeagleBoneBlack,
    OrangePi,
    OrangePiZero,
}

impl Board {
    /// Every supported board.
    pub const ALL: [Board; 10] = [
        Board::RaspberryPiRev1,
        Board::RaspberryPiRev2,
        Board::RaspberryPiPlusZero,
        Board::RaspberryPi2,
        Board::RaspberryPi3,
        Board::RaspberryPi4,
        Board::Chip,
        Board::BeagleBoneBlack,
        Board::OrangePi,
        Board::OrangePiZero,
    ];

    /// The static header table for this board.
    pub fn profile(self) -> &'static BoardProfile {
        match self {
            Board::RaspberryPiRev1 => &RPI_REV1_PROFILE,
            Board::RaspberryPiRev2 => &RPI_REV2_PROFILE,
            Board::RaspberryPiPlusZero => &RPI_PLUS_ZERO_PROFILE,
            Board::RaspberryPi2 => &RPI_2_PROFILE,
            Board::RaspberryPi3 => &RPI_3_PROFILE,
            Board::RaspberryPi4 => &RPI_4_PROFILE,
            Board::Chip => &CHIP_PROFILE,
            Board::BeagleBoneBlack => &BEAGLEBONE_BLACK_PROFILE,
            Board::OrangePi => &ORANGE_PI_PROFILE,
            Board::OrangePiZero => &ORANGE_PI_ZERO_PROFILE,
        }
    }

    /// Whether this is a Raspberry Pi, the only family with hardware PWM
    /// channels wired to GPIO12/13/18/19.
    pub fn is_raspberry_pi(self) -> bool {
        matches!(
            self,
            Board::RaspberryPiRev1
                | Board::RaspberryPiRev2
                | Board::RaspberryPiPlusZero
                | Board::RaspberryPi2
                | Board::RaspberryPi3
                | Board::RaspberryPi4
        )
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile().name)
    }
}

impl FromStr for Board {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Board::ALL
            .into_iter()
            .find(|b| b.profile().name == s)
            .ok_or_else(|| format!("Unknown board: {s}"))
    }
}

/// Static header description for a board.
///
/// All slices are `'static` so profiles can be stored as `const` values
/// without heap allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardProfile {
    /// Canonical kebab-case board name (e.g. `"raspberry-pi-3"`).
    pub name: &'static str,
    /// Logical pin to backend address.
    pub pins: &'static [(Pin, Address)],
    /// Bus used when an I2C probe does not name a device.
    pub default_i2c: I2cDevice,
}

impl BoardProfile {
    /// Backend address of `pin`, or `None` if the header does not expose it.
    pub fn address_of(&self, pin: Pin) -> Option<Address> {
        self.pins
            .iter()
            .find(|(p, _)| *p == pin)
            .map(|(_, addr)| *addr)
    }

    /// Returns `true` if `pin` is on this board's header.
    pub fn supports(&self, pin: Pin) -> bool {
        self.address_of(pin).is_some()
    }

    /// Number of logical pins exposed.
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }
}

// ---------------------------------------------------------------------------
// Built-in profiles
// ---------------------------------------------------------------------------

/// 40-pin header Pis: P0..P27 map straight to BCM 0..27.
const RPI_40PIN: &[(Pin, Address)] = &[
    (P0, 0),
    (P1, 1),
    (P2, 2),
    (P3, 3),
    (P4, 4),
    (P5, 5),
    (P6, 6),
    (P7, 7),
    (P8, 8),
    (P9, 9),
    (P10, 10),
    (P11, 11),
    (P12, 12),
    (P13, 13),
    (P14, 14),
    (P15, 15),
    (P16, 16),
    (P17, 17),
    (P18, 18),
    (P19, 19),
    (P20, 20),
    (P21, 21),
    (P22, 22),
    (P23, 23),
    (P24, 24),
    (P25, 25),
    (P26, 26),
    (P27, 27),
];

pub const RPI_REV1_PROFILE: BoardProfile = BoardProfile {
    name: "raspberry-pi-rev1",
    pins: &[
        (P0, 0),
        (P1, 1),
        (P4, 4),
        (P7, 7),
        (P8, 8),
        (P9, 9),
        (P10, 10),
        (P11, 11),
        (P14, 14),
        (P15, 15),
        (P17, 17),
        (P18, 18),
        (P21, 21),
        (P22, 22),
        (P23, 23),
        (P24, 24),
        (P25, 25),
    ],
    default_i2c: I2cDevice::Old,
};

/// Rev2 adds the P5 header (BCM 28..31).
pub const RPI_REV2_PROFILE: BoardProfile = BoardProfile {
    name: "raspberry-pi-rev2",
    pins: &[
        (P2, 2),
        (P3, 3),
        (P4, 4),
        (P7, 7),
        (P8, 8),
        (P9, 9),
        (P10, 10),
        (P11, 11),
        (P14, 14),
        (P15, 15),
        (P17, 17),
        (P18, 18),
        (P22, 22),
        (P23, 23),
        (P24, 24),
        (P25, 25),
        (P27, 27),
        (P28, 28),
        (P29, 29),
        (P30, 30),
        (P31, 31),
    ],
    default_i2c: I2cDevice::New,
};

pub const RPI_PLUS_ZERO_PROFILE: BoardProfile = BoardProfile {
    name: "raspberry-pi-plus-zero",
    pins: RPI_40PIN,
    default_i2c: I2cDevice::New,
};

pub const RPI_2_PROFILE: BoardProfile = BoardProfile {
    name: "raspberry-pi-2",
    pins: RPI_40PIN,
    default_i2c: I2cDevice::New,
};

pub const RPI_3_PROFILE: BoardProfile = BoardProfile {
    name: "raspberry-pi-3",
    pins: RPI_40PIN,
    default_i2c: I2cDevice::New,
};

pub const RPI_4_PROFILE: BoardProfile = BoardProfile {
    name: "raspberry-pi-4",
    pins: RPI_40PIN,
    default_i2c: I2cDevice::New,
};

/// CHIP exposes its eight XIO expander lines; kernel numbering starts at 1013.
pub const CHIP_PROFILE: BoardProfile = BoardProfile {
    name: "chip",
    pins: &[
        (P0, 1013),
        (P1, 1014),
        (P2, 1015),
        (P3, 1016),
        (P4, 1017),
        (P5, 1018),
        (P6, 1019),
        (P7, 1020),
    ],
    default_i2c: I2cDevice::New,
};

/// BeagleBone Black P8 and P9 headers in header order.
pub const BEAGLEBONE_BLACK_PROFILE: BoardProfile = BoardProfile {
    name: "beaglebone-black",
    pins: &[
        (P0, 38),
        (P1, 39),
        (P2, 34),
        (P3, 35),
        (P4, 66),
        (P5, 67),
        (P6, 69),
        (P7, 68),
        (P8, 45),
        (P9, 44),
        (P10, 23),
        (P11, 26),
        (P12, 47),
        (P13, 46),
        (P14, 27),
        (P15, 65),
        (P16, 22),
        (P17, 63),
        (P18, 62),
        (P19, 37),
        (P20, 36),
        (P21, 33),
        (P22, 32),
        (P23, 61),
        (P24, 86),
        (P25, 88),
        (P26, 87),
        (P27, 89),
        (P28, 10),
        (P29, 11),
        (P30, 9),
        (P31, 81),
        (P32, 8),
        (P33, 80),
        (P34, 78),
        (P35, 79),
        (P36, 76),
        (P37, 77),
        (P38, 74),
        (P39, 75),
        (P40, 72),
        (P41, 73),
        (P42, 70),
        (P43, 71),
        (P44, 30),
        (P45, 60),
        (P46, 31),
        (P47, 50),
    ],
    default_i2c: I2cDevice::New,
};

/// OrangePi (H3) 40-pin header, Allwinner port numbering.
pub const ORANGE_PI_PROFILE: BoardProfile = BoardProfile {
    name: "orange-pi",
    pins: &[
        (P0, 12),
        (P1, 11),
        (P2, 6),
        (P3, 1),
        (P4, 0),
        (P5, 3),
        (P6, 15),
        (P7, 16),
        (P8, 14),
        (P9, 13),
        (P10, 2),
        (P11, 19),
        (P12, 18),
        (P13, 7),
        (P14, 8),
        (P15, 9),
        (P16, 10),
        (P17, 20),
        (P18, 200),
        (P19, 201),
        (P20, 198),
        (P21, 199),
        (P22, 110),
        (P23, 21),
        (P24, 67),
        (P25, 68),
        (P26, 71),
    ],
    default_i2c: I2cDevice::Old,
};

/// OrangePi Zero 26-pin header.
pub const ORANGE_PI_ZERO_PROFILE: BoardProfile = BoardProfile {
    name: "orange-pi-zero",
    pins: &[
        (P0, 12),
        (P1, 11),
        (P2, 6),
        (P3, 1),
        (P4, 0),
        (P5, 3),
        (P6, 15),
        (P7, 16),
        (P8, 14),
        (P9, 13),
        (P10, 2),
        (P11, 18),
        (P12, 19),
        (P13, 7),
        (P14, 10),
        (P15, 198),
        (P16, 199),
    ],
    default_i2c: I2cDevice::Old,
};

// ---------------------------------------------------------------------------
// Registry lookup
// ---------------------------------------------------------------------------

/// Return the [`BoardProfile`] for a canonical board name.
///
/// Returns `None` for unknown names. Matching is case-sensitive.
pub fn profile_for(name: &str) -> Option<&'static BoardProfile> {
    name.parse::<Board>().ok().map(Board::profile)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
