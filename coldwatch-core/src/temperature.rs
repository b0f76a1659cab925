//! Fixed-point temperature
//!
//! Temperatures are stored as signed sixteenths of a degree Celsius, the
//! native resolution of the DS18B20. Every conversion out of this scale
//! truncates toward zero.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sixteenths per degree
pub const SCALE: i32 = 16;

/// Temperature in sixteenths of a degree Celsius
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Temperature(i32);

impl Temperature {
    pub const ZERO: Self = Self(0);

    pub const fn from_sixteenths(sixteenths: i32) -> Self {
        Self(sixteenths)
    }

    pub const fn from_celsius(celsius: i16) -> Self {
        Self(celsius as i32 * SCALE)
    }

    /// From tenths of a degree, rounded to the nearest sixteenth
    pub const fn from_celsius_x10(celsius_x10: i32) -> Self {
        let scaled = celsius_x10 * SCALE;
        let half = if scaled < 0 { -5 } else { 5 };
        Self((scaled + half) / 10)
    }

    /// From a DS18B20 conversion register (`SSSS SIII IIII FFFF`)
    pub const fn from_ds18b20_raw(raw: u16) -> Self {
        Self(raw as i16 as i32)
    }

    pub const fn sixteenths(self) -> i32 {
        self.0
    }

    /// Whole degrees, truncated toward zero
    pub const fn whole_degrees(self) -> i32 {
        self.0 / SCALE
    }

    /// First decimal digit of the magnitude (0..=9)
    pub const fn tenths(self) -> u8 {
        ((self.0.unsigned_abs() % SCALE as u32) * 10 / SCALE as u32) as u8
    }

    /// Tenths of a degree, truncated toward zero
    pub const fn celsius_x10(self) -> i32 {
        self.0 * 10 / SCALE
    }

    pub fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }
}

/// One decimal place: `23.5`, `-0.5`
impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x10 = self.celsius_x10();
        let sign = if x10 < 0 { "-" } else { "" };
        let magnitude = x10.unsigned_abs();
        write!(f, "{}{}.{}", sign, magnitude / 10, magnitude % 10)
    }
}
