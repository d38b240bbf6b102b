//! The Maestro's 42 measurement ranges.
//!
//! Codes run from 0 (1 pW or pJ) to 41 (300 MW or MJ) in three steps per
//! decade pair: 1, 3, 10, 30, 100, 300. The same code selects a power range
//! for thermopile and photodiode heads and an energy range for pyroelectric
//! heads.

use crate::error::{MeterError, MeterResult};
use serde::{Deserialize, Serialize};

/// Number of selectable ranges.
pub const RANGE_COUNT: usize = 42;

/// Labels indexed by range code.
const RANGE_LABELS: [&str; RANGE_COUNT] = [
    "1 picowatt or picojoule",
    "3 picowatts or picojoules",
    "10 picowatts or picojoules",
    "30 picowatts or picojoules",
    "100 picowatts or picojoules",
    "300 picowatts or picojoules",
    "1 nanowatt or nanojoule",
    "3 nanowatts or nanojoules",
    "10 nanowatts or nanojoules",
    "30 nanowatts or nanojoules",
    "100 nanowatts or nanojoules",
    "300 nanowatts or nanojoules",
    "1 microwatt or microjoule",
    "3 microwatts or microjoules",
    "10 microwatts or microjoules",
    "30 microwatts or microjoules",
    "100 microwatts or microjoules",
    "300 microwatts or microjoules",
    "1 milliwatt or millijoule",
    "3 milliwatts or millijoules",
    "10 milliwatts or millijoules",
    "30 milliwatts or millijoules",
    "100 milliwatts or millijoules",
    "300 milliwatts or millijoules",
    "1 watt or joule",
    "3 watts or joules",
    "10 watts or joules",
    "30 watts or joules",
    "100 watts or joules",
    "300 watts or joules",
    "1 kilowatt or kilojoule",
    "3 kilowatts or kilojoules",
    "10 kilowatts or kilojoules",
    "30 kilowatts or kilojoules",
    "100 kilowatts or kilojoules",
    "300 kilowatts or kilojoules",
    "1 megawatt or megajoule",
    "3 megawatts or megajoules",
    "10 megawatts or megajoules",
    "30 megawatts or megajoules",
    "100 megawatts or megajoules",
    "300 megawatts or megajoules",
];

/// Mantissas within one SI-prefix step (1e3).
const MANTISSAS: [f64; 6] = [1.0, 3.0, 10.0, 30.0, 100.0, 300.0];

/// A validated range code in `0..=41`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct RangeLevel(u8);

impl RangeLevel {
    /// Lowest range, 1 pW or pJ.
    pub const MIN: RangeLevel = RangeLevel(0);
    /// Highest range, 300 MW or MJ.
    pub const MAX: RangeLevel = RangeLevel(RANGE_COUNT as u8 - 1);
    /// 1 nW or nJ, the level assumed before the first read.
    pub const ONE_NANO: RangeLevel = RangeLevel(6);

    /// Validate an integer code.
    pub fn from_code(code: i64) -> MeterResult<Self> {
        if (0..RANGE_COUNT as i64).contains(&code) {
            Ok(Self(code as u8))
        } else {
            Err(MeterError::value(format!(
                "range code {code} is outside 0..={}",
                RANGE_COUNT - 1
            )))
        }
    }

    /// Parse a decimal code as sent on the wire (`"06"`, `"27"`).
    pub fn from_wire(token: &str) -> MeterResult<Self> {
        let code: i64 = token
            .trim()
            .parse()
            .map_err(|_| MeterError::value(format!("range code '{token}' is not an integer")))?;
        Self::from_code(code)
    }

    /// Two-digit zero-padded wire form.
    pub fn to_wire_code(self) -> String {
        format!("{:02}", self.0)
    }

    pub fn code(self) -> u8 {
        self.0
    }

    /// Human-readable magnitude, e.g. `"30 watts or joules"`.
    pub fn label(self) -> &'static str {
        RANGE_LABELS[self.0 as usize]
    }

    /// Full-scale value in watts (or joules).
    pub fn full_scale(self) -> f64 {
        let step = self.0 as usize;
        let decade = (step / MANTISSAS.len()) as i32;
        MANTISSAS[step % MANTISSAS.len()] * 10f64.powi(3 * decade - 12)
    }

    /// All ranges in ascending order.
    pub fn all() -> impl Iterator<Item = RangeLevel> {
        (0..RANGE_COUNT as u8).map(RangeLevel)
    }
}

impl Default for RangeLevel {
    fn default() -> Self {
        Self::ONE_NANO
    }
}

impl std::fmt::Display for RangeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02} {}", self.0, self.label())
    }
}

impl TryFrom<i64> for RangeLevel {
    type Error = MeterError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<RangeLevel> for u8 {
    fn from(level: RangeLevel) -> Self {
        level.0
    }
}
