//! Attribute names, metadata, and the dynamic value type used at the
//! framework boundary.

use crate::error::{MeterError, MeterResult};
use crate::protocol::{RangeLevel, MAX_WAVELENGTH_NM};
use serde::{Deserialize, Serialize};

/// The instrument parameters exposed for remote access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Attribute {
    Range,
    AutoRange,
    TriggerLevel,
    WaveCorr,
    WaveCorrValue,
    MeterValue,
}

/// Static description of an attribute, as published to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttributeInfo {
    pub name: &'static str,
    pub label: &'static str,
    pub unit: Option<&'static str>,
    pub format: Option<&'static str>,
    pub writable: bool,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Range,
        Attribute::AutoRange,
        Attribute::TriggerLevel,
        Attribute::WaveCorr,
        Attribute::WaveCorrValue,
        Attribute::MeterValue,
    ];

    /// Canonical camelCase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Range => "range",
            Self::AutoRange => "autoRange",
            Self::TriggerLevel => "triggerLevel",
            Self::WaveCorr => "waveCorr",
            Self::WaveCorrValue => "waveCorrValue",
            Self::MeterValue => "meterValue",
        }
    }

    pub const fn is_writable(self) -> bool {
        !matches!(self, Self::MeterValue)
    }

    pub const fn info(self) -> AttributeInfo {
        let (label, unit, format) = match self {
            Self::Range => ("Range", None, None),
            Self::AutoRange => ("Auto Range", None, None),
            Self::TriggerLevel => ("Trigger Level", Some("%"), Some("%4.2f")),
            Self::WaveCorr => ("Wavelength correction", None, None),
            Self::WaveCorrValue => ("Value for wavelength correction", Some("nm"), Some("%5.0f")),
            Self::MeterValue => ("Measurement Value", None, None),
        };
        AttributeInfo {
            name: self.name(),
            label,
            unit,
            format,
            writable: self.is_writable(),
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Attribute {
    type Err = MeterError;

    /// Accepts camelCase (`autoRange`) and snake_case (`auto_range`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|attr| attr.name().eq_ignore_ascii_case(&key))
            .ok_or_else(|| MeterError::UnknownAttribute(s.to_string()))
    }
}

/// An attribute value as exchanged with the publishing layer.
///
/// Reads produce the variant matching the attribute's type. Writes accept
/// any variant that converts losslessly, e.g. an integer code for `range`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Range(RangeLevel),
}

impl AttributeValue {
    pub(crate) fn as_bool(&self) -> MeterResult<bool> {
        match *self {
            Self::Bool(b) => Ok(b),
            Self::Int(0) => Ok(false),
            Self::Int(1) => Ok(true),
            other => Err(MeterError::value(format!("expected a boolean, got {other:?}"))),
        }
    }

    pub(crate) fn as_f64(&self) -> MeterResult<f64> {
        match *self {
            Self::Float(v) => Ok(v),
            Self::Int(v) => Ok(v as f64),
            other => Err(MeterError::value(format!("expected a number, got {other:?}"))),
        }
    }

    pub(crate) fn as_range(&self) -> MeterResult<RangeLevel> {
        match *self {
            Self::Range(level) => Ok(level),
            Self::Int(code) => RangeLevel::from_code(code),
            other => Err(MeterError::value(format!("expected a range code, got {other:?}"))),
        }
    }

    pub(crate) fn as_wavelength(&self) -> MeterResult<u32> {
        let nm = match *self {
            Self::Int(v) => v,
            Self::Float(v) if v.fract() == 0.0 && v.is_finite() => v as i64,
            other => {
                return Err(MeterError::value(format!(
                    "expected a whole number of nm, got {other:?}"
                )))
            }
        };
        u32::try_from(nm)
            .ok()
            .filter(|nm| *nm <= MAX_WAVELENGTH_NM)
            .ok_or_else(|| {
                MeterError::value(format!("wavelength {nm} nm is outside 0..={MAX_WAVELENGTH_NM}"))
            })
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<RangeLevel> for AttributeValue {
    fn from(v: RangeLevel) -> Self {
        Self::Range(v)
    }
}
