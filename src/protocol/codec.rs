//! Command encoding and response decoding for the Maestro ASCII protocol.
//!
//! Commands are a `*` followed by a three-letter mnemonic and, for setters, a
//! fixed-width payload: `*SCS03`, `*SAS1`, `*PWC00532`. No terminator is
//! appended. Responses are single lines, either a bare token (`06`,
//! `1.234e-03`) or `KEY:VALUE` (`PWC:00532`).

use super::range::RangeLevel;
use crate::error::{MeterError, MeterResult};

/// Highest wavelength, in nm, accepted for correction.
pub const MAX_WAVELENGTH_NM: u32 = 9_999;

/// The command mnemonics this adapter uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// `*VER` firmware identification
    Version,
    /// `*GCR` get current range
    GetRange,
    /// `*SCS` set range
    SetRange,
    /// `*GAS` get auto-range
    GetAutoRange,
    /// `*SAS` set auto-range
    SetAutoRange,
    /// `*GTL` get trigger level
    GetTriggerLevel,
    /// `*STL` set trigger level
    SetTriggerLevel,
    /// `*GWL` get correction wavelength
    GetWavelength,
    /// `*PWC` set correction wavelength; zero disables correction
    SetWavelength,
    /// `*CVU` current value
    CurrentValue,
}

impl Opcode {
    /// The four characters sent on the wire.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Version => "*VER",
            Self::GetRange => "*GCR",
            Self::SetRange => "*SCS",
            Self::GetAutoRange => "*GAS",
            Self::SetAutoRange => "*SAS",
            Self::GetTriggerLevel => "*GTL",
            Self::SetTriggerLevel => "*STL",
            Self::GetWavelength => "*GWL",
            Self::SetWavelength => "*PWC",
            Self::CurrentValue => "*CVU",
        }
    }

    /// Whether the instrument answers this command with a line.
    pub const fn expects_response(self) -> bool {
        matches!(
            self,
            Self::Version
                | Self::GetRange
                | Self::GetAutoRange
                | Self::GetTriggerLevel
                | Self::GetWavelength
                | Self::CurrentValue
        )
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Typed command argument; each variant has its own wire width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload {
    /// Two-digit range code
    Range(RangeLevel),
    /// `0` or `1`
    Flag(bool),
    /// Percent with two decimals
    Percent(f64),
    /// Five-digit wavelength in nm
    Wavelength(u32),
}

impl Payload {
    fn render(&self) -> String {
        match self {
            Self::Range(level) => level.to_wire_code(),
            Self::Flag(true) => "1".to_string(),
            Self::Flag(false) => "0".to_string(),
            Self::Percent(pct) => format!("{pct:.2}"),
            Self::Wavelength(nm) => format!("{nm:05}"),
        }
    }
}

/// An opcode with its (optional) payload.
///
/// Built through the constructors, which pair each setter with the payload
/// type it takes and reject out-of-domain values.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    opcode: Opcode,
    payload: Option<Payload>,
}

impl Command {
    fn query(opcode: Opcode) -> Self {
        Self {
            opcode,
            payload: None,
        }
    }

    pub fn version() -> Self {
        Self::query(Opcode::Version)
    }

    pub fn get_range() -> Self {
        Self::query(Opcode::GetRange)
    }

    pub fn set_range(level: RangeLevel) -> Self {
        Self {
            opcode: Opcode::SetRange,
            payload: Some(Payload::Range(level)),
        }
    }

    pub fn get_auto_range() -> Self {
        Self::query(Opcode::GetAutoRange)
    }

    pub fn set_auto_range(enabled: bool) -> Self {
        Self {
            opcode: Opcode::SetAutoRange,
            payload: Some(Payload::Flag(enabled)),
        }
    }

    pub fn get_trigger_level() -> Self {
        Self::query(Opcode::GetTriggerLevel)
    }

    /// Trigger level in percent, `0.0..=100.0`.
    pub fn set_trigger_level(percent: f64) -> MeterResult<Self> {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(MeterError::value(format!(
                "trigger level {percent} is outside 0..=100 %"
            )));
        }
        Ok(Self {
            opcode: Opcode::SetTriggerLevel,
            payload: Some(Payload::Percent(percent)),
        })
    }

    pub fn get_wavelength() -> Self {
        Self::query(Opcode::GetWavelength)
    }

    /// Correction wavelength in nm, `0..=9999`; zero restores the defaults.
    pub fn set_wavelength(nm: u32) -> MeterResult<Self> {
        if nm > MAX_WAVELENGTH_NM {
            return Err(MeterError::value(format!(
                "wavelength {nm} nm is outside 0..={MAX_WAVELENGTH_NM}"
            )));
        }
        Ok(Self {
            opcode: Opcode::SetWavelength,
            payload: Some(Payload::Wavelength(nm)),
        })
    }

    /// `*PWC00000`: switch wavelength correction off.
    pub fn reset_wavelength() -> Self {
        Self {
            opcode: Opcode::SetWavelength,
            payload: Some(Payload::Wavelength(0)),
        }
    }

    pub fn current_value() -> Self {
        Self::query(Opcode::CurrentValue)
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// The rendered payload alone, e.g. `"03"` for `*SCS03`.
    pub fn payload_text(&self) -> Option<String> {
        self.payload.as_ref().map(Payload::render)
    }

    /// Full ASCII command string.
    pub fn encode(&self) -> String {
        match &self.payload {
            Some(payload) => format!("{}{}", self.opcode.mnemonic(), payload.render()),
            None => self.opcode.mnemonic().to_string(),
        }
    }
}

/// Extract the value token from a raw response line.
///
/// Line terminators and all whitespace are removed. If a `:` remains, the
/// text after the first one is returned (`"PWC:00800"` gives `"00800"`);
/// otherwise the cleaned token is returned unchanged.
pub fn decode(raw: &[u8]) -> MeterResult<String> {
    let text = std::str::from_utf8(raw)
        .map_err(|_| MeterError::protocol(format!("response is not ASCII: {raw:?}")))?;
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.is_empty() {
        return Err(MeterError::protocol("empty response"));
    }

    match cleaned.split_once(':') {
        Some((_, value)) if value.is_empty() => Err(MeterError::protocol(format!(
            "response '{cleaned}' has no value after the delimiter"
        ))),
        Some((_, value)) => Ok(value.to_string()),
        None => Ok(cleaned),
    }
}

/// Decode an on/off token: `1|ON|TRUE` or `0|OFF|FALSE`, case-insensitive.
pub fn parse_flag(token: &str) -> MeterResult<bool> {
    match token.to_ascii_uppercase().as_str() {
        "1" | "ON" | "TRUE" => Ok(true),
        "0" | "OFF" | "FALSE" => Ok(false),
        _ => Err(MeterError::protocol(format!(
            "expected a boolean token, got '{token}'"
        ))),
    }
}

/// Decode a decimal or scientific-notation number.
pub fn parse_number(token: &str) -> MeterResult<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| MeterError::protocol(format!("expected a number, got '{token}'")))
}

/// Decode a zero-padded wavelength in nm.
pub fn parse_wavelength(token: &str) -> MeterResult<u32> {
    token
        .parse::<u32>()
        .map_err(|_| MeterError::protocol(format!("expected a wavelength in nm, got '{token}'")))
}

/// Decode a range code reported by the instrument.
///
/// A code outside the table in a response points at the device, so it is
/// reported as a protocol error rather than a value error.
pub fn parse_range(token: &str) -> MeterResult<RangeLevel> {
    RangeLevel::from_wire(token).map_err(|e| match e {
        MeterError::Value(msg) => MeterError::protocol(msg),
        other => other,
    })
}
