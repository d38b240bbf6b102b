//! The Maestro command grammar and range table.

pub mod codec;
pub mod range;

pub use codec::{decode, Command, Opcode, Payload, MAX_WAVELENGTH_NM};
pub use range::{RangeLevel, RANGE_COUNT};
