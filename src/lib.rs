//! Maestro Meter Library
//!
//! Control and monitoring adapter for the Gentec-EO Maestro laser
//! power/energy meter. Instrument parameters are exposed as named
//! attributes; reads and writes become the meter's ASCII commands over a
//! serial line or a TCP socket.
//!
//! # Modules
//!
//! - `transport`: serial and TCP channels behind one `Transport` trait
//! - `protocol`: command encoding, response decoding, the range table
//! - `controller`: attribute reads/writes, cached device state
//! - `config`: TOML configuration with environment overrides
//! - `error`: unified error handling
//! - `logging`: tracing subscriber setup
//! - `stdio`: line-delimited JSON front end

pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod stdio;
pub mod transport;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult, ConnectionConfig, ConnectionKind};
pub use controller::{
    Attribute, AttributeInfo, AttributeValue, ConnectionState, DeviceController, DeviceState,
};
pub use error::{MeterError, MeterResult};
pub use protocol::{Command, Opcode, RangeLevel};
pub use transport::{
    open_transport, MockTransport, NetTransport, SerialTransport, Transport, TransportError,
};
