//! Device controller: the attribute-level view of one Maestro.
//!
//! # Architecture
//!
//! ```text
//! read_attribute / write_attribute
//!         │
//!   DeviceController ──> Command::encode ──> Transport::send
//!         │                                      │
//!    DeviceState  <──── codec::decode  <──── Transport::receive
//! ```
//!
//! The controller owns its channel and its cache. Every public operation
//! takes `&mut self`, so at most one command is ever in flight.

pub mod attribute;

pub use attribute::{Attribute, AttributeInfo, AttributeValue};

use crate::config::ConnectionConfig;
use crate::error::{MeterError, MeterResult};
use crate::protocol::codec::{self, Command};
use crate::protocol::RangeLevel;
use crate::transport::{self, BoxedTransport, TransportError};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle of the controller's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Ready,
    /// A command has been sent and its exchange is not finished.
    Busy,
}

/// Last known instrument settings.
///
/// Fields change only after a successful exchange. `meter_value` is never
/// written locally; it mirrors the last `*CVU` answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceState {
    pub range: RangeLevel,
    pub auto_range: bool,
    pub trigger_level: f64,
    pub wave_corr_enabled: bool,
    pub wave_corr_value: u32,
    pub meter_value: f64,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            range: RangeLevel::ONE_NANO,
            auto_range: false,
            trigger_level: 0.0,
            wave_corr_enabled: false,
            wave_corr_value: 0,
            meter_value: 0.0,
        }
    }
}

/// Translates attribute reads and writes into Maestro commands.
///
/// # Example
/// ```
/// use maestro_meter::config::ConnectionConfig;
/// use maestro_meter::controller::{AttributeValue, DeviceController};
/// use maestro_meter::transport::MockTransport;
///
/// let link = MockTransport::new("MOCK0");
/// link.push_response(b"Maestro v1.2.3\r\n"); // *VER
///
/// let mut meter = DeviceController::new(ConnectionConfig::default());
/// meter.init_with(Box::new(link.clone())).unwrap();
///
/// meter.write_attribute("range", AttributeValue::Int(6)).unwrap();
/// link.push_response(b"06\r\n");
/// let range = meter.read_attribute("range").unwrap();
/// assert_eq!(range, AttributeValue::Range(meter.cache().range));
/// ```
#[derive(Debug)]
pub struct DeviceController {
    config: ConnectionConfig,
    transport: Option<BoxedTransport>,
    state: ConnectionState,
    cache: DeviceState,
    firmware: Option<String>,
    /// A query timed out and its reply may still be on the way.
    reply_overdue: bool,
}

impl DeviceController {
    /// Create a disconnected controller with a default cache.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            transport: None,
            state: ConnectionState::Disconnected,
            cache: DeviceState::default(),
            firmware: None,
            reply_overdue: false,
        }
    }

    /// Open the configured channel and run the startup sequence.
    ///
    /// # Errors
    ///
    /// - `MeterError::Connection` if the channel cannot be opened; nothing
    ///   further is attempted.
    /// - `MeterError::Io` if the startup commands cannot be sent.
    pub fn init(&mut self) -> MeterResult<()> {
        self.state = ConnectionState::Connecting;
        let transport = match transport::open_transport(&self.config) {
            Ok(transport) => transport,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(MeterError::Connection(e));
            }
        };
        self.start(transport)
    }

    /// Run the startup sequence over an already-open channel.
    pub fn init_with(&mut self, transport: BoxedTransport) -> MeterResult<()> {
        self.state = ConnectionState::Connecting;
        self.start(transport)
    }

    /// Identification query, then wavelength-correction reset.
    fn start(&mut self, transport: BoxedTransport) -> MeterResult<()> {
        info!(endpoint = transport.name(), "starting instrument session");
        self.transport = Some(transport);

        let startup = self
            .identify()
            .and_then(|()| self.send_command(&Command::reset_wavelength()));

        match startup {
            Ok(()) => {
                self.cache.wave_corr_enabled = false;
                self.state = ConnectionState::Ready;
                info!(firmware = ?self.firmware, "instrument ready");
                Ok(())
            }
            Err(e) => {
                self.close_transport();
                Err(e)
            }
        }
    }

    fn identify(&mut self) -> MeterResult<()> {
        match self.transact(&Command::version()) {
            Ok(raw) => {
                let ident = String::from_utf8_lossy(&raw.unwrap_or_default())
                    .trim()
                    .to_string();
                debug!(firmware = %ident, "identification received");
                self.firmware = Some(ident);
            }
            // The identification is informational only.
            Err(MeterError::Timeout(d)) => warn!(timeout = ?d, "no identification response"),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Close the channel. Never fails; close errors are logged and dropped.
    pub fn teardown(&mut self) {
        if self.transport.is_some() {
            info!("tearing down instrument session");
        }
        self.close_transport();
    }

    fn close_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.reply_overdue = false;
        self.state = ConnectionState::Disconnected;
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    /// Cached settings, as of the last successful exchange.
    pub fn cache(&self) -> &DeviceState {
        &self.cache
    }

    /// Identification string returned at startup, if any.
    pub fn firmware(&self) -> Option<&str> {
        self.firmware.as_deref()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    // ========== Attribute entry points ==========

    /// Read an attribute by name.
    pub fn read_attribute(&mut self, name: &str) -> MeterResult<AttributeValue> {
        let attr: Attribute = name.parse()?;
        self.read(attr)
    }

    /// Write an attribute by name.
    pub fn write_attribute(&mut self, name: &str, value: AttributeValue) -> MeterResult<()> {
        let attr: Attribute = name.parse()?;
        self.write(attr, value)
    }

    pub fn read(&mut self, attr: Attribute) -> MeterResult<AttributeValue> {
        Ok(match attr {
            Attribute::Range => self.read_range()?.into(),
            Attribute::AutoRange => self.read_auto_range()?.into(),
            Attribute::TriggerLevel => self.read_trigger_level()?.into(),
            Attribute::WaveCorr => self.read_wave_corr()?.into(),
            Attribute::WaveCorrValue => i64::from(self.read_wave_corr_value()?).into(),
            Attribute::MeterValue => self.read_meter_value()?.into(),
        })
    }

    pub fn write(&mut self, attr: Attribute, value: AttributeValue) -> MeterResult<()> {
        match attr {
            Attribute::Range => self.write_range(value.as_range()?),
            Attribute::AutoRange => self.write_auto_range(value.as_bool()?),
            Attribute::TriggerLevel => self.write_trigger_level(value.as_f64()?),
            Attribute::WaveCorr => self.write_wave_corr(value.as_bool()?),
            Attribute::WaveCorrValue => self.write_wave_corr_value(value.as_wavelength()?),
            Attribute::MeterValue => Err(MeterError::ReadOnly(attr)),
        }
    }

    // ========== Typed reads ==========

    pub fn read_range(&mut self) -> MeterResult<RangeLevel> {
        let token = self.query(&Command::get_range())?;
        let level = codec::parse_range(&token)?;
        self.cache.range = level;
        Ok(level)
    }

    pub fn read_auto_range(&mut self) -> MeterResult<bool> {
        let token = self.query(&Command::get_auto_range())?;
        let enabled = codec::parse_flag(&token)?;
        self.cache.auto_range = enabled;
        Ok(enabled)
    }

    pub fn read_trigger_level(&mut self) -> MeterResult<f64> {
        let token = self.query(&Command::get_trigger_level())?;
        let level = codec::parse_number(&token)?;
        self.cache.trigger_level = level;
        Ok(level)
    }

    /// Served from the cache; the instrument has no query for it.
    pub fn read_wave_corr(&self) -> MeterResult<bool> {
        self.ensure_ready()?;
        Ok(self.cache.wave_corr_enabled)
    }

    pub fn read_wave_corr_value(&mut self) -> MeterResult<u32> {
        let token = self.query(&Command::get_wavelength())?;
        let nm = codec::parse_wavelength(&token)?;
        self.cache.wave_corr_value = nm;
        Ok(nm)
    }

    pub fn read_meter_value(&mut self) -> MeterResult<f64> {
        let token = self.query(&Command::current_value())?;
        let value = codec::parse_number(&token)?;
        self.cache.meter_value = value;
        Ok(value)
    }

    // ========== Typed writes ==========

    /// The instrument does not confirm `*SCS`; the cache catches up on the
    /// next read.
    pub fn write_range(&mut self, level: RangeLevel) -> MeterResult<()> {
        self.send_command(&Command::set_range(level))
    }

    pub fn write_auto_range(&mut self, enabled: bool) -> MeterResult<()> {
        self.send_command(&Command::set_auto_range(enabled))
    }

    pub fn write_trigger_level(&mut self, percent: f64) -> MeterResult<()> {
        let command = Command::set_trigger_level(percent)?;
        self.send_command(&command)
    }

    pub fn write_wave_corr_value(&mut self, nm: u32) -> MeterResult<()> {
        let command = Command::set_wavelength(nm)?;
        self.send_command(&command)
    }

    /// Switching correction off sends `*PWC00000`. Switching it on sends
    /// nothing: the command set has no enable, only "set wavelength" and
    /// the zero-wavelength reset. Only the cached flag changes.
    pub fn write_wave_corr(&mut self, enabled: bool) -> MeterResult<()> {
        if enabled {
            self.ensure_ready()?;
        } else {
            self.send_command(&Command::reset_wavelength())?;
        }
        self.cache.wave_corr_enabled = enabled;
        Ok(())
    }

    // ========== Exchange helpers ==========

    fn deadline(&self) -> Duration {
        self.config.read_timeout()
    }

    fn ensure_ready(&self) -> MeterResult<()> {
        match self.state {
            ConnectionState::Disconnected => Err(MeterError::NotConnected),
            _ => Ok(()),
        }
    }

    fn send_command(&mut self, command: &Command) -> MeterResult<()> {
        self.transact(command).map(|_| ())
    }

    /// Send a query and decode its single-line reply.
    fn query(&mut self, command: &Command) -> MeterResult<String> {
        let raw = self.transact(command)?.ok_or_else(|| {
            MeterError::protocol(format!("{} does not produce a reply", command.opcode()))
        })?;
        let token = codec::decode(&raw)?;
        debug!(command = %command.opcode(), response = %token, "decoded");
        Ok(token)
    }

    /// Send one command; for opcodes the instrument answers, wait for the
    /// raw reply line.
    fn transact(&mut self, command: &Command) -> MeterResult<Option<Vec<u8>>> {
        self.ensure_ready()?;
        let wire = command.encode();

        if !command.opcode().expects_response() {
            self.exchange(|transport, _| {
                debug!(command = %wire, "sending");
                transport.send(wire.as_bytes()).map(|()| Vec::new())
            })?;
            return Ok(None);
        }

        self.discard_stray_input()?;
        let raw = self.exchange(|transport, deadline| {
            debug!(command = %wire, "querying");
            transport.send(wire.as_bytes())?;
            transport.receive(deadline)
        });
        if matches!(raw, Err(MeterError::Timeout(_))) {
            self.reply_overdue = true;
        }
        raw.map(Some)
    }

    /// Drop input no query is waiting for, so it cannot pass as the next
    /// reply. After a timeout, wait one more read deadline for the late
    /// reply before sending.
    fn discard_stray_input(&mut self) -> MeterResult<()> {
        let linger = if self.reply_overdue {
            self.deadline()
        } else {
            Duration::ZERO
        };
        let transport = self.transport.as_mut().ok_or(MeterError::NotConnected)?;
        let discarded = transport.discard_input(linger).map_err(|e| {
            warn!(error = %e, "discarding stray input failed");
            MeterError::from(e)
        })?;
        if discarded > 0 {
            debug!(bytes = discarded, "discarded stray input");
        }
        self.reply_overdue = false;
        Ok(())
    }

    /// Mark the controller busy around one transport exchange.
    fn exchange<F>(&mut self, op: F) -> MeterResult<Vec<u8>>
    where
        F: FnOnce(&mut BoxedTransport, Duration) -> Result<Vec<u8>, TransportError>,
    {
        let deadline = self.deadline();
        let transport = self.transport.as_mut().ok_or(MeterError::NotConnected)?;
        let previous = self.state;
        self.state = ConnectionState::Busy;
        let result = op(transport, deadline);
        self.state = previous;

        result.map_err(|e| {
            warn!(error = %e, "exchange failed");
            MeterError::from(e)
        })
    }
}

impl Drop for DeviceController {
    fn drop(&mut self) {
        self.teardown();
    }
}
