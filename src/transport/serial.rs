//! Serial line channel.
//!
//! Wraps `serialport::SerialPort`, fixed at 8 data bits, no parity, one stop
//! bit, no flow control. The baud rate and read deadline come from
//! configuration.

use super::error::TransportError;
use super::time_left;
use super::traits::Transport;
use std::io::{Read, Write};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Serial implementation of [`Transport`].
pub struct SerialTransport {
    port: Option<Box<dyn serialport::SerialPort>>,
    name: String,
    baud_rate: u32,
}

impl SerialTransport {
    /// Open `port_name` at `baud_rate`, 8N1, with `read_timeout` as the
    /// initial read deadline.
    ///
    /// # Example
    /// ```no_run
    /// use maestro_meter::transport::SerialTransport;
    /// use std::time::Duration;
    ///
    /// let port = SerialTransport::open("/dev/ttyUSB0", 115_200, Duration::from_millis(500))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(
        port_name: &str,
        baud_rate: u32,
        read_timeout: Duration,
    ) -> Result<Self, TransportError> {
        if baud_rate == 0 {
            return Err(TransportError::config("baud rate must be non-zero"));
        }

        let port = serialport::new(port_name, baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(read_timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => TransportError::not_found(port_name),
                serialport::ErrorKind::InvalidInput => TransportError::config(e.to_string()),
                _ => TransportError::Serial(e),
            })?;

        debug!(port = port_name, baud_rate, "serial port opened");

        Ok(Self {
            port: Some(port),
            name: port_name.to_string(),
            baud_rate,
        })
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>, TransportError> {
        self.port.as_mut().ok_or(TransportError::Closed)
    }
}

impl Transport for SerialTransport {
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let port = self.port_mut()?;
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }

    /// Reads byte by byte up to and including `\n`, so nothing belonging to
    /// a later response is consumed. Each read waits only for what is left
    /// of `deadline`.
    fn receive(&mut self, deadline: Duration) -> Result<Vec<u8>, TransportError> {
        let port = self.port_mut()?;

        let started = Instant::now();
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        while let Some(left) = time_left(started, deadline) {
            port.set_timeout(left)?;
            match port.read(&mut byte) {
                Ok(0) => continue,
                Ok(_) => {
                    line.push(byte[0]);
                    if byte[0] == b'\n' {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => match TransportError::from_read(e, deadline) {
                    TransportError::Timeout(_) => break,
                    other => return Err(other),
                },
            }
        }

        if line.is_empty() {
            return Err(TransportError::Timeout(deadline));
        }
        Ok(line)
    }

    fn discard_input(&mut self, linger: Duration) -> Result<usize, TransportError> {
        let port = self.port_mut()?;

        let started = Instant::now();
        let mut discarded = 0;
        let mut scratch = [0u8; 64];

        while let Some(left) = time_left(started, linger) {
            port.set_timeout(left)?;
            match port.read(&mut scratch) {
                Ok(n) => discarded += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => match TransportError::from_read(e, linger) {
                    TransportError::Timeout(_) => break,
                    other => return Err(other),
                },
            }
        }

        discarded += port.bytes_to_read()? as usize;
        port.clear(serialport::ClearBuffer::Input)?;
        Ok(discarded)
    }

    fn close(&mut self) {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.flush() {
                warn!(port = %self.name, error = %e, "flush on close failed");
            }
            debug!(port = %self.name, "serial port closed");
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_closed(&self) -> bool {
        self.port.is_none()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.name)
            .field("baud_rate", &self.baud_rate)
            .field("open", &self.port.is_some())
            .finish()
    }
}
