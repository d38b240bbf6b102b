//! TCP channel, for Maestro units reached through an Ethernet-serial bridge.

use super::error::TransportError;
use super::time_left;
use super::traits::Transport;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Bytes accepted from the socket per `receive` call.
pub const RECEIVE_BUFFER_SIZE: usize = 1024;

/// TCP implementation of [`Transport`].
#[derive(Debug)]
pub struct NetTransport {
    stream: Option<TcpStream>,
    name: String,
}

impl NetTransport {
    /// Connect to `host:port`, trying each resolved address in turn.
    pub fn connect(
        host: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let name = format!("{host}:{port}");
        let addrs = (host, port)
            .to_socket_addrs()
            .map_err(|e| TransportError::config(format!("cannot resolve {name}: {e}")))?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, connect_timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    debug!(endpoint = %name, %addr, "tcp connection established");
                    return Ok(Self {
                        stream: Some(stream),
                        name,
                    });
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(match last_err {
            Some(e) => TransportError::Io(e),
            None => TransportError::config(format!("{name} resolved to no addresses")),
        })
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream, TransportError> {
        self.stream.as_mut().ok_or(TransportError::Closed)
    }
}

fn peer_closed() -> TransportError {
    TransportError::Io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "peer closed the connection",
    ))
}

/// Read until the socket would block. The stream must be non-blocking.
fn drain_ready(stream: &mut TcpStream, buffer: &mut [u8]) -> Result<usize, TransportError> {
    let mut drained = 0;
    loop {
        match stream.read(buffer) {
            Ok(0) => return Err(peer_closed()),
            Ok(n) => drained += n,
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(drained),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::Io(e)),
        }
    }
}

impl Transport for NetTransport {
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let stream = self.stream_mut()?;
        stream.write_all(data)?;
        stream.flush()?;
        Ok(())
    }

    fn receive(&mut self, deadline: Duration) -> Result<Vec<u8>, TransportError> {
        let stream = self.stream_mut()?;
        // A zero read timeout is rejected by the OS.
        stream.set_read_timeout(Some(deadline.max(Duration::from_millis(1))))?;

        let mut buffer = [0u8; RECEIVE_BUFFER_SIZE];
        loop {
            match stream.read(&mut buffer) {
                Ok(0) => return Err(peer_closed()),
                Ok(n) => return Ok(buffer[..n].to_vec()),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::from_read(e, deadline)),
            }
        }
    }

    fn discard_input(&mut self, linger: Duration) -> Result<usize, TransportError> {
        let stream = self.stream_mut()?;
        let mut buffer = [0u8; RECEIVE_BUFFER_SIZE];
        let mut discarded = 0;

        let started = Instant::now();
        while let Some(left) = time_left(started, linger) {
            stream.set_read_timeout(Some(left.max(Duration::from_millis(1))))?;
            match stream.read(&mut buffer) {
                Ok(0) => return Err(peer_closed()),
                Ok(n) => discarded += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => match TransportError::from_read(e, linger) {
                    TransportError::Timeout(_) => break,
                    other => return Err(other),
                },
            }
        }

        stream.set_nonblocking(true)?;
        let drained = drain_ready(stream, &mut buffer);
        stream.set_nonblocking(false)?;
        Ok(discarded + drained?)
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                warn!(endpoint = %self.name, error = %e, "tcp shutdown failed");
            }
            debug!(endpoint = %self.name, "tcp connection closed");
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_closed(&self) -> bool {
        self.stream.is_none()
    }
}

impl Drop for NetTransport {
    fn drop(&mut self) {
        self.close();
    }
}
