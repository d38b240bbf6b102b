//! Transport-level error types.
//!
//! Kept separate from [`crate::error::MeterError`] so the channel
//! implementations know nothing about attributes or the command grammar.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a [`Transport`](super::Transport) implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The serial device does not exist on this system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// An I/O error occurred on the underlying link.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The serial layer rejected an operation.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Nothing arrived before the read deadline.
    #[error("No response within {0:?}")]
    Timeout(Duration),

    /// The connection parameters are unusable (bad address, bad baud rate).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The channel has already been closed.
    #[error("Channel is closed")]
    Closed,
}

impl TransportError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Map an I/O error from a deadline-bound read, folding the
    /// platform-specific "timed out" kinds into [`TransportError::Timeout`].
    pub(crate) fn from_read(err: std::io::Error, deadline: Duration) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                Self::Timeout(deadline)
            }
            _ => Self::Io(err),
        }
    }
}
