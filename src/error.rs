//! Errors surfaced to callers of the controller.

use crate::controller::Attribute;
use crate::transport::TransportError;
use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type MeterResult<T> = Result<T, MeterError>;

/// Everything an attribute read or write can fail with.
///
/// None of these are retried internally. After any failure other than
/// [`MeterError::Connection`] the controller stays ready and the affected
/// cached value is left as it was.
#[derive(Debug, Error)]
pub enum MeterError {
    /// The channel could not be opened at startup.
    #[error("Could not connect to the instrument: {0}")]
    Connection(#[source] TransportError),

    /// Sending or receiving failed on an open channel.
    #[error("Communication with the instrument failed: {0}")]
    Io(#[source] TransportError),

    /// The instrument did not answer within the read deadline.
    #[error("No response from the instrument within {0:?}")]
    Timeout(Duration),

    /// A response arrived but could not be understood.
    #[error("Malformed response: {0}")]
    Protocol(String),

    /// A value lies outside its attribute's domain.
    #[error("Invalid value: {0}")]
    Value(String),

    /// No attribute by that name.
    #[error("Unknown attribute '{0}'")]
    UnknownAttribute(String),

    /// The attribute cannot be written.
    #[error("Attribute '{0}' is read-only")]
    ReadOnly(Attribute),

    /// The controller has no open channel.
    #[error("Controller is not connected")]
    NotConnected,
}

impl MeterError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub(crate) fn value(message: impl Into<String>) -> Self {
        Self::Value(message.into())
    }

    /// Stable short name of the error class, for wire-level reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "ConnectionError",
            Self::Io(_) => "IOError",
            Self::Timeout(_) => "TimeoutError",
            Self::Protocol(_) => "ProtocolError",
            Self::Value(_) => "ValueError",
            Self::UnknownAttribute(_) => "UnknownAttribute",
            Self::ReadOnly(_) => "ReadOnly",
            Self::NotConnected => "NotConnected",
        }
    }
}

impl From<TransportError> for MeterError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(deadline) => Self::Timeout(deadline),
            other => Self::Io(other),
        }
    }
}
