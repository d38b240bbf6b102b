//! The byte-level channel abstraction shared by serial and TCP links.

use super::error::TransportError;
use std::time::Duration;

/// A duplex byte link to the instrument.
///
/// Both the serial and the network channel implement this, as does the
/// scripted [`MockTransport`](super::MockTransport) used in tests. The
/// controller holds one as a trait object chosen at startup and never
/// looks at the concrete type again.
pub trait Transport: Send + std::fmt::Debug {
    /// Write a complete command to the link.
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Read one response, waiting at most `deadline`.
    ///
    /// Returns [`TransportError::Timeout`] if nothing arrived in time.
    /// A partial line that arrived before the deadline is returned as-is.
    fn receive(&mut self, deadline: Duration) -> Result<Vec<u8>, TransportError>;

    /// Throw away input nobody asked for, returning how many bytes went.
    ///
    /// Bytes already buffered are always dropped. With a non-zero `linger`,
    /// bytes arriving during that window are dropped as well; this absorbs a
    /// reply that turns up after its query timed out.
    fn discard_input(&mut self, linger: Duration) -> Result<usize, TransportError>;

    /// Release the link. Idempotent; failures are logged and discarded.
    fn close(&mut self);

    /// Human-readable endpoint (port path or `host:port`).
    fn name(&self) -> &str;

    /// Whether `close` has been called.
    fn is_closed(&self) -> bool;
}
