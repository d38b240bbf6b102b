//! Channel abstraction over the two ways a Maestro can be reached.
//!
//! [`open_transport`] picks the serial or TCP implementation once, from
//! configuration, and hands back a boxed [`Transport`]. Nothing downstream
//! distinguishes between them again.

pub mod error;
pub mod mock;
pub mod net;
pub mod serial;
pub mod traits;

pub use error::TransportError;
pub use mock::MockTransport;
pub use net::NetTransport;
pub use serial::SerialTransport;
pub use traits::Transport;

use crate::config::{ConnectionConfig, ConnectionKind};
use std::time::{Duration, Instant};
use tracing::info;

/// Owned, type-erased channel held by the controller.
pub type BoxedTransport = Box<dyn Transport>;

/// Open the channel described by `config`.
pub fn open_transport(config: &ConnectionConfig) -> Result<BoxedTransport, TransportError> {
    let transport: BoxedTransport = match config.kind {
        ConnectionKind::Serial => Box::new(SerialTransport::open(
            &config.serial_port,
            config.baud_rate,
            config.read_timeout(),
        )?),
        ConnectionKind::Net => Box::new(NetTransport::connect(
            &config.host,
            config.port,
            config.connect_timeout(),
        )?),
    };

    info!(kind = ?config.kind, endpoint = transport.name(), "channel opened");
    Ok(transport)
}

/// Time left of `deadline` since `started`, or `None` once it has run out.
pub(crate) fn time_left(started: Instant, deadline: Duration) -> Option<Duration> {
    deadline
        .checked_sub(started.elapsed())
        .filter(|left| !left.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_left_shrinks_towards_deadline() {
        let started = Instant::now();
        let left = time_left(started, Duration::from_secs(5)).unwrap();
        assert!(left <= Duration::from_secs(5));
        assert!(left > Duration::from_secs(4));
    }

    #[test]
    fn test_time_left_is_none_when_spent() {
        assert_eq!(time_left(Instant::now(), Duration::ZERO), None);

        let started = Instant::now();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(time_left(started, Duration::from_millis(10)), None);
    }
}
