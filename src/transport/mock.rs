//! Scripted transport for exercising the controller without hardware.
//!
//! `MockTransport` is cheap to clone and every clone shares one state, so a
//! test can hand one clone to the controller and keep another to script
//! responses and inspect what was sent.

use super::error::TransportError;
use super::traits::Transport;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct MockState {
    /// One entry per `receive` call.
    responses: VecDeque<Vec<u8>>,
    /// Unsolicited bytes sitting in the input buffer; read before `responses`.
    stray: VecDeque<Vec<u8>>,
    /// `linger` of every `discard_input` call.
    discards: Vec<Duration>,
    sent: Vec<Vec<u8>>,
    fail_next_send: bool,
    closed: bool,
    close_calls: usize,
}

/// In-memory [`Transport`] with scripted responses.
///
/// An empty response queue behaves like a silent instrument: `receive`
/// returns [`TransportError::Timeout`].
///
/// # Example
/// ```
/// use maestro_meter::transport::{MockTransport, Transport};
/// use std::time::Duration;
///
/// let mut link = MockTransport::new("MOCK0");
/// link.push_response(b"06\r\n");
///
/// link.send(b"*GCR").unwrap();
/// assert_eq!(link.receive(Duration::from_millis(10)).unwrap(), b"06\r\n");
/// assert_eq!(link.sent_commands(), vec!["*GCR".to_string()]);
/// ```
#[derive(Clone)]
pub struct MockTransport {
    name: String,
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a mock channel with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Queue a response for the next `receive`.
    pub fn push_response(&self, data: &[u8]) {
        self.state.lock().responses.push_back(data.to_vec());
    }

    /// Put bytes in the input buffer as if they arrived unasked, such as a
    /// reply to a query that already timed out. `receive` returns them ahead
    /// of scripted responses; `discard_input` drops them.
    pub fn push_stray(&self, data: &[u8]) {
        self.state.lock().stray.push_back(data.to_vec());
    }

    /// The `linger` passed to each `discard_input` call, in order.
    pub fn discards(&self) -> Vec<Duration> {
        self.state.lock().discards.clone()
    }

    /// Raw bytes of every successful `send`, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().sent.clone()
    }

    /// Every successful `send`, decoded lossily as text.
    pub fn sent_commands(&self) -> Vec<String> {
        self.state
            .lock()
            .sent
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    /// Forget what has been sent so far.
    pub fn clear_sent(&self) {
        self.state.lock().sent.clear();
    }

    /// Make the next `send` fail with a broken-pipe I/O error.
    pub fn fail_next_send(&self) {
        self.state.lock().fail_next_send = true;
    }

    /// Number of responses not yet consumed.
    pub fn pending_responses(&self) -> usize {
        self.state.lock().responses.len()
    }

    /// How many times `close` was called on any clone.
    pub fn close_calls(&self) -> usize {
        self.state.lock().close_calls
    }
}

impl Transport for MockTransport {
    fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        if state.fail_next_send {
            state.fail_next_send = false;
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "simulated write failure",
            )));
        }
        state.sent.push(data.to_vec());
        Ok(())
    }

    fn receive(&mut self, deadline: Duration) -> Result<Vec<u8>, TransportError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        let state = &mut *state;
        state
            .stray
            .pop_front()
            .or_else(|| state.responses.pop_front())
            .ok_or(TransportError::Timeout(deadline))
    }

    fn discard_input(&mut self, linger: Duration) -> Result<usize, TransportError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.discards.push(linger);
        Ok(state.stray.drain(..).map(|bytes| bytes.len()).sum())
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.close_calls += 1;
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("name", &self.name)
            .field("pending_responses", &self.pending_responses())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_responses_are_consumed_in_order() {
        let mut link = MockTransport::new("MOCK0");
        link.push_response(b"first");
        link.push_response(b"second");

        let deadline = Duration::from_millis(10);
        assert_eq!(link.receive(deadline).unwrap(), b"first");
        assert_eq!(link.receive(deadline).unwrap(), b"second");
        assert!(matches!(
            link.receive(deadline),
            Err(TransportError::Timeout(d)) if d == deadline
        ));
    }

    #[test]
    fn test_discard_input_drops_only_stray_bytes() {
        let mut link = MockTransport::new("MOCK0");
        link.push_stray(b"1.234e-03\r\n");
        link.push_response(b"5.00\r\n");

        assert_eq!(link.discard_input(Duration::from_millis(20)).unwrap(), 11);
        assert_eq!(link.discards(), vec![Duration::from_millis(20)]);
        assert_eq!(link.receive(Duration::from_millis(10)).unwrap(), b"5.00\r\n");
    }

    #[test]
    fn test_stray_bytes_are_read_first() {
        let mut link = MockTransport::new("MOCK0");
        link.push_response(b"5.00\r\n");
        link.push_stray(b"06\r\n");

        let deadline = Duration::from_millis(10);
        assert_eq!(link.receive(deadline).unwrap(), b"06\r\n");
        assert_eq!(link.receive(deadline).unwrap(), b"5.00\r\n");
    }

    #[test]
    fn test_clones_share_state() {
        let observer = MockTransport::new("MOCK0");
        let mut link = observer.clone();

        link.send(b"*VER").unwrap();
        assert_eq!(observer.sent(), vec![b"*VER".to_vec()]);

        link.close();
        assert!(observer.is_closed());
        assert_eq!(observer.close_calls(), 1);
    }

    #[test]
    fn test_injected_send_failure_is_one_shot() {
        let mut link = MockTransport::new("MOCK0");
        link.fail_next_send();

        assert!(matches!(link.send(b"*GCR"), Err(TransportError::Io(_))));
        link.send(b"*GCR").unwrap();
        assert_eq!(link.sent_commands(), vec!["*GCR".to_string()]);
    }

    #[test]
    fn test_closed_channel_rejects_io() {
        let mut link = MockTransport::new("MOCK0");
        link.close();
        assert!(matches!(link.send(b"*VER"), Err(TransportError::Closed)));
        assert!(matches!(
            link.receive(Duration::from_millis(1)),
            Err(TransportError::Closed)
        ));
    }
}
