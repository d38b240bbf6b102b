//! Shared test utilities for the Maestro adapter tests.
//!
//! - Mock-backed controllers with the startup exchange already done
//! - A small TCP Maestro simulator for end-to-end runs over `NetTransport`

#![allow(dead_code)]

use maestro_meter::config::{ConnectionConfig, ConnectionKind};
use maestro_meter::transport::MockTransport;
use maestro_meter::DeviceController;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const FIRMWARE: &str = "Maestro Simulator 1.00.08";

/// A controller that has completed startup against a mock channel.
///
/// The returned mock shares state with the one inside the controller, and its
/// sent-command log has been cleared.
pub fn ready_controller() -> (DeviceController, MockTransport) {
    let link = MockTransport::new("MOCK0");
    link.push_response(format!("{FIRMWARE}\r\n").as_bytes());

    let mut controller = DeviceController::new(ConnectionConfig::default());
    controller
        .init_with(Box::new(link.clone()))
        .expect("mock startup should succeed");
    link.clear_sent();
    (controller, link)
}

/// Settings held by the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimState {
    pub range: u8,
    pub auto_range: bool,
    pub trigger_level: f64,
    pub wavelength: u32,
    pub reading: f64,
    /// Hold back the reply to this opcode (e.g. `"CVU"`) for a while.
    pub slow_reply: Option<(&'static str, Duration)>,
    pub commands: Vec<String>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            range: 6,
            auto_range: false,
            trigger_level: 2.0,
            wavelength: 800,
            reading: 1.234e-3,
            slow_reply: None,
            commands: Vec::new(),
        }
    }
}

/// TCP stand-in for a Maestro, serving one client.
pub struct MaestroSimulator {
    pub port: u16,
    pub state: Arc<Mutex<SimState>>,
    handle: Option<JoinHandle<()>>,
}

impl MaestroSimulator {
    pub fn start() -> Self {
        Self::start_with(SimState::default())
    }

    pub fn start_with(initial: SimState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(initial));

        let shared = Arc::clone(&state);
        let handle = thread::spawn(move || {
            if let Ok((socket, _)) = listener.accept() {
                serve(socket, shared);
            }
        });

        Self {
            port,
            state,
            handle: Some(handle),
        }
    }

    pub fn config(&self) -> ConnectionConfig {
        ConnectionConfig {
            kind: ConnectionKind::Net,
            host: "127.0.0.1".to_string(),
            port: self.port,
            read_timeout_ms: 1000,
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> SimState {
        self.state.lock().unwrap().clone()
    }

    /// Wait for the client to disconnect, then return the final state.
    pub fn join(mut self) -> SimState {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("simulator thread panicked");
        }
        self.snapshot()
    }
}

fn serve(mut socket: TcpStream, state: Arc<Mutex<SimState>>) {
    let mut buf = [0u8; 256];
    loop {
        let n = match socket.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        // Commands carry no terminator; `*` starts each one.
        let text = String::from_utf8_lossy(&buf[..n]).to_string();
        for cmd in text.split('*').filter(|c| !c.is_empty()) {
            let (reply, slow) = {
                let mut state = state.lock().unwrap();
                (respond(cmd, &mut state), state.slow_reply)
            };
            if let Some((opcode, delay)) = slow {
                if cmd.starts_with(opcode) {
                    thread::sleep(delay);
                }
            }
            if let Some(reply) = reply {
                if socket.write_all(reply.as_bytes()).is_err() {
                    return;
                }
            }
        }
    }
}

fn respond(cmd: &str, state: &mut SimState) -> Option<String> {
    state.commands.push(format!("*{cmd}"));
    let (opcode, payload) = cmd.split_at(cmd.len().min(3));
    match opcode {
        "VER" => Some(format!("{FIRMWARE}\r\n")),
        "GCR" => Some(format!("{:02}\r\n", state.range)),
        "SCS" => {
            state.range = payload.parse().ok()?;
            None
        }
        "GAS" => Some(format!("{}\r\n", u8::from(state.auto_range))),
        "SAS" => {
            state.auto_range = payload == "1";
            None
        }
        "GTL" => Some(format!("{:.1}\r\n", state.trigger_level)),
        "STL" => {
            state.trigger_level = payload.parse().ok()?;
            None
        }
        "GWL" => Some(format!("PWC: {:05}\r\n", state.wavelength)),
        "PWC" => {
            state.wavelength = payload.parse().ok()?;
            None
        }
        "CVU" => Some(format!("{:e}\r\n", state.reading)),
        _ => None,
    }
}
