//! End-to-end runs over a real TCP socket against the Maestro simulator.

mod common;

use common::{MaestroSimulator, SimState, FIRMWARE};
use maestro_meter::config::ConnectionConfig;
use maestro_meter::{AttributeValue, ConnectionState, DeviceController, MeterError};
use std::net::TcpListener;
use std::time::Duration;

#[test]
fn test_startup_over_tcp() {
    let sim = MaestroSimulator::start();
    let mut controller = DeviceController::new(sim.config());

    controller.init().unwrap();

    assert_eq!(controller.state(), ConnectionState::Ready);
    assert_eq!(controller.firmware(), Some(FIRMWARE));

    controller.teardown();
    let state = sim.join();
    assert_eq!(state.commands, vec!["*VER", "*PWC00000"]);
    assert_eq!(state.wavelength, 0);
}

#[test]
fn test_attribute_session_over_tcp() {
    let sim = MaestroSimulator::start();
    let mut controller = DeviceController::new(sim.config());
    controller.init().unwrap();

    controller
        .write_attribute("range", AttributeValue::Int(27))
        .unwrap();
    let range = controller.read_range().unwrap();
    assert_eq!(range.code(), 27);
    assert_eq!(range.label(), "30 watts or joules");

    controller
        .write_attribute("waveCorrValue", AttributeValue::Int(1064))
        .unwrap();
    assert_eq!(controller.read_wave_corr_value().unwrap(), 1064);

    controller.write_auto_range(true).unwrap();
    assert!(controller.read_auto_range().unwrap());

    controller.write_trigger_level(5.0).unwrap();
    assert_eq!(controller.read_trigger_level().unwrap(), 5.0);

    assert_eq!(controller.read_meter_value().unwrap(), 1.234e-3);

    controller.teardown();
    let state = sim.join();
    assert_eq!(state.range, 27);
    assert!(state.auto_range);
}

#[test]
fn test_late_reply_does_not_answer_the_next_query() {
    let sim = MaestroSimulator::start_with(SimState {
        trigger_level: 5.0,
        slow_reply: Some(("CVU", Duration::from_millis(400))),
        ..Default::default()
    });
    let mut config = sim.config();
    config.read_timeout_ms = 250;
    let mut controller = DeviceController::new(config);
    controller.init().unwrap();

    let err = controller.read_meter_value().unwrap_err();
    assert!(matches!(err, MeterError::Timeout(_)), "{err:?}");

    // The *CVU reply lands while this query waits out the stray input.
    assert_eq!(controller.read_trigger_level().unwrap(), 5.0);
    assert_eq!(controller.cache().trigger_level, 5.0);
    assert_eq!(controller.cache().meter_value, 0.0);

    controller.teardown();
    let state = sim.join();
    assert_eq!(state.commands, vec!["*VER", "*PWC00000", "*CVU", "*GTL"]);
}

#[test]
fn test_refused_connection_is_connection_error() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ConnectionConfig {
        kind: maestro_meter::ConnectionKind::Net,
        host: "127.0.0.1".to_string(),
        port,
        connect_timeout_ms: 500,
        ..Default::default()
    };
    let mut controller = DeviceController::new(config);

    let err = controller.init().unwrap_err();

    assert!(matches!(err, MeterError::Connection(_)), "{err:?}");
    assert_eq!(controller.state(), ConnectionState::Disconnected);
}
