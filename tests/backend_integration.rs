//! Integration tests for the backend worker thread
//!
//! These tests drive a real `RadarBackend` thread against a scripted sensor:
//! - Connect sequence and command acknowledgments
//! - Parsing of the speed stream and the live statistics
//! - Validation of user-typed commands

mod common;

use common::{assert_float_eq, fast_config, wait_for, ScriptedBackend};
use ops243_panel::backend::{BackendCommand, BackendMessage, RadarBackend};
use ops243_panel::config::AppConfig;
use ops243_panel::device::ConfigChange;
use ops243_panel::error::RadarError;
use ops243_panel::protocol::{DeviceCommand, PowerMode};
use ops243_panel::types::{ConnectionStatus, Direction};
use ops243_panel::units::SpeedUnit;

#[test]
fn test_backend_creation_and_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::spawn(fast_config(dir.path()));

    let messages = backend.shutdown();
    assert!(matches!(messages.last(), Some(BackendMessage::Shutdown)));
}

#[test]
fn test_connect_configures_sensor_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::connected(fast_config(dir.path()));

    assert_eq!(
        backend.script.written(),
        vec!["UM", "OS", "M>0", "R|", "O1"]
    );
    backend.shutdown();
}

#[test]
fn test_readings_update_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::connected(fast_config(dir.path()));

    backend.script.push_line("4.0");
    backend.script.push_line("-2.0");

    let seen = wait_for(&backend.handle, |msg| {
        matches!(msg, BackendMessage::Snapshot(s) if s.speed == Some(2.0))
    });
    let Some(BackendMessage::Snapshot(snapshot)) = seen.last() else {
        panic!("expected a snapshot");
    };
    assert_eq!(snapshot.max, Some(4.0));
    assert_eq!(snapshot.min, Some(2.0));
    assert_float_eq(snapshot.average.unwrap(), 3.0, 1e-9);
    assert_eq!(snapshot.direction, Some(Direction::Receding));
    assert_eq!(snapshot.unit, SpeedUnit::MetersPerSecond);

    backend.shutdown();
}

#[test]
fn test_unrecognized_line_is_diagnostic_only() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::connected(fast_config(dir.path()));

    backend.script.push_line("abc");
    backend.script.push_line("3");

    let seen = wait_for(&backend.handle, |msg| {
        matches!(msg, BackendMessage::Snapshot(s) if s.speed.is_some())
    });
    assert!(seen
        .iter()
        .any(|msg| matches!(msg, BackendMessage::Diagnostic(text) if text == "abc")));

    let Some(BackendMessage::Snapshot(snapshot)) = seen.last() else {
        panic!("expected a snapshot");
    };
    assert_eq!(snapshot.speed, Some(3.0));
    assert_eq!(snapshot.max, Some(3.0));
    assert_eq!(snapshot.min, Some(3.0));

    backend.shutdown();
}

#[test]
fn test_command_acks_follow_send_order() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::connected(fast_config(dir.path()));
    backend
        .script
        .respond_to("T=1", "{\"SamplingRate\":20000}");

    backend.handle.set_frequency(1).unwrap();
    backend.handle.send_command("PA").unwrap();

    let seen = wait_for(&backend.handle, |msg| {
        matches!(msg, BackendMessage::CommandAck(ack) if ack.sent == "PA")
    });
    let acks: Vec<_> = seen
        .iter()
        .filter_map(|msg| match msg {
            BackendMessage::CommandAck(ack) => Some(ack.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(acks.len(), 2);
    assert_eq!(acks[0].sent, "T=1");
    assert_eq!(acks[0].received, "{\"SamplingRate\":20000}");
    assert_eq!(acks[1].sent, "PA");

    backend.shutdown();
}

#[test]
fn test_out_of_range_command_never_written() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::connected(fast_config(dir.path()));

    let err = backend.handle.send_command("T=3").unwrap_err();
    assert!(matches!(err, RadarError::InvalidSetting(_)));

    // A valid command afterwards proves the queue was drained
    backend.handle.send_command("T=-2").unwrap();
    wait_for(&backend.handle, |msg| {
        matches!(msg, BackendMessage::CommandAck(ack) if ack.sent == "T=-2")
    });

    let written = backend.script.written();
    assert!(!written.iter().any(|c| c == "T=3"));
    assert_eq!(written.last().map(String::as_str), Some("T=-2"));

    backend.shutdown();
}

#[test]
fn test_invalid_commands_sent_directly_are_never_written() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::connected(fast_config(dir.path()));

    // Bypass the handle's validating setters
    assert!(backend
        .handle
        .send(BackendCommand::Configure(ConfigChange::Frequency(3))));
    assert!(backend
        .handle
        .send(BackendCommand::SendCommand(DeviceCommand::Frequency(3))));

    let mut errors = 0;
    wait_for(&backend.handle, |msg| {
        if matches!(msg, BackendMessage::CommandError(_)) {
            errors += 1;
        }
        errors == 2
    });

    assert_eq!(
        backend.script.written(),
        vec!["UM", "OS", "M>0", "R|", "O1"]
    );
    backend.shutdown();
}

#[test]
fn test_streamed_readings_are_not_taken_as_acks() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::connected(fast_config(dir.path()));

    backend.script.push_line("3.2");
    backend.script.push_line("4.1");
    backend
        .script
        .respond_to("PI", "{\"Power\":\"Idle\"}");
    backend.handle.set_power_mode(PowerMode::Idle).unwrap();

    let mut ack = None;
    let mut saw_max = false;
    wait_for(&backend.handle, |msg| {
        match msg {
            BackendMessage::CommandAck(a) if a.sent == "PI" => ack = Some(a.received.clone()),
            BackendMessage::Snapshot(s) if s.max == Some(4.1) => saw_max = true,
            _ => {}
        }
        ack.is_some() && saw_max
    });

    assert_eq!(ack.as_deref(), Some("{\"Power\":\"Idle\"}"));
    backend.shutdown();
}

#[test]
fn test_unit_change_reformats_without_new_reading() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::connected(fast_config(dir.path()));

    backend.script.push_line("10");
    wait_for(&backend.handle, |msg| {
        matches!(msg, BackendMessage::Snapshot(s) if s.speed == Some(10.0))
    });

    backend.handle.set_display_unit(SpeedUnit::KilometersPerHour).unwrap();
    let seen = wait_for(&backend.handle, |msg| {
        matches!(msg, BackendMessage::Snapshot(s) if s.unit == SpeedUnit::KilometersPerHour)
    });
    let Some(BackendMessage::Snapshot(snapshot)) = seen.last() else {
        panic!("expected a snapshot");
    };
    assert_float_eq(snapshot.speed.unwrap(), 36.0, 1e-9);
    assert!(backend.script.written().contains(&"UK".to_string()));

    backend.shutdown();
}

#[test]
fn test_read_failure_sets_error_and_allows_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let backend = ScriptedBackend::connected(fast_config(dir.path()));

    backend.script.push_read_error("device unplugged");
    wait_for(&backend.handle, |msg| {
        matches!(msg, BackendMessage::ConnectionStatus(ConnectionStatus::Error))
    });
    assert_eq!(backend.script.close_calls(), 1);

    backend.handle.connect("/dev/ttyACM0", 115_200);
    wait_for(&backend.handle, |msg| {
        matches!(
            msg,
            BackendMessage::ConnectionStatus(ConnectionStatus::Connected)
        )
    });

    backend.shutdown();
}

#[test]
fn test_simulated_radar_streams_readings() {
    let mut config = AppConfig::default();
    config.serial.connect_settle_ms = 0;
    config.serial.read_timeout_ms = 10;
    config.protocol.settle_delay_ms = 0;

    let (backend, handle) = RadarBackend::new(config);
    let thread = std::thread::spawn(move || backend.run());

    handle.connect("mock", 115_200);
    wait_for(&handle, |msg| {
        matches!(msg, BackendMessage::Snapshot(s) if s.speed.is_some())
    });

    handle.shutdown();
    thread.join().unwrap();
}
