//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

use ops243_panel::backend::{BackendMessage, RadarBackend, RadarHandle};
use ops243_panel::config::AppConfig;
use ops243_panel::transport::{ScriptedConnector, ScriptedTransport};
use ops243_panel::types::ConnectionStatus;
use ops243_panel::units::SpeedUnit;
use std::path::Path;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How long a test waits for an expected backend message
pub fn test_timeout() -> Duration {
    Duration::from_secs(3)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Config with every delay zeroed, speeds in m/s, exports under `output_dir`
pub fn fast_config(output_dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.serial.connect_settle_ms = 0;
    config.serial.read_timeout_ms = 0;
    config.protocol.settle_delay_ms = 0;
    config.protocol.ack_timeout_ms = 0;
    config.device.display_unit = SpeedUnit::MetersPerSecond;
    config.recording.output_dir = output_dir.to_path_buf();
    config
}

/// A backend thread talking to a scripted sensor
pub struct ScriptedBackend {
    pub handle: RadarHandle,
    pub script: ScriptedTransport,
    pub thread: JoinHandle<()>,
}

impl ScriptedBackend {
    pub fn spawn(config: AppConfig) -> Self {
        let script = ScriptedTransport::new();
        let connector = ScriptedConnector::new(script.clone());
        let (backend, handle) = RadarBackend::new(config);
        let backend = backend.with_connector(Box::new(connector));
        let thread = std::thread::spawn(move || backend.run());

        Self {
            handle,
            script,
            thread,
        }
    }

    /// Spawn and wait until the connect sequence has finished
    pub fn connected(config: AppConfig) -> Self {
        let backend = Self::spawn(config);
        backend.handle.connect("/dev/ttyACM0", 115_200);
        wait_for(&backend.handle, |msg| {
            matches!(
                msg,
                BackendMessage::ConnectionStatus(ConnectionStatus::Connected)
            )
        });
        backend
    }

    /// Stop the worker and return every message it published afterwards
    pub fn shutdown(self) -> Vec<BackendMessage> {
        self.handle.shutdown();
        self.thread.join().expect("backend thread panicked");
        self.handle.drain()
    }
}

/// Receive messages until one matches, returning everything seen up to and
/// including the match. Panics on timeout.
pub fn wait_for(
    handle: &RadarHandle,
    mut predicate: impl FnMut(&BackendMessage) -> bool,
) -> Vec<BackendMessage> {
    let deadline = Instant::now() + test_timeout();
    let mut seen = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match handle.receiver.recv_timeout(remaining) {
            Ok(msg) => {
                let done = predicate(&msg);
                seen.push(msg);
                if done {
                    return seen;
                }
            }
            Err(_) => panic!("timed out waiting for backend message; saw {:?}", seen),
        }
    }
}
