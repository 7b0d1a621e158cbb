//! Simulated radar for running the panel without hardware
//!
//! The simulator acknowledges every command with a short JSON line and
//! streams signed speed readings that follow a sine wave, so the statistics
//! and recording paths can be exercised end to end. Direction filter and
//! power mode commands are honoured; every other command is only echoed.

use super::{Transport, MOCK_PORT_NAME};
use crate::error::{RadarError, Result};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Interval between simulated readings (~10 Hz)
const READING_INTERVAL: Duration = Duration::from_millis(100);

/// One diagnostic line is interleaved after this many readings
const DIAGNOSTIC_EVERY: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectionGate {
    Both,
    Approaching,
    Receding,
}

/// Synthetic OPS243 sensor
#[derive(Debug)]
pub struct SimulatedRadar {
    open: bool,
    started: Instant,
    next_reading: Instant,
    readings_emitted: u64,
    acks: VecDeque<String>,
    gate: DirectionGate,
    idle: bool,
    /// Peak speed of the sine pattern in m/s
    amplitude: f64,
    /// Frequency of the sine pattern in Hz
    frequency: f64,
}

impl Default for SimulatedRadar {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRadar {
    /// Create a simulator with a 12 m/s, 0.1 Hz speed pattern
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            open: true,
            started: now,
            next_reading: now,
            readings_emitted: 0,
            acks: VecDeque::new(),
            gate: DirectionGate::Both,
            idle: false,
            amplitude: 12.0,
            frequency: 0.1,
        }
    }

    /// Set the sine pattern used for readings
    pub fn with_pattern(mut self, amplitude: f64, frequency: f64) -> Self {
        self.amplitude = amplitude;
        self.frequency = frequency;
        self
    }

    fn apply_command(&mut self, command: &str) {
        match command {
            "R|" => self.gate = DirectionGate::Both,
            "R+" => self.gate = DirectionGate::Approaching,
            "R-" => self.gate = DirectionGate::Receding,
            "PA" => self.idle = false,
            "PI" => self.idle = true,
            _ => {}
        }
    }

    fn sample(&self, now: Instant) -> f64 {
        let t = now.duration_since(self.started).as_secs_f64();
        self.amplitude * (2.0 * std::f64::consts::PI * self.frequency * t).sin()
    }

    fn passes_gate(&self, speed: f64) -> bool {
        match self.gate {
            DirectionGate::Both => true,
            DirectionGate::Approaching => speed > 0.0,
            DirectionGate::Receding => speed < 0.0,
        }
    }
}

impl Transport for SimulatedRadar {
    fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        if !self.open {
            return Err(RadarError::Transport("simulated radar is closed".into()));
        }
        let command = String::from_utf8_lossy(frame).trim().to_string();
        self.apply_command(&command);
        self.acks.push_back(format!("{{\"Command\":\"{}\"}}", command));
        Ok(())
    }

    fn read_line(&mut self, timeout: Duration) -> Result<String> {
        if !self.open {
            return Err(RadarError::Transport("simulated radar is closed".into()));
        }
        if let Some(ack) = self.acks.pop_front() {
            return Ok(ack);
        }
        if self.idle {
            std::thread::sleep(timeout);
            return Ok(String::new());
        }

        let now = Instant::now();
        if now < self.next_reading {
            let wait = self.next_reading - now;
            if wait > timeout {
                std::thread::sleep(timeout);
                return Ok(String::new());
            }
            std::thread::sleep(wait);
        }

        self.next_reading = Instant::now() + READING_INTERVAL;
        self.readings_emitted += 1;
        if self.readings_emitted % DIAGNOSTIC_EVERY == 0 {
            return Ok(format!("# simulated sensor, {} readings", self.readings_emitted));
        }

        let speed = self.sample(Instant::now());
        if !self.passes_gate(speed) {
            return Ok(String::new());
        }
        Ok(format!("{:.2}", speed))
    }

    fn take_buffered_lines(&mut self) -> Result<Vec<String>> {
        if !self.open {
            return Err(RadarError::Transport("simulated radar is closed".into()));
        }
        // Readings are generated on demand, so nothing is ever waiting
        Ok(Vec::new())
    }

    fn close(&mut self) {
        self.open = false;
        self.acks.clear();
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn name(&self) -> String {
        MOCK_PORT_NAME.to_string()
    }
}
