//! Core data types for the OPS243 panel
//!
//! This module contains the fundamental types shared between the worker
//! thread and the frontend: readings, direction, connection status and the
//! display snapshot published after every observation.

use crate::units::SpeedUnit;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A single speed reading produced by the parser
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Arrival time of the line that carried the reading
    pub timestamp: Instant,
    /// Signed speed in m/s; positive is approaching
    pub raw_speed: f64,
}

impl Reading {
    /// Create a new reading
    pub fn new(timestamp: Instant, raw_speed: f64) -> Self {
        Self {
            timestamp,
            raw_speed,
        }
    }

    /// Speed magnitude in m/s
    pub fn magnitude(&self) -> f64 {
        self.raw_speed.abs()
    }

    /// Direction of travel encoded by the sign
    pub fn direction(&self) -> Direction {
        Direction::from_raw_speed(self.raw_speed)
    }
}

/// Direction of travel relative to the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Target moving towards the sensor
    Approaching,
    /// Target moving away from the sensor
    Receding,
}

impl Direction {
    /// Classify a signed speed. Zero counts as receding.
    pub fn from_raw_speed(raw_speed: f64) -> Self {
        if raw_speed > 0.0 {
            Direction::Approaching
        } else {
            Direction::Receding
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Approaching => write!(f, "Approaching"),
            Direction::Receding => write!(f, "Receding"),
        }
    }
}

/// Current displayable values, already converted to the display unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySnapshot {
    /// Latest speed magnitude
    pub speed: Option<f64>,
    /// Largest magnitude seen since connect
    pub max: Option<f64>,
    /// Smallest magnitude seen since connect
    pub min: Option<f64>,
    /// Mean over the trailing window, if the window is not empty
    pub average: Option<f64>,
    /// Direction of the latest reading
    pub direction: Option<Direction>,
    /// Unit the values above are expressed in
    pub unit: SpeedUnit,
}

impl DisplaySnapshot {
    /// A snapshot with nothing observed yet
    pub fn empty(unit: SpeedUnit) -> Self {
        Self {
            speed: None,
            max: None,
            min: None,
            average: None,
            direction: None,
            unit,
        }
    }

    /// Format an optional value with the snapshot's unit, "N/A" when absent
    pub fn format_value(&self, value: Option<f64>) -> String {
        match value {
            Some(v) => format!("{:.2} {}", v, self.unit.label()),
            None => "N/A".to_string(),
        }
    }
}

/// Connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// Not connected to the sensor
    #[default]
    Disconnected,
    /// Opening the port and configuring the sensor
    Connecting,
    /// Connected and streaming
    Connected,
    /// Connection error occurred
    Error,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Connecting => write!(f, "Connecting..."),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Error => write!(f, "Error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_classification() {
        assert_eq!(Direction::from_raw_speed(3.2), Direction::Approaching);
        assert_eq!(Direction::from_raw_speed(-1.0), Direction::Receding);
        assert_eq!(Direction::from_raw_speed(0.0), Direction::Receding);
        assert_eq!(Direction::from_raw_speed(-0.0), Direction::Receding);
    }

    #[test]
    fn test_reading_magnitude() {
        let reading = Reading::new(Instant::now(), -4.5);
        assert_eq!(reading.magnitude(), 4.5);
        assert_eq!(reading.direction(), Direction::Receding);
    }

    #[test]
    fn test_snapshot_formatting() {
        let snapshot = DisplaySnapshot::empty(SpeedUnit::MilesPerHour);
        assert_eq!(snapshot.format_value(None), "N/A");
        assert_eq!(snapshot.format_value(Some(12.346)), "12.35 mph");
    }

    #[test]
    fn test_connection_status_display() {
        assert_eq!(ConnectionStatus::Connecting.to_string(), "Connecting...");
        assert_eq!(ConnectionStatus::default(), ConnectionStatus::Disconnected);
    }
}
