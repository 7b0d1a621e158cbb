//! Data published by the backend and consumed by the tabs.
//!
//! The `Topics` struct is a plain data bus with direct field access.
//! The app writes to it from `process_backend_messages()` and the tabs
//! read from it while rendering.

use std::collections::VecDeque;
use std::path::PathBuf;

use crate::backend::BackendMessage;
use crate::device::DeviceConfig;
use crate::session::{DataPoint, SessionState};
use crate::types::{ConnectionStatus, DisplaySnapshot};
use crate::units::SpeedUnit;

/// Maximum number of entries kept in the CLI log
pub const MAX_CLI_LOG: usize = 500;

/// Points plotted on the Speed Graph tab, reset when a recording starts
#[derive(Debug, Clone, Default)]
pub struct GraphSeries {
    pub instantaneous: Vec<[f64; 2]>,
    pub average: Vec<[f64; 2]>,
}

impl GraphSeries {
    pub fn push(&mut self, point: &DataPoint) {
        if let Some(speed) = point.instantaneous {
            self.instantaneous.push([point.elapsed_seconds, speed]);
        }
        if let Some(average) = point.average {
            self.average.push([point.elapsed_seconds, average]);
        }
    }

    pub fn clear(&mut self) {
        self.instantaneous.clear();
        self.average.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.instantaneous.is_empty() && self.average.is_empty()
    }
}

/// All shared data published by the backend.
pub struct Topics {
    // --- Live data ---
    /// Latest displayable values
    pub snapshot: DisplaySnapshot,
    /// Current connection status
    pub connection_status: ConnectionStatus,
    /// Mirror of the sensor settings
    pub device: DeviceConfig,

    // --- Recording ---
    pub recording_state: SessionState,
    pub recorded_points: usize,
    pub graph: GraphSeries,
    /// File written by the last successful export
    pub last_export: Option<PathBuf>,
    /// Reason of the last failed export, cleared on success
    pub export_error: Option<String>,

    // --- Messages ---
    /// Sent/received pairs, diagnostics and command errors, oldest first
    pub cli_log: VecDeque<String>,
    /// Connection error to show in the status bar
    pub last_error: Option<String>,
    /// Whether the backend has stopped
    pub backend_stopped: bool,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            snapshot: DisplaySnapshot::empty(SpeedUnit::default()),
            connection_status: ConnectionStatus::Disconnected,
            device: DeviceConfig::default(),
            recording_state: SessionState::Idle,
            recorded_points: 0,
            graph: GraphSeries::default(),
            last_export: None,
            export_error: None,
            cli_log: VecDeque::new(),
            last_error: None,
            backend_stopped: false,
        }
    }
}

impl Topics {
    /// Fold one backend message into the topics
    pub fn apply(&mut self, msg: BackendMessage) {
        match msg {
            BackendMessage::ConnectionStatus(status) => {
                self.connection_status = status;
                if status == ConnectionStatus::Connected {
                    self.last_error = None;
                }
            }
            BackendMessage::ConnectionError(err) => {
                self.log(format!("Error: {}", err));
                self.last_error = Some(err);
                self.connection_status = ConnectionStatus::Error;
            }
            BackendMessage::Snapshot(snapshot) => {
                self.snapshot = snapshot;
            }
            BackendMessage::Diagnostic(line) => {
                self.log(format!("Device: {}", line));
            }
            BackendMessage::CommandAck(ack) => {
                self.log(ack.to_string());
            }
            BackendMessage::CommandError(err) => {
                self.log(format!("Error: {}", err));
            }
            BackendMessage::DeviceConfig(device) => {
                self.device = device;
            }
            BackendMessage::RecordingState(state) => {
                if state.is_recording() {
                    self.graph.clear();
                    self.recorded_points = 0;
                }
                self.recording_state = state;
            }
            BackendMessage::RecordedPoint(point) => {
                self.graph.push(&point);
                self.recorded_points += 1;
            }
            BackendMessage::ExportComplete(path) => {
                self.log(format!("Data saved to {}", path.display()));
                self.last_export = Some(path);
                self.export_error = None;
            }
            BackendMessage::ExportFailed(reason) => {
                self.log(format!("Export failed: {}", reason));
                self.export_error = Some(reason);
            }
            BackendMessage::Shutdown => {
                self.backend_stopped = true;
            }
        }
    }

    /// Append an entry to the CLI log, dropping the oldest when full
    pub fn log(&mut self, entry: String) {
        if self.cli_log.len() >= MAX_CLI_LOG {
            self.cli_log.pop_front();
        }
        self.cli_log.push_back(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Ack;

    fn point(t: f64, speed: Option<f64>, average: Option<f64>) -> DataPoint {
        DataPoint {
            elapsed_seconds: t,
            instantaneous: speed,
            average,
            wall_clock_label: "00:00:00.000".to_string(),
        }
    }

    #[test]
    fn test_recording_start_clears_graph() {
        let mut topics = Topics::default();
        topics.apply(BackendMessage::RecordedPoint(point(0.0, Some(1.0), Some(1.0))));
        assert_eq!(topics.graph.instantaneous.len(), 1);

        topics.apply(BackendMessage::RecordingState(SessionState::Recording));
        assert!(topics.graph.is_empty());
        assert_eq!(topics.recorded_points, 0);
    }

    #[test]
    fn test_graph_skips_absent_average() {
        let mut topics = Topics::default();
        topics.apply(BackendMessage::RecordedPoint(point(1.0, Some(3.0), None)));
        assert_eq!(topics.graph.instantaneous, vec![[1.0, 3.0]]);
        assert!(topics.graph.average.is_empty());
    }

    #[test]
    fn test_ack_logged_as_sent_received() {
        let mut topics = Topics::default();
        topics.apply(BackendMessage::CommandAck(Ack {
            sent: "PA".to_string(),
            received: String::new(),
        }));
        assert_eq!(topics.cli_log.back().unwrap(), "Sent: PA\nReceived: ");
    }

    #[test]
    fn test_cli_log_is_bounded() {
        let mut topics = Topics::default();
        for i in 0..(MAX_CLI_LOG + 10) {
            topics.apply(BackendMessage::Diagnostic(format!("line {}", i)));
        }
        assert_eq!(topics.cli_log.len(), MAX_CLI_LOG);
        assert_eq!(topics.cli_log.front().unwrap(), "Device: line 10");
    }

    #[test]
    fn test_export_outcomes() {
        let mut topics = Topics::default();
        topics.apply(BackendMessage::ExportFailed("disk full".to_string()));
        assert_eq!(topics.export_error.as_deref(), Some("disk full"));

        topics.apply(BackendMessage::ExportComplete(PathBuf::from("saved_graphs/a.csv")));
        assert!(topics.export_error.is_none());
        assert_eq!(topics.last_export, Some(PathBuf::from("saved_graphs/a.csv")));
    }

    #[test]
    fn test_connection_error_sets_status() {
        let mut topics = Topics::default();
        topics.apply(BackendMessage::ConnectionError("no such device".to_string()));
        assert_eq!(topics.connection_status, ConnectionStatus::Error);
        topics.apply(BackendMessage::ConnectionStatus(ConnectionStatus::Connected));
        assert!(topics.last_error.is_none());
    }
}
