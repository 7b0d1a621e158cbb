//! Session data types

use crate::units::SpeedUnit;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// State of the session recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Not recording
    #[default]
    Idle,
    /// Appending a point for every reading
    Recording,
}

impl SessionState {
    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        matches!(self, SessionState::Recording)
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Recording => "Recording",
        }
    }
}

/// Which values a recording captures for each reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordMode {
    /// Instantaneous speed only
    #[default]
    Instantaneous,
    /// Windowed average only
    Average,
    /// Both values in one point
    Both,
}

impl RecordMode {
    pub const ALL: [RecordMode; 3] = [RecordMode::Instantaneous, RecordMode::Average, RecordMode::Both];

    pub fn records_instantaneous(self) -> bool {
        matches!(self, RecordMode::Instantaneous | RecordMode::Both)
    }

    pub fn records_average(self) -> bool {
        matches!(self, RecordMode::Average | RecordMode::Both)
    }
}

impl std::fmt::Display for RecordMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordMode::Instantaneous => write!(f, "Instantaneous"),
            RecordMode::Average => write!(f, "Average"),
            RecordMode::Both => write!(f, "Both"),
        }
    }
}

/// One recorded sample, in the display unit active when it was captured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Seconds since recording started
    pub elapsed_seconds: f64,
    /// Instantaneous speed, when the mode records it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instantaneous: Option<f64>,
    /// Windowed average, when the mode records it and the window was not empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
    /// Local wall clock time, `HH:MM:SS.mmm`
    pub wall_clock_label: String,
}

/// Recorded points handed to a sink when recording stops
#[derive(Debug, Clone, Copy)]
pub struct SessionExport<'a> {
    pub mode: RecordMode,
    /// Unit active at export time; names the value columns
    pub unit: SpeedUnit,
    pub started_at: DateTime<Local>,
    pub points: &'a [DataPoint],
}

/// File format written by the exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportFormat {
    #[default]
    Csv,
    /// One JSON object per line
    JsonLines,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::JsonLines => "jsonl",
        }
    }
}
