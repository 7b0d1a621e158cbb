//! Shared state types for the frontend
//!
//! Pages receive `SharedState` via borrowing and return `AppAction`s instead
//! of talking to the backend directly. The app turns actions into calls on
//! the [`RadarHandle`](crate::backend::RadarHandle).

use std::path::PathBuf;

use crate::config::AppConfig;
use crate::device::ConfigChange;
use crate::frontend::topics::Topics;
use crate::session::{ExportFormat, RecordMode};

/// Shared state accessible by all pages (borrowed, not owned).
pub struct SharedState<'a> {
    /// Everything the backend has published
    pub topics: &'a Topics,
    /// Editable configuration; saved on exit
    pub config: &'a mut AppConfig,
    /// Serial ports found by the last scan
    pub available_ports: &'a [String],
}

/// Actions that any page can emit
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    Connect { port: String, baud_rate: u32 },
    Disconnect,
    RefreshPorts,
    Configure(ConfigChange),
    /// Text typed on the CLI tab
    SendCommand(String),
    SaveSettings,
    ResetSettings,
    StartRecording(RecordMode),
    StopRecording,
    RetryExport,
    SetExportTarget {
        output_dir: PathBuf,
        prefix: String,
        format: ExportFormat,
    },
}

/// Top-level tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    General,
    SpeedGraph,
    Cli,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::General, Tab::SpeedGraph, Tab::Cli];

    pub fn title(self) -> &'static str {
        match self {
            Tab::General => "General",
            Tab::SpeedGraph => "Speed Graph",
            Tab::Cli => "CLI",
        }
    }
}
