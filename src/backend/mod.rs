//! Backend module for talking to the radar
//!
//! This module owns the transport on a separate thread to keep the UI
//! responsive. It uses crossbeam channels for thread-safe communication
//! with the frontend.
//!
//! # Architecture
//!
//! The backend runs in a separate thread from the UI, communicating via channels:
//!
//! - [`BackendCommand`] - Messages sent from UI to backend (connect, configure, record, etc.)
//! - [`BackendMessage`] - Messages sent from backend to UI (snapshots, acks, status, errors)
//! - [`RadarHandle`] - UI-side handle for sending commands and receiving messages
//! - [`RadarBackend`] - Main backend entry point that runs the worker loop
//! - [`BackendWorker`] - The loop itself: commands, ingestion, idle refresh
//!
//! # Example
//!
//! ```ignore
//! use ops243_panel::backend::{BackendMessage, RadarBackend};
//! use ops243_panel::config::AppConfig;
//!
//! let config = AppConfig::default();
//! let (backend, handle) = RadarBackend::new(config.clone());
//!
//! // Spawn backend thread
//! std::thread::spawn(move || backend.run());
//!
//! handle.connect(config.serial.port.clone(), config.serial.baud_rate);
//! handle.set_frequency(1)?;
//!
//! for msg in handle.drain() {
//!     if let BackendMessage::Snapshot(snapshot) = msg {
//!         println!("{}", snapshot.format_value(snapshot.speed));
//!     }
//! }
//! ```

pub mod worker;

pub use worker::BackendWorker;

use crate::config::AppConfig;
use crate::device::{ConfigChange, DeviceConfig, OutputFormat};
use crate::error::{RadarError, Result};
use crate::protocol::{Ack, DeviceCommand, DirectionFilter, PowerMode};
use crate::session::{DataPoint, ExportFormat, RecordMode, SessionState};
use crate::transport::{Connector, DefaultConnector};
use crate::types::{ConnectionStatus, DisplaySnapshot};
use crate::units::SpeedUnit;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Message sent from the UI to the backend
#[derive(Debug, Clone)]
pub enum BackendCommand {
    /// Open a port and configure the sensor
    Connect { port: String, baud_rate: u32 },
    /// Close the current port
    Disconnect,
    /// Change one sensor setting
    Configure(ConfigChange),
    /// Send a single command, typed by the user or a fixed action
    SendCommand(DeviceCommand),
    /// Begin recording in the given mode
    StartRecording(RecordMode),
    /// Stop recording and export
    StopRecording,
    /// Export points left over from a failed export
    RetryExport,
    /// Where and how recordings are written
    SetExportTarget {
        output_dir: PathBuf,
        prefix: String,
        format: ExportFormat,
    },
    /// Shutdown the backend
    Shutdown,
}

/// Message sent from the backend to the UI
#[derive(Debug, Clone)]
pub enum BackendMessage {
    /// Connection status changed
    ConnectionStatus(ConnectionStatus),
    /// Connection error occurred
    ConnectionError(String),
    /// Values after a reading or an idle refresh
    Snapshot(DisplaySnapshot),
    /// A non-numeric line from the sensor
    Diagnostic(String),
    /// A command round trip completed
    CommandAck(Ack),
    /// A command was rejected or its round trip failed
    CommandError(String),
    /// The sensor settings mirror changed
    DeviceConfig(DeviceConfig),
    /// Recorder state changed
    RecordingState(SessionState),
    /// A point was appended to the recording
    RecordedPoint(DataPoint),
    /// A recording was written to this file
    ExportComplete(PathBuf),
    /// Export failed; the points are kept for a retry
    ExportFailed(String),
    /// Backend is shutting down
    Shutdown,
}

/// UI-side handle to the backend
///
/// Setters validate their argument before anything is queued, so an
/// out-of-range value is reported to the caller and never reaches the worker.
#[derive(Clone)]
pub struct RadarHandle {
    /// Receiver for backend messages
    pub receiver: Receiver<BackendMessage>,
    /// Sender for commands to the backend
    pub command_sender: Sender<BackendCommand>,
}

impl RadarHandle {
    /// Try to receive a message without blocking
    pub fn try_recv(&self) -> Option<BackendMessage> {
        self.receiver.try_recv().ok()
    }

    /// Receive all pending messages
    pub fn drain(&self) -> Vec<BackendMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.receiver.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Send a command to the backend
    pub fn send(&self, cmd: BackendCommand) -> bool {
        self.command_sender.send(cmd).is_ok()
    }

    fn enqueue(&self, cmd: BackendCommand) -> Result<()> {
        self.command_sender
            .send(cmd)
            .map_err(|_| RadarError::Channel("backend is not running".to_string()))
    }

    /// Request connection to a port
    pub fn connect(&self, port: impl Into<String>, baud_rate: u32) {
        let _ = self.command_sender.send(BackendCommand::Connect {
            port: port.into(),
            baud_rate,
        });
    }

    /// Request disconnection
    pub fn disconnect(&self) {
        let _ = self.command_sender.send(BackendCommand::Disconnect);
    }

    /// Validate and queue a settings change
    pub fn configure(&self, change: ConfigChange) -> Result<()> {
        change.commands()?;
        self.enqueue(BackendCommand::Configure(change))
    }

    pub fn set_frequency(&self, frequency: i32) -> Result<()> {
        self.configure(ConfigChange::Frequency(frequency))
    }

    pub fn set_output_format(&self, format: OutputFormat) -> Result<()> {
        self.configure(ConfigChange::OutputFormat(format))
    }

    pub fn set_magnitude_filter(&self, threshold: u32) -> Result<()> {
        self.configure(ConfigChange::MagnitudeFilter(threshold))
    }

    pub fn set_direction_filter(&self, filter: DirectionFilter) -> Result<()> {
        self.configure(ConfigChange::DirectionFilter(filter))
    }

    pub fn set_power_mode(&self, mode: PowerMode) -> Result<()> {
        self.configure(ConfigChange::PowerMode(mode))
    }

    /// Change the display unit; also sent to the sensor when connected
    pub fn set_display_unit(&self, unit: SpeedUnit) -> Result<()> {
        self.configure(ConfigChange::DisplayUnit(unit))
    }

    /// Parse a user-typed command and queue it
    ///
    /// Known commands are range-checked, so `T=3` is rejected here.
    pub fn send_command(&self, text: &str) -> Result<DeviceCommand> {
        let command: DeviceCommand = text.parse()?;
        self.enqueue(BackendCommand::SendCommand(command.clone()))?;
        Ok(command)
    }

    /// Persist the current settings on the sensor (`A!`)
    pub fn save_settings(&self) {
        let _ = self
            .command_sender
            .send(BackendCommand::SendCommand(DeviceCommand::SaveSettings));
    }

    /// Reset the sensor settings (`P!`)
    pub fn reset_settings(&self) {
        let _ = self
            .command_sender
            .send(BackendCommand::SendCommand(DeviceCommand::ResetSettings));
    }

    pub fn start_recording(&self, mode: RecordMode) {
        let _ = self
            .command_sender
            .send(BackendCommand::StartRecording(mode));
    }

    pub fn stop_recording(&self) {
        let _ = self.command_sender.send(BackendCommand::StopRecording);
    }

    pub fn retry_export(&self) {
        let _ = self.command_sender.send(BackendCommand::RetryExport);
    }

    pub fn set_export_target(&self, output_dir: PathBuf, prefix: String, format: ExportFormat) {
        let _ = self.command_sender.send(BackendCommand::SetExportTarget {
            output_dir,
            prefix,
            format,
        });
    }

    /// Request shutdown
    pub fn shutdown(&self) {
        let _ = self.command_sender.send(BackendCommand::Shutdown);
    }
}

/// The radar backend that runs in a separate thread
pub struct RadarBackend {
    /// Configuration
    config: AppConfig,
    /// Opens the transport on connect
    connector: Box<dyn Connector>,
    /// Receiver for commands from the UI
    command_receiver: Receiver<BackendCommand>,
    /// Sender for messages to the UI
    message_sender: Sender<BackendMessage>,
    /// Running flag
    running: Arc<AtomicBool>,
}

impl RadarBackend {
    /// Create a new backend with communication channels
    pub fn new(config: AppConfig) -> (Self, RadarHandle) {
        let (cmd_tx, cmd_rx) = bounded(256);
        // Bounded; the worker drops readings rather than block if the UI stalls
        let (msg_tx, msg_rx) = bounded(10_000);

        let backend = Self {
            config,
            connector: Box::new(DefaultConnector),
            command_receiver: cmd_rx,
            message_sender: msg_tx,
            running: Arc::new(AtomicBool::new(true)),
        };

        let handle = RadarHandle {
            receiver: msg_rx,
            command_sender: cmd_tx,
        };

        (backend, handle)
    }

    /// Replace the connector used to open ports
    pub fn with_connector(mut self, connector: Box<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    /// Run the backend loop
    pub fn run(self) {
        let mut worker = BackendWorker::new(
            self.config,
            self.connector,
            self.command_receiver,
            self.message_sender,
            self.running,
        );
        worker.run();
    }
}
