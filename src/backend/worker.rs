//! Backend Worker Thread Implementation
//!
//! This module contains the main worker loop that runs in a separate thread
//! and owns the transport. It communicates with the UI thread through
//! crossbeam channels.
//!
//! # Responsibilities
//!
//! - **Command processing**: Responds to UI commands (connect, configure, record, etc.)
//! - **Reading ingestion**: One bounded read per iteration while connected
//! - **Statistics**: Feeds readings to the statistics engine and the recorder
//! - **Idle refresh**: Re-prunes the averaging window on a slow tick so the
//!   average decays once readings stop
//! - **Error handling**: A transport error while ingesting ends the connection;
//!   a failed command round trip is reported and ingestion carries on
//!
//! Commands are dispatched between reads on the same thread, so a command's
//! write-then-read never overlaps a reading read. Readings that arrive during
//! a round trip are held by the command channel and ingested afterwards.
//!
//! Publishing never blocks. Snapshots, recorded points and diagnostics are
//! dropped when the message queue is nearly full, leaving room for status,
//! acknowledgment and export messages.

use crate::backend::{BackendCommand, BackendMessage};
use crate::config::AppConfig;
use crate::device::{ConfigChange, DeviceConfig};
use crate::error::RadarError;
use crate::protocol::{parse_line, CommandChannel, DeviceCommand, ParsedLine};
use crate::session::{ExportFormat, FileExporter, RecordMode, SessionRecorder, StopOutcome};
use crate::stats::StatisticsEngine;
use crate::transport::{Connector, Transport};
use crate::types::ConnectionStatus;
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sleep between iterations while no port is open
const DISCONNECTED_SLEEP: Duration = Duration::from_millis(10);

/// Upper bound on queue slots reserved for control messages
const MAX_CONTROL_HEADROOM: usize = 64;

/// The backend worker that runs the ingestion loop
pub struct BackendWorker {
    /// Application configuration
    config: AppConfig,
    /// Opens the transport on connect
    connector: Box<dyn Connector>,
    /// Command receiver from the UI
    command_rx: Receiver<BackendCommand>,
    /// Message sender to the UI
    message_tx: Sender<BackendMessage>,
    /// Running flag
    running: Arc<AtomicBool>,
    /// Open link to the sensor, owned exclusively by this worker
    transport: Option<Box<dyn Transport>>,
    channel: CommandChannel,
    stats: StatisticsEngine,
    recorder: SessionRecorder,
    exporter: FileExporter,
    /// Mirror of the sensor settings
    device: DeviceConfig,
    /// Current connection status
    connection_status: ConnectionStatus,
    /// Last idle refresh
    last_refresh: Instant,
    /// Messages dropped because the UI was not draining the queue
    dropped_messages: u64,
}

impl BackendWorker {
    /// Create a new backend worker
    pub fn new(
        config: AppConfig,
        connector: Box<dyn Connector>,
        command_rx: Receiver<BackendCommand>,
        message_tx: Sender<BackendMessage>,
        running: Arc<AtomicBool>,
    ) -> Self {
        let device = config.device;
        let channel = CommandChannel::new(config.protocol.timing());
        let stats = StatisticsEngine::new(config.statistics.window(), device.display_unit);
        let exporter = config.recording.exporter();
        let mut recorder = SessionRecorder::new();
        recorder.set_max_points(config.recording.max_points);

        Self {
            config,
            connector,
            command_rx,
            message_tx,
            running,
            transport: None,
            channel,
            stats,
            recorder,
            exporter,
            device,
            connection_status: ConnectionStatus::Disconnected,
            last_refresh: Instant::now(),
            dropped_messages: 0,
        }
    }

    /// Run the main worker loop
    pub fn run(&mut self) {
        tracing::info!("Backend worker started");
        self.publish(BackendMessage::DeviceConfig(self.device));

        while self.running.load(Ordering::SeqCst) {
            // Process pending commands
            self.process_commands();

            if self.is_connected() {
                self.ingest_once();
            } else {
                std::thread::sleep(DISCONNECTED_SLEEP);
            }

            if self.last_refresh.elapsed() >= self.config.statistics.refresh_interval() {
                self.refresh_tick(Instant::now());
            }
        }

        // Cleanup
        if self.recorder.is_recording() {
            self.stop_recording();
        }
        self.close_transport();

        self.publish(BackendMessage::Shutdown);
        if self.dropped_messages > 0 {
            tracing::warn!("{} messages dropped in total", self.dropped_messages);
        }
        tracing::info!("Backend worker stopped");
    }

    /// Send a message to the UI without blocking
    fn publish(&mut self, msg: BackendMessage) {
        if let Err(TrySendError::Full(_)) = self.message_tx.try_send(msg) {
            self.count_dropped();
        }
    }

    /// Send a high-rate message, skipping it when the queue is nearly full
    fn publish_data(&mut self, msg: BackendMessage) {
        if let Some(capacity) = self.message_tx.capacity() {
            let headroom = (capacity / 4).min(MAX_CONTROL_HEADROOM);
            if self.message_tx.len() + headroom >= capacity {
                self.count_dropped();
                return;
            }
        }
        self.publish(msg);
    }

    fn count_dropped(&mut self) {
        self.dropped_messages += 1;
        if self.dropped_messages == 1 || self.dropped_messages % 1000 == 0 {
            tracing::warn!(
                "Message queue full; {} messages dropped so far",
                self.dropped_messages
            );
        }
    }

    fn is_connected(&self) -> bool {
        self.connection_status == ConnectionStatus::Connected && self.transport.is_some()
    }

    /// Process pending commands from the UI
    fn process_commands(&mut self) {
        loop {
            match self.command_rx.try_recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    }

    /// Handle a single command
    fn handle_command(&mut self, cmd: BackendCommand) {
        match cmd {
            BackendCommand::Connect { port, baud_rate } => {
                self.handle_connect(&port, baud_rate);
            }
            BackendCommand::Disconnect => {
                self.handle_disconnect();
            }
            BackendCommand::Configure(change) => {
                self.configure(change);
            }
            BackendCommand::SendCommand(command) => {
                self.send_user_command(command);
            }
            BackendCommand::StartRecording(mode) => {
                self.start_recording(mode);
            }
            BackendCommand::StopRecording => {
                self.stop_recording();
            }
            BackendCommand::RetryExport => {
                self.retry_export();
            }
            BackendCommand::SetExportTarget {
                output_dir,
                prefix,
                format,
            } => {
                self.set_export_target(output_dir, prefix, format);
            }
            BackendCommand::Shutdown => {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    /// Handle connect command
    fn handle_connect(&mut self, port: &str, baud_rate: u32) {
        if self.transport.is_some() {
            self.close_transport();
        }
        self.update_connection_status(ConnectionStatus::Connecting);

        let transport = match self.connector.open(port, baud_rate) {
            Ok(transport) => transport,
            Err(e) => {
                self.fail_connection(format!("Failed to connect to {}: {}", port, e));
                return;
            }
        };

        let settle = self.config.serial.connect_settle();
        if !settle.is_zero() {
            std::thread::sleep(settle);
        }

        self.transport = Some(transport);
        self.stats.reset();
        self.stats.set_unit(self.device.display_unit);

        tracing::info!("Configuring sensor on {}", port);
        let sequence = self.device.connect_sequence();
        if let Some(e) = self.dispatch(&sequence) {
            if e.is_transport() {
                self.fail_connection(format!("Failed to configure sensor: {}", e));
                return;
            }
        }

        self.update_connection_status(ConnectionStatus::Connected);
        self.publish(BackendMessage::DeviceConfig(self.device));
        self.publish(BackendMessage::Snapshot(self.stats.snapshot()));
        tracing::info!("Connected to {} at {} baud", port, baud_rate);
    }

    /// Handle disconnect command
    fn handle_disconnect(&mut self) {
        self.close_transport();
        self.update_connection_status(ConnectionStatus::Disconnected);
        tracing::info!("Disconnected from sensor");
    }

    fn close_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }

    fn fail_connection(&mut self, message: String) {
        tracing::error!("{}", message);
        self.close_transport();
        self.update_connection_status(ConnectionStatus::Error);
        self.publish(BackendMessage::ConnectionError(message));
    }

    fn update_connection_status(&mut self, status: ConnectionStatus) {
        self.connection_status = status;
        self.publish(BackendMessage::ConnectionStatus(status));
    }

    /// Send commands in order, publishing every acknowledgment
    ///
    /// Returns the error that stopped the sequence, if any. The caller decides
    /// whether it ends the connection.
    fn dispatch(&mut self, commands: &[DeviceCommand]) -> Option<RadarError> {
        let Some(transport) = self.transport.as_mut() else {
            let error = RadarError::Transport("Not connected".to_string());
            self.publish(BackendMessage::CommandError(error.to_string()));
            return Some(error);
        };

        let (acks, error) = self.channel.send_sequence(transport.as_mut(), commands);

        // Readings that streamed in around the round trips
        for line in self.channel.take_deferred() {
            self.handle_line(&line, Instant::now());
        }

        for ack in acks {
            self.publish(BackendMessage::CommandAck(ack));
        }
        if let Some(e) = &error {
            self.publish(BackendMessage::CommandError(e.to_string()));
        }
        error
    }

    /// Apply a settings change to the mirror, then to the sensor
    fn configure(&mut self, change: ConfigChange) {
        let commands = match self.device.apply(change) {
            Ok(commands) => commands,
            Err(e) => {
                tracing::warn!("Rejected setting: {}", e);
                self.publish(BackendMessage::CommandError(e.to_string()));
                return;
            }
        };
        self.device_changed();

        if self.transport.is_some() {
            self.dispatch(&commands);
        } else {
            tracing::debug!("Not connected; {:?} applied to the mirror only", change);
        }
    }

    fn send_user_command(&mut self, command: DeviceCommand) {
        if self.transport.is_none() {
            self.publish(BackendMessage::CommandError(format!(
                "Not connected; {} not sent",
                command
            )));
            return;
        }
        if let Err(e) = command.validate() {
            tracing::warn!("Rejected command {}: {}", command, e);
            self.publish(BackendMessage::CommandError(e.to_string()));
            return;
        }
        if self.device.track(&command) {
            self.device_changed();
        }
        self.dispatch(std::slice::from_ref(&command));
    }

    fn device_changed(&mut self) {
        if self.stats.unit() != self.device.display_unit {
            self.stats.set_unit(self.device.display_unit);
            self.publish(BackendMessage::Snapshot(self.stats.snapshot()));
        }
        self.publish(BackendMessage::DeviceConfig(self.device));
    }

    /// Read at most one line and fold it into the statistics
    fn ingest_once(&mut self) {
        let timeout = self.config.serial.read_timeout();
        let result = match self.transport.as_mut() {
            Some(transport) => transport.read_line(timeout),
            None => return,
        };

        match result {
            Ok(line) => self.handle_line(&line, Instant::now()),
            Err(e) => self.fail_connection(format!("Lost connection to sensor: {}", e)),
        }
    }

    fn handle_line(&mut self, line: &str, now: Instant) {
        match parse_line(line, now) {
            ParsedLine::Empty => {}
            ParsedLine::Unrecognized(text) => {
                tracing::debug!("Unrecognized line: {}", text);
                self.publish_data(BackendMessage::Diagnostic(text));
            }
            ParsedLine::Reading(reading) => {
                let snapshot = self.stats.observe(&reading, reading.timestamp);
                if let Some(point) = self.recorder.record(&snapshot, reading.timestamp) {
                    let point = point.clone();
                    self.publish_data(BackendMessage::RecordedPoint(point));
                }
                self.publish_data(BackendMessage::Snapshot(snapshot));
            }
        }
    }

    /// Re-prune the window and publish, even without new readings
    fn refresh_tick(&mut self, now: Instant) {
        self.last_refresh = now;
        if self.stats.readings_observed() == 0 {
            return;
        }
        let snapshot = self.stats.refresh(now);
        self.publish_data(BackendMessage::Snapshot(snapshot));
    }

    fn start_recording(&mut self, mode: RecordMode) {
        self.recorder.start_recording(mode, Instant::now());
        self.publish(BackendMessage::RecordingState(self.recorder.state()));
    }

    fn stop_recording(&mut self) {
        let result = self
            .recorder
            .stop_recording(&mut self.exporter, self.stats.unit());
        self.publish(BackendMessage::RecordingState(self.recorder.state()));
        self.report_export(result);
    }

    fn retry_export(&mut self) {
        let result = self
            .recorder
            .retry_export(&mut self.exporter, self.stats.unit());
        self.report_export(result);
    }

    fn report_export(&mut self, result: crate::error::Result<StopOutcome>) {
        match result {
            Ok(StopOutcome::Exported { path, .. }) => {
                self.publish(BackendMessage::ExportComplete(path));
            }
            Ok(StopOutcome::NothingRecorded) => {
                tracing::info!("Nothing recorded; no file written");
            }
            Err(e) => {
                tracing::error!("Export failed: {}", e);
                self.publish(BackendMessage::ExportFailed(e.to_string()));
            }
        }
    }

    fn set_export_target(&mut self, output_dir: PathBuf, prefix: String, format: ExportFormat) {
        tracing::debug!("Recordings go to {}", output_dir.display());
        self.exporter.set_output_dir(output_dir);
        self.exporter.set_prefix(prefix);
        self.exporter.set_format(format);
    }
}
