//! Frontend module for egui UI
//!
//! This module provides the control panel using eframe/egui. It receives
//! data from the backend through crossbeam channels and renders it in
//! real time.
//!
//! # Architecture
//!
//! The window has three tabs (General, Speed Graph, CLI). Pages read the
//! [`Topics`] published by the backend and return [`AppAction`]s; the app
//! turns actions into calls on the [`RadarHandle`].
//!
//! # Submodules
//!
//! - `pages` - One render function per tab
//! - `topics` - Data bus filled from backend messages
//! - `state` - Shared state and actions
//! - `status_bar` - Bottom status bar
//! - `widgets` - Custom UI widgets (status indicator, readouts)

pub mod pages;
pub mod state;
pub mod status_bar;
pub mod topics;
pub mod widgets;

use std::time::Duration;

use crate::backend::{BackendMessage, RadarHandle};
use crate::config::AppConfig;
use crate::transport::list_ports;
use crate::types::ConnectionStatus;

pub use pages::{
    CliPage, CliPageState, GeneralPage, GeneralPageState, Page, SpeedGraphPage,
    SpeedGraphPageState,
};
pub use state::{AppAction, SharedState, Tab};
pub use topics::Topics;

/// Main application state
pub struct PanelApp {
    /// Channels to the backend worker
    handle: RadarHandle,
    /// Data published by the backend
    topics: Topics,
    /// Editable configuration, saved on exit
    config: AppConfig,
    /// Serial ports found by the last scan
    available_ports: Vec<String>,
    /// Currently selected tab
    tab: Tab,
    general: GeneralPageState,
    speed_graph: SpeedGraphPageState,
    cli: CliPageState,
    /// Last error raised by a UI action
    last_error: Option<String>,
}

impl PanelApp {
    /// Create a new application instance
    pub fn new(_cc: &eframe::CreationContext<'_>, handle: RadarHandle, config: AppConfig) -> Self {
        let mut app = Self::with_handle(handle, config);
        app.available_ports = list_ports();
        app
    }

    /// Build the app state without a window, used by `new` and by tests
    pub fn with_handle(handle: RadarHandle, config: AppConfig) -> Self {
        Self {
            handle,
            topics: Topics::default(),
            general: GeneralPageState::from_config(&config),
            speed_graph: SpeedGraphPageState::default(),
            cli: CliPageState::default(),
            config,
            available_ports: Vec::new(),
            tab: Tab::default(),
            last_error: None,
        }
    }

    /// Configuration as edited in the UI
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    fn process_backend_messages(&mut self) -> bool {
        let messages = self.handle.drain();
        let had_messages = !messages.is_empty();

        for msg in messages {
            if matches!(msg, BackendMessage::Shutdown) {
                tracing::info!("Backend shutdown received");
            }
            self.topics.apply(msg);
        }

        had_messages
    }

    fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::Connect { port, baud_rate } => {
                self.last_error = None;
                self.handle.connect(port, baud_rate);
            }
            AppAction::Disconnect => {
                self.handle.disconnect();
            }
            AppAction::RefreshPorts => {
                self.available_ports = list_ports();
                tracing::debug!("Found {} serial ports", self.available_ports.len());
            }
            AppAction::Configure(change) => {
                if let Err(e) = self.handle.configure(change) {
                    tracing::warn!("Rejected setting {:?}: {}", change, e);
                    self.last_error = Some(e.to_string());
                }
            }
            AppAction::SendCommand(text) => match self.handle.send_command(&text) {
                Ok(command) => {
                    tracing::debug!("Queued command {}", command);
                }
                Err(e) => {
                    self.topics.log(format!("Error: {}", e));
                    self.last_error = Some(e.to_string());
                }
            },
            AppAction::SaveSettings => {
                self.handle.save_settings();
            }
            AppAction::ResetSettings => {
                self.handle.reset_settings();
            }
            AppAction::StartRecording(mode) => {
                self.config.recording.mode = mode;
                self.handle.start_recording(mode);
            }
            AppAction::StopRecording => {
                self.handle.stop_recording();
            }
            AppAction::RetryExport => {
                self.handle.retry_export();
            }
            AppAction::SetExportTarget {
                output_dir,
                prefix,
                format,
            } => {
                self.handle.set_export_target(output_dir, prefix, format);
            }
        }
    }
}

impl eframe::App for PanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let had_messages = self.process_backend_messages();

        if self.topics.connection_status == ConnectionStatus::Connected || had_messages {
            ctx.request_repaint();
        } else {
            // Keep polling the channel while idle
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for tab in Tab::ALL {
                    ui.selectable_value(&mut self.tab, tab, tab.title());
                }
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            let last_error = self
                .last_error
                .as_deref()
                .or(self.topics.last_error.as_deref());
            let status_ctx = status_bar::StatusBarContext {
                topics: &self.topics,
                port: &self.config.serial.port,
                last_error,
            };
            status_bar::render_status_bar(ui, &status_ctx);
        });

        let actions = egui::CentralPanel::default()
            .show(ctx, |ui| {
                let mut shared = SharedState {
                    topics: &self.topics,
                    config: &mut self.config,
                    available_ports: &self.available_ports,
                };
                match self.tab {
                    Tab::General => egui::ScrollArea::vertical()
                        .show(ui, |ui| GeneralPage::render(&mut self.general, &mut shared, ui))
                        .inner,
                    Tab::SpeedGraph => {
                        SpeedGraphPage::render(&mut self.speed_graph, &mut shared, ui)
                    }
                    Tab::Cli => CliPage::render(&mut self.cli, &mut shared, ui),
                }
            })
            .inner;

        for action in actions {
            self.handle_action(action);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.handle.shutdown();

        if let Err(e) = self.config.save() {
            tracing::warn!("Failed to save config: {}", e);
        }
    }
}
