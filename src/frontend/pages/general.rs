//! General page - connection, live readouts and sensor controls

use egui::{Color32, Ui};

use super::Page;
use crate::config::{AppConfig, SUPPORTED_BAUD_RATES};
use crate::device::{ConfigChange, OutputFormat};
use crate::frontend::state::{AppAction, SharedState};
use crate::frontend::widgets::{Readout, StatusIndicator};
use crate::protocol::{DirectionFilter, PowerMode, FREQUENCY_RANGE};
use crate::types::ConnectionStatus;
use crate::units::SpeedUnit;

/// State specific to the General page
pub struct GeneralPageState {
    pub port_input: String,
    pub baud_rate: u32,
    /// Pending frequency, applied with the Set button
    pub frequency: i32,
    /// Pending magnitude filter, applied with the Set button
    pub magnitude_filter: u32,
}

impl GeneralPageState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            port_input: config.serial.port.clone(),
            baud_rate: config.serial.baud_rate,
            frequency: config.device.frequency,
            magnitude_filter: config.device.magnitude_filter,
        }
    }
}

pub struct GeneralPage;

impl Page for GeneralPage {
    type State = GeneralPageState;

    fn render(
        state: &mut Self::State,
        shared: &mut SharedState<'_>,
        ui: &mut Ui,
    ) -> Vec<AppAction> {
        let mut actions = Vec::new();

        ui.group(|ui| {
            ui.heading("General Information");
            render_connection(state, shared, ui, &mut actions);
        });

        ui.add_space(6.0);
        ui.group(|ui| {
            ui.heading("Live Stats");
            render_stats(shared, ui, &mut actions);
        });

        ui.add_space(6.0);
        ui.group(|ui| {
            ui.heading("Sensor Controls");
            render_controls(state, shared, ui, &mut actions);
        });

        actions
    }
}

fn render_connection(
    state: &mut GeneralPageState,
    shared: &mut SharedState<'_>,
    ui: &mut Ui,
    actions: &mut Vec<AppAction>,
) {
    let status = shared.topics.connection_status;

    ui.horizontal(|ui| {
        ui.label("Port:");
        egui::ComboBox::from_id_salt("general_port")
            .selected_text(state.port_input.as_str())
            .show_ui(ui, |ui| {
                for port in shared.available_ports {
                    ui.selectable_value(&mut state.port_input, port.clone(), port.as_str());
                }
                ui.selectable_value(
                    &mut state.port_input,
                    crate::transport::MOCK_PORT_NAME.to_string(),
                    "Simulated radar",
                );
            });
        ui.text_edit_singleline(&mut state.port_input);
        if ui.button("⟳").on_hover_text("Rescan ports").clicked() {
            actions.push(AppAction::RefreshPorts);
        }
    });

    ui.horizontal(|ui| {
        ui.label("Baud:");
        for baud in SUPPORTED_BAUD_RATES {
            ui.radio_value(&mut state.baud_rate, baud, baud.to_string());
        }
    });

    ui.horizontal(|ui| {
        match status {
            ConnectionStatus::Connected | ConnectionStatus::Connecting => {
                if ui.button("Disconnect").clicked() {
                    actions.push(AppAction::Disconnect);
                }
            }
            ConnectionStatus::Disconnected | ConnectionStatus::Error => {
                if ui.button("Connect").clicked() {
                    shared.config.serial.port = state.port_input.trim().to_string();
                    shared.config.serial.baud_rate = state.baud_rate;
                    actions.push(AppAction::Connect {
                        port: state.port_input.trim().to_string(),
                        baud_rate: state.baud_rate,
                    });
                }
            }
        }

        let mut indicator = StatusIndicator::for_status(status);
        if let Some(err) = &shared.topics.last_error {
            indicator = indicator.with_tooltip(err.as_str());
        }
        ui.add(indicator);
    });

    if let Some(err) = &shared.topics.last_error {
        ui.colored_label(Color32::RED, err);
    }
}

fn render_stats(shared: &mut SharedState<'_>, ui: &mut Ui, actions: &mut Vec<AppAction>) {
    let snapshot = shared.topics.snapshot;
    ui.add(Readout::new("Speed", snapshot.format_value(snapshot.speed)));
    ui.add(Readout::new("Max Speed", snapshot.format_value(snapshot.max)));
    ui.add(Readout::new("Min Speed", snapshot.format_value(snapshot.min)));
    ui.add(Readout::new(
        "Avg Speed (5s)",
        snapshot.format_value(snapshot.average),
    ));
    ui.add(Readout::new(
        "Direction",
        snapshot
            .direction
            .map(|d| d.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
    ));

    ui.horizontal(|ui| {
        ui.label("Display unit:");
        let current = shared.topics.device.display_unit;
        for unit in SpeedUnit::ALL {
            if ui.radio(current == unit, unit.label()).clicked() && current != unit {
                shared.config.device.display_unit = unit;
                actions.push(AppAction::Configure(ConfigChange::DisplayUnit(unit)));
            }
        }
    });
}

fn render_controls(
    state: &mut GeneralPageState,
    shared: &mut SharedState<'_>,
    ui: &mut Ui,
    actions: &mut Vec<AppAction>,
) {
    let device = shared.topics.device;

    ui.horizontal(|ui| {
        ui.label("Frequency (T=):");
        ui.add(egui::DragValue::new(&mut state.frequency).range(FREQUENCY_RANGE));
        if ui.button("Set").clicked() {
            actions.push(AppAction::Configure(ConfigChange::Frequency(state.frequency)));
        }
        ui.weak(format!("current T={}", device.frequency));
    });

    ui.horizontal(|ui| {
        ui.label("Output:");
        for format in OutputFormat::ALL {
            if ui
                .radio(device.output_format == format, format.to_string())
                .clicked()
                && device.output_format != format
            {
                actions.push(AppAction::Configure(ConfigChange::OutputFormat(format)));
            }
        }
    });

    ui.horizontal(|ui| {
        ui.label("Magnitude filter (M>):");
        ui.add(egui::DragValue::new(&mut state.magnitude_filter).range(0..=10_000));
        if ui.button("Set").clicked() {
            shared.config.device.magnitude_filter = state.magnitude_filter;
            actions.push(AppAction::Configure(ConfigChange::MagnitudeFilter(
                state.magnitude_filter,
            )));
        }
    });

    ui.horizontal(|ui| {
        ui.label("Direction:");
        for filter in DirectionFilter::ALL {
            if ui
                .radio(device.direction_filter == filter, filter.to_string())
                .clicked()
                && device.direction_filter != filter
            {
                shared.config.device.direction_filter = filter;
                actions.push(AppAction::Configure(ConfigChange::DirectionFilter(filter)));
            }
        }
    });

    ui.horizontal(|ui| {
        ui.label("Power:");
        for mode in [PowerMode::Active, PowerMode::Idle] {
            if ui.radio(device.power_mode == mode, mode.to_string()).clicked()
                && device.power_mode != mode
            {
                actions.push(AppAction::Configure(ConfigChange::PowerMode(mode)));
            }
        }
    });

    ui.separator();
    ui.horizontal(|ui| {
        if ui
            .button("Save Settings")
            .on_hover_text("Persist the current settings on the sensor (A!)")
            .clicked()
        {
            actions.push(AppAction::SaveSettings);
        }
        if ui
            .button("Reset Settings")
            .on_hover_text("Restore the sensor defaults (P!)")
            .clicked()
        {
            actions.push(AppAction::ResetSettings);
        }
    });
}
