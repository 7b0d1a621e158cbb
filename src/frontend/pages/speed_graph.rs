//! Speed Graph page - recording controls and the live plot

use egui::{Color32, Ui};
use egui_plot::{Corner, Legend, Line, Plot, PlotPoints};

use super::Page;
use crate::frontend::state::{AppAction, SharedState};
use crate::session::{ExportFormat, RecordMode};

/// State specific to the Speed Graph page
pub struct SpeedGraphPageState {
    /// Follow the newest points instead of keeping the user's zoom
    pub follow_latest: bool,
}

impl Default for SpeedGraphPageState {
    fn default() -> Self {
        Self {
            follow_latest: true,
        }
    }
}

pub struct SpeedGraphPage;

impl Page for SpeedGraphPage {
    type State = SpeedGraphPageState;

    fn render(
        state: &mut Self::State,
        shared: &mut SharedState<'_>,
        ui: &mut Ui,
    ) -> Vec<AppAction> {
        let mut actions = Vec::new();
        let recording = shared.topics.recording_state.is_recording();

        ui.group(|ui| {
            ui.add_enabled_ui(!recording, |ui| {
                render_export_settings(shared, ui);
            });

            ui.horizontal(|ui| {
                if recording {
                    if ui.button("⏹ Stop Recording").clicked() {
                        actions.push(export_target(shared));
                        actions.push(AppAction::StopRecording);
                    }
                } else if ui.button("⏺ Start Recording").clicked() {
                    actions.push(AppAction::StartRecording(shared.config.recording.mode));
                }

                ui.label(format!(
                    "{} | {} points",
                    shared.topics.recording_state.display_name(),
                    shared.topics.recorded_points
                ));
            });

            if let Some(reason) = &shared.topics.export_error {
                ui.horizontal(|ui| {
                    ui.colored_label(Color32::RED, format!("Export failed: {}", reason));
                    if ui.button("Retry").clicked() {
                        actions.push(export_target(shared));
                        actions.push(AppAction::RetryExport);
                    }
                });
            } else if let Some(path) = &shared.topics.last_export {
                ui.label(format!("Data saved to {}", path.display()));
            }
        });

        ui.checkbox(&mut state.follow_latest, "Follow latest");
        render_plot(state, shared, ui);

        actions
    }
}

fn render_export_settings(shared: &mut SharedState<'_>, ui: &mut Ui) {
    let recording = &mut shared.config.recording;

    ui.horizontal(|ui| {
        ui.label("Record:");
        for mode in RecordMode::ALL {
            ui.radio_value(&mut recording.mode, mode, mode.to_string());
        }
    });

    ui.horizontal(|ui| {
        ui.label("Folder:");
        ui.monospace(recording.output_dir.display().to_string());
        if ui.button("Browse...").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .set_directory(&recording.output_dir)
                .pick_folder()
            {
                recording.output_dir = path;
            }
        }
    });

    ui.horizontal(|ui| {
        ui.label("Prefix:");
        ui.add(egui::TextEdit::singleline(&mut recording.filename_prefix).desired_width(120.0));

        ui.label("Format:");
        egui::ComboBox::from_id_salt("export_format")
            .selected_text(format_label(recording.format))
            .show_ui(ui, |ui| {
                for format in [ExportFormat::Csv, ExportFormat::JsonLines] {
                    ui.selectable_value(&mut recording.format, format, format_label(format));
                }
            });
    });
}

fn render_plot(state: &SpeedGraphPageState, shared: &SharedState<'_>, ui: &mut Ui) {
    let unit = shared.topics.snapshot.unit;
    let graph = &shared.topics.graph;

    let mut plot = Plot::new("speed_graph")
        .allow_zoom(true)
        .allow_drag(true)
        .show_axes(true)
        .x_axis_label("Time (s)")
        .y_axis_label(format!("Speed ({})", unit.label()))
        .legend(Legend::default().position(Corner::RightTop));

    if state.follow_latest {
        plot = plot.auto_bounds(egui::Vec2b::TRUE);
    }

    plot.show(ui, |plot_ui| {
        if !graph.instantaneous.is_empty() {
            let points = PlotPoints::from(graph.instantaneous.clone());
            plot_ui.line(Line::new("Speed", points).color(Color32::LIGHT_BLUE));
        }
        if !graph.average.is_empty() {
            let points = PlotPoints::from(graph.average.clone());
            plot_ui.line(Line::new("Avg Speed", points).color(Color32::ORANGE));
        }
    });
}

fn format_label(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Csv => "CSV",
        ExportFormat::JsonLines => "JSON Lines",
    }
}

fn export_target(shared: &SharedState<'_>) -> AppAction {
    AppAction::SetExportTarget {
        output_dir: shared.config.recording.output_dir.clone(),
        prefix: shared.config.recording.filename_prefix.clone(),
        format: shared.config.recording.format,
    }
}
