//! Status bar panel - bottom bar showing connection, recording and error info.

use egui::{Color32, RichText, Ui};

use crate::frontend::topics::Topics;
use crate::types::ConnectionStatus;

/// Context needed to render the status bar.
pub struct StatusBarContext<'a> {
    pub topics: &'a Topics,
    pub port: &'a str,
    pub last_error: Option<&'a str>,
}

/// Render the status bar.
pub fn render_status_bar(ui: &mut Ui, ctx: &StatusBarContext<'_>) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        // === Connection status dot + port ===
        let status = ctx.topics.connection_status;
        let status_color = match status {
            ConnectionStatus::Connected => Color32::GREEN,
            ConnectionStatus::Connecting => Color32::YELLOW,
            ConnectionStatus::Disconnected => Color32::GRAY,
            ConnectionStatus::Error => Color32::RED,
        };
        ui.colored_label(status_color, "●");
        let port_display = if ctx.port.is_empty() {
            status.to_string()
        } else {
            format!("{}: {}", status, ctx.port)
        };
        ui.label(RichText::new(port_display).small());

        ui.separator();

        // === Current unit ===
        ui.label(RichText::new(format!("Unit: {}", ctx.topics.snapshot.unit.label())).small());

        ui.separator();

        // === Recording ===
        let recording = ctx.topics.recording_state.is_recording();
        let rec_color = if recording {
            Color32::LIGHT_RED
        } else {
            Color32::GRAY
        };
        ui.colored_label(
            rec_color,
            RichText::new(format!(
                "{} ({} points)",
                ctx.topics.recording_state.display_name(),
                ctx.topics.recorded_points
            ))
            .small(),
        );

        // === Last error ===
        if let Some(err) = ctx.last_error {
            ui.separator();
            ui.colored_label(Color32::LIGHT_RED, RichText::new(err).small());
        }
    });
}
