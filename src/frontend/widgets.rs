//! Custom widgets for the panel UI
//!
//! - [`StatusIndicator`] - Colored status dot with label
//! - [`Readout`] - Label and formatted value on one row

use egui::{Color32, Response, RichText, Ui, Widget};

use crate::types::ConnectionStatus;

/// A widget that displays a colored status indicator
pub struct StatusIndicator {
    color: Color32,
    label: String,
    tooltip: Option<String>,
}

impl StatusIndicator {
    /// Create a new status indicator with the given color and label
    pub fn new(color: Color32, label: impl Into<String>) -> Self {
        Self {
            color,
            label: label.into(),
            tooltip: None,
        }
    }

    /// Indicator for a connection status
    pub fn for_status(status: ConnectionStatus) -> Self {
        let color = match status {
            ConnectionStatus::Connected => Color32::GREEN,
            ConnectionStatus::Connecting => Color32::YELLOW,
            ConnectionStatus::Disconnected => Color32::GRAY,
            ConnectionStatus::Error => Color32::RED,
        };
        Self::new(color, status.to_string())
    }

    /// Add a tooltip to the indicator
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }
}

impl Widget for StatusIndicator {
    fn ui(self, ui: &mut Ui) -> Response {
        let response = ui.horizontal(|ui| {
            ui.colored_label(self.color, "●");
            ui.label(&self.label);
        });

        let response = response.response;

        if let Some(tooltip) = self.tooltip {
            response.on_hover_text(tooltip)
        } else {
            response
        }
    }
}

/// A "Label: value" row with the value in a monospace font
pub struct Readout<'a> {
    label: &'a str,
    value: String,
}

impl<'a> Readout<'a> {
    pub fn new(label: &'a str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

impl Widget for Readout<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        ui.horizontal(|ui| {
            ui.label(format!("{}:", self.label));
            ui.label(RichText::new(self.value).monospace().strong());
        })
        .response
    }
}
