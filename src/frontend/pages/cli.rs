//! CLI page - raw command entry and the device log

use egui::{Key, Ui};

use super::Page;
use crate::frontend::state::{AppAction, SharedState};

/// State specific to the CLI page
#[derive(Default)]
pub struct CliPageState {
    pub input: String,
}

pub struct CliPage;

impl Page for CliPage {
    type State = CliPageState;

    fn render(
        state: &mut Self::State,
        shared: &mut SharedState<'_>,
        ui: &mut Ui,
    ) -> Vec<AppAction> {
        let mut actions = Vec::new();

        ui.horizontal(|ui| {
            ui.label("Command:");
            let response = ui.add(
                egui::TextEdit::singleline(&mut state.input)
                    .hint_text("e.g. ??, T=1, OS")
                    .desired_width(240.0),
            );
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));
            if (ui.button("Send").clicked() || submitted) && !state.input.trim().is_empty() {
                actions.push(AppAction::SendCommand(state.input.trim().to_string()));
                state.input.clear();
                response.request_focus();
            }
        });

        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for entry in &shared.topics.cli_log {
                    ui.monospace(entry);
                }
            });

        actions
    }
}
