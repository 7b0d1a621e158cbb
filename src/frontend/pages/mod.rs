//! Page modules for the frontend
//!
//! One page per tab. Each page receives shared state via `SharedState`
//! and returns actions instead of mutating the app or calling the backend.

mod cli;
mod general;
mod speed_graph;

pub use cli::{CliPage, CliPageState};
pub use general::{GeneralPage, GeneralPageState};
pub use speed_graph::{SpeedGraphPage, SpeedGraphPageState};

use crate::frontend::state::{AppAction, SharedState};
use egui::Ui;

/// Trait for page components
///
/// # Example
///
/// ```ignore
/// #[derive(Default)]
/// pub struct MyPageState {
///     input: String,
/// }
///
/// pub struct MyPage;
///
/// impl Page for MyPage {
///     type State = MyPageState;
///
///     fn render(
///         state: &mut Self::State,
///         shared: &mut SharedState<'_>,
///         ui: &mut Ui,
///     ) -> Vec<AppAction> {
///         let mut actions = Vec::new();
///         if ui.button("Disconnect").clicked() {
///             actions.push(AppAction::Disconnect);
///         }
///         actions
///     }
/// }
/// ```
pub trait Page {
    /// Page-specific UI state, owned by the app and kept across frames
    type State;

    /// Render the page inside the central panel and return any actions
    fn render(state: &mut Self::State, shared: &mut SharedState<'_>, ui: &mut Ui)
        -> Vec<AppAction>;
}
