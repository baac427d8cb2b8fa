mod popup;
mod state;

use crossterm::event::KeyCode;

pub use popup::{ConfirmAction, ConfirmPopup, EntryField, EntryMode, EntryPopup, InputPopup, InputPurpose};
pub use state::App;

/// Possible input events the app reacts to.
pub enum AppEvent {
    Tick,
    KeyPress(KeyCode),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppView {
    Projects,
    Sessions,
    Help,
}
