//! Application state and actions

mod action;
mod selection;
mod state;

pub use action::Action;
pub use selection::{Discovery, SelectionController};
pub use state::{AppState, Field, Picker, UiState, ValidationError};
