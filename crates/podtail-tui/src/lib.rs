//! Terminal user interface for podtail
//!
//! Holds the application state, selection controller, keybindings,
//! event pump and the widgets that draw them.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, Discovery, Field, Picker, SelectionController, UiState, ValidationError};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{ErrorDialog, HelpOverlay, ListSelector, ListSelectorExt, StatusBar};
pub use ui::screens::{PickerScreen, ViewerScreen};
pub use ui::{Layout, Theme};
