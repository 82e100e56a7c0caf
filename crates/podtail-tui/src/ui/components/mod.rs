mod dialog;
mod help_overlay;
mod list_selector;
mod status_bar;

pub use dialog::ErrorDialog;
pub use help_overlay::HelpOverlay;
pub use list_selector::{ListSelector, ListSelectorExt};
pub use status_bar::{StatusBar, picker_hints, viewer_hints};
