//! Configuration types

mod keybindings;

pub use keybindings::{KeyBinding, KeyBindings, KeyContext};
