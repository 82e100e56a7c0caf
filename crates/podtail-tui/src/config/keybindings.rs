use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;

/// A key combination
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::CONTROL,
        }
    }

    pub fn shift(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::SHIFT,
        }
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self {
            code: event.code,
            modifiers: event.modifiers,
        }
    }
}

/// Context for keybindings
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    Main,
    TailInput,
    Picker,
    Dialog,
    Help,
}

/// Keybinding configuration
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = HashMap::new();

        // Global bindings
        let mut global = HashMap::new();
        global.insert(KeyBinding::ctrl(KeyCode::Char('c')), Action::Quit);
        bindings.insert(KeyContext::Global, global);

        // Main screen: header focus, stream control and less-like scrolling
        let mut main = HashMap::new();
        main.insert(KeyBinding::new(KeyCode::Char('q')), Action::Quit);
        main.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        main.insert(KeyBinding::new(KeyCode::Tab), Action::FocusNext);
        main.insert(KeyBinding::shift(KeyCode::BackTab), Action::FocusPrev);
        main.insert(KeyBinding::new(KeyCode::BackTab), Action::FocusPrev);
        main.insert(KeyBinding::new(KeyCode::Enter), Action::Activate);
        main.insert(KeyBinding::new(KeyCode::Char('s')), Action::StartStream);
        main.insert(KeyBinding::new(KeyCode::Char('x')), Action::StopStream);
        main.insert(KeyBinding::new(KeyCode::Char('c')), Action::ClearLogs);
        main.insert(KeyBinding::new(KeyCode::Char('r')), Action::RefreshNamespaces);
        main.insert(KeyBinding::new(KeyCode::Char('f')), Action::ToggleFollow);
        // Line navigation
        main.insert(KeyBinding::new(KeyCode::Char('j')), Action::ScrollDown(1));
        main.insert(KeyBinding::new(KeyCode::Down), Action::ScrollDown(1));
        main.insert(KeyBinding::new(KeyCode::Char('k')), Action::ScrollUp(1));
        main.insert(KeyBinding::new(KeyCode::Up), Action::ScrollUp(1));
        // Page navigation (less-style)
        main.insert(KeyBinding::ctrl(KeyCode::Char('f')), Action::PageDown);
        main.insert(KeyBinding::ctrl(KeyCode::Char('b')), Action::PageUp);
        main.insert(KeyBinding::ctrl(KeyCode::Char('d')), Action::PageDown);
        main.insert(KeyBinding::ctrl(KeyCode::Char('u')), Action::PageUp);
        main.insert(KeyBinding::new(KeyCode::PageDown), Action::PageDown);
        main.insert(KeyBinding::new(KeyCode::PageUp), Action::PageUp);
        // Top/bottom navigation (less-style)
        main.insert(KeyBinding::new(KeyCode::Char('g')), Action::ScrollToTop);
        main.insert(KeyBinding::shift(KeyCode::Char('G')), Action::ScrollToBottom);
        main.insert(KeyBinding::new(KeyCode::Home), Action::ScrollToTop);
        main.insert(KeyBinding::new(KeyCode::End), Action::ScrollToBottom);
        bindings.insert(KeyContext::Main, main);

        // Tail count input bindings
        let mut tail_input = HashMap::new();
        tail_input.insert(KeyBinding::new(KeyCode::Enter), Action::TailDone);
        tail_input.insert(KeyBinding::new(KeyCode::Esc), Action::TailDone);
        tail_input.insert(KeyBinding::new(KeyCode::Tab), Action::TailDone);
        tail_input.insert(KeyBinding::new(KeyCode::Backspace), Action::TailBackspace);
        bindings.insert(KeyContext::TailInput, tail_input);

        // Picker popup bindings
        let mut picker = HashMap::new();
        picker.insert(KeyBinding::new(KeyCode::Up), Action::PickerUp);
        picker.insert(KeyBinding::new(KeyCode::Down), Action::PickerDown);
        picker.insert(KeyBinding::new(KeyCode::Char('k')), Action::PickerUp);
        picker.insert(KeyBinding::new(KeyCode::Char('j')), Action::PickerDown);
        picker.insert(KeyBinding::ctrl(KeyCode::Char('p')), Action::PickerUp);
        picker.insert(KeyBinding::ctrl(KeyCode::Char('n')), Action::PickerDown);
        picker.insert(KeyBinding::new(KeyCode::Enter), Action::PickerSelect);
        picker.insert(KeyBinding::new(KeyCode::Esc), Action::PickerClose);
        picker.insert(KeyBinding::new(KeyCode::Char('q')), Action::PickerClose);
        bindings.insert(KeyContext::Picker, picker);

        // Modal error dialog
        let mut dialog = HashMap::new();
        dialog.insert(KeyBinding::new(KeyCode::Enter), Action::DismissError);
        dialog.insert(KeyBinding::new(KeyCode::Esc), Action::DismissError);
        bindings.insert(KeyContext::Dialog, dialog);

        // Help overlay
        let mut help = HashMap::new();
        help.insert(KeyBinding::new(KeyCode::Char('?')), Action::ToggleHelp);
        help.insert(KeyBinding::new(KeyCode::Esc), Action::ToggleHelp);
        help.insert(KeyBinding::new(KeyCode::Char('q')), Action::ToggleHelp);
        bindings.insert(KeyContext::Help, help);

        Self { bindings }
    }

    /// Look up action for key event in given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        let binding = KeyBinding::from_event(key);

        // First check context-specific bindings
        if let Some(context_bindings) = self.bindings.get(&context) {
            if let Some(action) = context_bindings.get(&binding) {
                return Some(action.clone());
            }
        }

        // Fall back to global bindings
        self.bindings
            .get(&KeyContext::Global)?
            .get(&binding)
            .cloned()
    }

    /// Handle key event in tail input mode
    /// Returns Some(Action) for special keys, TailInput for regular characters
    pub fn get_tail_input_action(&self, key: &KeyEvent) -> Option<Action> {
        if let Some(action) = self.get_action(KeyContext::TailInput, key) {
            return Some(action);
        }

        if let KeyCode::Char(c) = key.code {
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                return Some(Action::TailInput(c));
            }
        }

        None
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
