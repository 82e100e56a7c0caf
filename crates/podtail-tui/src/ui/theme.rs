use ratatui::style::{Color, Modifier, Style};

/// Color theme for the application
pub struct Theme;

impl Theme {
    // Base colors
    pub const BG: Color = Color::Reset;
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;

    // Accent colors
    pub const PRIMARY: Color = Color::Cyan;
    pub const HIGHLIGHT: Color = Color::Yellow;

    // Status colors
    pub const ERROR: Color = Color::Red;

    // Border styles
    pub fn border() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    pub fn border_editing() -> Style {
        Style::default().fg(Self::HIGHLIGHT)
    }

    // Text styles
    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn text_highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    // List styles
    pub fn list_item() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn list_item_selected() -> Style {
        Style::default()
            .fg(Self::BG)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn list_item_current() -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    // Status bar
    pub fn status_bar() -> Style {
        Style::default().fg(Self::FG_DIM).bg(Color::DarkGray)
    }

    pub fn status_bar_key() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_message() -> Style {
        Style::default().fg(Self::FG).bg(Color::DarkGray)
    }

    // Error
    pub fn error() -> Style {
        Style::default()
            .fg(Self::ERROR)
            .add_modifier(Modifier::BOLD)
    }
}
