use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use crate::ui::Theme;

/// Status bar showing keyboard shortcuts and the current status message
pub struct StatusBar<'a> {
    hints: Vec<(&'a str, &'a str)>,
    right_text: Option<String>,
}

impl<'a> StatusBar<'a> {
    pub fn new() -> Self {
        Self {
            hints: Vec::new(),
            right_text: None,
        }
    }

    /// Add keyboard hints as (key, description) pairs
    pub fn hints<I>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.hints = hints.into_iter().collect();
        self
    }

    /// Set text to display on the right side
    pub fn right<S: Into<String>>(mut self, text: S) -> Self {
        self.right_text = Some(text.into());
        self
    }
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Theme::status_bar());

        let mut spans = Vec::new();
        for (i, (key, desc)) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", Theme::status_bar()));
            }
            spans.push(Span::styled(format!("[{}]", key), Theme::status_bar_key()));
            spans.push(Span::styled(format!(" {}", desc), Theme::status_bar()));
        }

        let line = Line::from(spans);
        let line_width = line.width() as u16;

        // The status message wins over hints when space is short
        if let Some(right) = self.right_text {
            let right_width = right.chars().count() as u16;
            let right_x = area.x + area.width.saturating_sub(right_width + 1);
            let hints_width = right_x.saturating_sub(area.x + 2);
            if line_width > 0 && hints_width > 0 {
                buf.set_line(area.x + 1, area.y, &line, hints_width);
            }
            let right_span = Span::styled(right, Theme::status_bar_message());
            buf.set_span(right_x, area.y, &right_span, right_width);
        } else {
            buf.set_line(area.x + 1, area.y, &line, area.width.saturating_sub(2));
        }
    }
}

/// Hints for the main viewer, depending on which buttons are enabled
pub fn viewer_hints(can_start: bool, can_stop: bool) -> Vec<(&'static str, &'static str)> {
    let mut hints = vec![("Tab", "Next"), ("Enter", "Edit")];
    if can_start {
        hints.push(("s", "Start"));
    }
    if can_stop {
        hints.push(("x", "Stop"));
    }
    hints.extend([("c", "Clear"), ("?", "Help"), ("q", "Quit")]);
    hints
}

/// Hints while a picker is open
pub fn picker_hints() -> Vec<(&'static str, &'static str)> {
    vec![
        ("↑/k", "Up"),
        ("↓/j", "Down"),
        ("Enter", "Select"),
        ("Esc", "Cancel"),
    ]
}
