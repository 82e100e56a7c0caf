use ratatui::{
    Frame,
    layout::Alignment,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::ui::{Layout, Theme};

/// Modal error dialog; dismissed with Enter or Esc
pub struct ErrorDialog;

impl ErrorDialog {
    pub fn render(frame: &mut Frame, message: &str) {
        let popup_area = Layout::popup(frame.area(), 60, 7);

        frame.render_widget(Clear, popup_area);

        let text = vec![
            Line::from(Span::styled(message, Theme::text())),
            Line::from(""),
            Line::from(Span::styled("[Enter] OK", Theme::text_dim())),
        ];

        let dialog = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::error())
                    .title(Span::styled(" Error ", Theme::error())),
            );

        frame.render_widget(dialog, popup_area);
    }
}
