use ratatui::{
    Frame,
    layout::{Margin, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use crate::app::{AppState, Field};
use crate::ui::components::{StatusBar, picker_hints, viewer_hints};
use crate::ui::{Layout, Theme};

/// Main screen: selection header, log view and status bar
pub struct ViewerScreen;

impl ViewerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState) {
        let (header, content, status) = Layout::main(frame.area());

        Self::render_header(frame, header, state);
        Self::render_logs(frame, content, state);
        Self::render_status_bar(frame, status, state);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
        let selection = state.selection.selection();
        let enabled = state.controls_enabled();
        let ui = &state.ui_state;

        let tail = if ui.tail_editing {
            format!("{}▏", ui.tail_input)
        } else if ui.tail_input.is_empty() {
            "all".to_string()
        } else {
            ui.tail_input.clone()
        };

        let values = [
            (Field::Namespace, selection.namespace().to_string()),
            (Field::Pod, selection.pod().unwrap_or("-").to_string()),
            (Field::Container, selection.container().unwrap_or("-").to_string()),
            (Field::Tail, tail),
            (
                Field::Follow,
                if ui.follow { "[x] on" } else { "[ ] off" }.to_string(),
            ),
        ];

        let areas = Layout::header_fields(area);
        for ((field, value), area) in values.into_iter().zip(areas) {
            let focused = ui.focus == field;
            let border = if focused && ui.tail_editing && field == Field::Tail {
                Theme::border_editing()
            } else if focused {
                Theme::border_focused()
            } else {
                Theme::border()
            };
            let text_style = if enabled { Theme::text() } else { Theme::text_dim() };

            let widget = Paragraph::new(Span::styled(value, text_style)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(Span::styled(
                        format!(" {} ", field.label()),
                        if focused { Theme::title() } else { Theme::text_dim() },
                    )),
            );
            frame.render_widget(widget, area);
        }
    }

    fn render_logs(frame: &mut Frame, area: Rect, state: &mut AppState) {
        let stream_state = state.stream_state();
        let title = match state.streams.target() {
            Some(target) => Line::from(vec![
                Span::styled(" Logs ", Theme::title()),
                Span::styled(target.label(), Theme::text_highlight()),
                Span::styled(" │ ", Theme::text_dim()),
                Span::styled(
                    stream_state.label(),
                    Style::default().fg(stream_state.color()),
                ),
                Span::raw(" "),
            ]),
            None => Line::from(Span::styled(" Logs ", Theme::title())),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border())
            .title(title);
        let inner = block.inner(area);

        state.display.set_viewport(inner.height as usize);

        let lines: Vec<Line> = state
            .display
            .visible()
            .iter()
            .map(|line| Line::from(Span::styled(line.as_str(), Theme::text())))
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);

        let max_top = state.display.max_top();
        if max_top > 0 {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));

            let mut scrollbar_state = ScrollbarState::default()
                .content_length(max_top)
                .position(state.display.top());

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let hints = if state.ui_state.picker.is_some() {
            picker_hints()
        } else {
            viewer_hints(state.can_start(), state.can_stop())
        };
        let bar = StatusBar::new()
            .hints(hints)
            .right(state.status.clone());
        frame.render_widget(bar, area);
    }
}
