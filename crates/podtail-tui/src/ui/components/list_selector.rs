use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, StatefulWidget, Widget},
};

use crate::ui::Theme;

/// A popup list for choosing a namespace, pod or container
pub struct ListSelector<'a> {
    items: Vec<ListItem<'a>>,
    title: String,
    highlight_symbol: &'a str,
}

impl<'a> ListSelector<'a> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            title: title.into(),
            highlight_symbol: "▶ ",
        }
    }

    /// Add items from an iterator of (display_text, is_current) tuples
    pub fn items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: Into<String>,
    {
        self.items = items
            .into_iter()
            .map(|(text, is_current)| {
                let text = text.into();
                let content = if is_current {
                    Line::from(Span::styled(
                        format!("{} (current)", text),
                        Theme::list_item_current(),
                    ))
                } else {
                    Line::from(Span::styled(text, Theme::list_item()))
                };
                ListItem::new(content)
            })
            .collect();
        self
    }
}

impl StatefulWidget for ListSelector<'_> {
    type State = ListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border_focused())
            .title(Span::styled(format!(" {} ", self.title), Theme::title()));

        let list = List::new(self.items)
            .block(block)
            .highlight_style(Theme::list_item_selected())
            .highlight_symbol(self.highlight_symbol);

        StatefulWidget::render(list, area, buf, state);
    }
}

/// Extension trait to render ListSelector more easily
pub trait ListSelectorExt {
    fn render_list_selector(&mut self, area: Rect, selector: ListSelector, state: &mut ListState);
}

impl ListSelectorExt for ratatui::Frame<'_> {
    fn render_list_selector(&mut self, area: Rect, selector: ListSelector, state: &mut ListState) {
        self.render_stateful_widget(selector, area, state);
    }
}
