use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Create the main layout with header, content, and status bar
    pub fn main(area: Rect) -> (Rect, Rect, Rect) {
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(1),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        (chunks[0], chunks[1], chunks[2])
    }

    /// Split the header into one box per field
    pub fn header_fields(area: Rect) -> [Rect; 5] {
        let chunks = RatatuiLayout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(24), // Namespace
                Constraint::Percentage(30), // Pod
                Constraint::Percentage(22), // Container
                Constraint::Percentage(12), // Tail
                Constraint::Percentage(12), // Follow
            ])
            .split(area);

        [chunks[0], chunks[1], chunks[2], chunks[3], chunks[4]]
    }

    /// Centered popup of at most the given size
    pub fn popup(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(4));
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popup_is_centered_and_clamped() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(Layout::popup(area, 50, 10), Rect::new(25, 15, 50, 10));

        let small = Rect::new(0, 0, 20, 8);
        let popup = Layout::popup(small, 50, 10);
        assert_eq!((popup.width, popup.height), (16, 4));
    }
}
