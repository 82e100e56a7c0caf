use crate::queue::LineQueue;

/// Rows the view may sit above the last line and still count as at the bottom
const BOTTOM_SLACK_LINES: usize = 1;

/// Append-only text shown in the log view, plus its scroll position.
///
/// Only the UI tick writes to it. New content keeps the view pinned to the
/// bottom when it was already there and leaves it alone otherwise.
#[derive(Clone, Debug)]
pub struct DisplayBuffer {
    lines: Vec<String>,
    /// Index of the first visible line
    top: usize,
    /// Number of visible rows
    viewport: usize,
}

impl DisplayBuffer {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            top: 0,
            viewport: 1,
        }
    }

    /// All lines, oldest first
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the first visible line
    pub fn top(&self) -> usize {
        self.top
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    /// Largest valid value for `top`
    pub fn max_top(&self) -> usize {
        self.lines.len().saturating_sub(self.viewport)
    }

    /// Lines inside the viewport
    pub fn visible(&self) -> &[String] {
        let end = (self.top + self.viewport).min(self.lines.len());
        &self.lines[self.top.min(end)..end]
    }

    /// Whether the view is at the last line, give or take the slack
    pub fn at_bottom(&self) -> bool {
        self.top + BOTTOM_SLACK_LINES >= self.max_top()
    }

    /// Resize the viewport, keeping a bottom-pinned view pinned
    pub fn set_viewport(&mut self, rows: usize) {
        let pinned = self.at_bottom();
        self.viewport = rows.max(1);
        if pinned {
            self.scroll_to_bottom();
        } else {
            self.top = self.top.min(self.max_top());
        }
    }

    /// Append lines, following the bottom only if the view was there before
    pub fn append<I>(&mut self, lines: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let pinned = self.at_bottom();
        let before = self.lines.len();
        self.lines.extend(lines);
        if pinned {
            self.scroll_to_bottom();
        }
        self.lines.len() - before
    }

    /// Move everything queued into the buffer; returns how many lines moved
    pub fn drain_from(&mut self, queue: &LineQueue) -> usize {
        let drained = queue.drain();
        if drained.is_empty() {
            return 0;
        }
        self.append(drained)
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.top = self.top.saturating_sub(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.top = self.top.saturating_add(n).min(self.max_top());
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.viewport);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.viewport);
    }

    pub fn scroll_to_top(&mut self) {
        self.top = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.top = self.max_top();
    }

    /// Clear all lines
    pub fn clear(&mut self) {
        self.lines.clear();
        self.top = 0;
    }
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self::new()
    }
}
