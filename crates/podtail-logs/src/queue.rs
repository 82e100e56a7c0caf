use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

/// Unbounded FIFO of log lines shared by one producer and one consumer.
///
/// The stream worker pushes, the UI tick drains without blocking on
/// anything but the short critical section.
#[derive(Clone, Default)]
pub struct LineQueue {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl LineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line at the back
    pub fn push(&self, line: impl Into<String>) {
        self.lines.lock().push_back(line.into());
    }

    /// Take everything currently queued, oldest first
    pub fn drain(&self) -> Vec<String> {
        self.lines.lock().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }
}
