//! Log streaming for podtail
//!
//! This crate provides the line queue shared between the stream worker and
//! the UI, the worker that runs `kubectl logs`, and the display buffer the
//! UI renders from.

mod buffer;
mod process;
mod queue;
mod stream;

pub use buffer::DisplayBuffer;
pub use process::{LogProcess, ProcessLauncher, SystemLauncher};
pub use queue::LineQueue;
pub use stream::{LogStreamManager, StreamError};

// Re-export types used in our public API
pub use podtail_types::{StreamSettings, StreamState, StreamTarget};
