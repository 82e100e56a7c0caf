//! Shared types for podtail
//!
//! This crate contains data structures used across multiple podtail crates.

use ratatui::style::Color;

/// Namespace used when discovery returns nothing
pub const DEFAULT_NAMESPACE: &str = "default";

/// Tail count used when neither the CLI nor the config file provides one
pub const DEFAULT_TAIL_LINES: u64 = 1000;

// ============================================================================
// Selection
// ============================================================================

/// The namespace/pod/container currently picked by the operator.
///
/// Transitions go through the `with_*` methods so the cascade rules hold:
/// changing the namespace drops the pod and container, changing the pod
/// drops the container, and a container is never set without a pod.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionState {
    namespace: String,
    pod: Option<String>,
    container: Option<String>,
}

impl SelectionState {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            pod: None,
            container: None,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn pod(&self) -> Option<&str> {
        self.pod.as_deref()
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    /// Switch namespace, invalidating pod and container
    pub fn with_namespace(self, namespace: impl Into<String>) -> Self {
        Self::new(namespace)
    }

    /// Switch pod (or clear it), invalidating the container
    pub fn with_pod(self, pod: Option<String>) -> Self {
        Self {
            namespace: self.namespace,
            pod: pod.filter(|p| !p.is_empty()),
            container: None,
        }
    }

    /// Set the container; ignored while no pod is selected
    pub fn with_container(self, container: Option<String>) -> Self {
        let container = if self.pod.is_some() {
            container.filter(|c| !c.is_empty())
        } else {
            None
        };
        Self { container, ..self }
    }

    /// Snapshot this selection as a stream target, if a pod is selected
    pub fn target(&self) -> Option<StreamTarget> {
        let pod = self.pod.clone()?;
        Some(StreamTarget {
            namespace: self.namespace.clone(),
            pod,
            container: self.container.clone(),
        })
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

// ============================================================================
// Streaming
// ============================================================================

/// Immutable snapshot of what a stream session reads from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamTarget {
    pub namespace: String,
    pub pod: String,
    pub container: Option<String>,
}

impl StreamTarget {
    /// Human readable `namespace/pod[:container]`
    pub fn label(&self) -> String {
        match &self.container {
            Some(container) => format!("{}/{}:{}", self.namespace, self.pod, container),
            None => format!("{}/{}", self.namespace, self.pod),
        }
    }
}

/// How much history to fetch and whether to keep following
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamSettings {
    /// Keep the stream open for new lines (`-f`)
    pub follow: bool,
    /// Number of historical lines (`--tail`); `None` fetches everything
    pub tail: Option<u64>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            follow: true,
            tail: Some(DEFAULT_TAIL_LINES),
        }
    }
}

/// Lifecycle of a stream session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Idle,
    Starting,
    Streaming,
    Stopped,
    Completed,
    Failed,
}

impl StreamState {
    /// A session in this state owns the worker and blocks a new start
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::Streaming)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Streaming => "streaming",
            Self::Stopped => "stopped",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Get display color for this state
    pub fn color(&self) -> Color {
        match self {
            Self::Idle => Color::DarkGray,
            Self::Starting => Color::Yellow,
            Self::Streaming => Color::Green,
            Self::Stopped => Color::Cyan,
            Self::Completed => Color::White,
            Self::Failed => Color::Red,
        }
    }
}
