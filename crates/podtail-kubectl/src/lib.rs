//! kubectl integration for podtail
//!
//! This crate runs the external `kubectl` binary for discovery calls
//! (namespaces, pods, containers) and builds the argument vector for
//! `kubectl logs`.

mod client;
mod runner;

pub use client::{Kubectl, logs_args};
pub use runner::{CommandRunner, SystemRunner};

// Re-export types that are used in our public API
pub use podtail_types::{StreamSettings, StreamTarget};
