//! Directory watching for filekit
//!
//! This crate turns raw file-system notifications into typed events and hands
//! them to registered services:
//! - Services declare one entry point per event kind, each tagged isolated
//!   (may run concurrently) or sequential (serialized per service)
//! - A per-endpoint dispatcher fans every event out to all matching services
//! - Endpoints own one event source and one dispatcher for one root directory
//!   and move through Created -> Started -> Stopped

pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod service;
pub mod source;

pub use config::WatchConfig;
pub use dispatch::{DispatchError, Dispatcher, ServiceId};
pub use endpoint::{EndpointState, WatchEndpoint};
pub use error::{Result, WatchError};
pub use service::{EntryPoint, HandlerFuture, Service, ServiceBuilder};
pub use source::{EventSink, EventSource, NotifySource};

use serde::Serialize;
use std::fmt;

/// File system event delivered to services
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEvent {
    /// Path of the entry that changed
    pub name: String,
    /// Type of change
    pub kind: EventKind,
}

impl FileEvent {
    pub fn new(name: impl Into<String>, kind: EventKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

impl fmt::Display for FileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// Type of file system event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// File created
    Create,
    /// File modified
    Modify,
    /// File deleted
    Delete,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Create, EventKind::Modify, EventKind::Delete];

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Create => 0,
            Self::Modify => 1,
            Self::Delete => 2,
        }
    }

    /// Operation name carried by events of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Delete => "delete",
        }
    }

    /// Name of the entry point that handles this kind
    pub fn entry_point_name(&self) -> &'static str {
        match self {
            Self::Create => "on_create",
            Self::Modify => "on_modify",
            Self::Delete => "on_delete",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
