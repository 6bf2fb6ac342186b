//! Watch service errors

use crate::endpoint::EndpointState;
use crate::EventKind;
use filekit_core::FileError;
use thiserror::Error;

/// Result type for watch operations
pub type Result<T> = std::result::Result<T, WatchError>;

#[derive(Debug, Error)]
pub enum WatchError {
    /// Root validation and other file system failures
    #[error(transparent)]
    File(#[from] FileError),

    /// Lifecycle call not valid in the current state
    #[error("Cannot {operation} a watch endpoint that is {state}")]
    InvalidState {
        operation: &'static str,
        state: EndpointState,
    },

    /// Service declares no entry point at all
    #[error(
        "Service '{0}' needs at least a single entry point from the following: \
         on_create, on_delete, on_modify"
    )]
    EmptyService(String),

    /// Service declares two entry points for one kind
    #[error("Service '{service}' declares more than one entry point for {kind} events")]
    DuplicateEntryPoint { service: String, kind: EventKind },

    /// The underlying notification mechanism failed
    #[error("Unable to initialize event source: {0}")]
    Source(#[from] notify::Error),

    /// Endpoint created outside of a tokio runtime
    #[error("Watch endpoints need a tokio runtime: {0}")]
    NoRuntime(String),
}
