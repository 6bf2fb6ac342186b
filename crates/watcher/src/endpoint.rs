//! Watch endpoint lifecycle
//!
//! A [`WatchEndpoint`] pairs one event source with one dispatcher for a
//! single root directory. It moves through `Created -> Started -> Stopped`;
//! a stopped endpoint cannot be restarted.

use crate::config::WatchConfig;
use crate::dispatch::{DispatchError, Dispatcher, ServiceId};
use crate::error::{Result, WatchError};
use crate::service::Service;
use crate::source::{EventSink, EventSource, NotifySource};
use crossbeam_channel::Receiver;
use filekit_core::FileError;
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{info, warn};

/// Capacity of the per-endpoint dispatch error channel
const ERROR_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    Created,
    Started,
    Stopped,
}

impl fmt::Display for EndpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Stopped => "stopped",
        })
    }
}

/// Observes one directory and routes its events to attached services
pub struct WatchEndpoint<S: EventSource = NotifySource> {
    root: PathBuf,
    recursive: bool,
    // Lock order: state, then source
    state: Mutex<EndpointState>,
    source: Mutex<S>,
    dispatcher: Arc<Dispatcher>,
    errors: Receiver<DispatchError>,
}

impl WatchEndpoint<NotifySource> {
    /// Create an endpoint for `root` backed by the platform watcher.
    ///
    /// Must be called from within a tokio runtime; entry points run there.
    pub fn create(root: impl AsRef<Path>, recursive: bool) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| WatchError::NoRuntime(e.to_string()))?;
        Self::with_source(root, recursive, NotifySource::new(), runtime)
    }

    pub fn from_config(config: &WatchConfig) -> Result<Self> {
        Self::create(&config.path, config.recursive)
    }
}

impl<S: EventSource> WatchEndpoint<S> {
    /// Create an endpoint with an explicit event source and runtime.
    pub fn with_source(
        root: impl AsRef<Path>,
        recursive: bool,
        source: S,
        runtime: Handle,
    ) -> Result<Self> {
        let root = validate_root(root.as_ref())?;
        let (tx, errors) = crossbeam_channel::bounded(ERROR_CHANNEL_CAPACITY);

        Ok(Self {
            root,
            recursive,
            state: Mutex::new(EndpointState::Created),
            source: Mutex::new(source),
            dispatcher: Arc::new(Dispatcher::new(runtime, tx)),
            errors,
        })
    }

    /// Subscribe to the event source and begin dispatching.
    ///
    /// Only valid from `Created`. On failure the endpoint stays `Created`.
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state != EndpointState::Created {
            return Err(WatchError::InvalidState {
                operation: "start",
                state: *state,
            });
        }

        let dispatcher = Arc::downgrade(&self.dispatcher);
        let sink: EventSink = Arc::new(move |event| {
            if let Some(dispatcher) = dispatcher.upgrade() {
                dispatcher.dispatch(event);
            }
        });

        self.dispatcher.set_running(true);
        if let Err(e) = self.source.lock().subscribe(&self.root, self.recursive, sink) {
            self.dispatcher.set_running(false);
            return Err(e);
        }

        *state = EndpointState::Started;
        info!(
            "Watching {} (recursive: {}, services: {})",
            self.root.display(),
            self.recursive,
            self.dispatcher.service_count()
        );
        Ok(())
    }

    /// Unsubscribe, release the source and drop every registration.
    ///
    /// Only valid from `Started`. The endpoint ends up `Stopped` even if
    /// unsubscribing fails.
    pub fn stop(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state != EndpointState::Started {
            return Err(WatchError::InvalidState {
                operation: "stop",
                state: *state,
            });
        }
        *state = EndpointState::Stopped;
        self.shutdown()
    }

    fn shutdown(&self) -> Result<()> {
        self.dispatcher.set_running(false);
        let result = self.source.lock().unsubscribe();
        self.dispatcher.clear();
        info!("Stopped watching {}", self.root.display());
        result
    }

    /// Register a service. Allowed before and after `start`.
    pub fn attach(&self, service: Service) -> Result<ServiceId> {
        let state = self.state.lock();
        if *state == EndpointState::Stopped {
            return Err(WatchError::InvalidState {
                operation: "attach a service to",
                state: *state,
            });
        }
        Ok(self.dispatcher.add_service(service))
    }

    /// Deregister a service; false when `id` is not attached.
    pub fn detach(&self, id: ServiceId) -> bool {
        self.dispatcher.remove_service(id)
    }

    pub fn state(&self) -> EndpointState {
        *self.state.lock()
    }

    /// Receiver of failures raised by entry points
    pub fn errors(&self) -> Receiver<DispatchError> {
        self.errors.clone()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl<S: EventSource> Drop for WatchEndpoint<S> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if *state == EndpointState::Started {
            *state = EndpointState::Stopped;
            if let Err(e) = self.shutdown() {
                warn!("Failed to release watch on {}: {}", self.root.display(), e);
            }
        }
    }
}

impl<S: EventSource> fmt::Debug for WatchEndpoint<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchEndpoint")
            .field("root", &self.root)
            .field("recursive", &self.recursive)
            .field("state", &self.state())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

fn validate_root(root: &Path) -> Result<PathBuf> {
    if root.as_os_str().is_empty() {
        return Err(FileError::FileSystem("'path' field is empty".to_string()).into());
    }
    let abs = filekit_core::absolute(root)?;
    if !abs.exists() {
        return Err(
            FileError::FileSystem(format!("Folder does not exist: {}", root.display())).into(),
        );
    }
    if !abs.is_dir() {
        return Err(FileError::FileSystem(format!(
            "Unable to find a directory: {}",
            root.display()
        ))
        .into());
    }
    Ok(abs)
}
