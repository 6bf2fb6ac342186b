//! Services and their per-kind entry points

use crate::error::{Result, WatchError};
use crate::{EventKind, FileEvent};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Future returned by an entry point
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;

type Callback = dyn Fn(FileEvent) -> HandlerFuture + Send + Sync;

/// Callable bound to one event kind
///
/// The isolation flag is fixed when the entry point is declared. Isolated
/// entry points may run concurrently with themselves; sequential ones are
/// serialized with every other sequential invocation of the same service.
#[derive(Clone)]
pub struct EntryPoint {
    callback: Arc<Callback>,
    isolated: bool,
}

impl EntryPoint {
    fn new<F, Fut>(f: F, isolated: bool) -> Self
    where
        F: Fn(FileEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            callback: Arc::new(move |event| f(event).boxed()),
            isolated,
        }
    }

    pub fn is_isolated(&self) -> bool {
        self.isolated
    }

    pub(crate) fn invoke(&self, event: FileEvent) -> HandlerFuture {
        (self.callback)(event)
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint")
            .field("isolated", &self.isolated)
            .finish_non_exhaustive()
    }
}

/// A handler unit: a name plus at most one entry point per event kind
///
/// Immutable once built; changing the handled kinds means detaching and
/// attaching a new service.
#[derive(Debug, Clone)]
pub struct Service {
    name: String,
    entries: [Option<EntryPoint>; 3],
}

impl Service {
    pub fn builder(name: impl Into<String>) -> ServiceBuilder {
        ServiceBuilder {
            name: name.into(),
            entries: Default::default(),
            duplicate: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entry point bound to `kind`, if any
    pub fn entry(&self, kind: EventKind) -> Option<&EntryPoint> {
        self.entries[kind.index()].as_ref()
    }

    /// Event kinds this service accepts
    pub fn kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        EventKind::ALL
            .into_iter()
            .filter(|kind| self.entry(*kind).is_some())
    }
}

/// Builder for [`Service`]
pub struct ServiceBuilder {
    name: String,
    entries: [Option<EntryPoint>; 3],
    duplicate: Option<EventKind>,
}

impl ServiceBuilder {
    /// Bind a sequential entry point to `kind`.
    pub fn on<F, Fut>(self, kind: EventKind, f: F) -> Self
    where
        F: Fn(FileEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.bind(kind, EntryPoint::new(f, false))
    }

    /// Bind an isolated entry point to `kind`.
    pub fn on_isolated<F, Fut>(self, kind: EventKind, f: F) -> Self
    where
        F: Fn(FileEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.bind(kind, EntryPoint::new(f, true))
    }

    pub fn on_create<F, Fut>(self, f: F) -> Self
    where
        F: Fn(FileEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on(EventKind::Create, f)
    }

    pub fn on_modify<F, Fut>(self, f: F) -> Self
    where
        F: Fn(FileEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on(EventKind::Modify, f)
    }

    pub fn on_delete<F, Fut>(self, f: F) -> Self
    where
        F: Fn(FileEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on(EventKind::Delete, f)
    }

    fn bind(mut self, kind: EventKind, entry: EntryPoint) -> Self {
        let slot = &mut self.entries[kind.index()];
        if slot.is_some() && self.duplicate.is_none() {
            self.duplicate = Some(kind);
        }
        *slot = Some(entry);
        self
    }

    /// Finish the service.
    ///
    /// Fails when no entry point was declared, or one kind was bound twice.
    pub fn build(self) -> Result<Service> {
        if let Some(kind) = self.duplicate {
            return Err(WatchError::DuplicateEntryPoint {
                service: self.name,
                kind,
            });
        }
        if self.entries.iter().all(Option::is_none) {
            return Err(WatchError::EmptyService(self.name));
        }
        Ok(Service {
            name: self.name,
            entries: self.entries,
        })
    }
}
