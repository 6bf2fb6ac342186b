//! Event dispatch registry
//!
//! Maps registered services to the event kinds they accept and invokes the
//! matching entry points on the tokio runtime, never on the notification
//! thread. Isolated entry points get a task per event. Sequential entry
//! points go through a per-service queue drained by one worker task, so two
//! sequential invocations of the same service never overlap.

use crate::service::{HandlerFuture, Service};
use crate::FileEvent;
use crossbeam_channel::{Sender, TrySendError};
use dashmap::DashMap;
use futures::FutureExt;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Opaque identifier of a registered service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceId(u64);

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service#{}", self.0)
    }
}

/// Failure raised by an entry point, reported out of band
#[derive(Debug, Error)]
#[error("Service '{service_name}' ({service}) failed to handle {event}: {error}")]
pub struct DispatchError {
    pub service: ServiceId,
    pub service_name: String,
    pub event: FileEvent,
    pub error: anyhow::Error,
}

struct Registration {
    id: ServiceId,
    service: Service,
    /// Feeds the sequential worker of this service
    queue: mpsc::UnboundedSender<FileEvent>,
    /// Cleared on removal; no invocation starts once it is false
    active: RwLock<bool>,
}

impl Registration {
    /// Start an invocation for `event` unless the service was removed.
    ///
    /// A panic raised while the entry point builds its future is caught and
    /// returned as `Err`.
    fn start_invocation(&self, event: &FileEvent) -> Option<std::thread::Result<HandlerFuture>> {
        let active = self.active.read();
        if !*active {
            return None;
        }
        let entry = self.service.entry(event.kind)?;
        let event = event.clone();
        Some(catch_unwind(AssertUnwindSafe(|| entry.invoke(event))))
    }

    async fn run(&self, event: FileEvent, errors: &Sender<DispatchError>) {
        let Some(started) = self.start_invocation(&event) else {
            debug!("{} removed before handling {}", self.id, event);
            return;
        };

        let outcome = match started {
            Ok(invocation) => AssertUnwindSafe(invocation).catch_unwind().await,
            Err(panic) => Err(panic),
        };
        let error = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e,
            Err(panic) => anyhow::anyhow!("entry point panicked: {}", panic_message(&*panic)),
        };

        report(
            errors,
            DispatchError {
                service: self.id,
                service_name: self.service.name().to_string(),
                event,
                error,
            },
        );
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

fn report(errors: &Sender<DispatchError>, err: DispatchError) {
    warn!("{}", err);
    match errors.try_send(err) {
        Ok(()) | Err(TrySendError::Disconnected(_)) => {}
        Err(TrySendError::Full(_)) => debug!("Dispatch error channel full, dropping report"),
    }
}

/// Per-endpoint registry of services
pub struct Dispatcher {
    services: DashMap<ServiceId, Arc<Registration>>,
    next_id: AtomicU64,
    runtime: Handle,
    running: AtomicBool,
    errors: Sender<DispatchError>,
}

impl Dispatcher {
    /// Create an empty registry that runs entry points on `runtime` and
    /// reports their failures on `errors`.
    pub fn new(runtime: Handle, errors: Sender<DispatchError>) -> Self {
        Self {
            services: DashMap::new(),
            next_id: AtomicU64::new(1),
            runtime,
            running: AtomicBool::new(false),
            errors,
        }
    }

    /// Register a service and spawn its sequential worker.
    pub fn add_service(&self, service: Service) -> ServiceId {
        let id = ServiceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (queue, mut rx) = mpsc::unbounded_channel::<FileEvent>();

        let kinds: Vec<_> = service.kinds().map(|k| k.as_str()).collect();
        debug!("Registering {} '{}' for {:?}", id, service.name(), kinds);

        let registration = Arc::new(Registration {
            id,
            service,
            queue,
            active: RwLock::new(true),
        });

        // The worker must not keep the registration (and its queue) alive
        let weak: Weak<Registration> = Arc::downgrade(&registration);
        let errors = self.errors.clone();
        self.runtime.spawn(async move {
            while let Some(event) = rx.recv().await {
                let Some(registration) = weak.upgrade() else {
                    break;
                };
                registration.run(event, &errors).await;
            }
        });

        self.services.insert(id, registration);
        id
    }

    /// Deregister a service.
    ///
    /// Once this returns, no new invocation of the service starts; invocations
    /// already running finish normally. An invocation counts as running once
    /// its entry point has returned a future, even if that future has not been
    /// polled yet, so its body may still execute after removal. Returns false
    /// for unknown ids.
    pub fn remove_service(&self, id: ServiceId) -> bool {
        match self.services.remove(&id) {
            Some((_, registration)) => {
                *registration.active.write() = false;
                debug!("Removed {} '{}'", id, registration.service.name());
                true
            }
            None => false,
        }
    }

    /// Deregister every service.
    pub fn clear(&self) {
        let ids: Vec<ServiceId> = self.services.iter().map(|r| *r.key()).collect();
        for id in ids {
            self.remove_service(id);
        }
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    /// Ingest one raw event and fan it out to every matching service.
    ///
    /// Never blocks on entry points. Events arriving while the owning
    /// endpoint is not started are dropped.
    pub fn dispatch(&self, event: FileEvent) {
        if !self.is_running() {
            debug!("Dropping {} (endpoint not started)", event);
            return;
        }

        // Snapshot so registration changes cannot disturb this fan-out
        let matched: Vec<Arc<Registration>> = self
            .services
            .iter()
            .filter(|r| r.service.entry(event.kind).is_some())
            .map(|r| Arc::clone(r.value()))
            .collect();

        if matched.is_empty() {
            debug!("No service handles {}", event);
            return;
        }

        for registration in matched {
            let isolated = registration
                .service
                .entry(event.kind)
                .is_some_and(|entry| entry.is_isolated());

            if isolated {
                let errors = self.errors.clone();
                let event = event.clone();
                self.runtime.spawn(async move {
                    registration.run(event, &errors).await;
                });
            } else if registration.queue.send(event.clone()).is_err() {
                debug!("Worker of {} has exited, dropping {}", registration.id, event);
            }
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("services", &self.services.len())
            .field("running", &self.is_running())
            .finish()
    }
}
