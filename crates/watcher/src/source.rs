//! Raw event sources
//!
//! An [`EventSource`] subscribes to one root directory and pushes translated
//! [`FileEvent`]s into a sink. The production source wraps the platform
//! watcher from `notify`; tests plug in their own.

use crate::error::Result;
use crate::{EventKind, FileEvent};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Receiver of translated events; called from the notification thread
pub type EventSink = Arc<dyn Fn(FileEvent) + Send + Sync>;

/// Producer of raw file system notifications for one root
pub trait EventSource: Send {
    /// Begin delivering events under `root` to `sink`.
    fn subscribe(&mut self, root: &Path, recursive: bool, sink: EventSink) -> Result<()>;

    /// Stop delivering events. Calling it without a subscription is a no-op.
    fn unsubscribe(&mut self) -> Result<()>;
}

/// Event source backed by the platform's recommended `notify` watcher
#[derive(Default)]
pub struct NotifySource {
    watcher: Option<RecommendedWatcher>,
    root: Option<PathBuf>,
}

impl NotifySource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSource for NotifySource {
    fn subscribe(&mut self, root: &Path, recursive: bool, sink: EventSink) -> Result<()> {
        let handler = move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for translated in translate(event) {
                    sink(translated);
                }
            }
            Err(e) => warn!("Watch error: {}", e),
        };

        let mut watcher = RecommendedWatcher::new(handler, Config::default())?;
        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(root, mode)?;

        debug!("Watching {} (recursive: {})", root.display(), recursive);
        self.watcher = Some(watcher);
        self.root = Some(root.to_path_buf());
        Ok(())
    }

    fn unsubscribe(&mut self) -> Result<()> {
        if let (Some(mut watcher), Some(root)) = (self.watcher.take(), self.root.take()) {
            // The watch may already be gone if the root itself was removed
            if let Err(e) = watcher.unwatch(&root) {
                debug!("Unwatch of {} failed: {}", root.display(), e);
            }
        }
        Ok(())
    }
}

/// Map one `notify` event onto zero or more file events.
///
/// Renames become a delete of the old name and a create of the new one.
/// Access and unclassified notifications are ignored.
pub(crate) fn translate(event: Event) -> Vec<FileEvent> {
    use notify::EventKind as Raw;

    let make = |path: &PathBuf, kind| FileEvent::new(path.to_string_lossy(), kind);

    match event.kind {
        Raw::Create(_) => event.paths.iter().map(|p| make(p, EventKind::Create)).collect(),
        Raw::Remove(_) => event.paths.iter().map(|p| make(p, EventKind::Delete)).collect(),
        Raw::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => event.paths.iter().map(|p| make(p, EventKind::Delete)).collect(),
            RenameMode::To => event.paths.iter().map(|p| make(p, EventKind::Create)).collect(),
            RenameMode::Both => {
                let mut out = Vec::with_capacity(2);
                if let Some(from) = event.paths.first() {
                    out.push(make(from, EventKind::Delete));
                }
                if let Some(to) = event.paths.get(1) {
                    out.push(make(to, EventKind::Create));
                }
                out
            }
            // Direction unknown; decide by what is on disk now
            RenameMode::Any | RenameMode::Other => event
                .paths
                .iter()
                .map(|p| {
                    let kind = if p.symlink_metadata().is_ok() {
                        EventKind::Create
                    } else {
                        EventKind::Delete
                    };
                    make(p, kind)
                })
                .collect(),
        },
        Raw::Modify(_) => event.paths.iter().map(|p| make(p, EventKind::Modify)).collect(),
        Raw::Access(_) | Raw::Any | Raw::Other => Vec::new(),
    }
}
