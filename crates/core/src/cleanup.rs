//! Advisory removal of temp entries at shutdown
//!
//! Temp files and directories created inside an explicit directory are queued
//! here. Nothing runs on abnormal termination; callers that want the cleanup
//! hold a [`CleanupGuard`] for the lifetime of the process.

use parking_lot::{const_mutex, Mutex};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

static PENDING: Mutex<Vec<PathBuf>> = const_mutex(Vec::new());

/// Queue `path` for removal at shutdown.
pub fn register_for_cleanup(path: &Path) {
    debug!("Registered {} for shutdown cleanup", path.display());
    PENDING.lock().push(path.to_path_buf());
}

/// Remove every queued entry, most recent first. Failures are logged only.
///
/// Directories are removed only when empty.
pub fn run_shutdown_cleanup() {
    let pending = std::mem::take(&mut *PENDING.lock());

    for path in pending.into_iter().rev() {
        let result = match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir(&path),
            Ok(_) => fs::remove_file(&path),
            // Already gone
            Err(_) => continue,
        };
        if let Err(e) = result {
            error!("Error deleting temporary entry {}: {}", path.display(), e);
        }
    }
}

/// Runs [`run_shutdown_cleanup`] when dropped
#[must_use = "cleanup runs when the guard is dropped"]
#[derive(Debug, Default)]
pub struct CleanupGuard {
    _private: (),
}

impl CleanupGuard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        run_shutdown_cleanup();
    }
}
