//! Path-based file operations for filekit
//!
//! This crate provides:
//! - Path resolution and metadata snapshots
//! - A depth-first tree walker with pre/post visit callbacks
//! - Best-effort recursive copy, strict recursive delete, bounded listing
//! - The public operation surface (create, remove, rename, copy, list, temp, test)
//! - A structured error taxonomy shared by every operation

pub mod cleanup;
pub mod error;
pub mod ops;
pub mod options;
pub mod path;
pub mod tree;
pub mod walk;

// Re-exports
pub use cleanup::{register_for_cleanup, run_shutdown_cleanup, CleanupGuard};
pub use error::{FileError, Result};
pub use ops::{
    copy, create_dir, create_file, create_temp, create_temp_dir, get_metadata, read_dir, remove,
    rename, test,
};
pub use options::{CopyOption, CopyOptions, TestPredicate};
pub use path::{absolute, current_directory, metadata, resolve_symlink, temp_directory, Metadata};
pub use tree::{CopyReport, SkippedEntry, LISTING_DEPTH};
