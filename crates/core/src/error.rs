//! Error taxonomy for file operations
//!
//! Every public operation returns exactly one of these on failure. Each variant
//! carries the human-readable message that callers see.

use std::io;
use std::path::Path;
use thiserror::Error;

/// Result type for file operations
pub type Result<T> = std::result::Result<T, FileError>;

/// File operation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileError {
    /// A path string is not syntactically valid for the host.
    #[error("{0}")]
    InvalidPath(String),

    /// A required path does not exist at the time of the check.
    #[error("{0}")]
    FileNotFound(String),

    /// An operation-specific precondition was violated.
    #[error("{0}")]
    InvalidOperation(String),

    /// A symlink-only operation was invoked on a non-link path.
    #[error("{0}")]
    NotLink(String),

    /// The host denied the operation.
    #[error("{0}")]
    Permission(String),

    /// Low-level I/O failure while reading link targets.
    #[error("{0}")]
    Io(String),

    /// Any other failure of the underlying file system.
    #[error("{0}")]
    FileSystem(String),

    /// A host-level security policy denial.
    #[error("{0}")]
    Security(String),
}

impl FileError {
    /// Map an `io::Error` onto the taxonomy.
    ///
    /// `context` is prefixed to the OS message for the kinds that do not carry
    /// a dedicated message of their own.
    pub fn from_io(context: impl AsRef<str>, err: &io::Error) -> Self {
        let context = context.as_ref();
        let message = format!("{}{}", context, err);
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound(message),
            io::ErrorKind::PermissionDenied => Self::Permission(message),
            io::ErrorKind::AlreadyExists => Self::InvalidOperation(message),
            _ => Self::FileSystem(message),
        }
    }

    pub(crate) fn not_found(path: &Path) -> Self {
        Self::FileNotFound(format!("File not found: {}", path.display()))
    }

    /// Short name of the error kind, as used in logs and CLI output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) => "InvalidPathError",
            Self::FileNotFound(_) => "FileNotFoundError",
            Self::InvalidOperation(_) => "InvalidOperationError",
            Self::NotLink(_) => "NotLinkError",
            Self::Permission(_) => "PermissionError",
            Self::Io(_) => "IOError",
            Self::FileSystem(_) => "FileSystemError",
            Self::Security(_) => "SecurityError",
        }
    }

    /// The message carried by this error.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidPath(m)
            | Self::FileNotFound(m)
            | Self::InvalidOperation(m)
            | Self::NotLink(m)
            | Self::Permission(m)
            | Self::Io(m)
            | Self::FileSystem(m)
            | Self::Security(m) => m,
        }
    }
}
