//! Path resolution and metadata snapshots

use crate::error::{FileError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Point-in-time description of a file system entry
///
/// Produced fresh on every query and never cached, so it is stale as soon as
/// it is returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Absolute path of the entry
    pub abs_path: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time (UTC)
    pub modified_time: DateTime<Utc>,
    /// Whether the entry is a directory
    pub dir: bool,
    /// Whether the current process may read the entry
    pub readable: bool,
    /// Whether the current process may write the entry
    pub writable: bool,
}

/// Resolve `path` to an absolute path using host syntax.
///
/// An empty path resolves to the current working directory. Nothing is read
/// from disk; the entry does not need to exist.
pub fn absolute(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();

    if path.as_os_str().is_empty() {
        return std::env::current_dir()
            .map_err(|_| FileError::InvalidPath(format!("Invalid path {}", path.display())));
    }

    if path.as_os_str().as_encoded_bytes().contains(&0) {
        return Err(FileError::InvalidPath(format!(
            "Invalid path {}",
            path.display()
        )));
    }

    std::path::absolute(path)
        .map_err(|_| FileError::InvalidPath(format!("Invalid path {}", path.display())))
}

/// Return the direct target of the symbolic link at `path`.
pub fn resolve_symlink(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let abs = absolute(path)?;

    let link_meta = fs::symlink_metadata(&abs).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            FileError::FileNotFound(format!("File does not exist at {}", path.display()))
        }
        io::ErrorKind::PermissionDenied => {
            FileError::Security(format!("Security error for {}", path.display()))
        }
        _ => FileError::Io(format!("IO error for {}", path.display())),
    })?;

    if !link_meta.file_type().is_symlink() {
        return Err(FileError::NotLink(format!(
            "Path is not a symbolic link {}",
            path.display()
        )));
    }

    fs::read_link(&abs).map_err(|e| match e.kind() {
        io::ErrorKind::PermissionDenied => {
            FileError::Security(format!("Security error for {}", path.display()))
        }
        _ => FileError::Io(format!("IO error for {}", path.display())),
    })
}

/// Produce a metadata snapshot of the entry at `path`.
///
/// Existence is checked first and attributes are read afterwards; an entry
/// removed in between surfaces as a `FileSystem` error.
pub fn metadata(path: impl AsRef<Path>) -> Result<Metadata> {
    let abs = absolute(path.as_ref())?;
    if !abs.exists() {
        return Err(FileError::not_found(path.as_ref()));
    }
    read_metadata(&abs)
}

/// Read attributes of an entry known to exist.
pub(crate) fn read_metadata(abs: &Path) -> Result<Metadata> {
    let meta = fs::metadata(abs).map_err(|e| FileError::FileSystem(e.to_string()))?;
    let modified = meta
        .modified()
        .map_err(|e| FileError::FileSystem(e.to_string()))?;

    Ok(Metadata {
        abs_path: abs.to_string_lossy().into_owned(),
        size: meta.len(),
        modified_time: DateTime::<Utc>::from(modified),
        dir: meta.is_dir(),
        readable: is_readable(abs),
        writable: is_writable(abs),
    })
}

/// Current working directory of the process
pub fn current_directory() -> Result<PathBuf> {
    std::env::current_dir().map_err(|e| FileError::from_io("", &e))
}

/// Host temp directory used when no directory is given
pub fn temp_directory() -> PathBuf {
    std::env::temp_dir()
}

#[cfg(unix)]
pub(crate) fn is_readable(path: &Path) -> bool {
    use nix::unistd::{access, AccessFlags};
    access(path, AccessFlags::R_OK).is_ok()
}

#[cfg(unix)]
pub(crate) fn is_writable(path: &Path) -> bool {
    use nix::unistd::{access, AccessFlags};
    access(path, AccessFlags::W_OK).is_ok()
}

#[cfg(not(unix))]
pub(crate) fn is_readable(path: &Path) -> bool {
    fs::metadata(path).is_ok()
}

#[cfg(not(unix))]
pub(crate) fn is_writable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_absolute_relative_path() {
        let abs = absolute("some/where.txt").unwrap();
        assert!(abs.is_absolute());
        assert!(abs.ends_with("some/where.txt"));
    }

    #[test]
    fn test_absolute_empty_is_cwd() {
        assert_eq!(absolute("").unwrap(), std::env::current_dir().unwrap());
    }

    #[test]
    fn test_absolute_rejects_nul() {
        let err = absolute("bad\0path").unwrap_err();
        assert!(matches!(err, FileError::InvalidPath(_)));
    }

    #[test]
    fn test_metadata_of_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.txt");
        fs::write(&file, b"hello").unwrap();

        let meta = metadata(&file).unwrap();
        assert_eq!(meta.size, 5);
        assert!(!meta.dir);
        assert!(meta.readable);
        assert!(meta.abs_path.ends_with("a.txt"));
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let temp_dir = TempDir::new().unwrap();
        let meta = metadata(temp_dir.path()).unwrap();

        let json = serde_json::to_value(&meta).unwrap();
        let obj = json.as_object().unwrap();
        for key in ["absPath", "size", "modifiedTime", "dir", "readable", "writable"] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert_eq!(obj.len(), 6);
        assert_eq!(json["dir"], true);
        assert_eq!(json["absPath"], meta.abs_path.as_str());
    }

    #[test]
    fn test_metadata_missing() {
        let temp_dir = TempDir::new().unwrap();
        let err = metadata(temp_dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, FileError::FileNotFound(_)));
    }

    #[test]
    fn test_resolve_symlink_on_regular_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("plain");
        fs::write(&file, b"x").unwrap();

        let err = resolve_symlink(&file).unwrap_err();
        assert!(matches!(err, FileError::NotLink(_)));

        let err = resolve_symlink(temp_dir.path().join("ghost")).unwrap_err();
        assert!(matches!(err, FileError::FileNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_symlink_returns_direct_target() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target.txt");
        let link = temp_dir.path().join("link");
        fs::write(&target, b"x").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(resolve_symlink(&link).unwrap(), target);
    }
}
