//! Path-based file operations
//!
//! Each operation checks its preconditions, delegates to the tree walker or
//! the host file system, and maps failures onto [`FileError`]. Existence
//! checks and the operations that follow them are not atomic.

use crate::cleanup::register_for_cleanup;
use crate::error::{FileError, Result};
use crate::options::{CopyOption, CopyOptions, TestPredicate};
use crate::path::{self, absolute, Metadata};
use crate::tree::{self, CopyReport};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::error;
use uuid::Uuid;

/// Create a directory.
///
/// With `recursive` every missing parent is created and an existing directory
/// is not an error. Without it, an existing entry fails with
/// `InvalidOperation`.
pub fn create_dir(dir: impl AsRef<Path>, recursive: bool) -> Result<()> {
    let dir = dir.as_ref();
    let result = if recursive {
        fs::create_dir_all(dir)
    } else {
        fs::create_dir(dir)
    };

    result.map_err(|e| {
        let err = match e.kind() {
            io::ErrorKind::AlreadyExists => FileError::InvalidOperation(format!(
                "File already exists. Failed to create the file: {}",
                dir.display()
            )),
            io::ErrorKind::PermissionDenied => FileError::Permission(format!(
                "Permission denied. Failed to create the file: {}",
                dir.display()
            )),
            _ => FileError::FileSystem(format!(
                "IO error while creating the file {}",
                dir.display()
            )),
        };
        error!("{}: {}", err, e);
        err
    })
}

/// Create an empty file; fails if anything already exists at `file`.
pub fn create_file(file: impl AsRef<Path>) -> Result<()> {
    let file = file.as_ref();
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(file)
        .map(|_| ())
        .map_err(|e| {
            let err = match e.kind() {
                io::ErrorKind::AlreadyExists => FileError::InvalidOperation(format!(
                    "File already exists. Failed to create the file: {}",
                    file.display()
                )),
                io::ErrorKind::PermissionDenied => FileError::Permission(format!(
                    "Permission denied. Failed to create the file: {}",
                    file.display()
                )),
                io::ErrorKind::NotFound => {
                    return FileError::FileSystem(format!(
                        "The file does not exist in path {}",
                        file.display()
                    ))
                }
                _ => FileError::FileSystem(format!(
                    "IO error occurred while creating the file {}",
                    file.display()
                )),
            };
            error!("{}: {}", err, e);
            err
        })
}

/// Move `old_path` to `new_path`.
///
/// Never overwrites: an existing `new_path` fails with `InvalidOperation`.
/// Both paths must be on the same file system.
pub fn rename(old_path: impl AsRef<Path>, new_path: impl AsRef<Path>) -> Result<()> {
    let old_abs = absolute(old_path.as_ref())?;
    let new_abs = absolute(new_path.as_ref())?;

    if fs::symlink_metadata(&old_abs).is_err() {
        return Err(FileError::not_found(&old_abs));
    }
    if fs::symlink_metadata(&new_abs).is_ok() {
        return Err(FileError::InvalidOperation(format!(
            "File already exists in the new path {}",
            new_path.as_ref().display()
        )));
    }

    fs::rename(&old_abs, &new_abs).map_err(|e| match e.kind() {
        io::ErrorKind::PermissionDenied => FileError::Permission(e.to_string()),
        _ => FileError::FileSystem(e.to_string()),
    })
}

/// Remove a file or directory.
///
/// The current working directory can never be removed. Without `recursive`
/// a directory must be empty. Symbolic links are removed, never followed.
pub fn remove(target: impl AsRef<Path>, recursive: bool) -> Result<()> {
    let abs = absolute(target.as_ref())?;
    let cwd = path::current_directory()?;

    if let (Ok(canonical_cwd), Ok(canonical)) = (cwd.canonicalize(), abs.canonicalize()) {
        if canonical_cwd == canonical {
            return Err(FileError::InvalidOperation(format!(
                "Cannot delete the current working directory {}",
                canonical_cwd.display()
            )));
        }
    }

    let meta = match fs::symlink_metadata(&abs) {
        Ok(meta) => meta,
        Err(_) => return Err(FileError::not_found(&abs)),
    };

    const DELETE_ERROR: &str = "Error while deleting the file/directory: ";
    if meta.is_dir() {
        if recursive {
            tree::delete_tree(&abs)
        } else {
            fs::remove_dir(&abs).map_err(|e| delete_error(DELETE_ERROR, &e))
        }
    } else {
        fs::remove_file(&abs).map_err(|e| delete_error(DELETE_ERROR, &e))
    }
}

fn delete_error(context: &str, e: &io::Error) -> FileError {
    match e.kind() {
        io::ErrorKind::PermissionDenied => FileError::Permission(format!("{}{}", context, e)),
        _ => FileError::FileSystem(format!("{}{}", context, e)),
    }
}

/// Copy a file or directory tree.
///
/// Per-entry failures (an existing target without `ReplaceExisting`, an
/// unreadable child, ...) are recorded in the returned [`CopyReport`] and do
/// not fail the call.
pub fn copy(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    options: &[CopyOption],
) -> Result<CopyReport> {
    let source = source.as_ref();
    let destination = destination.as_ref();
    let options = CopyOptions::from(options);

    if !source.exists() {
        return Err(FileError::FileNotFound(format!(
            "File not found: {}",
            source.display()
        )));
    }

    let src_abs = absolute(source)?;
    let dst_abs = absolute(destination)?;
    let nested = resolve_existing(&dst_abs).starts_with(resolve_existing(&src_abs));
    if src_abs.is_dir() && nested {
        return Err(FileError::InvalidOperation(format!(
            "Cannot copy {} into itself",
            source.display()
        )));
    }

    tree::copy_tree(&src_abs, &dst_abs, options)
}

/// Canonical form of `path` even when its tail does not exist yet.
///
/// The nearest existing ancestor is canonicalized and the remaining
/// components are applied lexically.
fn resolve_existing(path: &Path) -> PathBuf {
    let mut pending = Vec::new();
    let mut current = path;
    loop {
        if let Ok(mut resolved) = current.canonicalize() {
            for part in pending.into_iter().rev() {
                match part {
                    Component::ParentDir => {
                        resolved.pop();
                    }
                    Component::Normal(name) => resolved.push(name),
                    _ => {}
                }
            }
            return resolved;
        }
        match (current.components().next_back(), current.parent()) {
            (Some(last), Some(parent)) => {
                pending.push(last);
                current = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Metadata of the direct children of a directory.
pub fn read_dir(dir: impl AsRef<Path>) -> Result<Vec<Metadata>> {
    let dir = dir.as_ref();
    let abs = absolute(dir)?;

    if !abs.exists() {
        return Err(FileError::not_found(dir));
    }
    if !abs.is_dir() {
        return Err(FileError::InvalidOperation(format!(
            "File in path {} is not a directory",
            dir.display()
        )));
    }

    tree::list_tree(&abs)
}

/// Create a uniquely named empty file and return its path.
///
/// The name is `prefix + random token + suffix`. Without `dir` the host temp
/// directory is used; with one, the file is queued for shutdown cleanup.
pub fn create_temp(
    suffix: Option<&str>,
    prefix: Option<&str>,
    dir: Option<&Path>,
) -> Result<PathBuf> {
    create_temp_entry(suffix, prefix, dir, TempKind::File)
}

/// Create a uniquely named directory; see [`create_temp`].
pub fn create_temp_dir(
    suffix: Option<&str>,
    prefix: Option<&str>,
    dir: Option<&Path>,
) -> Result<PathBuf> {
    create_temp_entry(suffix, prefix, dir, TempKind::Directory)
}

#[derive(Clone, Copy)]
enum TempKind {
    File,
    Directory,
}

fn create_temp_entry(
    suffix: Option<&str>,
    prefix: Option<&str>,
    dir: Option<&Path>,
    kind: TempKind,
) -> Result<PathBuf> {
    let name = format!(
        "{}{}{}",
        prefix.map(str::trim).unwrap_or_default(),
        Uuid::new_v4(),
        suffix.map(str::trim).unwrap_or_default()
    );

    let explicit_dir = dir
        .map(|d| match d.to_str() {
            Some(s) => Path::new(s.trim()),
            None => d,
        })
        .filter(|d| !d.as_os_str().is_empty());
    let path = match explicit_dir {
        Some(d) => d.join(&name),
        None => path::temp_directory().join(&name),
    };

    let created = match kind {
        TempKind::File => OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map(|_| ()),
        TempKind::Directory => fs::create_dir(&path),
    };

    if let Err(e) = created {
        let what = match kind {
            TempKind::File => "file",
            TempKind::Directory => "directory",
        };
        let msg = format!("Error occurred while creating temporary {}. {}", what, e);
        error!("{}", msg);
        return Err(FileError::FileSystem(msg));
    }

    if explicit_dir.is_some() {
        register_for_cleanup(&path);
    }
    Ok(path)
}

/// Evaluate `predicate` against `target` without side effects.
pub fn test(target: impl AsRef<Path>, predicate: TestPredicate) -> Result<bool> {
    let target = target.as_ref();
    Ok(match predicate {
        TestPredicate::Exists => target.exists(),
        TestPredicate::IsDirectory => target.is_dir(),
        TestPredicate::IsSymlink => target.is_symlink(),
        TestPredicate::Readable => target.exists() && path::is_readable(target),
        TestPredicate::Writable => target.exists() && path::is_writable(target),
    })
}

/// Metadata snapshot of `target`.
pub fn get_metadata(target: impl AsRef<Path>) -> Result<Metadata> {
    path::metadata(target.as_ref()).map_err(|err| {
        if let FileError::FileSystem(_) = &err {
            error!("IO error while reading metadata of {}: {}", target.as_ref().display(), err);
        }
        err
    })
}
