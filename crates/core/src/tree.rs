//! Recursive tree operations: listing, copy and delete

use crate::error::{FileError, Result};
use crate::options::CopyOptions;
use crate::path::{read_metadata, Metadata};
use crate::walk::{walk_tree, TreeVisitor, Visit};
use filetime::FileTime;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Depth bound for directory listings (immediate children only).
///
/// Fixed for compatibility; deeper listings are a possible future
/// configuration point, not something to raise silently.
pub const LISTING_DEPTH: usize = 1;

const DELETE_ERROR: &str = "Error while deleting the file/directory: ";

/// Entry skipped during a best-effort copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Source path of the entry
    pub path: PathBuf,
    /// Why it was skipped
    pub error: FileError,
}

/// Outcome of a copy call
///
/// Per-entry failures never fail the call; they are recorded here instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Files (and links) written to the destination
    pub copied: usize,
    /// Directories created at the destination
    pub dirs_created: usize,
    /// Entries left out, with the subtree below skipped directories
    pub skipped: Vec<SkippedEntry>,
}

impl CopyReport {
    /// True when nothing was skipped
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// List entries below `root` up to [`LISTING_DEPTH`], excluding `root` itself.
///
/// Any failure reading an entry aborts the listing; no partial results.
pub fn list_tree(root: &Path) -> Result<Vec<Metadata>> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(LISTING_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            let entry = entry.map_err(|e| {
                FileError::FileSystem(format!("Error while accessing file info: {}", e))
            })?;
            read_metadata(entry.path())
        })
        .collect()
}

/// Copy `source` to `target`, isolating per-entry failures.
///
/// Directories are recreated before their children are visited; a directory
/// that cannot be created is skipped together with its whole subtree. Only a
/// failure to set up the destination root fails the call.
pub fn copy_tree(source: &Path, target: &Path, options: CopyOptions) -> Result<CopyReport> {
    let mut visitor = CopyVisitor {
        source,
        target,
        options,
        report: CopyReport::default(),
    };
    walk_tree(source, !options.no_follow_links, &mut visitor)?;
    Ok(visitor.report)
}

/// Delete `root` and everything below it, children before parents.
///
/// Not failure-isolated: the first error aborts the walk.
pub fn delete_tree(root: &Path) -> Result<()> {
    walk_tree(root, false, &mut DeleteVisitor)
}

struct CopyVisitor<'a> {
    source: &'a Path,
    target: &'a Path,
    options: CopyOptions,
    report: CopyReport,
}

impl CopyVisitor<'_> {
    fn destination(&self, path: &Path) -> PathBuf {
        match path.strip_prefix(self.source) {
            Ok(rel) if !rel.as_os_str().is_empty() => self.target.join(rel),
            _ => self.target.to_path_buf(),
        }
    }

    fn skip(&mut self, path: &Path, error: FileError) {
        debug!("Skipping {} during copy: {}", path.display(), error);
        self.report.skipped.push(SkippedEntry {
            path: path.to_path_buf(),
            error,
        });
    }
}

impl TreeVisitor for CopyVisitor<'_> {
    fn pre_visit_dir(&mut self, dir: &DirEntry) -> Result<Visit> {
        let dest = self.destination(dir.path());
        if dest.is_dir() {
            return Ok(Visit::Continue);
        }

        match fs::create_dir(&dest) {
            Ok(()) => {
                self.report.dirs_created += 1;
                Ok(Visit::Continue)
            }
            // Nothing can be copied without the destination root
            Err(e) if dir.depth() == 0 => Err(match e.kind() {
                io::ErrorKind::NotFound => FileError::FileNotFound(format!(
                    "The target directory does not exist: {}",
                    dest.display()
                )),
                _ => FileError::from_io(
                    "An error occurred when copying the file/s: ",
                    &e,
                ),
            }),
            Err(e) => {
                let error = FileError::from_io(format!("{}: ", dest.display()), &e);
                self.skip(dir.path(), error);
                Ok(Visit::SkipSubtree)
            }
        }
    }

    fn visit_file(&mut self, file: &DirEntry) -> Result<Visit> {
        let dest = self.destination(file.path());
        match copy_entry(file, &dest, self.options) {
            Ok(()) => self.report.copied += 1,
            Err(error) => self.skip(file.path(), error),
        }
        Ok(Visit::Continue)
    }

    fn post_visit_dir(&mut self, dir: &Path) -> Result<()> {
        if self.options.copy_attributes {
            let dest = self.destination(dir);
            if let Err(e) = copy_attributes(dir, &dest, false) {
                debug!("Could not copy attributes of {}: {}", dir.display(), e);
            }
        }
        Ok(())
    }

    fn visit_failed(&mut self, err: walkdir::Error) -> Result<()> {
        if err.depth() == 0 {
            return Err(FileError::FileSystem(format!(
                "An error occurred when copying the file/s: {}",
                err
            )));
        }
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        self.skip(&path, FileError::FileSystem(err.to_string()));
        Ok(())
    }
}

/// Copy one non-directory entry to `dest`.
fn copy_entry(entry: &DirEntry, dest: &Path, options: CopyOptions) -> Result<()> {
    let context = format!("{}: ", dest.display());

    if let Ok(existing) = fs::symlink_metadata(dest) {
        if !options.replace_existing {
            return Err(FileError::InvalidOperation(format!(
                "File already exists: {}",
                dest.display()
            )));
        }
        let removed = if existing.is_dir() {
            fs::remove_dir(dest)
        } else {
            fs::remove_file(dest)
        };
        removed.map_err(|e| FileError::from_io(&context, &e))?;
    }

    let is_link = entry.file_type().is_symlink();
    if is_link && options.no_follow_links {
        copy_link(entry.path(), dest).map_err(|e| FileError::from_io(&context, &e))?;
    } else {
        fs::copy(entry.path(), dest).map_err(|e| FileError::from_io(&context, &e))?;
    }

    if options.copy_attributes {
        copy_attributes(entry.path(), dest, is_link && options.no_follow_links)
            .map_err(|e| FileError::from_io(&context, &e))?;
    }
    Ok(())
}

#[cfg(unix)]
fn copy_link(src: &Path, dest: &Path) -> io::Result<()> {
    let target = fs::read_link(src)?;
    std::os::unix::fs::symlink(target, dest)
}

#[cfg(not(unix))]
fn copy_link(src: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(src, dest).map(|_| ())
}

/// Carry permissions and timestamps from `src` to `dest`.
fn copy_attributes(src: &Path, dest: &Path, link: bool) -> io::Result<()> {
    if link {
        let meta = fs::symlink_metadata(src)?;
        return filetime::set_symlink_file_times(
            dest,
            FileTime::from_last_access_time(&meta),
            FileTime::from_last_modification_time(&meta),
        );
    }

    let meta = fs::metadata(src)?;
    fs::set_permissions(dest, meta.permissions())?;
    filetime::set_file_times(
        dest,
        FileTime::from_last_access_time(&meta),
        FileTime::from_last_modification_time(&meta),
    )
}

struct DeleteVisitor;

impl TreeVisitor for DeleteVisitor {
    fn visit_file(&mut self, file: &DirEntry) -> Result<Visit> {
        fs::remove_file(file.path()).map_err(|e| FileError::from_io(DELETE_ERROR, &e))?;
        Ok(Visit::Continue)
    }

    fn post_visit_dir(&mut self, dir: &Path) -> Result<()> {
        fs::remove_dir(dir).map_err(|e| FileError::from_io(DELETE_ERROR, &e))
    }

    fn visit_failed(&mut self, err: walkdir::Error) -> Result<()> {
        Err(match err.io_error() {
            Some(io_err) => FileError::from_io(DELETE_ERROR, io_err),
            None => FileError::FileSystem(format!("{}{}", DELETE_ERROR, err)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn build_tree(root: &Path) {
        fs::create_dir_all(root.join("sub/inner")).unwrap();
        fs::write(root.join("one.txt"), b"1").unwrap();
        fs::write(root.join("two.txt"), b"22").unwrap();
        fs::write(root.join("sub/three.txt"), b"333").unwrap();
        fs::write(root.join("sub/inner/four.txt"), b"4444").unwrap();
    }

    #[test]
    fn test_list_tree_immediate_children_only() {
        let temp_dir = TempDir::new().unwrap();
        build_tree(temp_dir.path());

        let entries = list_tree(temp_dir.path()).unwrap();
        let names: Vec<_> = entries
            .iter()
            .map(|m| Path::new(&m.abs_path).file_name().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["one.txt", "sub", "two.txt"]);
        assert!(entries.iter().all(|m| Path::new(&m.abs_path) != temp_dir.path()));
    }

    #[test]
    fn test_copy_tree_full() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        build_tree(&src);

        let report = copy_tree(&src, &dst, CopyOptions::default()).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.copied, 4);
        assert_eq!(report.dirs_created, 3);
        assert_eq!(fs::read(dst.join("sub/inner/four.txt")).unwrap(), b"4444");
    }

    #[test]
    fn test_copy_tree_isolates_existing_target() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        build_tree(&src);
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("one.txt"), b"keep me").unwrap();

        let report = copy_tree(&src, &dst, CopyOptions::default()).unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, src.join("one.txt"));
        assert_eq!(fs::read(dst.join("one.txt")).unwrap(), b"keep me");
        assert_eq!(fs::read(dst.join("two.txt")).unwrap(), b"22");
        assert_eq!(fs::read(dst.join("sub/three.txt")).unwrap(), b"333");
    }

    #[test]
    fn test_copy_tree_skips_subtree_of_failed_directory() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        build_tree(&src);
        fs::create_dir_all(&dst).unwrap();
        // A file where a directory should go blocks the whole subtree
        fs::write(dst.join("sub"), b"in the way").unwrap();

        let report = copy_tree(&src, &dst, CopyOptions::default()).unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, src.join("sub"));
        assert!(dst.join("one.txt").exists());
        assert!(!dst.join("sub").is_dir());
    }

    #[test]
    fn test_copy_tree_replace_existing() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        build_tree(&src);
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("one.txt"), b"old").unwrap();

        let options = CopyOptions {
            replace_existing: true,
            ..Default::default()
        };
        let report = copy_tree(&src, &dst, options).unwrap();
        assert!(report.is_complete());
        assert_eq!(fs::read(dst.join("one.txt")).unwrap(), b"1");
    }

    #[test]
    fn test_copy_tree_missing_destination_parent() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        build_tree(&src);

        let err = copy_tree(&src, &temp_dir.path().join("no/such/dst"), CopyOptions::default())
            .unwrap_err();
        assert!(matches!(err, FileError::FileNotFound(_)));
    }

    #[test]
    fn test_copy_attributes_preserves_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("old.txt");
        let dst = temp_dir.path().join("copy.txt");
        fs::write(&src, b"old").unwrap();
        let old = FileTime::from_unix_time(1_000_000_000, 0);
        filetime::set_file_mtime(&src, old).unwrap();

        let options = CopyOptions {
            copy_attributes: true,
            ..Default::default()
        };
        copy_tree(&src, &dst, options).unwrap();

        let meta = fs::metadata(&dst).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), old);
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_no_follow_links_keeps_link() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("real.txt"), b"data").unwrap();
        std::os::unix::fs::symlink("real.txt", src.join("alias")).unwrap();

        let options = CopyOptions {
            no_follow_links: true,
            ..Default::default()
        };
        copy_tree(&src, &dst, options).unwrap();

        let link_meta = fs::symlink_metadata(dst.join("alias")).unwrap();
        assert!(link_meta.file_type().is_symlink());
        assert_eq!(fs::read_link(dst.join("alias")).unwrap(), Path::new("real.txt"));
    }

    #[test]
    fn test_delete_tree_removes_everything() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("doomed");
        build_tree(&root);

        delete_tree(&root).unwrap();
        assert!(!root.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_delete_tree_does_not_follow_links() {
        let temp_dir = TempDir::new().unwrap();
        let outside = temp_dir.path().join("outside");
        let root = temp_dir.path().join("doomed");
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("precious.txt"), b"!").unwrap();
        fs::create_dir_all(&root).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        delete_tree(&root).unwrap();
        assert!(!root.exists());
        assert!(outside.join("precious.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_delete_tree_aborts_on_first_error() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("doomed");
        let locked = root.join("a_locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("pinned.txt"), b"x").unwrap();
        fs::write(root.join("z_after.txt"), b"z").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o500)).unwrap();

        // Privileged users ignore directory permissions
        if fs::write(locked.join("write-check"), b"").is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o700)).unwrap();
            return;
        }

        let result = delete_tree(&root);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o700)).unwrap();

        match result {
            Err(FileError::Permission(msg)) => assert!(msg.starts_with(DELETE_ERROR)),
            other => panic!("expected permission error, got {other:?}"),
        }
        assert!(locked.join("pinned.txt").exists());
        assert!(root.join("z_after.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_list_tree_fails_without_partial_results() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), b"a").unwrap();
        std::os::unix::fs::symlink(
            temp_dir.path().join("missing"),
            temp_dir.path().join("dangling"),
        )
        .unwrap();
        fs::write(temp_dir.path().join("z.txt"), b"z").unwrap();

        assert!(list_tree(temp_dir.path()).is_err());
    }
}
