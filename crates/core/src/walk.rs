//! Depth-first tree traversal with per-node callbacks
//!
//! Built on `walkdir`'s pre-order iterator. Directories that were entered are
//! kept on an explicit stack so `post_visit_dir` fires only after every child
//! has been visited, giving pre- and post-order hooks from a single pass.

use crate::error::{FileError, Result};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// What the walker should do after a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Keep walking normally
    Continue,
    /// Do not descend into this directory (no `post_visit_dir` either)
    SkipSubtree,
}

/// Callbacks invoked by [`walk_tree`]
///
/// Returning an error from any callback aborts the walk and surfaces that
/// error to the caller.
pub trait TreeVisitor {
    /// Called for a directory before any of its children.
    fn pre_visit_dir(&mut self, _dir: &DirEntry) -> Result<Visit> {
        Ok(Visit::Continue)
    }

    /// Called for every non-directory entry (files, and links when not followed).
    fn visit_file(&mut self, file: &DirEntry) -> Result<Visit>;

    /// Called for a directory after all of its children.
    fn post_visit_dir(&mut self, _dir: &Path) -> Result<()> {
        Ok(())
    }

    /// Called when an entry could not be read. Returning `Ok` keeps walking.
    fn visit_failed(&mut self, err: walkdir::Error) -> Result<()> {
        Err(FileError::FileSystem(err.to_string()))
    }
}

/// Walk the tree rooted at `root`, depth first, in file-name order.
///
/// The root itself is visited (depth 0). Single-threaded; the tree is read
/// lazily so concurrent mutation by other callers is a race the caller owns.
pub fn walk_tree<V: TreeVisitor>(root: &Path, follow_links: bool, visitor: &mut V) -> Result<()> {
    let mut it = WalkDir::new(root)
        .follow_links(follow_links)
        .follow_root_links(follow_links)
        .sort_by_file_name()
        .into_iter();

    // Entered directories as (depth, path)
    let mut open: Vec<(usize, PathBuf)> = Vec::new();

    while let Some(next) = it.next() {
        let entry = match next {
            Ok(entry) => entry,
            Err(err) => {
                visitor.visit_failed(err)?;
                continue;
            }
        };

        close_dirs(&mut open, entry.depth(), visitor)?;

        if entry.file_type().is_dir() {
            match visitor.pre_visit_dir(&entry)? {
                Visit::Continue => open.push((entry.depth(), entry.into_path())),
                Visit::SkipSubtree => it.skip_current_dir(),
            }
        } else {
            visitor.visit_file(&entry)?;
        }
    }

    close_dirs(&mut open, 0, visitor)
}

/// Post-visit every open directory at or below `depth`.
fn close_dirs<V: TreeVisitor>(
    open: &mut Vec<(usize, PathBuf)>,
    depth: usize,
    visitor: &mut V,
) -> Result<()> {
    while matches!(open.last(), Some((d, _)) if *d >= depth) {
        if let Some((_, dir)) = open.pop() {
            visitor.post_visit_dir(&dir)?;
        }
    }
    Ok(())
}
