//! End-to-end behaviour of the file operation surface

use filekit_core::{
    copy, create_dir, create_file, read_dir, remove, test, CopyOption, FileError, TestPredicate,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn names(dir: &Path) -> BTreeSet<String> {
    read_dir(dir)
        .unwrap()
        .into_iter()
        .map(|m| {
            Path::new(&m.abs_path)
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

/// Fixture tree:
/// ```text
/// project/
///   Cargo.toml
///   README.md
///   src/
///     lib.rs
///     bin/
///       main.rs
///   empty/
/// ```
fn project(root: &Path) {
    create_dir(root.join("src/bin"), true).unwrap();
    create_dir(root.join("empty"), false).unwrap();
    fs::write(root.join("Cargo.toml"), "[package]").unwrap();
    fs::write(root.join("README.md"), "# readme").unwrap();
    fs::write(root.join("src/lib.rs"), "pub fn f() {}").unwrap();
    fs::write(root.join("src/bin/main.rs"), "fn main() {}").unwrap();
}

#[test]
fn test_read_dir_returns_direct_children_only() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("project");
    project(&root);

    let entries = read_dir(&root).unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|m| Path::new(&m.abs_path) != root));

    let src = entries
        .iter()
        .find(|m| m.abs_path.ends_with("src"))
        .unwrap();
    assert!(src.dir);
    let readme = entries
        .iter()
        .find(|m| m.abs_path.ends_with("README.md"))
        .unwrap();
    assert_eq!(readme.size, 8);
}

#[test]
fn test_remove_then_exists_is_false() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("victim.txt");
    let dir = temp_dir.path().join("empty");
    create_file(&file).unwrap();
    create_dir(&dir, false).unwrap();

    for path in [&file, &dir] {
        remove(path, false).unwrap();
        assert!(!test(path, TestPredicate::Exists).unwrap());
    }
}

#[test]
fn test_recursive_remove_of_tree() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("project");
    project(&root);

    remove(&root, true).unwrap();
    assert!(!root.exists());
    assert!(temp_dir.path().exists());
}

#[test]
fn test_copy_round_trip_matches_every_subdirectory() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("project");
    let dst = temp_dir.path().join("mirror");
    project(&src);

    let report = copy(&src, &dst, &[CopyOption::ReplaceExisting]).unwrap();
    assert!(report.is_complete());

    for sub in ["", "src", "src/bin", "empty"] {
        assert_eq!(names(&src.join(sub)), names(&dst.join(sub)), "mismatch in {:?}", sub);
    }
}

#[test]
fn test_copy_with_one_conflict_copies_the_rest() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("project");
    let dst = temp_dir.path().join("mirror");
    project(&src);
    create_dir(&dst, false).unwrap();
    fs::write(dst.join("README.md"), "existing").unwrap();

    let report = copy(&src, &dst, &[]).unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(fs::read_to_string(dst.join("README.md")).unwrap(), "existing");
    assert_eq!(fs::read_to_string(dst.join("Cargo.toml")).unwrap(), "[package]");
    assert!(dst.join("src/bin/main.rs").exists());
    assert!(dst.join("empty").is_dir());
}

#[test]
fn test_exists_is_stable_without_mutation() {
    let temp_dir = TempDir::new().unwrap();
    let present = temp_dir.path().join("here");
    let absent = temp_dir.path().join("gone");
    create_file(&present).unwrap();

    let first = (
        test(&present, TestPredicate::Exists).unwrap(),
        test(&absent, TestPredicate::Exists).unwrap(),
    );
    for _ in 0..10 {
        assert_eq!(
            first,
            (
                test(&present, TestPredicate::Exists).unwrap(),
                test(&absent, TestPredicate::Exists).unwrap(),
            )
        );
    }
    assert_eq!(first, (true, false));
}

#[test]
fn test_unsupported_predicate_name() {
    let err = "IS_SOCKET".parse::<TestPredicate>().unwrap_err();
    assert_eq!(err, FileError::InvalidOperation("Unsupported test option.".into()));
}

#[cfg(unix)]
#[test]
fn test_symlink_predicate_and_resolution() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("target");
    let link = temp_dir.path().join("link");
    create_file(&target).unwrap();
    std::os::unix::fs::symlink(&target, &link).unwrap();

    assert!(test(&link, TestPredicate::IsSymlink).unwrap());
    assert!(!test(&target, TestPredicate::IsSymlink).unwrap());
    assert_eq!(filekit_core::resolve_symlink(&link).unwrap(), target);

    // Removing the link leaves the target alone
    remove(&link, true).unwrap();
    assert!(target.exists());
}
