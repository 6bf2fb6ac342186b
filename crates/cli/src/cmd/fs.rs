//! File operation commands

use crate::util::{print_entry, print_metadata};
use anyhow::Result;
use filekit_core::{self as fk, CopyOption, TestPredicate};
use owo_colors::OwoColorize;
use std::path::Path;

pub fn list(dir: &Path, json: bool) -> Result<()> {
    let entries = fk::read_dir(dir)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for meta in &entries {
        print_entry(meta);
    }
    Ok(())
}

pub fn stat(target: &Path, json: bool) -> Result<()> {
    let meta = fk::get_metadata(target)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&meta)?);
    } else {
        print_metadata(&meta);
    }
    Ok(())
}

pub fn copy(source: &Path, destination: &Path, options: &[String]) -> Result<()> {
    let options = options
        .iter()
        .map(|name| name.parse::<CopyOption>())
        .collect::<Result<Vec<_>, _>>()?;
    let report = fk::copy(source, destination, &options)?;

    println!(
        "{} {} file(s), {} director(ies)",
        "Copied".green(),
        report.copied,
        report.dirs_created
    );
    if !report.is_complete() {
        println!("{} {} entr(ies):", "Skipped".yellow(), report.skipped.len());
        for skipped in &report.skipped {
            println!("  {} {}", skipped.path.display(), skipped.error.dimmed());
        }
    }
    Ok(())
}

pub fn remove(target: &Path, recursive: bool) -> Result<()> {
    fk::remove(target, recursive)?;
    println!("{} {}", "Removed".green(), target.display());
    Ok(())
}

pub fn mkdir(dir: &Path, parents: bool) -> Result<()> {
    fk::create_dir(dir, parents)?;
    Ok(())
}

pub fn touch(file: &Path) -> Result<()> {
    fk::create_file(file)?;
    Ok(())
}

pub fn rename(from: &Path, to: &Path) -> Result<()> {
    fk::rename(from, to)?;
    Ok(())
}

/// Print the outcome; the exit status reflects it.
pub fn test(target: &Path, predicate: &str) -> Result<bool> {
    let predicate: TestPredicate = predicate.parse()?;
    let outcome = fk::test(target, predicate)?;
    println!("{}", outcome);
    Ok(outcome)
}

pub fn mktemp(
    directory: bool,
    prefix: Option<&str>,
    suffix: Option<&str>,
    dir: Option<&Path>,
) -> Result<()> {
    let created = if directory {
        fk::create_temp_dir(suffix, prefix, dir)?
    } else {
        fk::create_temp(suffix, prefix, dir)?
    };
    println!("{}", created.display());
    Ok(())
}

pub fn readlink(link: &Path) -> Result<()> {
    println!("{}", fk::resolve_symlink(link)?.display());
    Ok(())
}

pub fn pwd() -> Result<()> {
    println!("{}", fk::current_directory()?.display());
    Ok(())
}
