//! Output helpers shared by commands

use filekit_core::Metadata;
use owo_colors::OwoColorize;
use std::path::Path;

/// Format a byte count for humans ("1.5 KiB")
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Single-line listing entry
pub fn print_entry(meta: &Metadata) {
    let name = Path::new(&meta.abs_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| meta.abs_path.clone());
    let flags = format!(
        "{}{}{}",
        if meta.dir { 'd' } else { '-' },
        if meta.readable { 'r' } else { '-' },
        if meta.writable { 'w' } else { '-' },
    );
    let when = meta.modified_time.format("%Y-%m-%d %H:%M");

    if meta.dir {
        println!("{} {:>10}  {}  {}/", flags.dimmed(), "-", when, name.blue().bold());
    } else {
        println!("{} {:>10}  {}  {}", flags.dimmed(), format_size(meta.size), when, name);
    }
}

/// Detailed multi-line view used by `fk stat`
pub fn print_metadata(meta: &Metadata) {
    println!("{}: {}", "Path".cyan(), meta.abs_path);
    println!(
        "{}: {}",
        "Type".cyan(),
        if meta.dir { "directory" } else { "file" }
    );
    println!("{}: {} ({} bytes)", "Size".cyan(), format_size(meta.size), meta.size);
    println!("{}: {}", "Modified".cyan(), meta.modified_time.to_rfc3339());
    println!("{}: {}", "Readable".cyan(), meta.readable);
    println!("{}: {}", "Writable".cyan(), meta.writable);
}
