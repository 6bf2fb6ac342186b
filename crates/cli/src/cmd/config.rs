//! Show the effective configuration

use crate::config::{self, CliConfig};
use anyhow::Result;
use owo_colors::OwoColorize;
use std::path::Path;

pub fn run(config: &CliConfig, source: Option<&Path>) -> Result<()> {
    println!("{}", "Filekit Configuration".bold());
    match source {
        Some(path) => println!("{}: {}\n", "Location".dimmed(), path.display().dimmed()),
        None => {
            let default = config::config_file_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<no config directory>".to_string());
            println!(
                "{}: {} {}\n",
                "Location".dimmed(),
                default.dimmed(),
                "(not found, using defaults)".dimmed()
            );
        }
    }

    println!("{}", "[log]".yellow());
    println!("  {} = {:?}", "level".cyan(), config.log.level);

    for watch in &config.watch {
        println!("\n{}", "[[watch]]".yellow());
        println!("  {} = {:?}", "path".cyan(), watch.path.display().to_string());
        println!("  {} = {}", "recursive".cyan(), watch.recursive);
    }
    if config.watch.is_empty() {
        println!("\n{}", "No [[watch]] tables configured".dimmed());
    }

    Ok(())
}
