//! Filekit CLI - fk command

use anyhow::Result;
use clap::{Parser, Subcommand};
use filekit_core::CleanupGuard;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cmd;
mod config;
mod util;

/// Filekit - file operations and directory watching
#[derive(Parser)]
#[command(name = "fk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/filekit/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the direct children of a directory
    Ls {
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Print metadata as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show metadata of a file or directory
    Stat {
        path: PathBuf,
        /// Print metadata as JSON
        #[arg(long)]
        json: bool,
    },
    /// Copy a file or directory tree
    Cp {
        source: PathBuf,
        destination: PathBuf,
        /// REPLACE_EXISTING, COPY_ATTRIBUTES or NO_FOLLOW_LINKS (repeatable)
        #[arg(short = 'o', long = "option")]
        options: Vec<String>,
    },
    /// Remove a file or directory
    Rm {
        path: PathBuf,
        /// Remove directories and their contents
        #[arg(short, long)]
        recursive: bool,
    },
    /// Create a directory
    Mkdir {
        path: PathBuf,
        /// Create missing parents; an existing directory is not an error
        #[arg(short, long)]
        parents: bool,
    },
    /// Create a new empty file
    Touch { path: PathBuf },
    /// Rename or move an entry
    Mv { from: PathBuf, to: PathBuf },
    /// Evaluate a predicate: EXISTS, IS_DIR, IS_SYMLINK, READABLE or WRITABLE
    Test { path: PathBuf, predicate: String },
    /// Create a uniquely named temp file or directory
    Mktemp {
        /// Create a directory instead of a file
        #[arg(short, long)]
        directory: bool,
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        suffix: Option<String>,
        /// Parent directory; entries created here are removed on exit
        #[arg(long = "in")]
        dir: Option<PathBuf>,
    },
    /// Print the target of a symbolic link
    Readlink { path: PathBuf },
    /// Print the current working directory
    Pwd,
    /// Watch directories and log their events until Ctrl-C
    Watch {
        /// Directory to watch (default: every [[watch]] table in the config)
        path: Option<PathBuf>,
        /// Also watch nested directories
        #[arg(short, long)]
        recursive: bool,
    },
    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let (config, config_source) = config::load(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let _cleanup = CleanupGuard::new();

    match cli.command {
        Commands::Ls { dir, json } => cmd::fs::list(&dir, json)?,
        Commands::Stat { path, json } => cmd::fs::stat(&path, json)?,
        Commands::Cp {
            source,
            destination,
            options,
        } => cmd::fs::copy(&source, &destination, &options)?,
        Commands::Rm { path, recursive } => cmd::fs::remove(&path, recursive)?,
        Commands::Mkdir { path, parents } => cmd::fs::mkdir(&path, parents)?,
        Commands::Touch { path } => cmd::fs::touch(&path)?,
        Commands::Mv { from, to } => cmd::fs::rename(&from, &to)?,
        Commands::Test { path, predicate } => {
            if !cmd::fs::test(&path, &predicate)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Mktemp {
            directory,
            prefix,
            suffix,
            dir,
        } => cmd::fs::mktemp(directory, prefix.as_deref(), suffix.as_deref(), dir.as_deref())?,
        Commands::Readlink { path } => cmd::fs::readlink(&path)?,
        Commands::Pwd => cmd::fs::pwd()?,
        Commands::Watch { path, recursive } => cmd::watch::run(path, recursive, &config.watch).await?,
        Commands::Config => cmd::config::run(&config, config_source.as_deref())?,
    }

    Ok(ExitCode::SUCCESS)
}
