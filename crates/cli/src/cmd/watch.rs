//! Run watch endpoints that log every event until interrupted

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing::{error, info};
use watcher::{EventKind, FileEvent, Service, WatchConfig, WatchEndpoint};

fn logging_service() -> Result<Service> {
    let mut builder = Service::builder("event-log");
    for kind in EventKind::ALL {
        builder = builder.on_isolated(kind, |event: FileEvent| async move {
            let label = match event.kind {
                EventKind::Create => event.kind.green().to_string(),
                EventKind::Modify => event.kind.yellow().to_string(),
                EventKind::Delete => event.kind.red().to_string(),
            };
            println!("{:>8} {}", label, event.name);
            Ok(())
        });
    }
    Ok(builder.build()?)
}

/// Watch `path`, or every `[[watch]]` table when no path is given.
pub async fn run(path: Option<PathBuf>, recursive: bool, configured: &[WatchConfig]) -> Result<()> {
    let targets = match path {
        Some(path) => vec![WatchConfig::new(path, recursive)],
        None if configured.is_empty() => {
            anyhow::bail!("Nothing to watch: pass a path or add a [[watch]] table to the config")
        }
        None => configured.to_vec(),
    };

    let mut endpoints = Vec::with_capacity(targets.len());
    for target in &targets {
        let endpoint = WatchEndpoint::from_config(target)
            .with_context(|| format!("Failed to watch {}", target.path.display()))?;
        endpoint.attach(logging_service()?)?;
        endpoint.start()?;

        let errors = endpoint.errors();
        tokio::task::spawn_blocking(move || {
            for report in errors.iter() {
                error!("{}", report);
            }
        });

        println!(
            "{} {}{}",
            "Watching".bold(),
            endpoint.root().display(),
            if target.recursive { " (recursive)" } else { "" }
        );
        endpoints.push(endpoint);
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Interrupted, stopping {} endpoint(s)", endpoints.len());

    for endpoint in &endpoints {
        endpoint.stop()?;
    }
    Ok(())
}
