//! Watch endpoints against the real platform watcher

use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Instant};
use watcher::{EventKind, FileEvent, Service, WatchConfig, WatchEndpoint};

const WAIT: Duration = Duration::from_secs(10);

/// Service forwarding every event of every kind to a channel
fn forwarding() -> (Service, mpsc::UnboundedReceiver<FileEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut builder = Service::builder("forward");
    for kind in EventKind::ALL {
        let tx = tx.clone();
        builder = builder.on(kind, move |event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(event);
                Ok(())
            }
        });
    }
    (builder.build().unwrap(), rx)
}

/// Wait until an event of `kind` for `path` arrives.
async fn expect_event(rx: &mut mpsc::UnboundedReceiver<FileEvent>, path: &Path, kind: EventKind) {
    let wanted = path.to_string_lossy().into_owned();
    let deadline = Instant::now() + WAIT;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match timeout(remaining, rx.recv()).await {
            Ok(Some(event)) if event.kind == kind && event.name == wanted => return,
            Ok(Some(_)) => continue,
            Ok(None) => panic!("event stream closed before {kind} {wanted}"),
            Err(_) => panic!("timed out waiting for {kind} {wanted}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_create_and_delete_reported() {
    let tmp = TempDir::new().unwrap();
    let endpoint = WatchEndpoint::create(tmp.path(), false).unwrap();
    let (service, mut rx) = forwarding();
    endpoint.attach(service).unwrap();
    endpoint.start().unwrap();

    let file = endpoint.root().join("report.csv");
    fs::write(&file, b"a,b,c\n").unwrap();
    expect_event(&mut rx, &file, EventKind::Create).await;

    fs::remove_file(&file).unwrap();
    expect_event(&mut rx, &file, EventKind::Delete).await;

    endpoint.stop().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_recursive_endpoint_sees_nested_files() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("nested")).unwrap();
    let config = WatchConfig::new(tmp.path(), true);
    let endpoint = WatchEndpoint::from_config(&config).unwrap();
    let (service, mut rx) = forwarding();
    endpoint.attach(service).unwrap();
    endpoint.start().unwrap();

    let file = endpoint.root().join("nested").join("deep.txt");
    fs::write(&file, b"deep").unwrap();
    expect_event(&mut rx, &file, EventKind::Create).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stopped_endpoint_delivers_nothing() {
    let tmp = TempDir::new().unwrap();
    let endpoint = WatchEndpoint::create(tmp.path(), false).unwrap();
    let (service, mut rx) = forwarding();
    endpoint.attach(service).unwrap();
    endpoint.start().unwrap();
    endpoint.stop().unwrap();

    fs::write(tmp.path().join("ignored.txt"), b"x").unwrap();
    sleep(Duration::from_millis(300)).await;

    // Registrations are gone, so the channel is closed with nothing queued
    assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_handler_failure_reaches_error_channel() {
    let tmp = TempDir::new().unwrap();
    let endpoint = WatchEndpoint::create(tmp.path(), false).unwrap();
    let errors = endpoint.errors();
    endpoint
        .attach(
            Service::builder("strict")
                .on_create(|event| async move { Err(anyhow::anyhow!("rejected {}", event.name)) })
                .build()
                .unwrap(),
        )
        .unwrap();
    endpoint.start().unwrap();

    let file = endpoint.root().join("bad.bin");
    fs::write(&file, b"\0").unwrap();

    let deadline = Instant::now() + WAIT;
    let report = loop {
        if let Ok(report) = errors.try_recv() {
            break report;
        }
        assert!(Instant::now() < deadline, "no dispatch error reported");
        sleep(Duration::from_millis(20)).await;
    };
    assert_eq!(report.service_name, "strict");
    assert_eq!(report.event.kind, EventKind::Create);
    assert!(report.error.to_string().starts_with("rejected"));
}
