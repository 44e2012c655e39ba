#![cfg(unix)]

use std::fs;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tempfile::tempdir;
use zolapad_preview::{PreviewConfig, PreviewManager, StartOutcome, SystemBackend};
use zolapad_project::WorkspaceRoot;
use zolapad_runexec::OutputMode;

#[test]
fn saving_the_watched_document_rewrites_the_page() {
    let site = tempdir().unwrap();
    let post_dir = site.path().join("content").join("2021-11-09");
    fs::create_dir_all(&post_dir).unwrap();
    let document = post_dir.join("index.md");
    fs::write(&document, "+++\ntitle=\"draft\"\n+++\n").unwrap();
    let surface_dir = tempdir().unwrap();
    let surface_path = surface_dir.path().join("preview.html");

    let (tx, rx) = mpsc::channel();
    let backend = SystemBackend::new(tx)
        .with_surface_path(&surface_path)
        .with_poll_interval(Duration::from_millis(50))
        .with_output(OutputMode::Discard);
    let config = PreviewConfig {
        serve_command: "sleep 30".into(),
        ..PreviewConfig::default()
    };
    let mut manager =
        PreviewManager::new(backend, config, vec![WorkspaceRoot::new(site.path())]);

    let outcome = manager.start(Some(&document)).unwrap();
    assert_eq!(
        outcome,
        StartOutcome::Started {
            url: "http://localhost:1111/2021-11-09".into()
        }
    );
    let first = fs::read_to_string(&surface_path).unwrap();
    assert!(first.contains("http://localhost:1111/2021-11-09"));

    thread::sleep(Duration::from_millis(200));
    fs::write(&document, "+++\ntitle=\"final\"\n+++\nbody text").unwrap();
    let event = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("expected a watch event");
    assert!(manager.on_watch_event(&event).unwrap());

    let second = fs::read_to_string(&surface_path).unwrap();
    assert!(second.contains("http://localhost:1111/2021-11-09"));
    assert_ne!(first, second);

    manager.shutdown();
}
