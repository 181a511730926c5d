// tests/watcher_registration.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use tokio::sync::mpsc::{self, UnboundedSender};

use hotserve::fs::RealFileSystem;
use hotserve::fs::mock::MockFileSystem;
use hotserve::types::ChangeKind;
use hotserve::watch::{
    ChangeEvent, ChangeSource, ExcludeFilter, PathWatcher, WatchBackend, WatchSignal,
};

/// Backend that remembers what is watched and can refuse chosen dirs.
#[derive(Debug, Clone, Default)]
struct RecordingBackend {
    watched: Arc<Mutex<BTreeSet<PathBuf>>>,
    refuse: Arc<Mutex<BTreeSet<PathBuf>>>,
}

impl RecordingBackend {
    fn watched(&self) -> Vec<PathBuf> {
        self.watched.lock().unwrap().iter().cloned().collect()
    }

    fn refuse(&self, dir: &str) {
        self.refuse.lock().unwrap().insert(PathBuf::from(dir));
    }
}

impl WatchBackend for RecordingBackend {
    fn watch_dir(&mut self, dir: &Path) -> anyhow::Result<()> {
        if self.refuse.lock().unwrap().contains(dir) {
            bail!("refusing {:?}", dir);
        }
        self.watched.lock().unwrap().insert(dir.to_path_buf());
        Ok(())
    }

    fn unwatch_dir(&mut self, dir: &Path) -> anyhow::Result<()> {
        self.watched.lock().unwrap().remove(dir);
        Ok(())
    }
}

struct Fixture {
    fs: MockFileSystem,
    backend: RecordingBackend,
    tx: UnboundedSender<WatchSignal>,
    watcher: PathWatcher<RecordingBackend>,
}

fn fixture(exclude: &[&str], prepare: impl FnOnce(&MockFileSystem, &RecordingBackend)) -> Fixture {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("app/libapp.so", "v1");
    fs.add_dir("app/assets/img");
    fs.add_dir("app/tmp");

    let backend = RecordingBackend::default();
    prepare(&fs, &backend);

    let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
    let (tx, rx) = mpsc::unbounded_channel();
    let watcher = PathWatcher::with_backend(
        "app",
        Arc::new(fs.clone()),
        ExcludeFilter::new(&exclude).unwrap(),
        backend.clone(),
        rx,
    )
    .unwrap();

    Fixture {
        fs,
        backend,
        tx,
        watcher,
    }
}

fn change(kind: ChangeKind, path: &str) -> WatchSignal {
    WatchSignal::Change(ChangeEvent::new(kind, path))
}

fn paths(list: &[&str]) -> Vec<PathBuf> {
    list.iter().map(PathBuf::from).collect()
}

#[test]
fn every_directory_is_registered_at_startup() {
    let f = fixture(&[], |_, _| {});
    assert_eq!(
        f.backend.watched(),
        paths(&["app", "app/assets", "app/assets/img", "app/tmp"])
    );
    assert_eq!(f.watcher.registry().len(), 4);
}

#[test]
fn created_subtree_is_registered_on_poll() {
    let mut f = fixture(&[], |_, _| {});
    f.fs.add_dir("app/plugins/extra");
    f.fs.add_file("app/plugins/extra/libplugin.so", "p");
    f.tx.send(change(ChangeKind::Created, "app/plugins")).unwrap();

    let batch = f.watcher.poll();
    assert_eq!(
        batch.events,
        vec![ChangeEvent::new(ChangeKind::Created, "app/plugins")]
    );
    assert!(f.watcher.registry().contains(Path::new("app/plugins")));
    assert!(f.watcher.registry().contains(Path::new("app/plugins/extra")));
    assert!(f.backend.watched().contains(&PathBuf::from("app/plugins/extra")));
}

#[test]
fn removed_directory_is_forgotten_with_its_children() {
    let mut f = fixture(&[], |_, _| {});
    f.fs.remove("app/assets");
    f.tx.send(change(ChangeKind::Removed, "app/assets")).unwrap();

    let batch = f.watcher.poll();
    assert!(batch.has_changes());
    assert_eq!(f.backend.watched(), paths(&["app", "app/tmp"]));
    assert!(!f.watcher.registry().contains(Path::new("app/assets/img")));
}

#[test]
fn unregistrable_directory_is_skipped() {
    let f = fixture(&[], |_, backend| backend.refuse("app/assets"));
    // The refused dir is skipped; its children are still tried.
    assert_eq!(
        f.backend.watched(),
        paths(&["app", "app/assets/img", "app/tmp"])
    );
    assert!(!f.watcher.registry().contains(Path::new("app/assets")));
}

#[test]
fn unregistrable_root_is_an_error() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_dir("app");
    let backend = RecordingBackend::default();
    backend.refuse("app");
    let (_tx, rx) = mpsc::unbounded_channel();

    let result = PathWatcher::with_backend("app", Arc::new(fs), ExcludeFilter::none(), backend, rx);
    assert!(result.is_err());
}

#[test]
fn missing_root_is_an_error() {
    init_tracing();
    let (_tx, rx) = mpsc::unbounded_channel();
    let result = PathWatcher::with_backend(
        "nowhere",
        Arc::new(MockFileSystem::new()),
        ExcludeFilter::none(),
        RecordingBackend::default(),
        rx,
    );
    assert!(result.is_err());
}

#[test]
fn excluded_paths_do_not_count_as_changes() {
    let mut f = fixture(&["tmp/**", "*.log"], |_, _| {});
    f.tx.send(change(ChangeKind::Modified, "app/tmp/scratch")).unwrap();
    f.tx.send(change(ChangeKind::Modified, "app/build.log")).unwrap();
    assert!(!f.watcher.poll().has_changes());

    f.tx.send(change(ChangeKind::Modified, "app/libapp.so")).unwrap();
    let batch = f.watcher.poll();
    assert_eq!(
        batch.events,
        vec![ChangeEvent::new(ChangeKind::Modified, "app/libapp.so")]
    );
}

#[test]
fn excluded_directories_are_still_registered() {
    let mut f = fixture(&["tmp/**"], |_, _| {});
    f.fs.add_dir("app/tmp/cache");
    f.tx.send(change(ChangeKind::Created, "app/tmp/cache")).unwrap();

    assert!(!f.watcher.poll().has_changes());
    assert!(f.watcher.registry().contains(Path::new("app/tmp/cache")));
}

#[test]
fn overflow_marks_the_batch_and_rescans() {
    let mut f = fixture(&[], |_, _| {});
    // Created while the backend was not reporting individual events.
    f.fs.add_dir("app/late");
    f.tx.send(WatchSignal::Overflow).unwrap();

    let batch = f.watcher.poll();
    assert!(batch.overflow);
    assert!(batch.events.is_empty());
    assert!(batch.has_changes());
    assert!(f.watcher.registry().contains(Path::new("app/late")));
}

#[test]
fn backend_errors_and_closed_channel_do_not_panic() {
    let mut f = fixture(&[], |_, _| {});
    f.tx.send(WatchSignal::Error("queue full".to_string())).unwrap();
    assert!(!f.watcher.poll().has_changes());

    drop(f.tx);
    assert!(!f.watcher.poll().has_changes());
    assert!(!f.watcher.poll().has_changes());
}

#[tokio::test]
async fn native_backend_sees_files_in_new_directories() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut watcher =
        PathWatcher::new(dir.path(), Arc::new(RealFileSystem), ExcludeFilter::none()).unwrap();
    let root = watcher.root().to_path_buf();

    let nested = root.join("nested");
    std::fs::create_dir(&nested).unwrap();

    with_timeout(async {
        while !watcher.registry().contains(&nested) {
            watcher.poll();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;

    let artifact = nested.join("libapp.so");
    std::fs::write(&artifact, b"build").unwrap();

    with_timeout(async {
        loop {
            let batch = watcher.poll();
            if batch.events.iter().any(|e| e.path == artifact) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;
}
