// src/watch/registry.rs

//! Per-directory watch registration.
//!
//! Directories are registered one by one (non-recursive) instead of handing
//! the root to the backend recursively. This keeps track of exactly which
//! directories are covered and makes registration of newly created subtrees
//! an explicit step of the poll cycle.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::errors::WatchRegistrationError;
use crate::fs::{FileSystem, walk_dirs};
use crate::watch::event::{WatchSignal, signals_from_notify};

/// Something that can start and stop watching a single directory.
pub trait WatchBackend: Send {
    fn watch_dir(&mut self, dir: &Path) -> Result<()>;
    fn unwatch_dir(&mut self, dir: &Path) -> Result<()>;
}

/// Production backend on top of `notify::RecommendedWatcher`.
pub struct NotifyBackend {
    watcher: RecommendedWatcher,
}

impl std::fmt::Debug for NotifyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyBackend").finish_non_exhaustive()
    }
}

impl NotifyBackend {
    /// Create a watcher whose callback forwards into `tx`.
    ///
    /// The callback runs on notify's own thread; an unbounded channel keeps
    /// it from ever blocking on a slow poller.
    pub fn new(tx: UnboundedSender<WatchSignal>) -> Result<Self> {
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| {
                for signal in signals_from_notify(res) {
                    // Only fails once the watcher side is gone.
                    if tx.send(signal).is_err() {
                        break;
                    }
                }
            },
            Config::default(),
        )
        .context("creating filesystem watcher")?;
        Ok(Self { watcher })
    }
}

impl WatchBackend for NotifyBackend {
    fn watch_dir(&mut self, dir: &Path) -> Result<()> {
        self.watcher.watch(dir, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn unwatch_dir(&mut self, dir: &Path) -> Result<()> {
        self.watcher.unwatch(dir)?;
        Ok(())
    }
}

/// The set of directories currently registered with a backend.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    dirs: BTreeSet<PathBuf>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.dirs.contains(dir)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    /// Register `start` and every directory below it that is not registered
    /// yet.
    ///
    /// Directories that cannot be registered (typically because they were
    /// removed again before we got to them) are logged and skipped; the
    /// failures are returned for callers that want to inspect them.
    pub fn register_tree(
        &mut self,
        backend: &mut dyn WatchBackend,
        fs: &dyn FileSystem,
        start: &Path,
    ) -> Vec<WatchRegistrationError> {
        let dirs = match walk_dirs(fs, start) {
            Ok(dirs) => dirs,
            Err(source) => {
                let err = WatchRegistrationError {
                    path: start.to_path_buf(),
                    source,
                };
                warn!(error = %err, "skipping directory");
                return vec![err];
            }
        };

        let mut failures = Vec::new();
        for dir in dirs {
            if self.dirs.contains(&dir) {
                continue;
            }
            match backend.watch_dir(&dir) {
                Ok(()) => {
                    debug!(dir = ?dir, "watching directory");
                    self.dirs.insert(dir);
                }
                Err(source) => {
                    let err = WatchRegistrationError { path: dir, source };
                    warn!(error = %err, "skipping directory");
                    failures.push(err);
                }
            }
        }
        failures
    }

    /// Forget `dir` and everything registered below it.
    ///
    /// The backend usually dropped the watch on its own when the directory
    /// disappeared, so unwatch errors are only traced.
    pub fn forget(&mut self, backend: &mut dyn WatchBackend, dir: &Path) -> usize {
        let gone: Vec<PathBuf> = self
            .dirs
            .iter()
            .filter(|p| p.starts_with(dir))
            .cloned()
            .collect();
        for path in &gone {
            if let Err(err) = backend.unwatch_dir(path) {
                debug!(dir = ?path, error = %err, "unwatch failed");
            }
            self.dirs.remove(path);
        }
        gone.len()
    }
}
