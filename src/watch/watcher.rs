// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc::{self, UnboundedReceiver, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::fs::FileSystem;
use crate::types::ChangeKind;
use crate::watch::ChangeSource;
use crate::watch::event::{ChangeBatch, ChangeEvent, WatchSignal};
use crate::watch::patterns::ExcludeFilter;
use crate::watch::registry::{NotifyBackend, WatchBackend, WatchRegistry};

/// Watches a directory tree and hands out one [`ChangeBatch`] per poll.
///
/// The backend callback pushes [`WatchSignal`]s into a channel; [`poll`]
/// drains it without blocking, registers directories that were created in
/// the meantime and drops excluded paths.
///
/// [`poll`]: ChangeSource::poll
pub struct PathWatcher<B: WatchBackend = NotifyBackend> {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    backend: B,
    registry: WatchRegistry,
    exclude: ExcludeFilter,
    rx: UnboundedReceiver<WatchSignal>,
    disconnected: bool,
}

impl<B: WatchBackend> std::fmt::Debug for PathWatcher<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathWatcher")
            .field("root", &self.root)
            .field("registered", &self.registry.len())
            .field("exclude", &self.exclude)
            .finish_non_exhaustive()
    }
}

impl PathWatcher<NotifyBackend> {
    /// Start watching `root` with the platform's native backend.
    pub fn new(
        root: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        exclude: ExcludeFilter,
    ) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = NotifyBackend::new(tx)?;
        Self::with_backend(root, fs, exclude, backend, rx)
    }
}

impl<B: WatchBackend> PathWatcher<B> {
    /// Start watching `root` with an explicit backend. `rx` must receive
    /// whatever the backend reports.
    pub fn with_backend(
        root: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        exclude: ExcludeFilter,
        mut backend: B,
        rx: UnboundedReceiver<WatchSignal>,
    ) -> Result<Self> {
        let root = root.into();
        if !fs.is_dir(&root) {
            bail!("watch root {:?} is not a directory", root);
        }
        // Canonicalize once so event paths and the exclude filter agree.
        let root = fs
            .canonicalize(&root)
            .with_context(|| format!("resolving watch root {:?}", root))?;

        let mut registry = WatchRegistry::new();
        let failures = registry.register_tree(&mut backend, fs.as_ref(), &root);
        if !registry.contains(&root) {
            bail!(
                "cannot watch root {:?}: {}",
                root,
                failures
                    .first()
                    .map(|e| e.source.to_string())
                    .unwrap_or_else(|| "not registered".to_string())
            );
        }

        info!(root = ?root, dirs = registry.len(), "watching artifact directory");

        Ok(Self {
            root,
            fs,
            backend,
            registry,
            exclude,
            rx,
            disconnected: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn handle_change(&mut self, event: ChangeEvent, batch: &mut ChangeBatch) {
        match event.kind {
            // A new directory must be registered before anything inside it
            // can report; do it even for excluded paths so the registry
            // covers the whole tree.
            ChangeKind::Created if self.fs.is_dir(&event.path) => {
                self.registry
                    .register_tree(&mut self.backend, self.fs.as_ref(), &event.path);
            }
            ChangeKind::Removed if self.registry.contains(&event.path) => {
                let n = self.registry.forget(&mut self.backend, &event.path);
                debug!(dir = ?event.path, forgotten = n, "directory removed");
            }
            _ => {}
        }

        if self.exclude.is_excluded_path(&self.root, &event.path) {
            debug!(path = ?event.path, "ignoring excluded path");
            return;
        }

        debug!(kind = event.kind.label(), path = ?event.path, "change");
        batch.events.push(event);
    }
}

impl<B: WatchBackend> ChangeSource for PathWatcher<B> {
    fn poll(&mut self) -> ChangeBatch {
        let mut batch = ChangeBatch::empty();

        loop {
            match self.rx.try_recv() {
                Ok(WatchSignal::Change(event)) => self.handle_change(event, &mut batch),
                Ok(WatchSignal::Overflow) => {
                    debug!("watch backend overflow, rescanning");
                    batch.overflow = true;
                    // Directories created during the overflow window would
                    // otherwise never be registered.
                    let root = self.root.clone();
                    self.registry
                        .register_tree(&mut self.backend, self.fs.as_ref(), &root);
                }
                Ok(WatchSignal::Error(message)) => {
                    warn!(error = %message, "file watch error");
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        warn!("watch backend channel closed; no further changes will be seen");
                        self.disconnected = true;
                    }
                    break;
                }
            }
        }

        batch
    }
}
