// src/host/app_host.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use arc_swap::ArcSwapOption;
use tracing::{debug, info, warn};

use crate::errors::LoadError;
use crate::host::instance::AppInstance;
use crate::host::loader::{AppLoader, EntryPointId};
use crate::http::{Dispatch, Request};

/// Owns the single current application instance.
///
/// Requests read the slot concurrently; a reload publishes the new instance
/// with one atomic swap, so every reader sees either the old or the new
/// instance, never a mixture. The superseded instance gets its shutdown hook
/// right after the swap and is released once no request holds it any more.
pub struct AppHost {
    artifact_root: PathBuf,
    entry_point: EntryPointId,
    loader: Box<dyn AppLoader>,
    current: ArcSwapOption<AppInstance>,
    last_generation: AtomicU64,
    retired: Mutex<Vec<Arc<AppInstance>>>,
    /// Serialises loads so generation numbers stay in order.
    load_lock: Mutex<()>,
}

impl fmt::Debug for AppHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppHost")
            .field("artifact_root", &self.artifact_root)
            .field("entry_point", &self.entry_point.to_string())
            .field("generation", &self.current_generation())
            .field("retired", &self.retired_count())
            .finish_non_exhaustive()
    }
}

impl AppHost {
    /// Create a host with an empty slot. Nothing is loaded yet.
    pub fn new(
        artifact_root: impl Into<PathBuf>,
        entry_point: EntryPointId,
        loader: impl AppLoader + 'static,
    ) -> Self {
        Self {
            artifact_root: artifact_root.into(),
            entry_point,
            loader: Box::new(loader),
            current: ArcSwapOption::empty(),
            last_generation: AtomicU64::new(0),
            retired: Mutex::new(Vec::new()),
            load_lock: Mutex::new(()),
        }
    }

    /// Create a host and perform the initial load.
    ///
    /// A failure here means there is nothing to serve; callers treat it as
    /// fatal.
    pub fn start(
        artifact_root: impl Into<PathBuf>,
        entry_point: EntryPointId,
        loader: impl AppLoader + 'static,
    ) -> Result<Arc<Self>, LoadError> {
        let host = Self::new(artifact_root, entry_point, loader);
        let generation = host.load_next()?;
        info!(
            generation,
            entry_point = %host.entry_point,
            root = ?host.artifact_root,
            "application started"
        );
        Ok(Arc::new(host))
    }

    /// Load a fresh instance and make it current.
    ///
    /// On failure the current instance keeps serving; the error is logged
    /// and returned for the caller's information.
    pub fn reload_once(&self) -> Result<u64, LoadError> {
        match self.load_next() {
            Ok(generation) => {
                info!(generation, "reloaded application");
                Ok(generation)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    current = ?self.current_generation(),
                    "reload failed"
                );
                Err(err)
            }
        }
    }

    fn load_next(&self) -> Result<u64, LoadError> {
        let _guard = lock(&self.load_lock);
        let generation = self.last_generation.load(Ordering::Acquire) + 1;
        debug!(generation, entry_point = %self.entry_point, "loading application");
        let instance = self
            .loader
            .load(&self.artifact_root, &self.entry_point, generation)?;
        self.last_generation.store(generation, Ordering::Release);
        Ok(self.activate(instance))
    }

    /// Publish `instance` and retire whatever was current before.
    pub fn activate(&self, instance: AppInstance) -> u64 {
        let generation = instance.generation();
        let previous = self.current.swap(Some(Arc::new(instance)));
        if let Some(previous) = previous {
            self.retire(previous);
        }
        generation
    }

    fn retire(&self, instance: Arc<AppInstance>) {
        let generation = instance.generation();
        if let Err(err) = instance.invoke_shutdown_hook() {
            warn!(error = %err, "shutdown hook failed");
        }
        match Arc::try_unwrap(instance) {
            Ok(instance) => release(instance),
            Err(shared) => {
                debug!(generation, "retired instance still in use; parking");
                lock(&self.retired).push(shared);
            }
        }
    }

    /// Release retired instances that no request holds any more. Returns the
    /// number released.
    pub fn reap_retired(&self) -> usize {
        let parked = std::mem::take(&mut *lock(&self.retired));
        let mut still_used = Vec::new();
        let mut released = 0;
        for instance in parked {
            match Arc::try_unwrap(instance) {
                Ok(instance) => {
                    release(instance);
                    released += 1;
                }
                Err(shared) => still_used.push(shared),
            }
        }
        if !still_used.is_empty() {
            lock(&self.retired).extend(still_used);
        }
        released
    }

    /// Number of superseded instances waiting for readers to let go.
    pub fn retired_count(&self) -> usize {
        lock(&self.retired).len()
    }

    pub fn current(&self) -> Option<Arc<AppInstance>> {
        self.current.load_full()
    }

    pub fn current_generation(&self) -> Option<u64> {
        self.current.load_full().map(|i| i.generation())
    }

    pub fn artifact_root(&self) -> &Path {
        &self.artifact_root
    }

    pub fn entry_point(&self) -> &EntryPointId {
        &self.entry_point
    }
}

impl Dispatch for AppHost {
    fn dispatch(&self, request: &Request) -> Option<String> {
        // Hold a strong reference for the whole request so the instance
        // cannot be released underneath it.
        let instance = self.current.load_full()?;
        instance.handle(request)
    }
}

impl Drop for AppHost {
    fn drop(&mut self) {
        // Dropping the instances releases them (see `AppInstance::drop`).
        let current = self.current.swap(None);
        let retired = std::mem::take(&mut *lock(&self.retired));
        debug!(
            current = ?current.as_ref().map(|i| i.generation()),
            retired = retired.len(),
            "host dropped; releasing instances"
        );
    }
}

fn release(instance: AppInstance) {
    let generation = instance.generation();
    match instance.release() {
        Ok(()) => info!(generation, "released generation"),
        Err(err) => warn!(error = %err, "release failed"),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
