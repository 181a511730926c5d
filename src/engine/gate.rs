// src/engine/gate.rs

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::watch::{ExcludeFilter, tree_fingerprint};

/// Remembers the artifact fingerprint of the active generation and tells
/// the runtime whether a reload signal points at different bytes.
///
/// Prime it before the initial load so the recorded fingerprint never
/// describes a newer build than the one actually loaded.
#[derive(Clone)]
pub struct FingerprintGate {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    exclude: ExcludeFilter,
    active: Option<String>,
}

impl fmt::Debug for FingerprintGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FingerprintGate")
            .field("root", &self.root)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// Outcome of [`FingerprintGate::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Same bytes as the active generation.
    Unchanged,
    /// Reload; pass the fingerprint to [`FingerprintGate::commit`] once the
    /// reload succeeded. `None` if it could not be computed.
    Changed(Option<String>),
}

impl FingerprintGate {
    pub fn new(fs: Arc<dyn FileSystem>, root: impl Into<PathBuf>, exclude: ExcludeFilter) -> Self {
        Self {
            fs,
            root: root.into(),
            exclude,
            active: None,
        }
    }

    /// Record the fingerprint of the artifacts about to be loaded.
    pub fn prime(&mut self) {
        self.active = self.compute();
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn check(&self) -> GateDecision {
        let current = self.compute();
        match (&current, &self.active) {
            (Some(now), Some(active)) if now == active => GateDecision::Unchanged,
            _ => GateDecision::Changed(current),
        }
    }

    pub fn commit(&mut self, fingerprint: Option<String>) {
        debug!(fingerprint = ?fingerprint, "recording active fingerprint");
        self.active = fingerprint;
    }

    // A tree that cannot be hashed (mid-rebuild, permissions) never blocks
    // a reload.
    fn compute(&self) -> Option<String> {
        match tree_fingerprint(self.fs.as_ref(), &self.root, &self.exclude) {
            Ok(hash) => Some(hash),
            Err(err) => {
                warn!(root = ?self.root, error = %err, "cannot fingerprint artifacts");
                None
            }
        }
    }
}
