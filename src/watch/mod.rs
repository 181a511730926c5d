// src/watch/mod.rs

//! Directory watching and change detection.
//!
//! This module is responsible for:
//! - Registering every directory below the artifact root with a
//!   cross-platform watcher (`notify`), including directories created later.
//! - Turning raw notifications into one [`ChangeBatch`] per poll.
//! - Dropping changes on paths matched by `[watch].exclude`.
//! - Fingerprinting the artifact tree so unchanged rebuilds can be skipped.
//!
//! It does **not** know about debouncing or reloading; the engine only sees
//! the [`ChangeSource`] trait.

pub mod event;
pub mod fingerprint;
pub mod path_utils;
pub mod patterns;
pub mod registry;
pub mod watcher;

pub use event::{ChangeBatch, ChangeEvent, WatchSignal};
pub use fingerprint::{compute_file_hash, tree_fingerprint};
pub use patterns::ExcludeFilter;
pub use registry::{NotifyBackend, WatchBackend, WatchRegistry};
pub use watcher::PathWatcher;

/// Something the reload runtime can poll once per cycle.
pub trait ChangeSource: Send {
    /// Return everything observed since the previous call. Never blocks.
    fn poll(&mut self) -> ChangeBatch;
}
