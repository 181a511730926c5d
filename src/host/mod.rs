// src/host/mod.rs

//! Loading, activating and disposing application instances.
//!
//! - [`loader`] defines the [`AppLoader`] seam and the entry point id.
//! - [`dylib`] is the production loader: one shadow copy of the compiled
//!   library per generation, opened with `libloading`.
//! - [`instance`] owns one generation's handlers and its loading boundary.
//! - [`app_host`] keeps the single current instance behind an atomically
//!   swappable slot and retires superseded ones.

pub mod app_host;
pub mod dylib;
pub mod instance;
pub mod loader;

pub use app_host::AppHost;
pub use dylib::{DylibLoader, EntryPointFn};
pub use instance::{AppInstance, LoadBoundary};
pub use loader::{AppLoader, EntryPointId};
