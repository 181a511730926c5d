// src/engine/mod.rs

//! Reload engine for hotserve.
//!
//! This module ties together:
//! - the debounce state machine that turns per-cycle change batches into a
//!   single reload signal
//! - the optional fingerprint gate that skips reloads of unchanged artifacts
//! - the background runtime that polls, debounces and reloads on a
//!   fixed-rate timer
//!
//! The pure state machine lives in [`debounce`]; the async shell is
//! implemented in [`runtime`].

use std::time::Duration;

pub mod debounce;
pub mod gate;
pub mod runtime;

pub use debounce::{DebounceState, Debouncer, ReloadSignal};
pub use gate::{FingerprintGate, GateDecision};
pub use runtime::{ReloadRuntimeHandle, RuntimeStats, spawn_reload_runtime};

/// Default period between two poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Default delay before the first poll cycle.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(2000);

/// Options for the background reload runtime.
#[derive(Debug)]
pub struct RuntimeOptions {
    /// Fixed-rate period between cycles.
    pub poll_interval: Duration,
    /// Delay before the first cycle.
    pub settle_delay: Duration,
    /// When set, reloads of byte-identical artifacts are skipped. The gate
    /// is used as handed over; prime it before the initial load.
    pub gate: Option<FingerprintGate>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            gate: None,
        }
    }
}
