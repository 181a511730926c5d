// src/engine/debounce.rs

//! Pure debounce state machine.
//!
//! One call to [`Debouncer::observe`] per poll cycle. A burst of changing
//! cycles followed by a single quiet cycle yields exactly one
//! [`ReloadSignal`]. There is no clock in here; the cycle period is owned by
//! the runtime.

use crate::watch::ChangeBatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebounceState {
    #[default]
    Quiet,
    /// Changes were seen in the last `cycles` consecutive polls.
    Changing { cycles: u32 },
}

/// Fired on the quiet cycle that ends a burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadSignal {
    /// Number of consecutive changing cycles in the burst.
    pub burst_cycles: u32,
}

#[derive(Debug, Default)]
pub struct Debouncer {
    state: DebounceState,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Feed the outcome of one poll cycle.
    pub fn observe(&mut self, changed: bool) -> Option<ReloadSignal> {
        match (self.state, changed) {
            (DebounceState::Quiet, false) => None,
            (DebounceState::Quiet, true) => {
                self.state = DebounceState::Changing { cycles: 1 };
                None
            }
            (DebounceState::Changing { cycles }, true) => {
                self.state = DebounceState::Changing {
                    cycles: cycles.saturating_add(1),
                };
                None
            }
            (DebounceState::Changing { cycles }, false) => {
                self.state = DebounceState::Quiet;
                Some(ReloadSignal {
                    burst_cycles: cycles,
                })
            }
        }
    }

    pub fn observe_batch(&mut self, batch: &ChangeBatch) -> Option<ReloadSignal> {
        self.observe(batch.has_changes())
    }
}
