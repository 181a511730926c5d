use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hotserve::types::ChangeKind;
use hotserve::watch::{ChangeBatch, ChangeEvent, ChangeSource};

/// A `ChangeSource` that replays a fixed script, one batch per poll, and
/// reports "no changes" once the script is exhausted.
#[derive(Debug)]
pub struct ScriptedChangeSource {
    script: VecDeque<ChangeBatch>,
    polls: Arc<AtomicUsize>,
}

impl ScriptedChangeSource {
    pub fn new(script: impl IntoIterator<Item = ChangeBatch>) -> Self {
        Self {
            script: script.into_iter().collect(),
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// `true` = one modified file in that cycle, `false` = a quiet cycle.
    pub fn from_pattern(pattern: &[bool]) -> Self {
        Self::new(pattern.iter().map(|changed| {
            if *changed {
                ChangeBatch {
                    events: vec![ChangeEvent::new(ChangeKind::Modified, "out/libapp.so")],
                    overflow: false,
                }
            } else {
                ChangeBatch::empty()
            }
        }))
    }

    /// Counter of `poll` calls that stays readable after the source moved
    /// into the runtime.
    pub fn polls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.polls)
    }
}

impl ChangeSource for ScriptedChangeSource {
    fn poll(&mut self) -> ChangeBatch {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.script.pop_front().unwrap_or_default()
    }
}
