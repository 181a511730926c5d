use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use hotserve::errors::LoadError;
use hotserve::host::{AppHost, AppInstance, AppLoader, EntryPointId, LoadBoundary};
use hotserve::http::{GetHandlers, PostHandlers, RequestHandlers};

/// Something that happened to a fake instance, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    Loaded(u64),
    /// Shutdown hook of `generation` ran while `current` was published.
    HookInvoked { generation: u64, current: Option<u64> },
    HandlersDropped(u64),
    BoundaryReleased(u64),
}

/// Shared, append-only log of lifecycle events.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<JournalEntry>>>);

impl Journal {
    fn push(&self, entry: JournalEntry) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.0.lock().unwrap().clone()
    }

    pub fn hooks_for(&self, generation: u64) -> Vec<JournalEntry> {
        self.entries()
            .into_iter()
            .filter(|e| matches!(e, JournalEntry::HookInvoked { generation: g, .. } if *g == generation))
            .collect()
    }

    pub fn releases_for(&self, generation: u64) -> usize {
        self.entries()
            .iter()
            .filter(|e| **e == JournalEntry::BoundaryReleased(generation))
            .count()
    }

    pub fn position(&self, entry: &JournalEntry) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}

/// How the next `load` call should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeFailure {
    MissingEntryPoint,
    ConstructorPanics,
}

#[derive(Default)]
struct FakeLoaderState {
    journal: Journal,
    failures: Mutex<VecDeque<FakeFailure>>,
    hook_fails: AtomicBool,
    release_fails: AtomicBool,
    host: Mutex<Option<Weak<AppHost>>>,
    load_calls: AtomicU64,
}

/// In-memory `AppLoader` producing instances that record their lifecycle.
///
/// Routes of every fake instance:
/// - `GET /`      -> `"generation <n>"`
/// - `GET /hello` -> `"Hello world!\n"`
/// - `POST /`     -> `"Got body: <body>"`
#[derive(Clone, Default)]
pub struct FakeLoader {
    state: Arc<FakeLoaderState>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> Journal {
        self.state.journal.clone()
    }

    /// Queue a failure for the next load that has not been planned yet.
    pub fn fail_next(&self, failure: FakeFailure) {
        self.state.failures.lock().unwrap().push_back(failure);
    }

    pub fn set_hook_fails(&self, fails: bool) {
        self.state.hook_fails.store(fails, Ordering::SeqCst);
    }

    pub fn set_release_fails(&self, fails: bool) {
        self.state.release_fails.store(fails, Ordering::SeqCst);
    }

    /// Let shutdown hooks record which generation `host` had published.
    pub fn observe(&self, host: &Arc<AppHost>) {
        *self.state.host.lock().unwrap() = Some(Arc::downgrade(host));
    }

    pub fn load_calls(&self) -> u64 {
        self.state.load_calls.load(Ordering::SeqCst)
    }
}

impl AppLoader for FakeLoader {
    fn load(
        &self,
        _artifact_root: &Path,
        entry_point: &EntryPointId,
        generation: u64,
    ) -> Result<AppInstance, LoadError> {
        self.state.load_calls.fetch_add(1, Ordering::SeqCst);
        match self.state.failures.lock().unwrap().pop_front() {
            Some(FakeFailure::MissingEntryPoint) => {
                return Err(LoadError::EntryPointNotFound(entry_point.to_string()));
            }
            Some(FakeFailure::ConstructorPanics) => {
                return Err(LoadError::ConstructionError {
                    entry: entry_point.to_string(),
                    cause: "constructor panicked".to_string(),
                });
            }
            None => {}
        }

        self.state.journal.push(JournalEntry::Loaded(generation));
        let app = FakeApp::new(generation, Arc::clone(&self.state));
        let boundary = FakeBoundary {
            generation,
            state: Arc::clone(&self.state),
        };
        Ok(AppInstance::new(generation, Box::new(app), Box::new(boundary)))
    }
}

struct FakeApp {
    generation: u64,
    state: Arc<FakeLoaderState>,
    get: GetHandlers,
    post: PostHandlers,
}

impl FakeApp {
    fn new(generation: u64, state: Arc<FakeLoaderState>) -> Self {
        let mut get: GetHandlers = GetHandlers::new();
        get.insert(
            "/".to_string(),
            Box::new(move || Some(format!("generation {generation}"))),
        );
        get.insert("/hello".to_string(), Box::new(|| Some("Hello world!\n".to_string())));

        let mut post: PostHandlers = PostHandlers::new();
        post.insert(
            "/".to_string(),
            Box::new(|body: String| Some(format!("Got body: {body}"))),
        );

        Self {
            generation,
            state,
            get,
            post,
        }
    }
}

impl RequestHandlers for FakeApp {
    fn get_handlers(&self) -> &GetHandlers {
        &self.get
    }

    fn post_handlers(&self) -> &PostHandlers {
        &self.post
    }

    fn shutdown(&self) -> anyhow::Result<()> {
        // Clone the weak handle first so the lock is not held while the
        // host might be dropped.
        let host = self.state.host.lock().unwrap().clone();
        let current = host
            .and_then(|weak| weak.upgrade())
            .and_then(|host| host.current_generation());
        self.state.journal.push(JournalEntry::HookInvoked {
            generation: self.generation,
            current,
        });
        if self.state.hook_fails.load(Ordering::SeqCst) {
            anyhow::bail!("hook of generation {} failed", self.generation);
        }
        Ok(())
    }
}

impl Drop for FakeApp {
    fn drop(&mut self) {
        self.state
            .journal
            .push(JournalEntry::HandlersDropped(self.generation));
    }
}

struct FakeBoundary {
    generation: u64,
    state: Arc<FakeLoaderState>,
}

impl LoadBoundary for FakeBoundary {
    fn describe(&self) -> String {
        format!("fake boundary #{}", self.generation)
    }

    fn release(self: Box<Self>) -> anyhow::Result<()> {
        self.state
            .journal
            .push(JournalEntry::BoundaryReleased(self.generation));
        if self.state.release_fails.load(Ordering::SeqCst) {
            anyhow::bail!("boundary of generation {} refused to unload", self.generation);
        }
        Ok(())
    }
}
