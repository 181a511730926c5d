// src/host/instance.rs

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::errors::ReleaseError;
use crate::http::{Request, RequestHandlers};

/// The isolation scope an instance's code was loaded in.
///
/// Releasing it unloads that code, so it must only happen once nothing
/// created from it (handlers, closures, strings with its vtables) is alive.
pub trait LoadBoundary: Send + Sync {
    /// Short human readable description for logs.
    fn describe(&self) -> String;

    fn release(self: Box<Self>) -> anyhow::Result<()>;
}

/// One loaded generation of the application.
///
/// Lifecycle: created by a loader, published by the host, retired when a
/// successor is published and finally released. Release runs the shutdown
/// hook (at most once), drops the handlers and then releases the boundary,
/// in that order.
pub struct AppInstance {
    generation: u64,
    handlers: Option<Box<dyn RequestHandlers>>,
    boundary: Option<Box<dyn LoadBoundary>>,
    hook_invoked: AtomicBool,
}

impl fmt::Debug for AppInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppInstance")
            .field("generation", &self.generation)
            .field("boundary", &self.boundary.as_ref().map(|b| b.describe()))
            .field("hook_invoked", &self.hook_invoked())
            .finish()
    }
}

impl AppInstance {
    pub fn new(
        generation: u64,
        handlers: Box<dyn RequestHandlers>,
        boundary: Box<dyn LoadBoundary>,
    ) -> Self {
        Self {
            generation,
            handlers: Some(handlers),
            boundary: Some(boundary),
            hook_invoked: AtomicBool::new(false),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn hook_invoked(&self) -> bool {
        self.hook_invoked.load(Ordering::Acquire)
    }

    /// Route `request` through this generation's handlers.
    pub fn handle(&self, request: &Request) -> Option<String> {
        self.handlers.as_ref().and_then(|h| h.handle(request))
    }

    /// Run the application's shutdown hook unless it already ran.
    ///
    /// Panics inside the hook are reported as errors.
    pub fn invoke_shutdown_hook(&self) -> Result<(), ReleaseError> {
        if self.hook_invoked.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let Some(handlers) = self.handlers.as_ref() else {
            return Ok(());
        };
        debug!(generation = self.generation, "invoking shutdown hook");

        let outcome = catch_unwind(AssertUnwindSafe(|| handlers.shutdown()))
            .unwrap_or_else(|payload| Err(anyhow::anyhow!(panic_message(payload.as_ref()))));
        outcome.map_err(|source| ReleaseError::ShutdownHook {
            generation: self.generation,
            source,
        })
    }

    /// Dispose of this instance.
    ///
    /// The first error is returned; a later one is only logged.
    pub fn release(mut self) -> Result<(), ReleaseError> {
        self.release_parts()
    }

    fn release_parts(&mut self) -> Result<(), ReleaseError> {
        let hook = self.invoke_shutdown_hook();

        // The handlers' code lives inside the boundary.
        drop(self.handlers.take());

        let boundary = match self.boundary.take() {
            Some(boundary) => {
                let what = boundary.describe();
                match boundary.release() {
                    Ok(()) => {
                        debug!(generation = self.generation, boundary = %what, "boundary released");
                        Ok(())
                    }
                    Err(source) => Err(ReleaseError::Boundary {
                        generation: self.generation,
                        source,
                    }),
                }
            }
            None => Ok(()),
        };

        match (hook, boundary) {
            (Err(hook_err), Err(boundary_err)) => {
                warn!(error = %boundary_err, "release failed");
                Err(hook_err)
            }
            (Err(err), Ok(())) | (Ok(()), Err(err)) => Err(err),
            (Ok(()), Ok(())) => Ok(()),
        }
    }
}

impl Drop for AppInstance {
    fn drop(&mut self) {
        if self.handlers.is_none() && self.boundary.is_none() {
            return;
        }
        if let Err(err) = self.release_parts() {
            warn!(error = %err, "release failed");
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
