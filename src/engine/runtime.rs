// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::errors::{HotserveError, Result};
use crate::host::AppHost;
use crate::watch::ChangeSource;

use super::debounce::{Debouncer, ReloadSignal};
use super::gate::{FingerprintGate, GateDecision};
use super::RuntimeOptions;

/// Counters reported when the runtime stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub cycles: u64,
    pub reloads: u64,
    pub failed_reloads: u64,
    pub skipped_unchanged: u64,
}

/// Handle to the background reload task.
pub struct ReloadRuntimeHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<RuntimeStats>,
}

impl fmt::Debug for ReloadRuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadRuntimeHandle")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

impl ReloadRuntimeHandle {
    /// Ask the loop to stop and wait for it.
    ///
    /// The request is seen between cycles; a cycle that is already running
    /// (including its reload) finishes first.
    pub async fn stop(mut self) -> Result<RuntimeStats> {
        if let Some(tx) = self.stop_tx.take() {
            // The loop may already be gone; joining reports why.
            let _ = tx.send(());
        }
        self.task
            .await
            .map_err(|e| HotserveError::Other(anyhow::anyhow!("reload runtime task failed: {e}")))
    }
}

/// Spawn the poll → debounce → reload loop on the current tokio runtime.
///
/// The first cycle runs after `settle_delay`, then one cycle every
/// `poll_interval`. A slow cycle delays the following ones instead of
/// bunching them up. Reloads run inline, so two reloads never overlap.
pub fn spawn_reload_runtime<S>(
    source: S,
    host: Arc<AppHost>,
    options: RuntimeOptions,
) -> ReloadRuntimeHandle
where
    S: ChangeSource + 'static,
{
    let (stop_tx, stop_rx) = oneshot::channel();
    let reload_loop = ReloadLoop {
        source,
        host,
        debouncer: Debouncer::new(),
        gate: options.gate,
        stats: RuntimeStats::default(),
    };
    let task = tokio::spawn(reload_loop.run(options.poll_interval, options.settle_delay, stop_rx));
    ReloadRuntimeHandle {
        stop_tx: Some(stop_tx),
        task,
    }
}

struct ReloadLoop<S> {
    source: S,
    host: Arc<AppHost>,
    debouncer: Debouncer,
    gate: Option<FingerprintGate>,
    stats: RuntimeStats,
}

impl<S: ChangeSource> ReloadLoop<S> {
    async fn run(
        mut self,
        poll_interval: time::Duration,
        settle_delay: time::Duration,
        mut stop_rx: oneshot::Receiver<()>,
    ) -> RuntimeStats {
        info!(
            poll_interval_ms = poll_interval.as_millis() as u64,
            settle_delay_ms = settle_delay.as_millis() as u64,
            "reload runtime started"
        );

        let mut ticker = time::interval_at(Instant::now() + settle_delay, poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => {
                    debug!("stop requested");
                    break;
                }
                _ = ticker.tick() => self.cycle().await,
            }
        }

        // Anything still parked may be releasable now.
        reap(Arc::clone(&self.host)).await;
        info!(
            cycles = self.stats.cycles,
            reloads = self.stats.reloads,
            failed = self.stats.failed_reloads,
            "reload runtime stopped"
        );
        self.stats
    }

    async fn cycle(&mut self) {
        self.stats.cycles += 1;
        let batch = self.source.poll();
        reap(Arc::clone(&self.host)).await;

        if batch.has_changes() {
            debug!(
                events = batch.events.len(),
                overflow = batch.overflow,
                "changes observed"
            );
        }

        if let Some(signal) = self.debouncer.observe_batch(&batch) {
            self.on_signal(signal).await;
        }
    }

    // Hashing, copying and opening libraries block, so they run on the
    // blocking pool. Each step is awaited before the next cycle starts.
    async fn on_signal(&mut self, signal: ReloadSignal) {
        let fingerprint = match check_gate(self.gate.clone()).await {
            Some(GateDecision::Unchanged) => {
                info!(
                    burst_cycles = signal.burst_cycles,
                    "artifacts unchanged; skipping reload"
                );
                self.stats.skipped_unchanged += 1;
                return;
            }
            Some(GateDecision::Changed(fp)) => fp,
            None => None,
        };

        info!(burst_cycles = signal.burst_cycles, "changes settled; reloading");
        let host = Arc::clone(&self.host);
        let outcome = task::spawn_blocking(move || host.reload_once()).await;
        match outcome {
            Ok(Ok(generation)) => {
                self.stats.reloads += 1;
                debug!(generation, "reload cycle complete");
                if let Some(gate) = self.gate.as_mut() {
                    gate.commit(fingerprint);
                }
            }
            Ok(Err(err)) => {
                self.stats.failed_reloads += 1;
                warn!(error = %err, "still serving previous generation");
            }
            Err(err) => {
                self.stats.failed_reloads += 1;
                warn!(error = %err, "reload task panicked; still serving previous generation");
            }
        }
    }
}

/// `None` when no gate is configured.
async fn check_gate(gate: Option<FingerprintGate>) -> Option<GateDecision> {
    let gate = gate?;
    match task::spawn_blocking(move || gate.check()).await {
        Ok(decision) => Some(decision),
        Err(err) => {
            warn!(error = %err, "fingerprint task failed; reloading anyway");
            Some(GateDecision::Changed(None))
        }
    }
}

async fn reap(host: Arc<AppHost>) {
    if let Err(err) = task::spawn_blocking(move || host.reap_retired()).await {
        warn!(error = %err, "releasing retired instances failed");
    }
}
