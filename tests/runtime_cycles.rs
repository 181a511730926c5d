// tests/runtime_cycles.rs

mod common;
use crate::common::fake_loader::{FakeFailure, FakeLoader, JournalEntry};
use crate::common::init_tracing;
use crate::common::scripted_source::ScriptedChangeSource;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use hotserve::engine::{FingerprintGate, RuntimeOptions, spawn_reload_runtime};
use hotserve::fs::mock::MockFileSystem;
use hotserve::host::AppHost;
use hotserve::watch::ExcludeFilter;

const PERIOD: Duration = Duration::from_millis(2000);

fn options() -> RuntimeOptions {
    RuntimeOptions {
        poll_interval: PERIOD,
        settle_delay: PERIOD,
        gate: None,
    }
}

fn start_host(loader: &FakeLoader) -> Arc<AppHost> {
    let host = AppHost::start("out", Default::default(), loader.clone()).unwrap();
    loader.observe(&host);
    host
}

/// Let `cycles` poll cycles elapse, plus some slack before the next one.
async fn run_cycles(cycles: u32) {
    tokio::time::sleep(PERIOD * cycles + PERIOD / 4).await;
}

#[tokio::test(start_paused = true)]
async fn burst_reloads_once_after_quiet_cycle() {
    init_tracing();
    let loader = FakeLoader::new();
    let host = start_host(&loader);

    let source = ScriptedChangeSource::from_pattern(&[true, true, true, false, false]);
    let polls = source.polls();
    let runtime = spawn_reload_runtime(source, Arc::clone(&host), options());

    run_cycles(3).await;
    assert_eq!(polls.load(Ordering::SeqCst), 3);
    assert_eq!(host.current_generation(), Some(1), "no reload while changing");

    run_cycles(2).await;
    let stats = runtime.stop().await.unwrap();

    assert_eq!(stats.cycles, 5);
    assert_eq!(stats.reloads, 1);
    assert_eq!(stats.failed_reloads, 0);
    assert_eq!(host.current_generation(), Some(2));
    assert_eq!(loader.load_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn nothing_happens_before_settle_delay() {
    init_tracing();
    let loader = FakeLoader::new();
    let host = start_host(&loader);

    let source = ScriptedChangeSource::from_pattern(&[true, false]);
    let polls = source.polls();
    let runtime = spawn_reload_runtime(
        source,
        Arc::clone(&host),
        RuntimeOptions {
            settle_delay: Duration::from_secs(10),
            ..options()
        },
    );

    tokio::time::sleep(Duration::from_secs(9)).await;
    assert_eq!(polls.load(Ordering::SeqCst), 0);

    let stats = runtime.stop().await.unwrap();
    assert_eq!(stats.cycles, 0);
    assert_eq!(host.current_generation(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn quiet_source_never_reloads() {
    init_tracing();
    let loader = FakeLoader::new();
    let host = start_host(&loader);

    let runtime = spawn_reload_runtime(
        ScriptedChangeSource::from_pattern(&[]),
        Arc::clone(&host),
        options(),
    );
    run_cycles(10).await;
    let stats = runtime.stop().await.unwrap();

    assert_eq!(stats.cycles, 10);
    assert_eq!(stats.reloads, 0);
    assert_eq!(loader.load_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_reload_keeps_serving_and_next_burst_recovers() {
    init_tracing();
    let loader = FakeLoader::new();
    let host = start_host(&loader);
    loader.fail_next(FakeFailure::ConstructorPanics);

    let source = ScriptedChangeSource::from_pattern(&[true, false, true, false]);
    let runtime = spawn_reload_runtime(source, Arc::clone(&host), options());

    run_cycles(2).await;
    assert_eq!(host.current_generation(), Some(1));

    run_cycles(2).await;
    let stats = runtime.stop().await.unwrap();

    assert_eq!(stats.failed_reloads, 1);
    assert_eq!(stats.reloads, 1);
    assert_eq!(host.current_generation(), Some(2));
    assert_eq!(
        loader.journal().hooks_for(1),
        vec![JournalEntry::HookInvoked {
            generation: 1,
            current: Some(2)
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn parked_instance_is_released_on_a_later_cycle() {
    init_tracing();
    let loader = FakeLoader::new();
    let host = start_host(&loader);
    let in_flight = host.current().unwrap();

    let source = ScriptedChangeSource::from_pattern(&[true, false]);
    let runtime = spawn_reload_runtime(source, Arc::clone(&host), options());

    run_cycles(2).await;
    assert_eq!(host.current_generation(), Some(2));
    assert_eq!(loader.journal().releases_for(1), 0);

    drop(in_flight);
    run_cycles(1).await;
    assert_eq!(loader.journal().releases_for(1), 1);

    runtime.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unchanged_artifacts_skip_the_reload() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("out/libapp.so", "build 1");

    let mut gate = FingerprintGate::new(Arc::new(fs.clone()), "out", ExcludeFilter::none());
    gate.prime();
    let loader = FakeLoader::new();
    let host = start_host(&loader);

    let source = ScriptedChangeSource::from_pattern(&[true, false, true, false]);
    let runtime = spawn_reload_runtime(
        source,
        Arc::clone(&host),
        RuntimeOptions {
            gate: Some(gate),
            ..options()
        },
    );

    // First burst: a touch without new bytes.
    run_cycles(2).await;
    assert_eq!(host.current_generation(), Some(1));

    fs.add_file("out/libapp.so", "build 2");
    run_cycles(2).await;
    let stats = runtime.stop().await.unwrap();

    assert_eq!(stats.skipped_unchanged, 1);
    assert_eq!(stats.reloads, 1);
    assert_eq!(host.current_generation(), Some(2));
}

#[tokio::test(start_paused = true)]
async fn build_landing_after_priming_is_reloaded() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("out/libapp.so", "build 1");

    let mut gate = FingerprintGate::new(Arc::new(fs.clone()), "out", ExcludeFilter::none());
    gate.prime();
    let loader = FakeLoader::new();
    let host = start_host(&loader);

    // Rebuilt after the initial load but before the runtime's first cycle.
    fs.add_file("out/libapp.so", "build 2");

    let source = ScriptedChangeSource::from_pattern(&[true, false]);
    let runtime = spawn_reload_runtime(
        source,
        Arc::clone(&host),
        RuntimeOptions {
            gate: Some(gate),
            ..options()
        },
    );

    run_cycles(2).await;
    let stats = runtime.stop().await.unwrap();

    assert_eq!(stats.skipped_unchanged, 0);
    assert_eq!(stats.reloads, 1);
    assert_eq!(host.current_generation(), Some(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reload_completes_on_a_multi_threaded_runtime() {
    init_tracing();
    let loader = FakeLoader::new();
    let host = start_host(&loader);

    let source = ScriptedChangeSource::from_pattern(&[true, false]);
    let runtime = spawn_reload_runtime(
        source,
        Arc::clone(&host),
        RuntimeOptions {
            poll_interval: Duration::from_millis(20),
            settle_delay: Duration::from_millis(20),
            gate: None,
        },
    );

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while host.current_generation() != Some(2) && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let stats = runtime.stop().await.unwrap();

    assert_eq!(stats.reloads, 1);
    assert_eq!(host.current_generation(), Some(2));
    assert_eq!(loader.journal().releases_for(1), 1);
}
