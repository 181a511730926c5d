// src/lib.rs

//! Development host that serves a compiled web application and swaps in
//! each rebuild without restarting the process, plus the build-time
//! generator of the application's route table.

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod host;
pub mod http;
pub mod logging;
pub mod routegen;
pub mod types;
pub mod watch;

pub use errors::{HotserveError, Result};
pub use hotserve_macros::{endpoint, get, post};

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cli::{CliArgs, Command, GenerateArgs, RoutesArgs, ServeArgs};
use crate::config::load_or_default;
use crate::engine::{FingerprintGate, RuntimeOptions, spawn_reload_runtime};
use crate::fs::{FileSystem, RealFileSystem};
use crate::host::{AppHost, DylibLoader};
use crate::http::{Dispatch, HttpServer};
use crate::routegen::{EmitOptions, RouteTable};
use crate::watch::{ExcludeFilter, PathWatcher};

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    match args.command {
        Command::Serve(serve_args) => serve(serve_args).await,
        Command::Generate(generate_args) => generate(generate_args),
        Command::Routes(routes_args) => routes(routes_args),
    }
}

/// Wires together:
/// - config loading
/// - the fingerprint gate and the watcher, both set up before the initial load
/// - the initial load (fatal on failure, before any socket is bound)
/// - the HTTP server dispatching through the host
/// - the reload runtime
/// - Ctrl-C handling
async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut cfg = load_or_default(args.config.as_deref())?;
    cfg.override_server(args.interface, args.port);

    let entry_point = args.entry_point.or_library(cfg.loader().library.as_deref());
    let loader = DylibLoader::new()
        .with_default_library(cfg.loader().library.clone())
        .with_shadow_dir(cfg.loader().shadow_dir.clone());

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let exclude = ExcludeFilter::new(&cfg.watch().exclude)?;

    // Fingerprint and watch before loading: a build landing during the load
    // then shows up as a change instead of being mistaken for the loaded one.
    let gate = cfg.watch().skip_unchanged.then(|| {
        let mut gate = FingerprintGate::new(Arc::clone(&fs), &args.artifact_dir, exclude.clone());
        gate.prime();
        gate
    });

    let watcher = PathWatcher::new(&args.artifact_dir, Arc::clone(&fs), exclude)?;
    let host = AppHost::start(&args.artifact_dir, entry_point, loader)?;

    let server = HttpServer::bind(cfg.server().interface, cfg.server().port)?;
    info!(addr = %server.local_addr(), "listening");
    let dispatch: Arc<dyn Dispatch> = host.clone();
    let server_handle = server.spawn(dispatch, cfg.server().workers);

    let options = RuntimeOptions {
        poll_interval: cfg.watch().poll_interval(),
        settle_delay: cfg.watch().settle_delay(),
        gate,
    };
    let runtime = spawn_reload_runtime(watcher, Arc::clone(&host), options);

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C; shutting down");
    }
    info!("shutting down");

    let stats = runtime.stop().await?;
    info!(reloads = stats.reloads, failed = stats.failed_reloads, "reload runtime finished");

    tokio::task::spawn_blocking(move || server_handle.shutdown()).await?;
    drop(host);
    Ok(())
}

fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let options = EmitOptions {
        struct_name: args.struct_name,
        entry_symbol: args.entry_symbol,
        runtime_crate: args.runtime_crate,
        emit_serve: true,
    };
    let generated = routegen::generate(&RealFileSystem, &args.src, &args.out, &options)?;
    println!(
        "wrote {} routes from {} endpoints to {}",
        generated.table.len(),
        generated.table.endpoints().len(),
        args.out.display()
    );
    Ok(())
}

fn routes(args: RoutesArgs) -> anyhow::Result<()> {
    let generated = routegen::render(&RealFileSystem, &args.src, &EmitOptions::default())?;
    print_routes(&args.src, &generated.table);
    for warning in &generated.warnings {
        println!("warning: {warning}");
    }
    Ok(())
}

/// Route listing: one line per route, sorted by method then path.
fn print_routes(src: &Path, table: &RouteTable) {
    println!("hotserve routes ({})", src.display());
    println!();
    if table.is_empty() {
        println!("  (no routes)");
        return;
    }
    for route in table.routes() {
        let endpoint = &table.endpoints()[route.endpoint];
        println!(
            "  {:<4} {:<24} -> {}::{}",
            route.method.as_str(),
            route.path,
            endpoint.qualified_name(),
            route.handler
        );
    }
}
