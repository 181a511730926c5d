// src/routegen/build.rs

//! Driving the generator from the CLI and from an application's `build.rs`.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::{GenerationError, HotserveError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::routegen::emit::{EmitOptions, emit};
use crate::routegen::model::RouteTable;
use crate::routegen::scan::scan_sources;

/// File name written into `OUT_DIR` by [`generate_for_build`].
pub const GENERATED_FILE_NAME: &str = "app_request_handlers.rs";

/// Outcome of a successful generation run.
#[derive(Debug)]
pub struct Generated {
    pub table: RouteTable,
    pub warnings: Vec<String>,
    pub source: String,
}

/// Scan `src`, build the table and render it. Nothing is written.
pub fn render(fs: &dyn FileSystem, src: &Path, options: &EmitOptions) -> std::result::Result<Generated, GenerationError> {
    let scanned = scan_sources(fs, src)?;
    let table = RouteTable::build(scanned.endpoints)?;
    let source = emit(&table, options)?;
    Ok(Generated {
        table,
        warnings: scanned.warnings,
        source,
    })
}

/// Scan `src` and write the generated unit to `out`.
///
/// `out` is only touched when every step succeeded.
pub fn generate(fs: &dyn FileSystem, src: &Path, out: &Path, options: &EmitOptions) -> Result<Generated> {
    let generated = render(fs, src, options)?;
    fs.write(out, generated.source.as_bytes())
        .map_err(|source| GenerationError::Source {
            path: out.to_path_buf(),
            source,
        })?;
    info!(
        routes = generated.table.len(),
        endpoints = generated.table.endpoints().len(),
        out = ?out,
        "wrote route table"
    );
    Ok(generated)
}

/// Entry point for an application's `build.rs`.
///
/// Scans `src_dir` (relative to the package root), writes
/// `$OUT_DIR/app_request_handlers.rs` and tells cargo to rerun when the
/// sources change. Scan warnings are forwarded as cargo warnings.
///
/// ```ignore
/// // build.rs
/// fn main() {
///     hotserve::routegen::generate_for_build("src").expect("route generation failed");
/// }
///
/// // src/lib.rs
/// include!(concat!(env!("OUT_DIR"), "/app_request_handlers.rs"));
/// ```
pub fn generate_for_build(src_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let out_dir = std::env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| HotserveError::ConfigError("OUT_DIR is not set; call this from build.rs".to_string()))?;
    let manifest_dir = std::env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_default();

    let src = manifest_dir.join(src_dir.as_ref());
    let out = out_dir.join(GENERATED_FILE_NAME);

    println!("cargo:rerun-if-changed={}", src.display());
    let generated = generate(&RealFileSystem, &src, &out, &EmitOptions::default())?;
    for warning in &generated.warnings {
        println!("cargo:warning={warning}");
    }
    Ok(out)
}
