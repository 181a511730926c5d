// src/host/dylib.rs

//! Dynamic-library loader.
//!
//! Each generation gets its own temporary directory holding a copy of the
//! compiled library. Opening the copy gives the dynamic linker a path it has
//! never seen, so the new generation cannot share code or statics with an
//! older one that is still mapped, and `cargo` is free to overwrite the
//! original file while the copy is in use.
//!
//! The constructor is called through the Rust ABI, so the library must be
//! built by the same toolchain against the same `hotserve` version as the
//! host.

use std::env::consts::{DLL_EXTENSION, DLL_PREFIX, DLL_SUFFIX};
use std::fs;
use std::panic::catch_unwind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use libloading::Library;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::errors::LoadError;
use crate::host::instance::{AppInstance, LoadBoundary, panic_message};
use crate::host::loader::{AppLoader, EntryPointId};
use crate::http::RequestHandlers;

/// Signature of the exported constructor.
pub type EntryPointFn = fn() -> Box<dyn RequestHandlers>;

/// Loads applications from dynamic libraries with `libloading`.
#[derive(Debug, Clone, Default)]
pub struct DylibLoader {
    default_library: Option<String>,
    shadow_parent: Option<PathBuf>,
}

impl DylibLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library name used when the entry point id does not name one.
    pub fn with_default_library(mut self, library: Option<String>) -> Self {
        self.default_library = library;
        self
    }

    /// Create per-generation copies under `dir` instead of the system temp
    /// directory.
    pub fn with_shadow_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.shadow_parent = dir;
        self
    }

    /// Platform file name of library `name`, e.g. `libapp.so`.
    pub fn library_file_name(name: &str) -> String {
        format!("{DLL_PREFIX}{name}{DLL_SUFFIX}")
    }

    /// Find the library file to load for `entry` under `root`.
    pub fn resolve_library(&self, root: &Path, entry: &EntryPointId) -> Result<PathBuf, LoadError> {
        if !root.is_dir() {
            return Err(LoadError::Resolution {
                root: root.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }

        if let Some(name) = entry.library().or(self.default_library.as_deref()) {
            let path = root.join(Self::library_file_name(name));
            if path.is_file() {
                return Ok(path);
            }
            return Err(LoadError::EntryPointNotFound(format!(
                "library {:?} not found",
                path
            )));
        }

        let entries = fs::read_dir(root).map_err(|e| LoadError::Resolution {
            root: root.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == DLL_EXTENSION))
            .collect();
        candidates.sort();

        match candidates.len() {
            0 => Err(LoadError::Resolution {
                root: root.to_path_buf(),
                reason: format!("no *.{DLL_EXTENSION} library found"),
            }),
            1 => Ok(candidates.remove(0)),
            _ => Err(LoadError::Resolution {
                root: root.to_path_buf(),
                reason: format!(
                    "several libraries found ({}); name one as <library>:<symbol>",
                    candidates
                        .iter()
                        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }),
        }
    }

    fn shadow_copy(&self, library: &Path, generation: u64) -> anyhow::Result<(TempDir, PathBuf)> {
        let mut builder = tempfile::Builder::new();
        let prefix = format!("hotserve-gen{generation}-");
        builder.prefix(&prefix);
        let dir = match &self.shadow_parent {
            Some(parent) => {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating shadow parent {:?}", parent))?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        }
        .context("creating shadow directory")?;

        let file_name = library
            .file_name()
            .context("library path has no file name")?;
        let copy = dir.path().join(file_name);
        fs::copy(library, &copy)
            .with_context(|| format!("copying {:?} to {:?}", library, copy))?;
        Ok((dir, copy))
    }
}

impl AppLoader for DylibLoader {
    fn load(
        &self,
        artifact_root: &Path,
        entry_point: &EntryPointId,
        generation: u64,
    ) -> Result<AppInstance, LoadError> {
        let library_path = self.resolve_library(artifact_root, entry_point)?;
        let (shadow, copy) = self
            .shadow_copy(&library_path, generation)
            .map_err(|source| LoadError::Boundary {
                path: library_path.clone(),
                source,
            })?;
        debug!(generation, copy = ?copy, "created shadow copy");

        // SAFETY: loading runs the library's initialisers. The artifact
        // directory is the user's own build output.
        let library = unsafe { Library::new(&copy) }.map_err(|e| LoadError::Boundary {
            path: copy.clone(),
            source: e.into(),
        })?;

        // SAFETY: the symbol is emitted by the route generator with exactly
        // this signature.
        let constructor: EntryPointFn = unsafe {
            let symbol = library
                .get::<EntryPointFn>(entry_point.symbol().as_bytes())
                .map_err(|e| {
                    LoadError::EntryPointNotFound(format!(
                        "symbol `{}` in {:?}: {e}",
                        entry_point.symbol(),
                        library_path
                    ))
                })?;
            *symbol
        };

        let handlers = catch_unwind(constructor).map_err(|payload| LoadError::ConstructionError {
            entry: entry_point.to_string(),
            cause: panic_message(payload.as_ref()),
        })?;

        info!(generation, library = ?library_path, "loaded application library");
        let boundary = DylibBoundary {
            library: Some(library),
            shadow: Some(shadow),
            origin: library_path,
        };
        Ok(AppInstance::new(generation, handlers, Box::new(boundary)))
    }
}

/// Owns the opened library and its shadow directory.
#[derive(Debug)]
struct DylibBoundary {
    library: Option<Library>,
    shadow: Option<TempDir>,
    origin: PathBuf,
}

impl LoadBoundary for DylibBoundary {
    fn describe(&self) -> String {
        format!("{:?}", self.origin)
    }

    fn release(mut self: Box<Self>) -> anyhow::Result<()> {
        if let Some(library) = self.library.take() {
            library
                .close()
                .with_context(|| format!("closing library copied from {:?}", self.origin))?;
        }
        if let Some(shadow) = self.shadow.take() {
            let path = shadow.path().to_path_buf();
            shadow
                .close()
                .with_context(|| format!("removing shadow directory {:?}", path))?;
        }
        Ok(())
    }
}
