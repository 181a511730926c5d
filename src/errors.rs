// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Each failure domain gets its own enum so callers can decide what is fatal:
//! load errors end the process only at startup, release and watch
//! registration errors are only ever logged, and generation errors fail the
//! build.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::HttpMethod;

#[derive(Error, Debug)]
pub enum HotserveError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Server error: {0}")]
    Server(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure to produce a new application instance.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("entry point not found: {0}")]
    EntryPointNotFound(String),

    #[error("constructing entry point '{entry}' failed: {cause}")]
    ConstructionError { entry: String, cause: String },

    #[error("cannot resolve artifacts under {root:?}: {reason}")]
    Resolution { root: PathBuf, reason: String },

    #[error("cannot open library {path:?}: {source}")]
    Boundary {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// Failure while disposing a superseded instance. Never propagated.
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("shutdown hook of generation {generation} failed: {source}")]
    ShutdownHook {
        generation: u64,
        #[source]
        source: anyhow::Error,
    },

    #[error("releasing loading boundary of generation {generation} failed: {source}")]
    Boundary {
        generation: u64,
        #[source]
        source: anyhow::Error,
    },
}

/// A single directory could not be registered with the watch backend.
#[derive(Error, Debug)]
#[error("cannot watch directory {path:?}: {source}")]
pub struct WatchRegistrationError {
    pub path: PathBuf,
    #[source]
    pub source: anyhow::Error,
}

/// Build-time failure of the route table generator.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("cannot parse {file:?}: {message}")]
    Parse { file: PathBuf, message: String },

    #[error("malformed endpoint metadata at {location}: {message}")]
    Malformed { location: String, message: String },

    #[error("duplicate route {method} {path}: declared by {first} and {second}")]
    DuplicateRoute {
        method: HttpMethod,
        path: String,
        first: String,
        second: String,
    },

    #[error("cannot access {path:?}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, HotserveError>;
