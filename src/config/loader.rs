// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks value ranges and that the exclude globs compile.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load `explicit` if given, else the default config file if it exists,
/// else fall back to built-in defaults.
///
/// An explicitly named file that does not exist is an error.
pub fn load_or_default(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        debug!(path = ?path, "loading config");
        return load_and_validate(path);
    }

    let default = default_config_path();
    if default.is_file() {
        debug!(path = ?default, "loading default config");
        load_and_validate(default)
    } else {
        debug!("no config file; using defaults");
        Ok(ConfigFile::default())
    }
}

/// `Hotserve.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Hotserve.toml")
}
