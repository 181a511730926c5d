// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{HotserveError, Result};
use crate::host::loader::EntryPointId;
use crate::watch::ExcludeFilter;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = HotserveError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.watch, raw.server, raw.loader))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_watch(cfg)?;
    validate_server(cfg)?;
    validate_loader(cfg)?;
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.poll_interval_ms == 0 {
        return Err(HotserveError::ConfigError(
            "[watch].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    ExcludeFilter::new(&cfg.watch.exclude)
        .map_err(|e| HotserveError::ConfigError(format!("[watch].exclude: {e:#}")))?;

    Ok(())
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.workers == 0 {
        return Err(HotserveError::ConfigError(
            "[server].workers must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_loader(cfg: &RawConfigFile) -> Result<()> {
    if let Some(library) = &cfg.loader.library {
        // Reuse the entry point grammar for the library part.
        format!("{library}:entry")
            .parse::<EntryPointId>()
            .map_err(|_| {
                HotserveError::ConfigError(format!(
                    "[loader].library must be a bare library name like \"app\" (got {library:?})"
                ))
            })?;
    }
    Ok(())
}
