#![allow(dead_code)]

use std::net::IpAddr;
use std::path::PathBuf;

use hotserve::config::{ConfigFile, RawConfigFile};
use hotserve::errors::Result;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.watch.poll_interval_ms = ms;
        self
    }

    pub fn settle_delay_ms(mut self, ms: u64) -> Self {
        self.config.watch.settle_delay_ms = ms;
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.watch.exclude.push(pattern.to_string());
        self
    }

    pub fn skip_unchanged(mut self, val: bool) -> Self {
        self.config.watch.skip_unchanged = val;
        self
    }

    pub fn interface(mut self, interface: IpAddr) -> Self {
        self.config.server.interface = interface;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.server.workers = workers;
        self
    }

    pub fn library(mut self, name: &str) -> Self {
        self.config.loader.library = Some(name.to_string());
        self
    }

    pub fn shadow_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.loader.shadow_dir = Some(dir.into());
        self
    }

    /// Validate without panicking, for tests of the validation itself.
    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
