// src/config/model.rs

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration as read from `Hotserve.toml`, before validation.
///
/// ```toml
/// [watch]
/// poll_interval_ms = 2000
/// settle_delay_ms = 2000
/// exclude = ["**/*.d", "**/.fingerprint/**"]
/// skip_unchanged = false
///
/// [server]
/// interface = "127.0.0.1"
/// port = 8080
/// workers = 4
///
/// [loader]
/// library = "app"
/// shadow_dir = "/tmp/hotserve"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub loader: LoaderSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Period of the fixed-rate poll cycle.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay before the first poll cycle.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Globs (relative to the artifact directory) whose changes are ignored.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Skip reloads when the artifact contents did not actually change.
    #[serde(default)]
    pub skip_unchanged: bool,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_settle_delay_ms() -> u64 {
    2000
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            exclude: Vec::new(),
            skip_unchanged: false,
        }
    }
}

impl WatchSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_interface")]
    pub interface: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of request threads.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_interface() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    4
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            port: default_port(),
            workers: default_workers(),
        }
    }
}

/// `[loader]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderSection {
    /// Library name used when the entry point does not name one.
    #[serde(default)]
    pub library: Option<String>,

    /// Parent directory for per-generation library copies.
    #[serde(default)]
    pub shadow_dir: Option<PathBuf>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holders can rely on
/// the checks in `validate.rs` having passed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    watch: WatchSection,
    server: ServerSection,
    loader: LoaderSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        watch: WatchSection,
        server: ServerSection,
        loader: LoaderSection,
    ) -> Self {
        Self {
            watch,
            server,
            loader,
        }
    }

    pub fn watch(&self) -> &WatchSection {
        &self.watch
    }

    pub fn server(&self) -> &ServerSection {
        &self.server
    }

    pub fn loader(&self) -> &LoaderSection {
        &self.loader
    }

    /// Command-line overrides for the `[server]` section.
    pub fn override_server(&mut self, interface: Option<IpAddr>, port: Option<u16>) {
        if let Some(interface) = interface {
            self.server.interface = interface;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            WatchSection::default(),
            ServerSection::default(),
            LoaderSection::default(),
        )
    }
}
