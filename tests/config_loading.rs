// tests/config_loading.rs

mod common;
use crate::common::builders::ConfigFileBuilder;

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use hotserve::config::{load_and_validate, load_from_path, load_or_default};
use hotserve::errors::HotserveError;
use tempfile::TempDir;

fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Hotserve.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn empty_file_yields_defaults() {
    let (_dir, path) = write_config("");
    let config = load_and_validate(&path).unwrap();

    assert_eq!(config.watch().poll_interval(), Duration::from_millis(2000));
    assert_eq!(config.watch().settle_delay(), Duration::from_millis(2000));
    assert!(config.watch().exclude.is_empty());
    assert!(!config.watch().skip_unchanged);
    assert_eq!(config.server().interface, IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(config.server().port, 8080);
    assert_eq!(config.server().workers, 4);
    assert_eq!(config.loader().library, None);
}

#[test]
fn full_file_is_read() {
    let (_dir, path) = write_config(
        r#"
        [watch]
        poll_interval_ms = 250
        settle_delay_ms = 0
        exclude = ["**/*.d", "deps/**"]
        skip_unchanged = true

        [server]
        interface = "0.0.0.0"
        port = 9000
        workers = 8

        [loader]
        library = "app"
        shadow_dir = "/tmp/hotserve"
        "#,
    );
    let config = load_and_validate(&path).unwrap();

    assert_eq!(config.watch().poll_interval_ms, 250);
    assert_eq!(config.watch().settle_delay(), Duration::ZERO);
    assert_eq!(config.watch().exclude, vec!["**/*.d", "deps/**"]);
    assert!(config.watch().skip_unchanged);
    assert_eq!(config.server().interface, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    assert_eq!(config.server().port, 9000);
    assert_eq!(config.server().workers, 8);
    assert_eq!(config.loader().library.as_deref(), Some("app"));
    assert_eq!(
        config.loader().shadow_dir.as_deref(),
        Some(Path::new("/tmp/hotserve"))
    );
}

#[test]
fn zero_poll_interval_is_rejected() {
    let (_dir, path) = write_config("[watch]\npoll_interval_ms = 0\n");
    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, HotserveError::ConfigError(ref m) if m.contains("poll_interval_ms")));
}

#[test]
fn zero_workers_is_rejected() {
    let err = ConfigFileBuilder::new().workers(0).try_build().unwrap_err();
    assert!(matches!(err, HotserveError::ConfigError(ref m) if m.contains("workers")));
}

#[test]
fn invalid_exclude_glob_is_rejected() {
    let err = ConfigFileBuilder::new().exclude("a/[b").try_build().unwrap_err();
    assert!(matches!(err, HotserveError::ConfigError(ref m) if m.contains("exclude")));
}

#[test]
fn library_must_be_a_bare_name() {
    for bad in ["", "lib/app", "C:app"] {
        let err = ConfigFileBuilder::new().library(bad).try_build().unwrap_err();
        assert!(matches!(err, HotserveError::ConfigError(_)), "{bad:?}");
    }
    assert!(ConfigFileBuilder::new().library("app").try_build().is_ok());
}

#[test]
fn unknown_keys_are_toml_errors() {
    let (_dir, path) = write_config("[watch]\npoll_every = 3\n");
    assert!(matches!(load_from_path(&path), Err(HotserveError::TomlError(_))));

    let (_dir, path) = write_config("[database]\nurl = \"x\"\n");
    assert!(matches!(load_from_path(&path), Err(HotserveError::TomlError(_))));
}

#[test]
fn missing_explicit_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        load_or_default(Some(&missing)),
        Err(HotserveError::IoError(_))
    ));
}

#[test]
fn cli_overrides_replace_server_values() {
    let mut config = ConfigFileBuilder::new().port(1234).build();
    config.override_server(None, Some(4321));
    assert_eq!(config.server().port, 4321);
    assert_eq!(config.server().interface, IpAddr::V4(Ipv4Addr::LOCALHOST));

    config.override_server(Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)), None);
    assert_eq!(config.server().interface, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    assert_eq!(config.server().port, 4321);
}
