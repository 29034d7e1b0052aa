//! Integration tests for loading configuration files from disk.

#![allow(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::fs;

use pathswitch::{
    PathSwitchError,
    config::{BusType, Config, ConfigPaths, LogLevel},
};
use tempfile::TempDir;

#[test]
fn missing_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");

    let config = Config::load(&path).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn file_overrides_only_given_fields() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
            [general]
            log_level = "trace"
            log_to_file = true

            [bus]
            bus_type = "session"
            name = "org.example.PathSwitch"

            [registration]
            background_proxy_construction = false
        "#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();

    assert_eq!(config.general.log_level, LogLevel::Trace);
    assert!(config.general.log_to_file);
    assert_eq!(config.bus.bus_type, BusType::Session);
    assert_eq!(config.bus.name, "org.example.PathSwitch");
    assert_eq!(config.bus.object_path, "/de/tahifi/TAPSwitch");
    assert!(!config.registration.background_proxy_construction);
}

#[test]
fn malformed_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[bus]\nbus_type = \"carrier pigeon\"\n").unwrap();

    let error = Config::load(&path).unwrap_err();

    assert!(matches!(error, PathSwitchError::TomlParse(_)));
    assert!(error.to_string().contains("config.toml"));
}

#[test]
fn default_location_follows_xdg_config_home() {
    let temp_dir = TempDir::new().unwrap();

    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let main_config = ConfigPaths::main_config().unwrap();
    assert_eq!(
        main_config,
        temp_dir.path().join("pathswitch").join("config.toml")
    );

    fs::create_dir_all(main_config.parent().unwrap()).unwrap();
    fs::write(&main_config, "[general]\nlog_level = \"error\"\n").unwrap();

    let config = Config::load_default().unwrap();
    assert_eq!(config.general.log_level, LogLevel::Error);
}
