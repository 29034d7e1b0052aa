//! Unit tests for config module
//!
//! Tests configuration types, defaults, and serialization.
//! No filesystem dependencies - all in-memory.

#![allow(clippy::panic)]

use crate::{
    PathSwitchError,
    config::{BusType, Config, LogLevel},
};

#[test]
fn config_default() {
    let config = Config::default();

    assert_eq!(config.general.log_level, LogLevel::Info);
    assert!(!config.general.log_to_file);
    assert_eq!(config.bus.bus_type, BusType::System);
    assert_eq!(config.bus.name, "de.tahifi.TAPSwitch");
    assert_eq!(config.bus.object_path, "/de/tahifi/TAPSwitch");
    assert!(config.registration.background_proxy_construction);
}

#[test]
fn config_serialize_toml() {
    let config = Config::default();

    let toml_str = toml::to_string(&config).unwrap();
    assert!(toml_str.contains("[general]"));
    assert!(toml_str.contains("[bus]"));
    assert!(toml_str.contains("[registration]"));
}

#[test]
fn config_deserialize_partial_toml() {
    let toml_str = r#"
        [general]
        log_level = "debug"

        [bus]
        bus_type = "session"
    "#;

    let config = Config::from_toml_str(toml_str).unwrap();

    assert_eq!(config.general.log_level, LogLevel::Debug);
    assert_eq!(config.bus.bus_type, BusType::Session);
    assert_eq!(config.bus.name, "de.tahifi.TAPSwitch");
    assert!(config.registration.background_proxy_construction);
}

#[test]
fn config_empty_input_is_default() {
    let config = Config::from_toml_str("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn config_rejects_unknown_log_level() {
    let toml_str = r#"
        [general]
        log_level = "chatty"
    "#;

    assert!(Config::from_toml_str(toml_str).is_err());
}

#[test]
fn config_rejects_relative_object_path() {
    let toml_str = r#"
        [bus]
        object_path = "de/tahifi/TAPSwitch"
    "#;

    let error = Config::from_toml_str(toml_str).unwrap_err();
    assert!(matches!(error, PathSwitchError::Config(_)));
}

#[test]
fn config_rejects_empty_bus_name() {
    let mut config = Config::default();
    config.bus.name.clear();

    assert!(config.validate().is_err());
    assert!(Config::default().validate().is_ok());
}

#[test]
fn config_serialize_roundtrip() {
    let mut original = Config::default();
    original.registration.background_proxy_construction = false;
    original.bus.bus_type = BusType::Session;

    let toml_str = toml::to_string(&original).unwrap();
    let deserialized = Config::from_toml_str(&toml_str).unwrap();

    assert_eq!(original, deserialized);
}

#[test]
fn log_level_parses_case_insensitively() {
    assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warn));
    assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
    assert_eq!(" trace ".parse::<LogLevel>(), Ok(LogLevel::Trace));
    assert!("loud".parse::<LogLevel>().is_err());
    assert_eq!(LogLevel::Debug.to_string(), "debug");
}
