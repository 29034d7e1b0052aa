//! Configuration schema for the path switch daemon.
//!
//! All sections deserialize from TOML and fall back to defaults for any
//! field that is missing from the file.

mod bus;
mod general;
mod loading;
mod paths;
mod registration;

pub use bus::{BusConfig, BusType};
pub use general::{GeneralConfig, LogLevel};
pub use paths::ConfigPaths;
pub use registration::RegistrationConfig;

use serde::{Deserialize, Serialize};

/// Main configuration structure for pathswitch.
///
/// Represents the complete configuration schema that can be loaded
/// from TOML files. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// General application settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Bus connection and exported object settings.
    #[serde(default)]
    pub bus: BusConfig,

    /// How component registrations are processed.
    #[serde(default)]
    pub registration: RegistrationConfig,
}

#[cfg(test)]
mod tests;
