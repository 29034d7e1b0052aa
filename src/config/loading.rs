use super::{Config, ConfigPaths};

use crate::{PathSwitchError, Result};

use std::{fs, io::ErrorKind, path::Path};

use tracing::{debug, info};

impl Config {
    /// Load the configuration from `path`.
    ///
    /// A missing file yields the default configuration; a file that exists
    /// but cannot be parsed is an error.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid TOML for
    /// this schema.
    pub fn load(path: &Path) -> Result<Config> {
        let file_content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No config file at {}, using defaults", path.display());
                return Ok(Config::default());
            }
            Err(e) => return Err(e.into()),
        };

        debug!("Loading config from {}", path.display());

        let config: Config =
            toml::from_str(&file_content).map_err(|e| PathSwitchError::toml_parse(e, Some(path)))?;
        config.validate()?;

        Ok(config)
    }

    /// Load the configuration from the default location.
    ///
    /// # Errors
    /// Returns an error if the default path cannot be determined or the file
    /// is malformed.
    pub fn load_default() -> Result<Config> {
        let path = ConfigPaths::main_config()?;
        Self::load(&path)
    }

    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    /// Returns an error if the text is not valid TOML for this schema.
    pub fn from_toml_str(content: &str) -> Result<Config> {
        let config: Config =
            toml::from_str(content).map_err(|e| PathSwitchError::toml_parse(e, None))?;
        config.validate()?;

        Ok(config)
    }

    /// Check values the schema alone cannot express.
    ///
    /// # Errors
    /// Returns an error if the bus name is empty or the object path is not
    /// absolute.
    pub fn validate(&self) -> Result<()> {
        if self.bus.name.is_empty() {
            return Err(PathSwitchError::Config("bus.name must not be empty".to_string()));
        }

        if !self.bus.object_path.starts_with('/') {
            return Err(PathSwitchError::Config(format!(
                "bus.object_path must be absolute, got \"{}\"",
                self.bus.object_path
            )));
        }

        Ok(())
    }
}
