use std::path::Path;

use thiserror::Error;

/// Errors raised while setting up and running the daemon.
#[derive(Error, Debug)]
pub enum PathSwitchError {
    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a file or directory failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file is not valid TOML for the schema.
    #[error("{0}")]
    TomlParse(String),
}

/// Result alias using [`PathSwitchError`].
pub type Result<T> = std::result::Result<T, PathSwitchError>;

impl PathSwitchError {
    /// Wrap a TOML parse error, naming the offending file if known.
    pub fn toml_parse(error: impl std::fmt::Display, path: Option<&Path>) -> Self {
        match path {
            Some(p) => {
                let clean_path = p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
                PathSwitchError::TomlParse(format!(
                    "Failed to parse TOML at {:?}: {}",
                    clean_path, error
                ))
            }
            None => PathSwitchError::TomlParse(format!("Failed to parse TOML: {}", error)),
        }
    }
}
