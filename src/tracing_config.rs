use std::{env, error::Error, sync::Mutex};

use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

use crate::config::{ConfigPaths, LogLevel};

const DAYS_TO_KEEP: usize = 7;

/// Runtime handle for changing the log level after initialization.
///
/// Backs the `de.tahifi.Debug.Logging` interface.
pub struct LogLevelHandle {
    reload: reload::Handle<EnvFilter, Registry>,
    current: Mutex<LogLevel>,
}

impl LogLevelHandle {
    /// The level currently in effect.
    pub fn current(&self) -> LogLevel {
        match self.current.lock() {
            Ok(level) => *level,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Switch to a new level and return the previous one.
    ///
    /// # Errors
    /// Returns error if the subscriber backing this handle is gone.
    pub fn set(&self, level: LogLevel) -> Result<LogLevel, reload::Error> {
        self.reload.reload(EnvFilter::new(level.to_string()))?;

        let mut current = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        Ok(std::mem::replace(&mut *current, level))
    }
}

#[cfg(test)]
impl LogLevelHandle {
    /// Handle driving a filter layer that is not installed in any
    /// subscriber. The layer has to outlive the handle.
    pub(crate) fn detached(level: LogLevel) -> (reload::Layer<EnvFilter, Registry>, Self) {
        let (layer, reload) = reload::Layer::new(EnvFilter::new(level.to_string()));

        (
            layer,
            Self {
                reload,
                current: Mutex::new(level),
            },
        )
    }
}

/// Initialize tracing for the daemon
///
/// Uses RUST_LOG environment variable if set, otherwise the configured level.
/// Supports both pretty console output and JSON output based on
/// PATHSWITCH_LOG_FORMAT. With `log_to_file`, logs are also written to a
/// daily rotated file in the pathswitch logs directory.
///
/// # Errors
/// Returns error if file creation or tracing subscriber initialization fails
pub fn init(level: LogLevel, log_to_file: bool) -> Result<LogLevelHandle, Box<dyn Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let (filter, reload_handle) = reload::Layer::new(env_filter);

    let file_layer = if log_to_file {
        let file_appender = tracing_appender::rolling::Builder::new()
            .rotation(tracing_appender::rolling::Rotation::DAILY)
            .max_log_files(DAYS_TO_KEEP)
            .filename_prefix("pathswitch")
            .filename_suffix("log")
            .build(ConfigPaths::log_dir()?)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        std::mem::forget(guard);

        Some(
            fmt::layer()
                .compact()
                .with_target(true)
                .with_level(true)
                .with_writer(non_blocking)
                .with_ansi(false),
        )
    } else {
        None
    };

    let format = env::var("PATHSWITCH_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_target(true).with_level(true))
                .try_init()?;
        }
        _ => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_level(true)
                        .with_thread_ids(true)
                        .with_thread_names(true),
                )
                .try_init()?;
        }
    }

    Ok(LogLevelHandle {
        reload: reload_handle,
        current: Mutex::new(level),
    })
}

/// Initialize plain console tracing for command line tools
///
/// Only warnings and errors are shown unless RUST_LOG says otherwise.
///
/// # Errors
/// Returns error if tracing subscriber initialization fails
pub fn init_cli_mode() -> Result<(), Box<dyn Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}
