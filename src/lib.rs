//! pathswitch - Audio path arbiter for networked audio appliances.
//!
//! Players and audio sources register with the daemon over D-Bus. When a
//! client requests a source, the daemon deselects whatever currently owns
//! the audio path, switches players if needed and selects the new source.
//! Requests arriving while the appliance cannot render audio are parked and
//! completed once the appliance reports it is ready.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pathswitch::{config::Config, services::AudioPathService};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_default()?;
//! let service = AudioPathService::start(&config, None).await?;
//!
//! let path = service.handle().current_path().await?;
//! println!("Current path: {path:?}");
//! # Ok(())
//! # }
//! ```

/// Configuration schema and loading.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Audio path service and shared service utilities.
pub mod services;

/// Logging setup and runtime log level control.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use core::{PathSwitchError, Result};
