/// Audio path registration and switching service
pub mod audio_path;
/// Shared building blocks for services
pub mod common;

pub use audio_path::{AudioPathError, AudioPathService, PathSwitchHandle};
