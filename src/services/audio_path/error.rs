/// Errors surfaced by the audio path service
#[derive(thiserror::Error, Debug)]
pub enum AudioPathError {
    /// A required string argument was empty
    #[error("Empty {0}")]
    EmptyArgument(&'static str),

    /// No source registered under this id
    #[error("Unknown audio source \"{0}\"")]
    SourceUnknown(String),

    /// The source is registered, its player is not
    #[error("Player for audio source \"{0}\" not registered")]
    PlayerUnknown(String),

    /// No player registered under this id
    #[error("Unknown player \"{0}\"")]
    PlayerNotRegistered(String),

    /// The player rejected activation
    #[error("Failed activating player \"{0}\"")]
    PlayerFailed(String),

    /// The source rejected selection
    #[error("Failed selecting audio source \"{0}\"")]
    SourceFailed(String),

    /// A deferred request or a registration in progress was replaced by a
    /// newer one
    #[error("Request superseded by a newer request")]
    Superseded,

    /// Unknown appliance ready state encoding
    #[error("Invalid appliance ready state {0}")]
    InvalidReadyState(u8),

    /// Unknown log level name
    #[error("Invalid log level \"{0}\"")]
    InvalidLogLevel(String),

    /// The dispatcher is not running
    #[error("Audio path service not running")]
    ServiceUnavailable,

    /// Bus communication failed
    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),
}

impl AudioPathError {
    /// Whether the caller sent something unusable, as opposed to a failure
    /// further down the line.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AudioPathError::EmptyArgument(_)
                | AudioPathError::SourceUnknown(_)
                | AudioPathError::PlayerUnknown(_)
                | AudioPathError::PlayerNotRegistered(_)
                | AudioPathError::InvalidReadyState(_)
                | AudioPathError::InvalidLogLevel(_)
        )
    }
}

impl From<AudioPathError> for zbus::fdo::Error {
    fn from(error: AudioPathError) -> Self {
        if error.is_input_error() {
            zbus::fdo::Error::InvalidArgs(error.to_string())
        } else {
            zbus::fdo::Error::Failed(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_map_to_invalid_args() {
        let error: zbus::fdo::Error = AudioPathError::SourceUnknown("srcX".into()).into();
        assert!(matches!(error, zbus::fdo::Error::InvalidArgs(_)));

        let error: zbus::fdo::Error = AudioPathError::EmptyArgument("source id").into();
        assert!(matches!(error, zbus::fdo::Error::InvalidArgs(_)));
    }

    #[test]
    fn remote_failures_map_to_failed() {
        let error: zbus::fdo::Error = AudioPathError::PlayerFailed("pl1".into()).into();
        assert!(matches!(error, zbus::fdo::Error::Failed(_)));

        let error: zbus::fdo::Error = AudioPathError::Superseded.into();
        assert!(matches!(error, zbus::fdo::Error::Failed(_)));
    }
}
