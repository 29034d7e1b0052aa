use std::fmt;

use tracing::{debug, warn};

use super::AudioPathError;

/// A boolean that may not be known yet.
///
/// `Unknown` compares unequal to both `true` and `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tristate {
    /// Known to be false.
    False,
    /// Known to be true.
    True,
    /// Not reported yet.
    #[default]
    Unknown,
}

impl Tristate {
    /// Known and true.
    pub fn is_true(self) -> bool {
        self == Tristate::True
    }

    /// Known and false.
    pub fn is_false(self) -> bool {
        self == Tristate::False
    }
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        if value { Tristate::True } else { Tristate::False }
    }
}

impl PartialEq<bool> for Tristate {
    fn eq(&self, other: &bool) -> bool {
        match self {
            Tristate::True => *other,
            Tristate::False => !*other,
            Tristate::Unknown => false,
        }
    }
}

/// Whether a source may be selected right away.
///
/// Unknown states are permissive; only an explicit suspend or an explicitly
/// blocked audio path defer activation.
pub fn activation_allowed(up_and_running: Tristate, audio_path_ready: Tristate) -> bool {
    !(up_and_running.is_false() || audio_path_ready.is_false())
}

/// Ready states as sent over the appliance interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Both flags unknown.
    Unknown,
    /// Suspended, audio path blocked.
    Suspended,
    /// Up and running, audio path blocked.
    AudioPathBlocked,
    /// Up and running, audio path ready.
    Ready,
}

impl TryFrom<u8> for ReadyState {
    type Error = AudioPathError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ReadyState::Unknown),
            1 => Ok(ReadyState::Suspended),
            2 => Ok(ReadyState::AudioPathBlocked),
            3 => Ok(ReadyState::Ready),
            other => Err(AudioPathError::InvalidReadyState(other)),
        }
    }
}

impl From<ReadyState> for u8 {
    fn from(state: ReadyState) -> Self {
        match state {
            ReadyState::Unknown => 0,
            ReadyState::Suspended => 1,
            ReadyState::AudioPathBlocked => 2,
            ReadyState::Ready => 3,
        }
    }
}

/// Which flags an [`Appliance::apply`] call actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplianceChange {
    /// Power flag changed.
    pub power: bool,
    /// Audio path flag changed.
    pub audio_path: bool,
}

impl ApplianceChange {
    /// Whether any flag changed.
    pub fn any(self) -> bool {
        self.power || self.audio_path
    }
}

/// Readiness gate of the appliance.
#[derive(Debug, Default)]
pub struct Appliance {
    up_and_running: Tristate,
    audio_path_ready: Tristate,
}

fn set_state(state: &mut Tristate, new_state: bool, what: &str) -> bool {
    if *state == new_state {
        warn!("Set {what} again");
        return false;
    }

    *state = new_state.into();
    true
}

impl Appliance {
    /// Power flag: true when up and running, false when suspended.
    pub fn is_up_and_running(&self) -> Tristate {
        self.up_and_running
    }

    /// Audio path flag: true when ready, false when blocked.
    pub fn is_audio_path_ready(&self) -> Tristate {
        self.audio_path_ready
    }

    /// Forget the power state.
    pub fn set_power_state_unknown(&mut self) {
        self.up_and_running = Tristate::Unknown;
    }

    /// Enter suspend mode. Returns `false` if already suspended.
    pub fn set_suspend_mode(&mut self) -> bool {
        set_state(&mut self.up_and_running, false, "suspend mode")
    }

    /// Leave suspend mode. Returns `false` if already up and running.
    pub fn set_up_and_running(&mut self) -> bool {
        set_state(&mut self.up_and_running, true, "up and running")
    }

    /// Forget the audio path state.
    pub fn set_audio_path_unknown(&mut self) {
        self.audio_path_ready = Tristate::Unknown;
    }

    /// Audio path can render. Returns `false` if it already could.
    pub fn set_audio_path_ready(&mut self) -> bool {
        set_state(&mut self.audio_path_ready, true, "audio path ready")
    }

    /// Audio path cannot render. Returns `false` if it already could not.
    pub fn set_audio_path_blocked(&mut self) -> bool {
        set_state(&mut self.audio_path_ready, false, "audio path blocked")
    }

    /// Policy check for selecting a source right away.
    pub fn activation_allowed(&self) -> bool {
        activation_allowed(self.up_and_running, self.audio_path_ready)
    }

    /// Apply a ready state received from the appliance.
    ///
    /// Only flags that differ from the current state are touched, so a
    /// partial update does not trip the repeated-value warnings; a fully
    /// repeated state is reported once.
    pub fn apply(&mut self, state: ReadyState) -> ApplianceChange {
        let (power, audio_path) = match state {
            ReadyState::Unknown => (Tristate::Unknown, Tristate::Unknown),
            ReadyState::Suspended => (Tristate::False, Tristate::False),
            ReadyState::AudioPathBlocked => (Tristate::True, Tristate::False),
            ReadyState::Ready => (Tristate::True, Tristate::True),
        };

        let change = ApplianceChange {
            power: power != self.up_and_running,
            audio_path: audio_path != self.audio_path_ready,
        };

        if !change.any() {
            warn!(?state, "Set appliance ready state again");
            return change;
        }

        if change.power {
            match power {
                Tristate::True => self.set_up_and_running(),
                Tristate::False => self.set_suspend_mode(),
                Tristate::Unknown => {
                    self.set_power_state_unknown();
                    true
                }
            };
        }

        if change.audio_path {
            match audio_path {
                Tristate::True => self.set_audio_path_ready(),
                Tristate::False => self.set_audio_path_blocked(),
                Tristate::Unknown => {
                    self.set_audio_path_unknown();
                    true
                }
            };
        }

        debug!(?state, ?change, "Appliance state applied");

        change
    }

    /// Human-readable power state.
    pub fn power_state_name(&self) -> &'static str {
        match self.up_and_running {
            Tristate::True => "running",
            Tristate::False => "suspended",
            Tristate::Unknown => "unknown",
        }
    }

    /// Human-readable audio path state.
    pub fn audio_path_state_name(&self) -> &'static str {
        match self.audio_path_ready {
            Tristate::True => "ready",
            Tristate::False => "blocked",
            Tristate::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Appliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "power {}, audio path {}",
            self.power_state_name(),
            self.audio_path_state_name()
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unknown_is_neither_true_nor_false() {
        assert!(Tristate::Unknown != true);
        assert!(Tristate::Unknown != false);
        assert!(Tristate::True == true);
        assert!(Tristate::False == false);
        assert!(Tristate::True != false);
    }

    #[test]
    fn activation_policy_treats_unknown_as_permissive() {
        use Tristate::*;

        assert!(activation_allowed(Unknown, Unknown));
        assert!(activation_allowed(True, Unknown));
        assert!(activation_allowed(Unknown, True));
        assert!(activation_allowed(True, True));
        assert!(!activation_allowed(False, Unknown));
        assert!(!activation_allowed(Unknown, False));
        assert!(!activation_allowed(True, False));
        assert!(!activation_allowed(False, True));
    }

    #[test]
    fn setting_same_value_twice_is_rejected() {
        let mut appliance = Appliance::default();

        assert!(appliance.set_up_and_running());
        assert!(!appliance.set_up_and_running());
        assert!(appliance.set_suspend_mode());
        assert!(!appliance.set_suspend_mode());

        assert!(appliance.set_audio_path_blocked());
        assert!(!appliance.set_audio_path_blocked());
        assert!(appliance.set_audio_path_ready());
        assert!(!appliance.set_audio_path_ready());
        assert!(appliance.is_audio_path_ready().is_true());
    }

    #[test]
    fn unknown_setters_always_succeed() {
        let mut appliance = Appliance::default();
        appliance.set_power_state_unknown();
        appliance.set_audio_path_unknown();

        assert_eq!(appliance.is_up_and_running(), Tristate::Unknown);
        assert!(appliance.set_suspend_mode());
        appliance.set_power_state_unknown();
        assert!(appliance.set_suspend_mode());
    }

    #[test]
    fn apply_reports_changed_flags() {
        let mut appliance = Appliance::default();

        let change = appliance.apply(ReadyState::Suspended);
        assert!(change.power && change.audio_path);
        assert!(!appliance.activation_allowed());

        let change = appliance.apply(ReadyState::AudioPathBlocked);
        assert!(change.power);
        assert!(!change.audio_path);
        assert!(!appliance.activation_allowed());

        let change = appliance.apply(ReadyState::Ready);
        assert!(!change.power);
        assert!(change.audio_path);
        assert!(appliance.activation_allowed());

        assert!(!appliance.apply(ReadyState::Ready).any());
        assert_eq!(appliance.to_string(), "power running, audio path ready");
    }

    #[test]
    fn ready_state_byte_encoding() {
        for byte in 0u8..4 {
            let state = ReadyState::try_from(byte).unwrap();
            assert_eq!(u8::from(state), byte);
        }

        assert!(matches!(
            ReadyState::try_from(4),
            Err(AudioPathError::InvalidReadyState(4))
        ));
    }
}
