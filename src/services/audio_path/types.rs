use crate::component_id;

component_id!(
    /// Identifier of a registered player
    PlayerId
);

component_id!(
    /// Identifier of a registered audio source
    SourceId
);

/// Outcome of registering a player or a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddResult {
    /// First registration, counterpart not registered yet.
    NewComponent,
    /// Re-registration, counterpart not registered yet.
    UpdatedComponent,
    /// First registration, and the component now forms a complete path.
    NewPath,
    /// Re-registration of a component that is part of a complete path.
    UpdatedPath,
}

impl AddResult {
    pub(crate) fn classify(is_new: bool, has_path: bool) -> Self {
        match (is_new, has_path) {
            (true, false) => AddResult::NewComponent,
            (false, false) => AddResult::UpdatedComponent,
            (true, true) => AddResult::NewPath,
            (false, true) => AddResult::UpdatedPath,
        }
    }

    /// Whether the component was registered for the first time.
    pub fn is_new(self) -> bool {
        matches!(self, AddResult::NewComponent | AddResult::NewPath)
    }

    /// Whether the component is part of a complete path.
    pub fn is_path(self) -> bool {
        matches!(self, AddResult::NewPath | AddResult::UpdatedPath)
    }
}

/// Filter for [`Paths::for_each`](super::Paths::for_each).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForEachMode {
    /// Complete paths, sources without player, and players without source.
    Any,
    /// Sources whose player is registered.
    #[default]
    CompletePaths,
    /// Sources without player and players without source.
    IncompletePaths,
    /// Sources whose player is not registered.
    UnconnectedSources,
    /// Players no source refers to.
    UnconnectedPlayers,
}

impl ForEachMode {
    pub(crate) fn visits_sources(self) -> bool {
        self != ForEachMode::UnconnectedPlayers
    }

    pub(crate) fn emits_complete(self) -> bool {
        matches!(self, ForEachMode::Any | ForEachMode::CompletePaths)
    }

    pub(crate) fn emits_unconnected_sources(self) -> bool {
        matches!(
            self,
            ForEachMode::Any | ForEachMode::IncompletePaths | ForEachMode::UnconnectedSources
        )
    }

    pub(crate) fn emits_unconnected_players(self) -> bool {
        matches!(
            self,
            ForEachMode::Any | ForEachMode::IncompletePaths | ForEachMode::UnconnectedPlayers
        )
    }
}

/// Result of an attempt to activate an audio source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivateResult {
    /// Empty or unregistered source id, or nothing pending.
    ErrorSourceUnknown,
    /// The source rejected selection.
    ErrorSourceFailed,
    /// The source is registered, its player is not.
    ErrorPlayerUnknown,
    /// The player rejected activation.
    ErrorPlayerFailed,
    /// The requested source is already active.
    OkUnchanged,
    /// Source switched, player stayed the same.
    OkPlayerSame,
    /// Source and player switched.
    OkPlayerSwitched,
    /// Player stayed the same, source selection waits for the appliance.
    OkPlayerSameSourceDeferred,
    /// Player switched, source selection waits for the appliance.
    OkPlayerSwitchedSourceDeferred,
}

impl ActivateResult {
    /// Whether this is one of the `Ok*` results, deferred ones included.
    pub fn is_ok(self) -> bool {
        !self.is_error()
    }

    /// Whether this is one of the `Error*` results.
    pub fn is_error(self) -> bool {
        matches!(
            self,
            ActivateResult::ErrorSourceUnknown
                | ActivateResult::ErrorSourceFailed
                | ActivateResult::ErrorPlayerUnknown
                | ActivateResult::ErrorPlayerFailed
        )
    }

    /// Whether source selection is waiting for the appliance.
    pub fn is_deferred(self) -> bool {
        matches!(
            self,
            ActivateResult::OkPlayerSameSourceDeferred
                | ActivateResult::OkPlayerSwitchedSourceDeferred
        )
    }

    /// Whether the player changed during this activation.
    pub fn player_switched(self) -> bool {
        matches!(
            self,
            ActivateResult::OkPlayerSwitched | ActivateResult::OkPlayerSwitchedSourceDeferred
        )
    }

    pub(crate) fn deferred(self) -> Self {
        match self {
            ActivateResult::OkPlayerSame => ActivateResult::OkPlayerSameSourceDeferred,
            ActivateResult::OkPlayerSwitched => ActivateResult::OkPlayerSwitchedSourceDeferred,
            other => other,
        }
    }
}

/// Result of releasing the current audio path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseResult {
    /// A source was deselected, the player was kept.
    SourceDeselected,
    /// No source was active, the player was deactivated.
    PlayerDeactivated,
    /// Source deselected and player deactivated.
    CompleteRelease,
    /// Nothing was active.
    Unchanged,
}

impl ReleaseResult {
    pub(crate) fn classify(source_deselected: bool, player_deactivated: bool) -> Self {
        match (source_deselected, player_deactivated) {
            (true, true) => ReleaseResult::CompleteRelease,
            (true, false) => ReleaseResult::SourceDeselected,
            (false, true) => ReleaseResult::PlayerDeactivated,
            (false, false) => ReleaseResult::Unchanged,
        }
    }
}

/// Which source slot a switch operation deselected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deselected {
    /// Neither slot was occupied.
    #[default]
    Nothing,
    /// The active source was deselected.
    Active,
    /// The pending activation was abandoned.
    Pending,
}

/// Everything [`Switch::activate_source`](super::Switch::activate_source) reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Outcome tag.
    pub result: ActivateResult,
    /// Player that is (or was attempted to be) associated with the source.
    pub player_id: Option<PlayerId>,
    /// Slot that was deselected on the way.
    pub deselected: Deselected,
}

/// Everything [`Switch::release_path`](super::Switch::release_path) reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Outcome tag.
    pub result: ReleaseResult,
    /// Player still active after the release.
    pub player_id: Option<PlayerId>,
    /// Slot that was deselected.
    pub deselected: Deselected,
}

/// Outcome of completing or canceling a pending activation.
#[derive(Debug, Clone)]
pub struct PendingResolution {
    /// Outcome tag; `ErrorSourceUnknown` when nothing was pending.
    pub result: ActivateResult,
    /// Source that was pending.
    pub source_id: Option<SourceId>,
    /// Request data stored with the pending activation.
    pub request_data: Option<super::RequestData>,
}

/// The source/player pair currently holding the audio path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CurrentPath {
    /// Selected source.
    pub source_id: Option<SourceId>,
    /// Active player.
    pub player_id: Option<PlayerId>,
    /// Source waiting for the appliance.
    pub pending_source_id: Option<SourceId>,
}

/// Reply for a granted source request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathGrant {
    /// Player now associated with the requested source.
    pub player_id: PlayerId,
    /// Whether the player changed to serve the request.
    pub player_switched: bool,
}

/// One entry of a path listing; either side may be missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    /// Source of the pair, if any.
    pub source_id: Option<SourceId>,
    /// Player of the pair, if registered.
    pub player_id: Option<PlayerId>,
}

/// Notifications emitted by the dispatcher.
#[derive(Debug, Clone)]
pub enum PathEvent {
    /// Source selected and its player active.
    Activated {
        /// Selected source.
        source_id: SourceId,
        /// Active player.
        player_id: PlayerId,
        /// Request data of the activation.
        request_data: super::RequestData,
    },
    /// Player active, source waits for the appliance.
    Deferred {
        /// Source on hold.
        source_id: SourceId,
        /// Active player.
        player_id: PlayerId,
        /// Request data of the activation.
        request_data: super::RequestData,
    },
    /// Path released.
    Released {
        /// Player still active, if it was kept.
        player_id: Option<PlayerId>,
        /// Request data of the release.
        request_data: super::RequestData,
    },
}
