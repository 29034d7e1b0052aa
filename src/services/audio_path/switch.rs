use tracing::{debug, error, info, instrument, warn};

use super::{
    ActivateResult, Activation, CurrentPath, Deselected, PathLookup, Paths, PendingResolution,
    Player, PlayerId, Release, ReleaseResult, RequestData, Source, SourceId,
};

#[derive(Debug)]
struct PendingActivation {
    source_id: SourceId,
    request_data: RequestData,
    phase_one: ActivateResult,
}

/// Owner of the audio path.
///
/// Tracks which source is selected, which player renders it, and at most
/// one source activation that waits for the appliance to become ready. All
/// remote calls are issued in protocol order and never retried; failures are
/// reported through the returned result tags.
#[derive(Debug, Default)]
pub struct Switch {
    current_source_id: Option<SourceId>,
    current_player_id: Option<PlayerId>,
    pending: Option<PendingActivation>,
}

async fn activate_player(player: &Player, request_data: &RequestData) -> bool {
    debug!(player = %player.id(), name = player.name(), "Activate player");

    match player.control().activate(request_data).await {
        Ok(()) => true,
        Err(e) => {
            error!(player = %player.id(), error = %e, "Activating player failed");
            false
        }
    }
}

async fn deactivate_player(paths: &Paths, player_id: &PlayerId, request_data: &RequestData) {
    let player = paths.lookup_player(player_id.as_str());
    debug_assert!(player.is_some(), "active player {player_id} not registered");

    let Some(player) = player else {
        error!(player = %player_id, "BUG: Active player not registered");
        return;
    };

    debug!(player = %player.id(), name = player.name(), "Deactivate player");

    if let Err(e) = player.control().deactivate(request_data).await {
        error!(player = %player.id(), error = %e, "Deactivating player failed");
    }
}

async fn select_source(source: &Source, on_hold: bool, request_data: &RequestData) -> bool {
    let id = source.id().as_str();

    let result = if on_hold {
        debug!(source = id, name = source.name(), "Select audio source on hold");
        source.control().select_on_hold(id, request_data).await
    } else {
        debug!(source = id, name = source.name(), "Select audio source");
        source.control().select(id, request_data).await
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            error!(source = id, on_hold, error = %e, "Selecting audio source failed");
            false
        }
    }
}

async fn deselect_source(paths: &Paths, source_id: &SourceId, request_data: &RequestData) -> bool {
    let source = paths.lookup_source(source_id.as_str());
    debug_assert!(source.is_some(), "selected source {source_id} not registered");

    let Some(source) = source else {
        error!(source = %source_id, "BUG: Selected audio source not registered");
        return false;
    };

    debug!(source = %source_id, name = source.name(), "Deselect audio source");

    match source.control().deselect(source_id.as_str(), request_data).await {
        Ok(()) => true,
        Err(e) => {
            error!(source = %source_id, error = %e, "Deselecting audio source failed");
            false
        }
    }
}

impl Switch {
    /// Create an idle switch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Active player, if any.
    pub fn player_id(&self) -> Option<&PlayerId> {
        self.current_player_id.as_ref()
    }

    /// Selected source, if any.
    pub fn source_id(&self) -> Option<&SourceId> {
        self.current_source_id.as_ref()
    }

    /// Source waiting for the appliance, if any.
    pub fn pending_source_id(&self) -> Option<&SourceId> {
        self.pending.as_ref().map(|p| &p.source_id)
    }

    /// Whether a source activation is waiting for the appliance.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Snapshot of all three slots.
    pub fn current_path(&self) -> CurrentPath {
        CurrentPath {
            source_id: self.current_source_id.clone(),
            player_id: self.current_player_id.clone(),
            pending_source_id: self.pending_source_id().cloned(),
        }
    }

    fn check_exclusive_slots(&self) {
        let both = self.current_source_id.is_some() && self.pending.is_some();

        if both {
            error!(
                source = ?self.current_source_id,
                pending = ?self.pending_source_id(),
                "BUG: Pending activation coexists with selected audio source"
            );
        }

        debug_assert!(!both, "pending activation coexists with selected source");
    }

    fn drop_pending(&mut self) -> Deselected {
        match self.pending.take() {
            Some(pending) => {
                debug!(source = %pending.source_id, "Dropping pending audio source activation");
                Deselected::Pending
            }
            None => Deselected::Nothing,
        }
    }

    async fn deselect_current(&mut self, paths: &Paths, request_data: &RequestData) -> Deselected {
        self.check_exclusive_slots();

        if let Some(source_id) = self.current_source_id.take() {
            deselect_source(paths, &source_id, request_data).await;
            Deselected::Active
        } else if let Some(pending) = self.pending.take() {
            deselect_source(paths, &pending.source_id, request_data).await;
            Deselected::Pending
        } else {
            Deselected::Nothing
        }
    }

    /// Make `source_id` the selected source, switching players as needed.
    ///
    /// With `select_now` unset the source is only told to get ready and the
    /// activation is parked until [`Switch::complete_pending_source_activation`]
    /// or [`Switch::cancel_pending_source_activation`] resolves it.
    #[instrument(skip(self, paths, request_data))]
    pub async fn activate_source(
        &mut self,
        paths: &Paths,
        source_id: &str,
        select_now: bool,
        request_data: &RequestData,
    ) -> Activation {
        if source_id.is_empty() {
            error!("Empty audio source ID");
            return Activation {
                result: ActivateResult::ErrorSourceUnknown,
                player_id: None,
                deselected: self.drop_pending(),
            };
        }

        if self
            .current_source_id
            .as_ref()
            .is_some_and(|id| id.as_str() == source_id)
        {
            self.check_exclusive_slots();
            debug!("Audio source not changed");

            return Activation {
                result: ActivateResult::OkUnchanged,
                player_id: self.current_player_id.clone(),
                deselected: Deselected::Nothing,
            };
        }

        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.source_id.as_str() == source_id)
        {
            debug!("Audio source activation already pending");

            return Activation {
                result: ActivateResult::OkPlayerSwitchedSourceDeferred,
                player_id: self.current_player_id.clone(),
                deselected: Deselected::Nothing,
            };
        }

        let (source, player) = match paths.lookup_path(source_id) {
            PathLookup::Complete(source, player) => (source, player),
            PathLookup::UnknownSource => {
                warn!("Unknown audio source");
                return Activation {
                    result: ActivateResult::ErrorSourceUnknown,
                    player_id: None,
                    deselected: self.drop_pending(),
                };
            }
            PathLookup::MissingPlayer(source) => {
                debug!(
                    player = %source.player_id(),
                    name = source.name(),
                    "Player for audio source not registered"
                );
                return Activation {
                    result: ActivateResult::ErrorPlayerUnknown,
                    player_id: None,
                    deselected: self.drop_pending(),
                };
            }
        };

        let deselected = self.deselect_current(paths, request_data).await;
        let players_changed = self.current_player_id.as_ref() != Some(player.id());

        if players_changed {
            if let Some(old_player_id) = self.current_player_id.take() {
                deactivate_player(paths, &old_player_id, request_data).await;
            }

            if !activate_player(player, request_data).await {
                return Activation {
                    result: ActivateResult::ErrorPlayerFailed,
                    player_id: Some(player.id().clone()),
                    deselected,
                };
            }

            self.current_player_id = Some(player.id().clone());
        }

        let phase_one = if players_changed {
            ActivateResult::OkPlayerSwitched
        } else {
            ActivateResult::OkPlayerSame
        };

        if !select_source(source, !select_now, request_data).await {
            return Activation {
                result: ActivateResult::ErrorSourceFailed,
                player_id: Some(player.id().clone()),
                deselected,
            };
        }

        let result = if select_now {
            self.current_source_id = Some(source.id().clone());
            phase_one
        } else {
            info!(source = %source.id(), "Audio source activation deferred");
            self.pending = Some(PendingActivation {
                source_id: source.id().clone(),
                request_data: request_data.clone(),
                phase_one,
            });
            phase_one.deferred()
        };

        Activation {
            result,
            player_id: Some(player.id().clone()),
            deselected,
        }
    }

    /// Finish a parked activation with the final select call.
    ///
    /// Returns `ErrorSourceUnknown` when nothing is pending.
    #[instrument(skip_all)]
    pub async fn complete_pending_source_activation(&mut self, paths: &Paths) -> PendingResolution {
        let Some(pending) = self.pending.take() else {
            return PendingResolution {
                result: ActivateResult::ErrorSourceUnknown,
                source_id: None,
                request_data: None,
            };
        };

        debug!(source = %pending.source_id, "Completing pending audio source activation");

        let source = paths.lookup_source(pending.source_id.as_str());
        debug_assert!(source.is_some(), "pending source not registered");

        let selected = match source {
            Some(source) => select_source(source, false, &pending.request_data).await,
            None => {
                error!(source = %pending.source_id, "BUG: Pending audio source not registered");
                false
            }
        };

        let result = if selected {
            self.current_source_id = Some(pending.source_id.clone());
            pending.phase_one
        } else {
            ActivateResult::ErrorSourceFailed
        };

        PendingResolution {
            result,
            source_id: Some(pending.source_id),
            request_data: Some(pending.request_data),
        }
    }

    /// Abandon a parked activation and tell its source.
    ///
    /// The player activated for it stays active. Returns
    /// `ErrorSourceUnknown` when nothing is pending.
    #[instrument(skip_all)]
    pub async fn cancel_pending_source_activation(&mut self, paths: &Paths) -> PendingResolution {
        let Some(pending) = self.pending.take() else {
            return PendingResolution {
                result: ActivateResult::ErrorSourceUnknown,
                source_id: None,
                request_data: None,
            };
        };

        debug!(source = %pending.source_id, "Canceling pending audio source activation");

        self.current_source_id = None;

        let result = if deselect_source(paths, &pending.source_id, &pending.request_data).await {
            ActivateResult::OkPlayerSwitched
        } else {
            ActivateResult::ErrorSourceFailed
        };

        PendingResolution {
            result,
            source_id: Some(pending.source_id),
            request_data: Some(pending.request_data),
        }
    }

    /// Deselect the selected or pending source, and with `kill_player` also
    /// deactivate the active player.
    #[instrument(skip(self, paths, request_data))]
    pub async fn release_path(
        &mut self,
        paths: &Paths,
        kill_player: bool,
        request_data: &RequestData,
    ) -> Release {
        debug!(
            source = ?self.current_source_id,
            pending = ?self.pending_source_id(),
            "Release current audio path"
        );

        let deselected = self.deselect_current(paths, request_data).await;

        let player_deactivated = match self.current_player_id.take() {
            Some(player_id) if kill_player => {
                deactivate_player(paths, &player_id, request_data).await;
                true
            }
            keep => {
                self.current_player_id = keep;
                false
            }
        };

        Release {
            result: ReleaseResult::classify(deselected != Deselected::Nothing, player_deactivated),
            player_id: self.current_player_id.clone(),
            deselected,
        }
    }
}
