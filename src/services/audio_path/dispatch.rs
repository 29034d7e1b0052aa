use std::{collections::HashMap, sync::Arc};

use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument, warn};

use super::{
    ActivateResult, AddResult, Appliance, AudioPathError, ControlFactory, CurrentPath, Deselected,
    Endpoint, ForEachMode, GrantReply, PathEntry, PathEvent, PathGrant, Paths, PendingCaller,
    PendingCallers, PendingResolution, Player, PlayerId, ReadyState, Release, ReleaseResult,
    RequestData, Source, SourceId, Switch,
};
use crate::services::common::Property;

const EVENT_CAPACITY: usize = 64;

type Reply<T> = oneshot::Sender<Result<T, AudioPathError>>;

/// Commands processed one at a time by the dispatcher task.
enum Command {
    RegisterPlayer {
        player_id: PlayerId,
        name: String,
        endpoint: Endpoint,
        reply: Reply<AddResult>,
    },
    RegisterSource {
        source_id: SourceId,
        name: String,
        player_id: PlayerId,
        endpoint: Endpoint,
        reply: Reply<AddResult>,
    },
    PlayerControlReady {
        player: Player,
        serial: u64,
        reply: Reply<AddResult>,
    },
    SourceControlReady {
        source: Source,
        serial: u64,
        reply: Reply<AddResult>,
    },
    RequestSource {
        source_id: String,
        request_data: RequestData,
        reply: GrantReply,
    },
    ReleasePath {
        kill_player: bool,
        request_data: RequestData,
        reply: oneshot::Sender<Release>,
    },
    ActivePlayer {
        reply: oneshot::Sender<Option<(PlayerId, String)>>,
    },
    CurrentPath {
        reply: oneshot::Sender<CurrentPath>,
    },
    Paths {
        reply: oneshot::Sender<Vec<PathEntry>>,
    },
    PlayerInfo {
        player_id: String,
        reply: Reply<String>,
    },
    SourceInfo {
        source_id: String,
        reply: Reply<(String, PlayerId)>,
    },
    SetReadyState {
        state: ReadyState,
        reply: oneshot::Sender<()>,
    },
    ApplianceState {
        reply: oneshot::Sender<(&'static str, &'static str)>,
    },
    Shutdown,
}

/// Cloneable front end of the dispatcher task.
///
/// Every method posts a command and waits for the dispatcher to process it,
/// so operations take effect strictly in the order they were issued.
#[derive(Clone)]
pub struct PathSwitchHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<PathEvent>,
    current_path: Property<CurrentPath>,
}

impl PathSwitchHandle {
    async fn call<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, AudioPathError> {
        let (tx, rx) = oneshot::channel();

        self.commands
            .send(command(tx))
            .map_err(|_| AudioPathError::ServiceUnavailable)?;

        rx.await.map_err(|_| AudioPathError::ServiceUnavailable)
    }

    /// Register a player, or replace the endpoint of a known one.
    ///
    /// # Errors
    /// Returns error if id or name is empty, or the control handle cannot
    /// be built for `endpoint`.
    pub async fn register_player(
        &self,
        player_id: &str,
        name: &str,
        endpoint: Endpoint,
    ) -> Result<AddResult, AudioPathError> {
        if player_id.is_empty() {
            return Err(AudioPathError::EmptyArgument("player ID"));
        }

        if name.is_empty() {
            return Err(AudioPathError::EmptyArgument("player name"));
        }

        self.call(|reply| Command::RegisterPlayer {
            player_id: PlayerId::from(player_id),
            name: name.to_string(),
            endpoint,
            reply,
        })
        .await?
    }

    /// Register an audio source, or replace the endpoint of a known one.
    ///
    /// # Errors
    /// Returns error if any of the strings is empty, or the control handle
    /// cannot be built for `endpoint`.
    pub async fn register_source(
        &self,
        source_id: &str,
        name: &str,
        player_id: &str,
        endpoint: Endpoint,
    ) -> Result<AddResult, AudioPathError> {
        if source_id.is_empty() {
            return Err(AudioPathError::EmptyArgument("source ID"));
        }

        if name.is_empty() {
            return Err(AudioPathError::EmptyArgument("source name"));
        }

        if player_id.is_empty() {
            return Err(AudioPathError::EmptyArgument("player ID"));
        }

        self.call(|reply| Command::RegisterSource {
            source_id: SourceId::from(source_id),
            name: name.to_string(),
            player_id: PlayerId::from(player_id),
            endpoint,
            reply,
        })
        .await?
    }

    /// Request the audio path for `source_id`.
    ///
    /// If the appliance is not ready, this waits until the deferred
    /// activation is completed, canceled or superseded.
    ///
    /// # Errors
    /// Returns error if the source or its player is unknown, a remote call
    /// failed, or the request was superseded while waiting.
    pub async fn request_source(
        &self,
        source_id: &str,
        request_data: RequestData,
    ) -> Result<PathGrant, AudioPathError> {
        self.call(|reply| Command::RequestSource {
            source_id: source_id.to_string(),
            request_data,
            reply,
        })
        .await?
    }

    /// Release the audio path, optionally deactivating the player.
    ///
    /// # Errors
    /// Returns error if the dispatcher is not running.
    pub async fn release_path(
        &self,
        kill_player: bool,
        request_data: RequestData,
    ) -> Result<Release, AudioPathError> {
        self.call(|reply| Command::ReleasePath {
            kill_player,
            request_data,
            reply,
        })
        .await
    }

    /// Id and name of the active player.
    ///
    /// # Errors
    /// Returns error if the dispatcher is not running.
    pub async fn active_player(&self) -> Result<Option<(PlayerId, String)>, AudioPathError> {
        self.call(|reply| Command::ActivePlayer { reply }).await
    }

    /// Selected source, active player and pending source.
    ///
    /// # Errors
    /// Returns error if the dispatcher is not running.
    pub async fn current_path(&self) -> Result<CurrentPath, AudioPathError> {
        self.call(|reply| Command::CurrentPath { reply }).await
    }

    /// Watchable view of the current path, updated after every command.
    pub fn current_path_monitored(&self) -> Property<CurrentPath> {
        self.current_path.clone()
    }

    /// All registered sources and players, paired where possible.
    ///
    /// # Errors
    /// Returns error if the dispatcher is not running.
    pub async fn paths(&self) -> Result<Vec<PathEntry>, AudioPathError> {
        self.call(|reply| Command::Paths { reply }).await
    }

    /// Name of a registered player.
    ///
    /// # Errors
    /// Returns error if no such player is registered.
    pub async fn player_info(&self, player_id: &str) -> Result<String, AudioPathError> {
        self.call(|reply| Command::PlayerInfo {
            player_id: player_id.to_string(),
            reply,
        })
        .await?
    }

    /// Name and player of a registered source.
    ///
    /// # Errors
    /// Returns error if no such source is registered.
    pub async fn source_info(&self, source_id: &str) -> Result<(String, PlayerId), AudioPathError> {
        self.call(|reply| Command::SourceInfo {
            source_id: source_id.to_string(),
            reply,
        })
        .await?
    }

    /// Apply an appliance ready state, resolving a pending activation.
    ///
    /// # Errors
    /// Returns error if `state` is not a known ready state encoding.
    pub async fn set_ready_state(&self, state: u8) -> Result<(), AudioPathError> {
        let state = ReadyState::try_from(state)?;
        self.call(|reply| Command::SetReadyState { state, reply })
            .await
    }

    /// Power and audio path state names of the appliance.
    ///
    /// # Errors
    /// Returns error if the dispatcher is not running.
    pub async fn appliance_state(&self) -> Result<(&'static str, &'static str), AudioPathError> {
        self.call(|reply| Command::ApplianceState { reply }).await
    }

    /// Receive path events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PathEvent> {
        self.events.subscribe()
    }

    /// Ask the dispatcher to stop. Queued callers are failed.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

/// Single owner of registry, switch and appliance state.
pub struct Dispatcher {
    paths: Paths,
    switch: Switch,
    appliance: Appliance,
    pending_callers: PendingCallers,
    factory: Arc<dyn ControlFactory>,
    background_construction: bool,
    registration_serial: u64,
    player_registrations: HashMap<PlayerId, u64>,
    source_registrations: HashMap<SourceId, u64>,
    events: broadcast::Sender<PathEvent>,
    current_path: Property<CurrentPath>,
    commands: mpsc::WeakUnboundedSender<Command>,
}

fn grant(
    result: ActivateResult,
    source_id: &str,
    player_id: Option<&PlayerId>,
) -> Result<PathGrant, AudioPathError> {
    match result {
        ActivateResult::ErrorSourceUnknown if source_id.is_empty() => {
            Err(AudioPathError::EmptyArgument("source ID"))
        }
        ActivateResult::ErrorSourceUnknown => Err(AudioPathError::SourceUnknown(source_id.into())),
        ActivateResult::ErrorPlayerUnknown => Err(AudioPathError::PlayerUnknown(source_id.into())),
        ActivateResult::ErrorPlayerFailed => Err(AudioPathError::PlayerFailed(
            player_id.map(PlayerId::to_string).unwrap_or_default(),
        )),
        ActivateResult::ErrorSourceFailed => Err(AudioPathError::SourceFailed(source_id.into())),
        ok => match player_id {
            Some(player_id) => Ok(PathGrant {
                player_id: player_id.clone(),
                player_switched: ok.player_switched(),
            }),
            None => {
                error!(source = source_id, ?ok, "BUG: Successful activation without player");
                Err(AudioPathError::PlayerUnknown(source_id.into()))
            }
        },
    }
}

impl Dispatcher {
    /// Start the dispatcher task.
    ///
    /// With `background_construction`, control handles for registering
    /// components are built in separate tasks and inserted once ready, so
    /// a slow endpoint does not hold up other requests. Only the latest
    /// registration of an id is inserted; earlier ones still under
    /// construction fail with [`AudioPathError::Superseded`].
    pub fn spawn(
        factory: Arc<dyn ControlFactory>,
        background_construction: bool,
    ) -> (PathSwitchHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let current_path = Property::new(CurrentPath::default());

        let dispatcher = Dispatcher {
            paths: Paths::new(),
            switch: Switch::new(),
            appliance: Appliance::default(),
            pending_callers: PendingCallers::new(),
            factory,
            background_construction,
            registration_serial: 0,
            player_registrations: HashMap::new(),
            source_registrations: HashMap::new(),
            events: events.clone(),
            current_path: current_path.clone(),
            commands: commands_tx.downgrade(),
        };

        let handle = PathSwitchHandle {
            commands: commands_tx,
            events,
            current_path,
        };

        (handle, tokio::spawn(dispatcher.run(commands_rx)))
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        info!("Audio path dispatcher started");

        while let Some(command) = commands.recv().await {
            if matches!(command, Command::Shutdown) {
                break;
            }

            self.handle_command(command).await;
            self.current_path.set(self.switch.current_path());
        }

        let abandoned = self
            .pending_callers
            .complete_all(|| Err(AudioPathError::ServiceUnavailable));

        info!(abandoned, "Audio path dispatcher stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::RegisterPlayer {
                player_id,
                name,
                endpoint,
                reply,
            } => self.register_player(player_id, name, endpoint, reply).await,
            Command::RegisterSource {
                source_id,
                name,
                player_id,
                endpoint,
                reply,
            } => {
                self.register_source(source_id, name, player_id, endpoint, reply)
                    .await
            }
            Command::PlayerControlReady {
                player,
                serial,
                reply,
            } => {
                let result = if self.player_registrations.get(player.id()) == Some(&serial) {
                    Ok(self.insert_player(player))
                } else {
                    debug!(player = %player.id(), serial, "Dropping control of superseded registration");
                    Err(AudioPathError::Superseded)
                };
                let _ = reply.send(result);
            }
            Command::SourceControlReady {
                source,
                serial,
                reply,
            } => {
                let result = if self.source_registrations.get(source.id()) == Some(&serial) {
                    Ok(self.insert_source(source))
                } else {
                    debug!(source = %source.id(), serial, "Dropping control of superseded registration");
                    Err(AudioPathError::Superseded)
                };
                let _ = reply.send(result);
            }
            Command::RequestSource {
                source_id,
                request_data,
                reply,
            } => self.request_source(source_id, request_data, reply).await,
            Command::ReleasePath {
                kill_player,
                request_data,
                reply,
            } => {
                let release = self.release_path(kill_player, request_data).await;
                let _ = reply.send(release);
            }
            Command::ActivePlayer { reply } => {
                let active = self.switch.player_id().and_then(|id| {
                    self.paths
                        .lookup_player(id.as_str())
                        .map(|player| (id.clone(), player.name().to_string()))
                });
                let _ = reply.send(active);
            }
            Command::CurrentPath { reply } => {
                let _ = reply.send(self.switch.current_path());
            }
            Command::Paths { reply } => {
                let mut entries = Vec::new();
                self.paths.for_each(ForEachMode::Any, |source, player| {
                    entries.push(PathEntry {
                        source_id: source.map(|s| s.id().clone()),
                        player_id: player.map(|p| p.id().clone()),
                    });
                });
                let _ = reply.send(entries);
            }
            Command::PlayerInfo { player_id, reply } => {
                let info = self
                    .paths
                    .lookup_player(&player_id)
                    .map(|player| player.name().to_string())
                    .ok_or(AudioPathError::PlayerNotRegistered(player_id));
                let _ = reply.send(info);
            }
            Command::SourceInfo { source_id, reply } => {
                let info = self
                    .paths
                    .lookup_source(&source_id)
                    .map(|source| (source.name().to_string(), source.player_id().clone()))
                    .ok_or(AudioPathError::SourceUnknown(source_id));
                let _ = reply.send(info);
            }
            Command::SetReadyState { state, reply } => {
                self.set_ready_state(state).await;
                let _ = reply.send(());
            }
            Command::ApplianceState { reply } => {
                let _ = reply.send((
                    self.appliance.power_state_name(),
                    self.appliance.audio_path_state_name(),
                ));
            }
            Command::Shutdown => {}
        }
    }

    #[instrument(skip(self, endpoint, reply), fields(endpoint = %endpoint))]
    async fn register_player(
        &mut self,
        player_id: PlayerId,
        name: String,
        endpoint: Endpoint,
        reply: Reply<AddResult>,
    ) {
        if !self.background_construction {
            let result = match self.factory.player_control(&endpoint).await {
                Ok(control) => Ok(self.insert_player(Player::new(player_id, name, control))),
                Err(e) => {
                    error!(error = %e, "Failed creating player proxy");
                    Err(e.into())
                }
            };
            let _ = reply.send(result);
            return;
        }

        let serial = self.next_registration_serial();
        self.player_registrations.insert(player_id.clone(), serial);

        let factory = Arc::clone(&self.factory);
        let commands = self.commands.clone();

        tokio::spawn(async move {
            let control = match factory.player_control(&endpoint).await {
                Ok(control) => control,
                Err(e) => {
                    error!(player = %player_id, error = %e, "Failed creating player proxy");
                    let _ = reply.send(Err(e.into()));
                    return;
                }
            };

            let Some(commands) = commands.upgrade() else {
                let _ = reply.send(Err(AudioPathError::ServiceUnavailable));
                return;
            };

            let player = Player::new(player_id, name, control);

            if let Err(mpsc::error::SendError(Command::PlayerControlReady { reply, .. })) =
                commands.send(Command::PlayerControlReady {
                    player,
                    serial,
                    reply,
                })
            {
                let _ = reply.send(Err(AudioPathError::ServiceUnavailable));
            }
        });
    }

    #[instrument(skip(self, endpoint, reply), fields(endpoint = %endpoint))]
    async fn register_source(
        &mut self,
        source_id: SourceId,
        name: String,
        player_id: PlayerId,
        endpoint: Endpoint,
        reply: Reply<AddResult>,
    ) {
        if !self.background_construction {
            let result = match self.factory.source_control(&endpoint).await {
                Ok(control) => Ok(self.insert_source(Source::new(source_id, name, player_id, control))),
                Err(e) => {
                    error!(error = %e, "Failed creating audio source proxy");
                    Err(e.into())
                }
            };
            let _ = reply.send(result);
            return;
        }

        let serial = self.next_registration_serial();
        self.source_registrations.insert(source_id.clone(), serial);

        let factory = Arc::clone(&self.factory);
        let commands = self.commands.clone();

        tokio::spawn(async move {
            let control = match factory.source_control(&endpoint).await {
                Ok(control) => control,
                Err(e) => {
                    error!(source = %source_id, error = %e, "Failed creating audio source proxy");
                    let _ = reply.send(Err(e.into()));
                    return;
                }
            };

            let Some(commands) = commands.upgrade() else {
                let _ = reply.send(Err(AudioPathError::ServiceUnavailable));
                return;
            };

            let source = Source::new(source_id, name, player_id, control);

            if let Err(mpsc::error::SendError(Command::SourceControlReady { reply, .. })) =
                commands.send(Command::SourceControlReady {
                    source,
                    serial,
                    reply,
                })
            {
                let _ = reply.send(Err(AudioPathError::ServiceUnavailable));
            }
        });
    }

    fn next_registration_serial(&mut self) -> u64 {
        self.registration_serial += 1;
        self.registration_serial
    }

    fn insert_player(&mut self, player: Player) -> AddResult {
        let id = player.id().clone();
        let name = player.name().to_string();
        let result = self.paths.add_player(player);

        if result.is_new() {
            info!(player = %id, name = %name, complete_path = result.is_path(), "Registered player");
        } else {
            info!(player = %id, complete_path = result.is_path(), "Updated player");
        }

        result
    }

    fn insert_source(&mut self, source: Source) -> AddResult {
        let id = source.id().clone();
        let name = source.name().to_string();
        let player_id = source.player_id().clone();
        let result = self.paths.add_source(source);

        if result.is_new() {
            info!(
                source = %id,
                name = %name,
                player = %player_id,
                complete_path = result.is_path(),
                "Registered audio source"
            );
        } else {
            info!(source = %id, complete_path = result.is_path(), "Updated audio source");
        }

        result
    }

    fn supersede_pending_callers(&mut self) {
        let superseded = self.pending_callers.supersede_all();

        if superseded > 0 {
            debug!(superseded, "Failed callers of abandoned pending activation");
        }
    }

    #[instrument(skip(self, request_data, reply))]
    async fn request_source(
        &mut self,
        source_id: String,
        request_data: RequestData,
        reply: GrantReply,
    ) {
        let select_now = self.appliance.activation_allowed();
        let already_pending = self
            .switch
            .pending_source_id()
            .is_some_and(|id| id.as_str() == source_id);

        let activation = self
            .switch
            .activate_source(&self.paths, &source_id, select_now, &request_data)
            .await;

        if activation.deselected == Deselected::Pending {
            self.supersede_pending_callers();
        }

        if activation.result.is_deferred() {
            if !already_pending {
                match activation.player_id.clone() {
                    Some(player_id) => {
                        let _ = self.events.send(PathEvent::Deferred {
                            source_id: SourceId::from(source_id.as_str()),
                            player_id,
                            request_data: request_data.clone(),
                        });
                    }
                    None => error!("BUG: Deferred activation without player"),
                }
            }

            debug!(queued = self.pending_callers.len() + 1, "Caller waits for appliance");
            self.pending_callers
                .push(PendingCaller::new(reply, request_data));
            return;
        }

        let result = grant(activation.result, &source_id, activation.player_id.as_ref());

        if let Err(e) = &result {
            warn!(result = ?activation.result, error = %e, "Audio source request failed");
        }

        if matches!(
            activation.result,
            ActivateResult::OkPlayerSame | ActivateResult::OkPlayerSwitched
        ) {
            if let Some(player_id) = activation.player_id {
                let _ = self.events.send(PathEvent::Activated {
                    source_id: SourceId::from(source_id),
                    player_id,
                    request_data,
                });
            }
        }

        let _ = reply.send(result);
    }

    async fn release_path(&mut self, kill_player: bool, request_data: RequestData) -> Release {
        let release = self
            .switch
            .release_path(&self.paths, kill_player, &request_data)
            .await;

        if release.deselected == Deselected::Pending {
            self.supersede_pending_callers();
        }

        if release.result != ReleaseResult::Unchanged {
            let _ = self.events.send(PathEvent::Released {
                player_id: release.player_id.clone(),
                request_data,
            });
        }

        release
    }

    #[instrument(skip(self))]
    async fn set_ready_state(&mut self, state: ReadyState) {
        let change = self.appliance.apply(state);

        if !self.switch.has_pending() {
            return;
        }

        if self.appliance.activation_allowed() {
            let resolution = self
                .switch
                .complete_pending_source_activation(&self.paths)
                .await;
            self.resolve_pending_callers(resolution, true);
        } else if change.power && self.appliance.is_up_and_running().is_false() {
            let resolution = self
                .switch
                .cancel_pending_source_activation(&self.paths)
                .await;
            self.resolve_pending_callers(resolution, false);
        } else {
            debug!(appliance = %self.appliance, "Pending activation keeps waiting");
        }
    }

    fn resolve_pending_callers(&mut self, resolution: PendingResolution, completed: bool) {
        let PendingResolution {
            result,
            source_id,
            request_data,
        } = resolution;

        let Some(source_id) = source_id else {
            return;
        };

        let player_id = self.switch.player_id().cloned();
        let answered = self
            .pending_callers
            .complete_all(|| grant(result, source_id.as_str(), player_id.as_ref()));

        info!(
            source = %source_id,
            ?result,
            answered,
            completed,
            "Pending audio source activation resolved"
        );

        if completed && result.is_ok() {
            if let (Some(player_id), Some(request_data)) = (player_id, request_data) {
                let _ = self.events.send(PathEvent::Activated {
                    source_id,
                    player_id,
                    request_data,
                });
            }
        }
    }
}
