use std::{collections::HashMap, sync::Arc};

use futures::StreamExt;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use zbus::{
    Connection, fdo, interface,
    message::Header,
    object_server::SignalEmitter,
    proxy::CacheProperties,
    zvariant::{ObjectPath, OwnedValue},
};

use super::{
    AudioPathError, Endpoint, PathEvent, PathSwitchHandle, RequestData,
    proxy::DebugLoggingConfigProxy,
};
use crate::{config::LogLevel, tracing_config::LogLevelHandle};

fn endpoint(header: &Header<'_>, path: &ObjectPath<'_>) -> fdo::Result<Endpoint> {
    let sender = header
        .sender()
        .ok_or_else(|| fdo::Error::InvalidArgs("Registration without sender".to_string()))?;

    Ok(Endpoint::new(sender.to_string(), path.to_string()))
}

fn id_or_empty(id: Option<impl ToString>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

/// `de.tahifi.AudioPath.Manager`: registration and path requests.
pub struct ManagerInterface {
    handle: PathSwitchHandle,
}

impl ManagerInterface {
    /// Serve manager calls through `handle`.
    pub fn new(handle: PathSwitchHandle) -> Self {
        Self { handle }
    }
}

#[interface(name = "de.tahifi.AudioPath.Manager")]
impl ManagerInterface {
    async fn register_player(
        &self,
        player_id: &str,
        player_name: &str,
        path: ObjectPath<'_>,
        #[zbus(header)] header: Header<'_>,
    ) -> fdo::Result<()> {
        let endpoint = endpoint(&header, &path)?;
        debug!(player_id, player_name, %endpoint, "RegisterPlayer");

        self.handle
            .register_player(player_id, player_name, endpoint)
            .await?;

        Ok(())
    }

    async fn register_source(
        &self,
        source_id: &str,
        source_name: &str,
        player_id: &str,
        path: ObjectPath<'_>,
        #[zbus(header)] header: Header<'_>,
    ) -> fdo::Result<()> {
        let endpoint = endpoint(&header, &path)?;
        debug!(source_id, source_name, player_id, %endpoint, "RegisterSource");

        self.handle
            .register_source(source_id, source_name, player_id, endpoint)
            .await?;

        Ok(())
    }

    async fn request_source(
        &self,
        source_id: &str,
        request_data: HashMap<String, OwnedValue>,
    ) -> fdo::Result<(String, bool)> {
        debug!(source_id, "RequestSource");

        let grant = self
            .handle
            .request_source(source_id, RequestData::new(request_data))
            .await?;

        Ok((grant.player_id.to_string(), grant.player_switched))
    }

    async fn release_path(
        &self,
        deactivate_player: bool,
        request_data: HashMap<String, OwnedValue>,
    ) -> fdo::Result<()> {
        debug!(deactivate_player, "ReleasePath");

        self.handle
            .release_path(deactivate_player, RequestData::new(request_data))
            .await?;

        Ok(())
    }

    async fn get_active_player(&self) -> fdo::Result<(String, String)> {
        Ok(self.handle.active_player().await?.map_or_else(
            || (String::new(), String::new()),
            |(id, name)| (id.to_string(), name),
        ))
    }

    async fn get_current_path(&self) -> fdo::Result<(String, String)> {
        let path = self.handle.current_path().await?;
        Ok((id_or_empty(path.source_id), id_or_empty(path.player_id)))
    }

    async fn get_paths(&self) -> fdo::Result<Vec<(String, String)>> {
        let paths = self.handle.paths().await?;

        Ok(paths
            .into_iter()
            .map(|entry| (id_or_empty(entry.source_id), id_or_empty(entry.player_id)))
            .collect())
    }

    async fn get_player_info(&self, player_id: &str) -> fdo::Result<String> {
        Ok(self.handle.player_info(player_id).await?)
    }

    async fn get_source_info(&self, source_id: &str) -> fdo::Result<(String, String)> {
        let (name, player_id) = self.handle.source_info(source_id).await?;
        Ok((name, player_id.to_string()))
    }

    #[zbus(signal)]
    async fn path_activated(
        emitter: &SignalEmitter<'_>,
        source_id: &str,
        player_id: &str,
        request_data: &HashMap<String, OwnedValue>,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn path_deferred(
        emitter: &SignalEmitter<'_>,
        source_id: &str,
        player_id: &str,
        request_data: &HashMap<String, OwnedValue>,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    async fn path_released(
        emitter: &SignalEmitter<'_>,
        player_id: &str,
        request_data: &HashMap<String, OwnedValue>,
    ) -> zbus::Result<()>;
}

/// `de.tahifi.AudioPath.Appliance`: readiness reports from the appliance.
pub struct ApplianceInterface {
    handle: PathSwitchHandle,
}

impl ApplianceInterface {
    /// Serve appliance calls through `handle`.
    pub fn new(handle: PathSwitchHandle) -> Self {
        Self { handle }
    }
}

#[interface(name = "de.tahifi.AudioPath.Appliance")]
impl ApplianceInterface {
    async fn set_ready_state(&self, state: u8) -> fdo::Result<()> {
        debug!(state, "SetReadyState");
        Ok(self.handle.set_ready_state(state).await?)
    }

    async fn get_state(&self) -> fdo::Result<(String, String)> {
        let (power, audio_path) = self.handle.appliance_state().await?;
        Ok((power.to_string(), audio_path.to_string()))
    }
}

/// `de.tahifi.Debug.Logging`: runtime log level.
pub struct LoggingInterface {
    levels: Option<Arc<LogLevelHandle>>,
}

impl LoggingInterface {
    /// Without a handle, the level can be queried as "unknown" but not set.
    pub fn new(levels: Option<Arc<LogLevelHandle>>) -> Self {
        Self { levels }
    }
}

#[interface(name = "de.tahifi.Debug.Logging")]
impl LoggingInterface {
    /// Set a new level and return the previous one. An empty string only
    /// queries.
    fn debug_level(&self, new_level: &str) -> fdo::Result<String> {
        let Some(levels) = &self.levels else {
            return if new_level.is_empty() {
                Ok("unknown".to_string())
            } else {
                Err(fdo::Error::NotSupported(
                    "Log level is not adjustable".to_string(),
                ))
            };
        };

        if new_level.is_empty() {
            return Ok(levels.current().to_string());
        }

        Ok(apply_log_level(levels, new_level)?.to_string())
    }
}

/// Switch to the level named `new_level` and return the previous one.
fn apply_log_level(levels: &LogLevelHandle, new_level: &str) -> fdo::Result<LogLevel> {
    let level: LogLevel = new_level
        .parse()
        .map_err(|_| AudioPathError::InvalidLogLevel(new_level.to_string()))?;

    let previous = levels
        .set(level)
        .map_err(|e| fdo::Error::Failed(e.to_string()))?;

    info!(%previous, %level, "Log level changed");

    Ok(previous)
}

/// Apply log levels announced through `de.tahifi.Debug.LoggingConfig`
/// until the bus connection goes away.
pub async fn follow_global_log_level(
    connection: Connection,
    bus_name: String,
    object_path: String,
    levels: Arc<LogLevelHandle>,
) {
    if let Err(e) = receive_global_log_levels(&connection, bus_name, object_path, &levels).await {
        warn!(error = %e, "Not following global log level changes");
    }

    debug!("Global log level follower stopped");
}

async fn receive_global_log_levels(
    connection: &Connection,
    bus_name: String,
    object_path: String,
    levels: &LogLevelHandle,
) -> zbus::Result<()> {
    let proxy = DebugLoggingConfigProxy::builder(connection)
        .destination(bus_name)?
        .path(object_path)?
        .cache_properties(CacheProperties::No)
        .build()
        .await?;

    let mut changes = proxy.receive_global_debug_level_changed().await?;

    while let Some(signal) = changes.next().await {
        let args = match signal.args() {
            Ok(args) => args,
            Err(e) => {
                warn!(error = %e, "Malformed global log level signal");
                continue;
            }
        };

        if let Err(e) = apply_log_level(levels, args.new_level()) {
            warn!(error = %e, "Ignoring global log level change");
        }
    }

    Ok(())
}

/// Re-emit path events as manager signals until the dispatcher goes away.
pub async fn forward_events(
    connection: Connection,
    object_path: String,
    mut events: broadcast::Receiver<PathEvent>,
) {
    let emitter = match SignalEmitter::new(&connection, object_path) {
        Ok(emitter) => emitter,
        Err(e) => {
            warn!(error = %e, "Cannot emit path signals");
            return;
        }
    };

    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(missed)) => {
                warn!(missed, "Path signal forwarder lagged behind");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let result = match &event {
            PathEvent::Activated {
                source_id,
                player_id,
                request_data,
            } => {
                ManagerInterface::path_activated(
                    &emitter,
                    source_id.as_str(),
                    player_id.as_str(),
                    request_data.as_map(),
                )
                .await
            }
            PathEvent::Deferred {
                source_id,
                player_id,
                request_data,
            } => {
                ManagerInterface::path_deferred(
                    &emitter,
                    source_id.as_str(),
                    player_id.as_str(),
                    request_data.as_map(),
                )
                .await
            }
            PathEvent::Released {
                player_id,
                request_data,
            } => {
                let player_id = player_id.as_ref().map(|id| id.as_str()).unwrap_or_default();
                ManagerInterface::path_released(&emitter, player_id, request_data.as_map()).await
            }
        };

        if let Err(e) = result {
            warn!(?event, error = %e, "Failed emitting path signal");
        }
    }

    debug!("Path signal forwarder stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_ids_become_empty_strings() {
        assert_eq!(id_or_empty(None::<&str>), "");
        assert_eq!(id_or_empty(Some("pl1")), "pl1");
    }

    #[test]
    fn announced_level_replaces_current_one() {
        let (_layer, levels) = LogLevelHandle::detached(LogLevel::Info);

        assert_eq!(apply_log_level(&levels, "Debug").unwrap(), LogLevel::Info);
        assert_eq!(levels.current(), LogLevel::Debug);

        assert_eq!(apply_log_level(&levels, " warning ").unwrap(), LogLevel::Debug);
        assert_eq!(levels.current(), LogLevel::Warn);
    }

    #[test]
    fn unknown_level_name_keeps_current_one() {
        let (_layer, levels) = LogLevelHandle::detached(LogLevel::Trace);

        let error = apply_log_level(&levels, "chatty").unwrap_err();

        assert!(matches!(error, fdo::Error::InvalidArgs(_)));
        assert_eq!(levels.current(), LogLevel::Trace);
    }
}
