use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use zbus::Connection;

use super::{
    ApplianceInterface, AudioPathError, BusControlFactory, ControlFactory, Dispatcher,
    LoggingInterface, ManagerInterface, PathSwitchHandle, follow_global_log_level,
    forward_events,
};
use crate::{
    config::{BusType, Config},
    tracing_config::LogLevelHandle,
};

/// The running audio path daemon.
///
/// Owns the bus connection, the dispatcher task, the task that turns path
/// events into D-Bus signals and, with a log level handle, the task that
/// follows system-wide log level changes.
pub struct AudioPathService {
    connection: Connection,
    bus_name: String,
    handle: PathSwitchHandle,
    dispatcher: JoinHandle<()>,
    forwarder: JoinHandle<()>,
    log_follower: Option<JoinHandle<()>>,
}

impl AudioPathService {
    /// Connect to the configured bus and start serving.
    ///
    /// # Errors
    /// Returns error if the bus is unreachable, the interfaces cannot be
    /// exported, or the well-known name is taken.
    #[instrument(skip_all, fields(bus = ?config.bus.bus_type, name = %config.bus.name))]
    pub async fn start(
        config: &Config,
        levels: Option<Arc<LogLevelHandle>>,
    ) -> Result<Self, AudioPathError> {
        let connection = match config.bus.bus_type {
            BusType::Session => Connection::session().await?,
            BusType::System => Connection::system().await?,
        };

        let factory = Arc::new(BusControlFactory::new(connection.clone()));

        Self::start_with_factory(connection, config, factory, levels).await
    }

    /// Start serving on an existing connection with a custom control
    /// factory.
    ///
    /// # Errors
    /// Returns error if the interfaces cannot be exported or the well-known
    /// name is taken.
    pub async fn start_with_factory(
        connection: Connection,
        config: &Config,
        factory: Arc<dyn ControlFactory>,
        levels: Option<Arc<LogLevelHandle>>,
    ) -> Result<Self, AudioPathError> {
        let (handle, dispatcher) =
            Dispatcher::spawn(factory, config.registration.background_proxy_construction);

        if let Err(e) = export(&connection, config, &handle, levels.clone()).await {
            handle.shutdown();
            return Err(e);
        }

        let forwarder = tokio::spawn(forward_events(
            connection.clone(),
            config.bus.object_path.clone(),
            handle.subscribe(),
        ));

        let log_follower = levels.map(|levels| {
            tokio::spawn(follow_global_log_level(
                connection.clone(),
                config.bus.name.clone(),
                config.bus.object_path.clone(),
                levels,
            ))
        });

        info!(
            name = %config.bus.name,
            path = %config.bus.object_path,
            "Audio path service running"
        );

        Ok(Self {
            connection,
            bus_name: config.bus.name.clone(),
            handle,
            dispatcher,
            forwarder,
            log_follower,
        })
    }

    /// Handle for in-process use of the dispatcher.
    pub fn handle(&self) -> &PathSwitchHandle {
        &self.handle
    }

    /// Give up the bus name and stop all tasks.
    pub async fn shutdown(self) {
        if let Err(e) = self.connection.release_name(self.bus_name.as_str()).await {
            warn!(error = %e, "Failed releasing bus name");
        }

        self.handle.shutdown();

        if let Err(e) = self.dispatcher.await {
            warn!(error = %e, "Dispatcher task ended abnormally");
        }

        self.forwarder.abort();

        if let Some(log_follower) = self.log_follower {
            log_follower.abort();
        }

        info!("Audio path service stopped");
    }
}

async fn export(
    connection: &Connection,
    config: &Config,
    handle: &PathSwitchHandle,
    levels: Option<Arc<LogLevelHandle>>,
) -> Result<(), AudioPathError> {
    let server = connection.object_server();
    let path = config.bus.object_path.as_str();

    server.at(path, ManagerInterface::new(handle.clone())).await?;
    server.at(path, ApplianceInterface::new(handle.clone())).await?;
    server.at(path, LoggingInterface::new(levels)).await?;

    connection.request_name(config.bus.name.as_str()).await?;

    Ok(())
}
