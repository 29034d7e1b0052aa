#![allow(missing_docs)]

use std::collections::HashMap;

use async_trait::async_trait;
use zbus::{Connection, Result, proxy, proxy::CacheProperties, zvariant::OwnedValue};

use super::{ControlFactory, Endpoint, PlayerControl, RequestData, SourceControl};

/// Player side of an audio path
///
/// Implemented by every player that registers itself with the switch.
#[proxy(interface = "de.tahifi.AudioPath.Player")]
pub trait AudioPathPlayer {
    /// The player owns the audio path now
    fn activate(&self, request_data: &HashMap<String, OwnedValue>) -> Result<()>;

    /// The player lost the audio path
    fn deactivate(&self, request_data: &HashMap<String, OwnedValue>) -> Result<()>;
}

/// Source side of an audio path
///
/// Implemented by every audio source that registers itself with the switch.
#[proxy(interface = "de.tahifi.AudioPath.Source")]
pub trait AudioPathSource {
    /// Source selected, playback may start
    fn selected(&self, source_id: &str, request_data: &HashMap<String, OwnedValue>)
    -> Result<()>;

    /// Source selected, but the appliance is not ready to render audio
    fn selected_on_hold(
        &self,
        source_id: &str,
        request_data: &HashMap<String, OwnedValue>,
    ) -> Result<()>;

    /// Source deselected
    fn deselected(
        &self,
        source_id: &str,
        request_data: &HashMap<String, OwnedValue>,
    ) -> Result<()>;
}

/// Client view of the manager interface exported by the daemon
#[proxy(
    interface = "de.tahifi.AudioPath.Manager",
    default_service = "de.tahifi.TAPSwitch",
    default_path = "/de/tahifi/TAPSwitch"
)]
pub trait AudioPathManager {
    fn request_source(
        &self,
        source_id: &str,
        request_data: HashMap<&str, zbus::zvariant::Value<'_>>,
    ) -> Result<(String, bool)>;

    fn release_path(
        &self,
        deactivate_player: bool,
        request_data: HashMap<&str, zbus::zvariant::Value<'_>>,
    ) -> Result<()>;

    fn get_active_player(&self) -> Result<(String, String)>;

    fn get_current_path(&self) -> Result<(String, String)>;

    fn get_paths(&self) -> Result<Vec<(String, String)>>;

    fn get_player_info(&self, player_id: &str) -> Result<String>;

    fn get_source_info(&self, source_id: &str) -> Result<(String, String)>;
}

/// Client view of the appliance interface exported by the daemon
#[proxy(
    interface = "de.tahifi.AudioPath.Appliance",
    default_service = "de.tahifi.TAPSwitch",
    default_path = "/de/tahifi/TAPSwitch"
)]
pub trait AudioPathAppliance {
    fn set_ready_state(&self, state: u8) -> Result<()>;

    fn get_state(&self) -> Result<(String, String)>;
}

/// Client view of the runtime log level interface exported by the daemon
#[proxy(
    interface = "de.tahifi.Debug.Logging",
    default_service = "de.tahifi.TAPSwitch",
    default_path = "/de/tahifi/TAPSwitch"
)]
pub trait DebugLogging {
    fn debug_level(&self, new_level: &str) -> Result<String>;
}

/// System-wide log level announcements
#[proxy(interface = "de.tahifi.Debug.LoggingConfig")]
pub trait DebugLoggingConfig {
    #[zbus(signal)]
    fn global_debug_level_changed(&self, new_level: &str) -> Result<()>;
}

#[async_trait]
impl PlayerControl for AudioPathPlayerProxy<'static> {
    async fn activate(&self, request_data: &RequestData) -> Result<()> {
        AudioPathPlayerProxy::activate(self, request_data.as_map()).await
    }

    async fn deactivate(&self, request_data: &RequestData) -> Result<()> {
        AudioPathPlayerProxy::deactivate(self, request_data.as_map()).await
    }
}

#[async_trait]
impl SourceControl for AudioPathSourceProxy<'static> {
    async fn select(&self, source_id: &str, request_data: &RequestData) -> Result<()> {
        self.selected(source_id, request_data.as_map()).await
    }

    async fn select_on_hold(&self, source_id: &str, request_data: &RequestData) -> Result<()> {
        self.selected_on_hold(source_id, request_data.as_map()).await
    }

    async fn deselect(&self, source_id: &str, request_data: &RequestData) -> Result<()> {
        self.deselected(source_id, request_data.as_map()).await
    }
}

/// Builds proxies for registered components on a bus connection.
#[derive(Clone)]
pub struct BusControlFactory {
    connection: Connection,
}

impl BusControlFactory {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl ControlFactory for BusControlFactory {
    async fn player_control(&self, endpoint: &Endpoint) -> Result<Box<dyn PlayerControl>> {
        let proxy = AudioPathPlayerProxy::builder(&self.connection)
            .destination(endpoint.bus_name.clone())?
            .path(endpoint.object_path.clone())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;

        Ok(Box::new(proxy))
    }

    async fn source_control(&self, endpoint: &Endpoint) -> Result<Box<dyn SourceControl>> {
        let proxy = AudioPathSourceProxy::builder(&self.connection)
            .destination(endpoint.bus_name.clone())?
            .path(endpoint.object_path.clone())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;

        Ok(Box::new(proxy))
    }
}
