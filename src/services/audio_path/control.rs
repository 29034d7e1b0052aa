use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use zbus::zvariant::OwnedValue;

/// Opaque request data passed along with a path request.
///
/// Callers attach an `a{sv}` dictionary to their requests; it is handed to
/// every remote call made on behalf of that request and to the resulting
/// event without ever being looked into. Clones share the same dictionary.
#[derive(Clone, Default)]
pub struct RequestData(Arc<HashMap<String, OwnedValue>>);

impl RequestData {
    /// Wrap a dictionary received from a caller.
    pub fn new(data: HashMap<String, OwnedValue>) -> Self {
        Self(Arc::new(data))
    }

    /// The dictionary as sent over the bus.
    pub fn as_map(&self) -> &HashMap<String, OwnedValue> {
        &self.0
    }

    /// Whether both handles refer to the very same request data.
    #[cfg(test)]
    pub(crate) fn is_same(&self, other: &RequestData) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<HashMap<String, OwnedValue>> for RequestData {
    fn from(data: HashMap<String, OwnedValue>) -> Self {
        Self::new(data)
    }
}

impl fmt::Debug for RequestData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.0.keys().collect();
        keys.sort();
        f.debug_tuple("RequestData").field(&keys).finish()
    }
}

/// Where a registered component can be reached on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Unique or well-known bus name of the component.
    pub bus_name: String,
    /// Object path implementing the player or source interface.
    pub object_path: String,
}

impl Endpoint {
    /// Create an endpoint descriptor.
    pub fn new(bus_name: impl Into<String>, object_path: impl Into<String>) -> Self {
        Self {
            bus_name: bus_name.into(),
            object_path: object_path.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bus_name, self.object_path)
    }
}

/// Remote control of a player.
#[async_trait]
pub trait PlayerControl: Send + Sync {
    /// Make the player the one rendering audio.
    async fn activate(&self, request_data: &RequestData) -> zbus::Result<()>;

    /// Tell the player it lost the audio path.
    async fn deactivate(&self, request_data: &RequestData) -> zbus::Result<()>;
}

/// Remote control of an audio source.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// The source is selected and may start playing.
    async fn select(&self, source_id: &str, request_data: &RequestData) -> zbus::Result<()>;

    /// The source is selected, but the appliance cannot render audio yet.
    async fn select_on_hold(&self, source_id: &str, request_data: &RequestData)
    -> zbus::Result<()>;

    /// The source lost the audio path, or its hold was abandoned.
    async fn deselect(&self, source_id: &str, request_data: &RequestData) -> zbus::Result<()>;
}

/// Builds control handles for newly registered components.
#[async_trait]
pub trait ControlFactory: Send + Sync {
    /// Build a player control talking to `endpoint`.
    async fn player_control(&self, endpoint: &Endpoint) -> zbus::Result<Box<dyn PlayerControl>>;

    /// Build a source control talking to `endpoint`.
    async fn source_control(&self, endpoint: &Endpoint) -> zbus::Result<Box<dyn SourceControl>>;
}
