use serde::{Deserialize, Serialize};

/// Which message bus the daemon connects to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusType {
    /// The per-user session bus, mostly useful for development.
    Session,

    /// The system bus (default on the appliance).
    #[default]
    System,
}

/// D-Bus connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusConfig {
    /// Bus to connect to.
    #[serde(default)]
    pub bus_type: BusType,

    /// Well-known name owned by the daemon.
    #[serde(default = "default_bus_name")]
    pub name: String,

    /// Object path all interfaces are exported at.
    #[serde(default = "default_object_path")]
    pub object_path: String,
}

fn default_bus_name() -> String {
    "de.tahifi.TAPSwitch".to_string()
}

fn default_object_path() -> String {
    "/de/tahifi/TAPSwitch".to_string()
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            bus_type: BusType::default(),
            name: default_bus_name(),
            object_path: default_object_path(),
        }
    }
}
