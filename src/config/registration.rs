use serde::{Deserialize, Serialize};

/// Settings for processing player and source registrations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrationConfig {
    /// Build remote control proxies in a background task and insert the
    /// component once the proxy is ready. When disabled, the proxy is built
    /// inline before the registration is answered.
    #[serde(default = "default_background")]
    pub background_proxy_construction: bool,
}

fn default_background() -> bool {
    true
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            background_proxy_construction: default_background(),
        }
    }
}
