//! Audio path arbitration.
//!
//! Players and audio sources register themselves over D-Bus. A source names
//! the player it plays through; together they form a path once both are
//! registered. At most one path owns the audio hardware at a time, and the
//! [`Switch`] sequences the remote calls needed to move ownership from one
//! path to the next. While the appliance is suspended or its audio path is
//! blocked, sources are only selected "on hold" and the activation is
//! completed once the [`Appliance`] reports readiness.

/// Appliance readiness gate
pub mod appliance;
/// Remote control abstraction for players and sources
pub mod control;
/// Single-owner command loop serving all requests
pub mod dispatch;
/// Error types
pub mod error;
/// Exported D-Bus interfaces
pub mod interface;
/// Callers waiting for a deferred activation
pub mod pending;
/// D-Bus proxies for remote players and sources
pub mod proxy;
/// Registered players and sources
pub mod registry;
/// Service bootstrap
pub mod service;
/// Path switching state machine
pub mod switch;
/// Identifier, result and event types
pub mod types;

pub use appliance::{Appliance, ApplianceChange, ReadyState, Tristate, activation_allowed};
pub use control::{ControlFactory, Endpoint, PlayerControl, RequestData, SourceControl};
pub use dispatch::{Dispatcher, PathSwitchHandle};
pub use error::AudioPathError;
pub use interface::{
    ApplianceInterface, LoggingInterface, ManagerInterface, follow_global_log_level,
    forward_events,
};
pub use pending::{GrantReply, PendingCaller, PendingCallers};
pub use proxy::BusControlFactory;
pub use registry::{PathLookup, Paths, Player, Source};
pub use service::AudioPathService;
pub use switch::Switch;
pub use types::{
    ActivateResult, Activation, AddResult, CurrentPath, Deselected, ForEachMode, PathEntry,
    PathEvent, PathGrant, PendingResolution, PlayerId, Release, ReleaseResult, SourceId,
};

#[cfg(test)]
mod tests;
