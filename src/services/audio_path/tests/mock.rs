//! Recording player and source controls.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::services::audio_path::{
    Paths, Player, PlayerControl, PlayerId, RequestData, Source, SourceControl, SourceId,
};

/// A remote call as seen by a mock component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) enum Call {
    Activate(&'static str),
    Deactivate(&'static str),
    Select(String),
    SelectOnHold(String),
    Deselect(String),
}

impl Call {
    pub(super) fn select(source_id: &str) -> Self {
        Call::Select(source_id.to_string())
    }

    pub(super) fn select_on_hold(source_id: &str) -> Self {
        Call::SelectOnHold(source_id.to_string())
    }

    pub(super) fn deselect(source_id: &str) -> Self {
        Call::Deselect(source_id.to_string())
    }
}

/// Shared log of every call made on mocks created from it.
#[derive(Clone, Default)]
pub(super) struct CallLog {
    calls: Arc<Mutex<Vec<(Call, RequestData)>>>,
    failing: Arc<Mutex<HashSet<Call>>>,
}

impl CallLog {
    fn record(&self, call: Call, request_data: &RequestData) -> zbus::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((call.clone(), request_data.clone()));

        if self.failing.lock().unwrap().contains(&call) {
            Err(zbus::Error::Failure(format!("{call:?} rejected")))
        } else {
            Ok(())
        }
    }

    /// Make every future occurrence of `call` fail.
    pub(super) fn fail(&self, call: Call) {
        self.failing.lock().unwrap().insert(call);
    }

    /// Let `call` succeed again.
    pub(super) fn heal(&self, call: &Call) {
        self.failing.lock().unwrap().remove(call);
    }

    /// Calls made since the last take.
    pub(super) fn take(&self) -> Vec<Call> {
        self.take_with_data()
            .into_iter()
            .map(|(call, _)| call)
            .collect()
    }

    /// Calls made since the last take, with the request data they carried.
    pub(super) fn take_with_data(&self) -> Vec<(Call, RequestData)> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }
}

pub(super) struct MockPlayer {
    label: &'static str,
    log: CallLog,
}

#[async_trait]
impl PlayerControl for MockPlayer {
    async fn activate(&self, request_data: &RequestData) -> zbus::Result<()> {
        self.log.record(Call::Activate(self.label), request_data)
    }

    async fn deactivate(&self, request_data: &RequestData) -> zbus::Result<()> {
        self.log.record(Call::Deactivate(self.label), request_data)
    }
}

pub(super) struct MockSource {
    log: CallLog,
}

#[async_trait]
impl SourceControl for MockSource {
    async fn select(&self, source_id: &str, request_data: &RequestData) -> zbus::Result<()> {
        self.log.record(Call::select(source_id), request_data)
    }

    async fn select_on_hold(&self, source_id: &str, request_data: &RequestData) -> zbus::Result<()> {
        self.log.record(Call::select_on_hold(source_id), request_data)
    }

    async fn deselect(&self, source_id: &str, request_data: &RequestData) -> zbus::Result<()> {
        self.log.record(Call::deselect(source_id), request_data)
    }
}

/// Player whose calls are logged under `label`.
pub(super) fn player_labeled(id: &str, label: &'static str, log: &CallLog) -> Player {
    Player::new(
        PlayerId::from(id),
        format!("Player {id}"),
        Box::new(MockPlayer {
            label,
            log: log.clone(),
        }),
    )
}

pub(super) fn player(id: &'static str, log: &CallLog) -> Player {
    player_labeled(id, id, log)
}

pub(super) fn source(id: &str, player_id: &str, log: &CallLog) -> Source {
    Source::new(
        SourceId::from(id),
        format!("Source {id}"),
        PlayerId::from(player_id),
        Box::new(MockSource { log: log.clone() }),
    )
}

/// Sources `srcA1` and `srcB1` play through `pl1`, `srcC2` through `pl2`,
/// `srcE3` through `pl3`; `srcD-` refers to the unregistered player `pl-`.
pub(super) fn fixture() -> (Paths, CallLog) {
    let log = CallLog::default();
    let mut paths = Paths::new();

    paths.add_source(source("srcA1", "pl1", &log));
    paths.add_source(source("srcB1", "pl1", &log));
    paths.add_source(source("srcC2", "pl2", &log));
    paths.add_source(source("srcD-", "pl-", &log));
    paths.add_source(source("srcE3", "pl3", &log));

    paths.add_player(player("pl1", &log));
    paths.add_player(player("pl2", &log));
    paths.add_player(player("pl3", &log));

    (paths, log)
}
