use std::collections::{BTreeMap, HashSet, btree_map::Entry};

use tracing::debug;

use super::{AddResult, ForEachMode, PlayerControl, PlayerId, SourceControl, SourceId};

/// A registered player.
pub struct Player {
    id: PlayerId,
    name: String,
    control: Box<dyn PlayerControl>,
}

impl Player {
    /// Create a player around its remote control handle.
    pub fn new(id: PlayerId, name: impl Into<String>, control: Box<dyn PlayerControl>) -> Self {
        Self {
            id,
            name: name.into(),
            control,
        }
    }

    /// Player identifier.
    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    /// Display name given at first registration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remote control handle.
    pub fn control(&self) -> &dyn PlayerControl {
        self.control.as_ref()
    }

    fn take_control_from(&mut self, other: Player) {
        self.control = other.control;
    }
}

/// A registered audio source.
pub struct Source {
    id: SourceId,
    name: String,
    player_id: PlayerId,
    control: Box<dyn SourceControl>,
}

impl Source {
    /// Create a source around its remote control handle.
    ///
    /// `player_id` may name a player that has not registered yet.
    pub fn new(
        id: SourceId,
        name: impl Into<String>,
        player_id: PlayerId,
        control: Box<dyn SourceControl>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            player_id,
            control,
        }
    }

    /// Source identifier.
    pub fn id(&self) -> &SourceId {
        &self.id
    }

    /// Display name given at first registration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Player this source plays through.
    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    /// Remote control handle.
    pub fn control(&self) -> &dyn SourceControl {
        self.control.as_ref()
    }

    fn take_control_from(&mut self, other: Source) {
        self.control = other.control;
    }
}

/// Result of resolving a source id into a path.
pub enum PathLookup<'a> {
    /// No source with that id.
    UnknownSource,
    /// The source is registered, its player is not.
    MissingPlayer(&'a Source),
    /// Source and player are both registered.
    Complete(&'a Source, &'a Player),
}

impl PathLookup<'_> {
    /// Whether source and player are both registered.
    pub fn is_complete(&self) -> bool {
        matches!(self, PathLookup::Complete(..))
    }
}

/// All registered players and sources.
///
/// Sources refer to their player by id only; whether a source has a usable
/// path is resolved on every lookup.
#[derive(Default)]
pub struct Paths {
    players: BTreeMap<PlayerId, Player>,
    sources: BTreeMap<SourceId, Source>,
}

impl Paths {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a player, or replace the control handle of a known one.
    ///
    /// Name and id of an already registered player are kept.
    pub fn add_player(&mut self, player: Player) -> AddResult {
        let id = player.id.clone();

        let is_new = match self.players.entry(id.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(player);
                true
            }
            Entry::Occupied(mut entry) => {
                debug!(player = %id, "Replacing control handle of registered player");
                entry.get_mut().take_control_from(player);
                false
            }
        };

        let has_path = self.sources.values().any(|s| s.player_id == id);

        AddResult::classify(is_new, has_path)
    }

    /// Insert a source, or replace the control handle of a known one.
    ///
    /// Name and player id of an already registered source are kept.
    pub fn add_source(&mut self, source: Source) -> AddResult {
        let id = source.id.clone();

        let (is_new, player_id) = match self.sources.entry(id.clone()) {
            Entry::Vacant(entry) => {
                let player_id = source.player_id.clone();
                entry.insert(source);
                (true, player_id)
            }
            Entry::Occupied(mut entry) => {
                debug!(source = %id, "Replacing control handle of registered source");
                let existing = entry.get_mut();
                existing.take_control_from(source);
                (false, existing.player_id.clone())
            }
        };

        AddResult::classify(is_new, self.players.contains_key(&player_id))
    }

    /// Find a player by id.
    pub fn lookup_player(&self, player_id: &str) -> Option<&Player> {
        self.players.get(player_id)
    }

    /// Find a source by id.
    pub fn lookup_source(&self, source_id: &str) -> Option<&Source> {
        self.sources.get(source_id)
    }

    /// Resolve a source id into the source and its player.
    pub fn lookup_path(&self, source_id: &str) -> PathLookup<'_> {
        let Some(source) = self.lookup_source(source_id) else {
            return PathLookup::UnknownSource;
        };

        match self.players.get(&source.player_id) {
            Some(player) => PathLookup::Complete(source, player),
            None => PathLookup::MissingPlayer(source),
        }
    }

    /// Number of registered players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Number of registered sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Visit source/player pairs selected by `mode`.
    ///
    /// Sources come first in id order, each with its player if registered;
    /// players no source refers to follow, also in id order.
    pub fn for_each<F>(&self, mode: ForEachMode, mut visit: F)
    where
        F: FnMut(Option<&Source>, Option<&Player>),
    {
        if mode.visits_sources() {
            for source in self.sources.values() {
                match self.players.get(&source.player_id) {
                    Some(player) if mode.emits_complete() => visit(Some(source), Some(player)),
                    Some(_) => {}
                    None if mode.emits_unconnected_sources() => visit(Some(source), None),
                    None => {}
                }
            }
        }

        if mode.emits_unconnected_players() {
            let referenced: HashSet<&PlayerId> =
                self.sources.values().map(|s| &s.player_id).collect();

            for player in self.players.values() {
                if !referenced.contains(&player.id) {
                    visit(None, Some(player));
                }
            }
        }
    }
}
