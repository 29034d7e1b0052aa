use super::mock::{Call, CallLog, player, player_labeled, source};
use crate::services::audio_path::{AddResult, ForEachMode, PathLookup, Paths, RequestData};

fn collect(paths: &Paths, mode: ForEachMode) -> Vec<(Option<String>, Option<String>)> {
    let mut visited = Vec::new();

    paths.for_each(mode, |source, player| {
        visited.push((
            source.map(|s| s.id().to_string()),
            player.map(|p| p.id().to_string()),
        ));
    });

    visited
}

fn pair(source: Option<&str>, player: Option<&str>) -> (Option<String>, Option<String>) {
    (source.map(String::from), player.map(String::from))
}

#[test]
fn player_then_source_forms_path() {
    let log = CallLog::default();
    let mut paths = Paths::new();

    assert_eq!(paths.add_player(player("pl1", &log)), AddResult::NewComponent);
    assert_eq!(
        paths.add_source(source("srcA1", "pl1", &log)),
        AddResult::NewPath
    );
    assert_eq!(
        paths.add_source(source("srcX", "plX", &log)),
        AddResult::NewComponent
    );
}

#[test]
fn source_then_player_forms_path() {
    let log = CallLog::default();
    let mut paths = Paths::new();

    assert_eq!(
        paths.add_source(source("srcA1", "pl1", &log)),
        AddResult::NewComponent
    );
    assert_eq!(paths.add_player(player("pl1", &log)), AddResult::NewPath);
    assert_eq!(paths.player_count(), 1);
    assert_eq!(paths.source_count(), 1);
}

#[test]
fn reregistration_reports_update() {
    let log = CallLog::default();
    let mut paths = Paths::new();

    paths.add_player(player("pl2", &log));
    assert_eq!(paths.add_player(player("pl2", &log)), AddResult::UpdatedComponent);

    paths.add_source(source("srcA1", "pl1", &log));
    assert_eq!(
        paths.add_source(source("srcA1", "pl1", &log)),
        AddResult::UpdatedComponent
    );

    paths.add_player(player("pl1", &log));
    assert_eq!(
        paths.add_source(source("srcA1", "pl1", &log)),
        AddResult::UpdatedPath
    );
    assert_eq!(paths.add_player(player("pl1", &log)), AddResult::UpdatedPath);
    assert_eq!(paths.player_count(), 2);
    assert_eq!(paths.source_count(), 1);
}

#[test]
fn reregistered_source_keeps_name_and_player() {
    let log = CallLog::default();
    let mut paths = Paths::new();

    paths.add_source(source("srcA1", "pl1", &log));
    paths.add_source(source("srcA1", "pl9", &log));

    let source = paths.lookup_source("srcA1").unwrap();
    assert_eq!(source.name(), "Source srcA1");
    assert_eq!(source.player_id().as_str(), "pl1");
}

#[tokio::test]
async fn reregistered_player_gets_new_control() {
    let log = CallLog::default();
    let mut paths = Paths::new();

    paths.add_player(player_labeled("pl1", "first", &log));
    paths.add_player(player_labeled("pl1", "second", &log));

    let player = paths.lookup_player("pl1").unwrap();
    assert_eq!(player.name(), "Player pl1");

    player
        .control()
        .activate(&RequestData::default())
        .await
        .unwrap();
    assert_eq!(log.take(), vec![Call::Activate("second")]);
}

#[test]
fn lookups_never_construct() {
    let log = CallLog::default();
    let mut paths = Paths::new();
    paths.add_source(source("srcA1", "pl1", &log));

    assert!(paths.lookup_player("pl1").is_none());
    assert!(paths.lookup_source("srcB1").is_none());
    assert_eq!(paths.player_count(), 0);
    assert_eq!(paths.source_count(), 1);
}

#[test]
fn lookup_path_distinguishes_unknown_source_from_missing_player() {
    let log = CallLog::default();
    let mut paths = Paths::new();
    paths.add_source(source("srcA1", "pl1", &log));

    assert!(matches!(
        paths.lookup_path("srcB1"),
        PathLookup::UnknownSource
    ));

    match paths.lookup_path("srcA1") {
        PathLookup::MissingPlayer(source) => assert_eq!(source.player_id().as_str(), "pl1"),
        _ => panic!("expected missing player"),
    }

    paths.add_player(player("pl1", &log));

    match paths.lookup_path("srcA1") {
        PathLookup::Complete(source, player) => {
            assert_eq!(source.id().as_str(), "srcA1");
            assert_eq!(player.id().as_str(), "pl1");
        }
        _ => panic!("expected complete path"),
    }
    assert!(paths.lookup_path("srcA1").is_complete());
}

fn mixed_registry() -> Paths {
    let log = CallLog::default();
    let mut paths = Paths::new();

    paths.add_source(source("srcA1", "pl1", &log));
    paths.add_source(source("srcB2", "pl2", &log));
    paths.add_source(source("srcC1", "pl1", &log));
    paths.add_player(player("pl1", &log));
    paths.add_player(player("pl3", &log));

    paths
}

#[test]
fn for_each_defaults_to_complete_paths() {
    let paths = mixed_registry();

    assert_eq!(ForEachMode::default(), ForEachMode::CompletePaths);
    assert_eq!(
        collect(&paths, ForEachMode::default()),
        vec![
            pair(Some("srcA1"), Some("pl1")),
            pair(Some("srcC1"), Some("pl1")),
        ]
    );
}

#[test]
fn for_each_any_lists_everything_sources_first() {
    let paths = mixed_registry();

    assert_eq!(
        collect(&paths, ForEachMode::Any),
        vec![
            pair(Some("srcA1"), Some("pl1")),
            pair(Some("srcB2"), None),
            pair(Some("srcC1"), Some("pl1")),
            pair(None, Some("pl3")),
        ]
    );
}

#[test]
fn for_each_incomplete_and_unconnected_modes() {
    let paths = mixed_registry();

    assert_eq!(
        collect(&paths, ForEachMode::IncompletePaths),
        vec![pair(Some("srcB2"), None), pair(None, Some("pl3"))]
    );
    assert_eq!(
        collect(&paths, ForEachMode::UnconnectedSources),
        vec![pair(Some("srcB2"), None)]
    );
    assert_eq!(
        collect(&paths, ForEachMode::UnconnectedPlayers),
        vec![pair(None, Some("pl3"))]
    );
}

#[test]
fn sources_without_player_never_appear_as_complete_paths() {
    let paths = mixed_registry();

    for id in ["srcA1", "srcB2", "srcC1", "srcZ"] {
        if paths.lookup_path(id).is_complete() {
            continue;
        }

        let listed = collect(&paths, ForEachMode::CompletePaths)
            .into_iter()
            .any(|(source, _)| source.as_deref() == Some(id));
        assert!(!listed, "{id} listed as complete path");
    }
}

#[test]
fn empty_registry_visits_nothing() {
    let paths = Paths::new();

    for mode in [
        ForEachMode::Any,
        ForEachMode::CompletePaths,
        ForEachMode::IncompletePaths,
        ForEachMode::UnconnectedSources,
        ForEachMode::UnconnectedPlayers,
    ] {
        assert!(collect(&paths, mode).is_empty());
    }
}
