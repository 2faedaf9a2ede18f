mod common;

use std::sync::Arc;

use common::{TestMatch, short_settings, spawn_of};
use islandclash::host::HostCall;
use islandclash::persistence::{
    JsonFileStore, PHASE_STATE_KEY, PersistenceGateway, TEAMS_KEY, TERRITORIES_KEY,
};
use islandclash::phase::MatchPhase;
use islandclash::territory::ElementKind;
use islandclash::zone::BlockPos;
use serde_json::json;
use uuid::Uuid;

fn file_store(dir: &tempfile::TempDir) -> Arc<dyn PersistenceGateway> {
    Arc::new(JsonFileStore::new(dir.path()))
}

#[test]
fn stored_phase_restores_without_entry_effects() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    store
        .save(PHASE_STATE_KEY, &json!({"phase": "PVP", "elapsedTicks": 500}))
        .unwrap();

    let m = TestMatch::with_store(short_settings(), store);
    assert_eq!(m.game.phase().phase(), MatchPhase::Pvp);
    assert_eq!(m.game.phase().elapsed_ticks(), 500);
    assert!(
        !m.host
            .calls()
            .iter()
            .any(|c| matches!(c, HostCall::Teleport(..) | HostCall::Combat(_)))
    );
}

#[test]
fn match_resumes_where_it_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let member = Uuid::new_v4();

    {
        let mut m = TestMatch::with_store(short_settings(), file_store(&dir));
        let directory = m.game.directory().clone();
        directory.assign_member("earth", member).unwrap();
        directory.add_points("earth", 7).unwrap();
        m.game.set_phase("build").unwrap();
        m.ticks(5);
        m.game.shutdown();
    }

    assert!(dir.path().join("phase-state.json").exists());
    assert!(dir.path().join("teams.json").exists());
    assert!(dir.path().join("territories.json").exists());

    let m = TestMatch::with_store(short_settings(), file_store(&dir));
    assert_eq!(m.game.phase().phase(), MatchPhase::Build);
    assert_eq!(m.game.phase().elapsed_ticks(), 5);

    let directory = m.game.directory();
    assert_eq!(directory.team_of_member(member), Some("earth".to_string()));
    assert_eq!(directory.team("earth").unwrap().points, 7);
    assert_eq!(
        directory.island("earth-island").unwrap().spawn,
        Some(spawn_of(ElementKind::Earth))
    );
}

#[test]
fn stored_records_win_over_seeds() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    store
        .save(
            TERRITORIES_KEY,
            &json!({
                "fire-island": {
                    "kind": "fire",
                    "vertices": [{"x": 0, "z": 0}, {"x": 4, "z": 0}, {"x": 4, "z": 4}, {"x": 0, "z": 4}],
                    "minY": 10,
                    "maxY": 20,
                    "teamName": "fire",
                    "spawnX": 1,
                    "spawnY": 11,
                    "spawnZ": 1
                }
            }),
        )
        .unwrap();

    let m = TestMatch::with_store(short_settings(), store);
    let fire = m.game.directory().island("fire-island").unwrap();
    assert_eq!(fire.spawn, Some(BlockPos::new(1, 11, 1)));
    assert_eq!(fire.territory.unwrap().max_y(), 20);

    // Islands absent from the document still get their seeds
    let ice = m.game.directory().island("ice-island").unwrap();
    assert_eq!(ice.spawn, Some(spawn_of(ElementKind::Ice)));
}

#[test]
fn bootstrap_twice_links_each_kind_once() {
    let dir = tempfile::tempdir().unwrap();
    drop(TestMatch::with_store(short_settings(), file_store(&dir)));
    let m = TestMatch::with_store(short_settings(), file_store(&dir));

    let directory = m.game.directory();
    assert_eq!(directory.islands().len(), 5);
    assert_eq!(directory.teams().len(), 5);
    for kind in ElementKind::ALL {
        let island = directory.island(&kind.island_id()).unwrap();
        assert_eq!(island.team.as_deref(), Some(kind.as_str()));
        let team = directory.team(kind.as_str()).unwrap();
        assert_eq!(team.island, Some(kind.island_id()));
    }
}

#[test]
fn malformed_documents_start_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("teams.json"), "{ not json").unwrap();
    std::fs::write(dir.path().join("phase-state.json"), "").unwrap();

    let m = TestMatch::with_store(short_settings(), file_store(&dir));
    assert_eq!(m.game.phase().phase(), MatchPhase::Lobby);
    assert_eq!(m.game.directory().teams().len(), 5);

    // Boot rewrote the teams document with the bootstrapped roster
    let teams = std::fs::read_to_string(dir.path().join("teams.json")).unwrap();
    let teams: serde_json::Value = serde_json::from_str(&teams).unwrap();
    assert_eq!(teams.as_object().unwrap().len(), 5);
}

#[test]
fn team_document_layout() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir);
    let member = Uuid::new_v4();
    {
        let m = TestMatch::with_store(short_settings(), Arc::clone(&store));
        m.game.directory().assign_member("air", member).unwrap();
        m.game.shutdown();
    }

    let teams = store.load(TEAMS_KEY).unwrap().unwrap();
    assert_eq!(
        teams["air"],
        json!({"members": [member.to_string()], "islandId": "air-island", "points": 0})
    );
}
