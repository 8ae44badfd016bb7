use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use fpl_terminal::models::Position;
use fpl_terminal::persist::{
    self, Autosave, DRAFT_VERSION, FileStorage, MemoryStorage, OptimizerSettings,
    PlannerSettings, Storage, keys,
};
use fpl_terminal::transfer_planner::{PlannerPlayer, TransferPlan};
use fpl_terminal::wildcard::{WildcardPlayer, WildcardSquad};

fn squad_with_keeper() -> WildcardSquad {
    let mut squad = WildcardSquad::new(1000);
    squad
        .add_player(
            Position::Goalkeeper,
            WildcardPlayer {
                id: 1,
                web_name: "Raya".to_string(),
                team: "ARS".to_string(),
                team_id: Some(1),
                position: Position::Goalkeeper,
                now_cost: 55,
                total_points: 70,
                form: Some(4.5),
            },
            false,
        )
        .expect("keeper fits");
    squad
}

#[test]
fn file_storage_round_trips_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("storage.json");

    let mut storage = FileStorage::open(path.clone());
    assert!(storage.get(keys::WILDCARD_CODE).is_none());
    storage
        .set(keys::WILDCARD_CODE, "WC-1".to_string())
        .expect("write");
    storage
        .set(keys::PLANNER_HORIZON, "4".to_string())
        .expect("write");
    storage.remove(keys::PLANNER_HORIZON).expect("remove");

    let reopened = FileStorage::open(path.clone());
    assert_eq!(reopened.get(keys::WILDCARD_CODE).as_deref(), Some("WC-1"));
    assert!(reopened.get(keys::PLANNER_HORIZON).is_none());
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn corrupt_or_foreign_store_opens_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let corrupt = dir.path().join("corrupt.json");
    fs::write(&corrupt, "{not json").expect("write");
    assert!(FileStorage::open(corrupt).get(keys::WILDCARD_CODE).is_none());

    let future = dir.path().join("future.json");
    fs::write(
        &future,
        r#"{"version": 99, "entries": {"wildcard_code": "WC-9"}}"#,
    )
    .expect("write");
    assert!(FileStorage::open(future).get(keys::WILDCARD_CODE).is_none());
}

#[test]
fn storage_path_prefers_explicit_data_dir() {
    let path = persist::storage_path(Some(Path::new("/tmp/fpl"))).expect("path");
    assert_eq!(path, Path::new("/tmp/fpl/storage.json"));
}

#[test]
fn draft_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("storage.json");
    let squad = squad_with_keeper();

    let mut storage = FileStorage::open(path.clone());
    let saved = persist::save_draft(&mut storage, &squad).expect("save");
    assert_eq!(saved.version, DRAFT_VERSION);
    assert!(!saved.saved_at.is_empty());

    let storage = FileStorage::open(path);
    let draft = persist::load_draft(&storage).expect("draft present");
    assert_eq!(draft.squad, squad);
    assert_eq!(draft.squad.player_count(), 1);
}

#[test]
fn unreadable_draft_is_discarded_and_clear_removes_it() {
    let mut storage = MemoryStorage::new();
    storage
        .set(keys::WILDCARD_DRAFT, "[1, 2".to_string())
        .expect("set");
    assert!(persist::load_draft(&storage).is_none());

    persist::save_draft(&mut storage, &WildcardSquad::new(1000)).expect("save");
    assert!(persist::load_draft(&storage).is_some());
    persist::clear_draft(&mut storage).expect("clear");
    assert!(persist::load_draft(&storage).is_none());
}

#[test]
fn share_code_is_trimmed_and_blank_is_absent() {
    let mut storage = MemoryStorage::new();
    persist::save_share_code(&mut storage, "  WC-ABC  ").expect("save");
    assert_eq!(persist::load_share_code(&storage).as_deref(), Some("WC-ABC"));
    storage
        .set(keys::WILDCARD_CODE, "   ".to_string())
        .expect("set");
    assert!(persist::load_share_code(&storage).is_none());
}

#[test]
fn planner_settings_clamp_horizon() {
    let mut storage = MemoryStorage::new();
    assert_eq!(
        persist::load_planner_settings(&storage),
        PlannerSettings::default()
    );

    storage
        .set(keys::PLANNER_MANAGER_ID, " 1234 ".to_string())
        .expect("set");
    storage
        .set(keys::PLANNER_HORIZON, "25".to_string())
        .expect("set");
    let settings = persist::load_planner_settings(&storage);
    assert_eq!(settings.manager_id, Some(1234));
    assert_eq!(settings.horizon, 10);

    persist::save_planner_settings(
        &mut storage,
        &PlannerSettings {
            manager_id: None,
            horizon: 3,
        },
    )
    .expect("save");
    assert!(storage.get(keys::PLANNER_MANAGER_ID).is_none());
    assert_eq!(storage.get(keys::PLANNER_HORIZON).as_deref(), Some("3"));
}

#[test]
fn plans_are_keyed_per_manager() {
    let mut storage = MemoryStorage::new();
    let base = vec![PlannerPlayer {
        id: 1,
        web_name: "Raya".to_string(),
        team: "ARS".to_string(),
        position: Position::Goalkeeper,
        now_cost: 55,
    }];
    let plan = TransferPlan::new(77, 18, 5, base);
    persist::save_plan(&mut storage, &plan).expect("save");

    assert_eq!(persist::load_plan(&storage, 77), Some(plan));
    assert!(persist::load_plan(&storage, 78).is_none());
    assert!(storage.get("transfer_plan:77").is_some());
}

#[test]
fn settings_fill_missing_fields_with_defaults() {
    let mut storage = MemoryStorage::new();
    storage
        .set(keys::OPTIMIZER_SETTINGS, r#"{"horizon": 6}"#.to_string())
        .expect("set");
    let settings: OptimizerSettings =
        persist::load_json(&storage, keys::OPTIMIZER_SETTINGS).expect("settings");
    assert_eq!(settings.horizon, 6);
    assert_eq!(settings.budget, OptimizerSettings::default().budget);
    assert!(!settings.include_unavailable);
}

#[test]
fn autosave_fires_after_interval_and_flags_briefly() {
    let start = Instant::now();
    let mut autosave = Autosave::new(Duration::from_secs(30), start);
    assert!(!autosave.due(start + Duration::from_secs(29)));
    assert!(autosave.due(start + Duration::from_secs(30)));

    let saved = start + Duration::from_secs(30);
    autosave.record(saved);
    assert!(!autosave.due(saved + Duration::from_secs(1)));
    assert!(autosave.saved_visible(saved + Duration::from_secs(1)));
    assert!(!autosave.saved_visible(saved + Duration::from_secs(3)));
    assert_eq!(autosave.interval(), Duration::from_secs(30));
}

#[test]
fn repeated_saves_of_unchanged_squad_are_equivalent() {
    let mut storage = MemoryStorage::new();
    let squad = squad_with_keeper();
    let first = persist::save_draft(&mut storage, &squad).expect("first save");
    let second = persist::save_draft(&mut storage, &squad).expect("second save");
    assert_eq!(first.squad, second.squad);
    assert_eq!(persist::load_draft(&storage).map(|d| d.squad), Some(squad));
}

#[test]
fn restored_draft_takes_the_configured_budget() {
    let mut storage = MemoryStorage::new();
    let squad = squad_with_keeper();
    assert_eq!(squad.budget(), 1000);
    persist::save_draft(&mut storage, &squad).expect("save");

    let draft = persist::restore_draft(&storage, 1050).expect("draft present");
    assert_eq!(draft.squad.budget(), 1050);
    assert_eq!(draft.squad.remaining_budget(), 1050 - 55);
    assert_eq!(draft.squad.player_count(), 1);
    assert!(persist::restore_draft(&MemoryStorage::new(), 1050).is_none());
}
