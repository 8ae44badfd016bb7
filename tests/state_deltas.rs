use std::fs;
use std::path::PathBuf;

use fpl_terminal::api::parse_json;
use fpl_terminal::models::{
    Bootstrap, EntryPicks, PlayersPage, Position, SaveResponse, TrackResponse, WildcardTeam,
};
use fpl_terminal::state::{
    AppState, Delta, FetchRequest, Payload, PendingWrite, PlannerBase, ProviderCommand, Screen,
    apply_delta,
};
use fpl_terminal::transfer_planner::PlanAction;
use fpl_terminal::wildcard::{SquadAction, WildcardPlayer};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn generation(command: ProviderCommand) -> u64 {
    match command {
        ProviderCommand::Fetch { generation, .. } => generation,
    }
}

fn deliver(state: &mut AppState, request: FetchRequest, payload: Payload) {
    let generation = generation(state.begin_fetch(request));
    apply_delta(
        state,
        Delta::Fetched {
            generation,
            payload,
        },
    );
}

fn players_page() -> PlayersPage {
    parse_json(&read_fixture("players_page.json"), "players").expect("players fixture")
}

fn planner_base(manager_id: u32) -> PlannerBase {
    PlannerBase {
        manager_id,
        gameweek: 17,
        picks: parse_json::<EntryPicks>(&read_fixture("entry_picks.json"), "picks")
            .expect("picks fixture"),
        bootstrap: parse_json::<Bootstrap>(&read_fixture("bootstrap.json"), "bootstrap")
            .expect("bootstrap fixture"),
    }
}

#[test]
fn stale_response_is_dropped() {
    let mut state = AppState::new();
    let request = state.players_request();
    let stale = generation(state.begin_fetch(request.clone()));
    let current = generation(state.begin_fetch(request));

    apply_delta(
        &mut state,
        Delta::Fetched {
            generation: stale,
            payload: Payload::Players(Ok(players_page())),
        },
    );
    assert!(state.players.data().is_none());
    assert!(state.players.is_loading());

    state.players_selected = 40;
    apply_delta(
        &mut state,
        Delta::Fetched {
            generation: current,
            payload: Payload::Players(Ok(players_page())),
        },
    );
    assert_eq!(state.players.data().map(|p| p.players.len()), Some(3));
    assert_eq!(state.players_selected, 2);
}

#[test]
fn log_buffer_is_bounded() {
    let mut state = AppState::new();
    for idx in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("line {idx}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("line 50"));
}

#[test]
fn tracked_code_is_adopted_once() {
    let mut state = AppState::new();
    let track = |code: &str| {
        Payload::WildcardTrack(Ok(TrackResponse {
            success: true,
            code: code.to_string(),
            message: String::new(),
        }))
    };

    deliver(&mut state, FetchRequest::WildcardTrack, track(" WC-NEW1 "));
    assert_eq!(state.share_code.as_deref(), Some("WC-NEW1"));
    assert_eq!(
        state.take_pending_writes(),
        vec![PendingWrite::ShareCode("WC-NEW1".to_string())]
    );

    deliver(&mut state, FetchRequest::WildcardTrack, track("WC-OTHER"));
    assert_eq!(state.share_code.as_deref(), Some("WC-NEW1"));
    assert!(state.take_pending_writes().is_empty());
}

#[test]
fn tracking_failure_is_logged_not_alerted() {
    let mut state = AppState::new();
    deliver(
        &mut state,
        FetchRequest::WildcardTrack,
        Payload::WildcardTrack(Err("http 503: down".to_string())),
    );
    assert!(state.share_code.is_none());
    assert!(state.alert.is_none());
    assert!(
        state
            .logs
            .iter()
            .any(|line| line.contains("Wildcard tracking failed: http 503: down"))
    );
}

#[test]
fn shared_squad_replaces_draft_and_adopts_code() {
    let mut state = AppState::new();
    state.wildcard_selected = 9;
    let team: WildcardTeam =
        parse_json(&read_fixture("wildcard_team.json"), "wildcard").expect("wildcard fixture");
    deliver(
        &mut state,
        FetchRequest::WildcardLoad("WC-ABC123".to_string()),
        Payload::WildcardLoad(Ok(team)),
    );

    assert_eq!(state.squad.player_count(), 15);
    assert_eq!(state.squad.captain(), Some(10));
    assert_eq!(state.squad.vice_captain(), None);
    assert_eq!(state.wildcard_selected, 0);
    assert_eq!(state.wildcard_team_name, "Bench Boost FC");
    assert_eq!(state.share_code.as_deref(), Some("WC-ABC123"));
    assert_eq!(
        state.take_pending_writes(),
        vec![PendingWrite::ShareCode("WC-ABC123".to_string())]
    );
}

#[test]
fn shared_squad_failure_raises_alert_and_keeps_draft() {
    let mut state = AppState::new();
    state
        .squad
        .add_player(
            Position::Forward,
            WildcardPlayer {
                id: 10,
                web_name: "Haaland".to_string(),
                team: "MCI".to_string(),
                team_id: Some(13),
                position: Position::Forward,
                now_cost: 149,
                total_points: 110,
                form: None,
            },
            false,
        )
        .expect("fits");
    deliver(
        &mut state,
        FetchRequest::WildcardLoad("WC-404".to_string()),
        Payload::WildcardLoad(Err("share code WC-404 not found".to_string())),
    );
    assert_eq!(
        state.alert.as_deref(),
        Some("Could not load shared squad: share code WC-404 not found")
    );
    assert_eq!(state.squad.player_count(), 1);
}

#[test]
fn save_result_updates_summary_or_alerts() {
    let mut state = AppState::new();
    state.share_code = Some("WC-1".to_string());
    let request = FetchRequest::WildcardSave {
        code: "WC-1".to_string(),
        body: state.save_request(),
    };

    deliver(
        &mut state,
        request.clone(),
        Payload::WildcardSave(Ok(SaveResponse {
            success: true,
            code: "WC-1".to_string(),
            message: String::new(),
            total_cost: 99.5,
            predicted_points: 61,
        })),
    );
    assert_eq!(
        state.wildcard_summary.as_ref().map(|s| s.predicted_points),
        Some(61)
    );
    assert!(
        state
            .logs
            .iter()
            .any(|line| line == "[INFO] Squad saved: 99.5m, 61 predicted points")
    );

    deliver(
        &mut state,
        request,
        Payload::WildcardSave(Err("http 400: Squad incomplete".to_string())),
    );
    assert_eq!(
        state.alert.as_deref(),
        Some("Save failed: http 400: Squad incomplete")
    );
}

#[test]
fn planner_base_builds_plan_from_next_gameweek() {
    let mut state = AppState::new();
    state.planner_settings.manager_id = Some(42);
    state.planner_settings.horizon = 3;
    deliver(
        &mut state,
        FetchRequest::PlannerBase { manager_id: 42 },
        Payload::PlannerBase(Ok(planner_base(42))),
    );

    let plan = state.planner.as_ref().expect("plan built");
    assert_eq!(plan.start_gameweek, 18);
    assert_eq!(plan.horizon, 3);
    assert_eq!(plan.base.len(), 4);
    assert_eq!(state.planner_week, 18);
    assert!(matches!(
        state.take_pending_writes().as_slice(),
        [PendingWrite::Plan(saved)] if saved.manager_id == 42
    ));
}

#[test]
fn planner_base_for_another_manager_is_ignored() {
    let mut state = AppState::new();
    state.planner_settings.manager_id = Some(7);
    deliver(
        &mut state,
        FetchRequest::PlannerBase { manager_id: 42 },
        Payload::PlannerBase(Ok(planner_base(42))),
    );
    assert!(state.planner.is_none());
    assert!(state.pending_writes.is_empty());
}

#[test]
fn planner_edits_queue_a_save() {
    let mut state = AppState::new();
    assert!(!state.planner_apply(PlanAction::ClearWeek(18)));
    assert_eq!(state.alert.as_deref(), Some("Load a manager squad first"));

    state.alert = None;
    state.planner_settings.manager_id = Some(42);
    deliver(
        &mut state,
        FetchRequest::PlannerBase { manager_id: 42 },
        Payload::PlannerBase(Ok(planner_base(42))),
    );
    state.take_pending_writes();

    assert!(state.planner_apply(PlanAction::SetHorizon(2)));
    assert_eq!(state.pending_writes.len(), 1);
    assert!(!state.planner_apply(PlanAction::Remove {
        gameweek: 18,
        index: 0
    }));
    assert_eq!(state.alert.as_deref(), Some("No transfer #1 planned for GW18"));
}

#[test]
fn rejected_squad_action_raises_alert() {
    let mut state = AppState::new();
    assert!(!state.wildcard_apply(SquadAction::SetCaptain(99)));
    assert!(state.alert.is_some());
    assert!(
        state
            .logs
            .back()
            .is_some_and(|line| line.starts_with("[WARN] "))
    );
}

#[test]
fn compare_holds_at_most_four() {
    let mut state = AppState::new();
    for id in 1..=4 {
        assert!(state.toggle_compare(id));
    }
    assert!(!state.toggle_compare(5));
    assert_eq!(
        state.alert.as_deref(),
        Some("Compare holds at most 4 players")
    );
    assert!(state.toggle_compare(2));
    assert_eq!(state.compare_ids, vec![1, 3, 4]);
}

#[test]
fn wildcard_pool_filters_position_and_squad() {
    let mut state = AppState::new();
    let request = state.players_request();
    deliver(&mut state, request, Payload::Players(Ok(players_page())));
    state.wildcard_position = Position::Midfielder;
    let pool: Vec<u32> = state.wildcard_pool().iter().map(|p| p.id).collect();
    assert_eq!(pool, vec![328]);

    state
        .squad
        .add_player(
            Position::Midfielder,
            WildcardPlayer {
                id: 328,
                web_name: "M.Salah".to_string(),
                team: "LIV".to_string(),
                team_id: Some(12),
                position: Position::Midfielder,
                now_cost: 131,
                total_points: 211,
                form: Some(7.4),
            },
            false,
        )
        .expect("fits");
    assert!(state.wildcard_pool().is_empty());
}

#[test]
fn refresh_after_shared_load_keeps_local_edits() {
    let mut state = AppState::new();
    state.screen = Screen::Wildcard {
        code: Some("WC-ABC123".to_string()),
    };
    let team: WildcardTeam =
        parse_json(&read_fixture("wildcard_team.json"), "wildcard").expect("wildcard fixture");
    deliver(
        &mut state,
        FetchRequest::WildcardLoad("WC-ABC123".to_string()),
        Payload::WildcardLoad(Ok(team)),
    );
    assert_eq!(state.screen, Screen::Wildcard { code: None });
    assert_eq!(state.squad.player_count(), 15);

    assert!(state.wildcard_apply(SquadAction::RemovePlayer(1)));
    assert_eq!(state.squad.player_count(), 14);

    let requests = state.requests_for_screen();
    assert!(
        !requests
            .iter()
            .any(|r| matches!(r, FetchRequest::WildcardLoad(_) | FetchRequest::WildcardTrack))
    );
    assert!(!state.squad.contains(1));
}
