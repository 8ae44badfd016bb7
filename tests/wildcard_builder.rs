use fpl_terminal::models::{Position, SquadData, SquadDataPlayer, WildcardTeam};
use fpl_terminal::wildcard::{
    Formation, Slot, SquadAction, SquadError, WildcardPlayer, WildcardSquad, format_cost,
};

fn player(id: u32, position: Position, cost: u32) -> WildcardPlayer {
    WildcardPlayer {
        id,
        web_name: format!("P{id}"),
        team: format!("T{}", id % 8),
        team_id: None,
        position,
        now_cost: cost,
        total_points: 0,
        form: None,
    }
}

fn add(squad: &mut WildcardSquad, id: u32, position: Position, bench: bool) {
    squad
        .add_player(position, player(id, position, 50), bench)
        .expect("player should fit");
}

/// 4-4-2: GK 1, DEF 2-5, MID 6-9, FWD 10-11; bench GK 12, DEF 13, MID 14, FWD 15.
fn full_squad() -> WildcardSquad {
    let mut squad = WildcardSquad::new(1000);
    add(&mut squad, 1, Position::Goalkeeper, false);
    for id in 2..=5 {
        add(&mut squad, id, Position::Defender, false);
    }
    for id in 6..=9 {
        add(&mut squad, id, Position::Midfielder, false);
    }
    add(&mut squad, 10, Position::Forward, false);
    add(&mut squad, 11, Position::Forward, false);
    add(&mut squad, 12, Position::Goalkeeper, true);
    add(&mut squad, 13, Position::Defender, true);
    add(&mut squad, 14, Position::Midfielder, true);
    add(&mut squad, 15, Position::Forward, true);
    squad
}

fn ids(players: &[WildcardPlayer]) -> Vec<u32> {
    players.iter().map(|p| p.id).collect()
}

#[test]
fn new_squad_defaults_to_four_four_two() {
    let squad = WildcardSquad::new(1000);
    assert_eq!(squad.formation(), Formation::F442);
    assert_eq!(squad.player_count(), 0);
    assert_eq!(squad.remaining_budget(), 1000);
}

#[test]
fn formation_counts_always_fill_ten_outfield_slots() {
    for formation in Formation::ALL {
        let (def, mid, fwd) = formation.counts();
        assert_eq!(def + mid + fwd, 10, "{}", formation.name());
        assert_eq!(Formation::from_name(formation.name()), Some(formation));
    }
    assert_eq!(Formation::from_counts(5, 5, 0), None);
    assert_eq!(Formation::F541.next(), Formation::F343);
}

#[test]
fn full_squad_is_complete_and_valid() {
    let squad = full_squad();
    assert!(squad.is_complete());
    assert_eq!(squad.total_cost(), 750);
    assert!(squad.validate_for_save().is_ok());
    assert!(squad.club_counts().values().all(|count| *count <= 3));
}

#[test]
fn rejects_player_already_in_squad() {
    let mut squad = full_squad();
    let err = squad
        .add_player(Position::Forward, player(10, Position::Forward, 50), true)
        .unwrap_err();
    assert!(matches!(err, SquadError::AlreadySelected { .. }));
}

#[test]
fn rejects_wrong_position_for_slot() {
    let mut squad = WildcardSquad::new(1000);
    let err = squad
        .add_player(Position::Defender, player(6, Position::Midfielder, 50), false)
        .unwrap_err();
    assert_eq!(
        err,
        SquadError::PositionMismatch {
            slot: Position::Defender,
            player: Position::Midfielder,
        }
    );
}

#[test]
fn starting_line_and_bench_have_caps() {
    let mut squad = WildcardSquad::new(1000);
    add(&mut squad, 1, Position::Goalkeeper, false);
    let err = squad
        .add_player(Position::Goalkeeper, player(2, Position::Goalkeeper, 40), false)
        .unwrap_err();
    assert_eq!(
        err,
        SquadError::LineFull {
            slot: Slot::Starting(Position::Goalkeeper)
        }
    );

    for id in [3, 4, 5, 6] {
        add(&mut squad, id, Position::Defender, true);
    }
    let err = squad
        .add_player(Position::Defender, player(7, Position::Defender, 40), true)
        .unwrap_err();
    assert_eq!(err, SquadError::LineFull { slot: Slot::Bench });
}

#[test]
fn enforces_three_players_per_club() {
    let mut squad = WildcardSquad::new(1000);
    let ars = |id: u32, position: Position| WildcardPlayer {
        team: "ARS".to_string(),
        ..player(id, position, 50)
    };
    squad
        .add_player(Position::Defender, ars(2, Position::Defender), false)
        .expect("first");
    squad
        .add_player(Position::Defender, ars(3, Position::Defender), false)
        .expect("second");
    squad
        .add_player(Position::Midfielder, ars(6, Position::Midfielder), false)
        .expect("third");
    let err = squad
        .add_player(Position::Forward, ars(10, Position::Forward), false)
        .unwrap_err();
    assert_eq!(
        err,
        SquadError::ClubLimit {
            club: "ARS".to_string()
        }
    );
    assert_eq!(squad.player_count(), 3);
}

#[test]
fn club_limit_counts_bench_players() {
    let mut squad = WildcardSquad::new(1000);
    let ars = |id: u32, position: Position| WildcardPlayer {
        team: "ARS".to_string(),
        ..player(id, position, 50)
    };
    squad
        .add_player(Position::Defender, ars(2, Position::Defender), false)
        .expect("first starter");
    squad
        .add_player(Position::Midfielder, ars(6, Position::Midfielder), false)
        .expect("second starter");
    squad
        .add_player(Position::Goalkeeper, ars(12, Position::Goalkeeper), true)
        .expect("bench");
    let err = squad
        .add_player(Position::Forward, ars(10, Position::Forward), false)
        .unwrap_err();
    assert_eq!(
        err,
        SquadError::ClubLimit {
            club: "ARS".to_string()
        }
    );
    let err = squad
        .add_player(Position::Defender, ars(13, Position::Defender), true)
        .unwrap_err();
    assert!(matches!(err, SquadError::ClubLimit { .. }));
    assert_eq!(squad.player_count(), 3);
    assert_eq!(squad.bench().len(), 1);
}

#[test]
fn club_identity_prefers_team_id_over_label() {
    let mut squad = WildcardSquad::new(1000);
    for (id, label) in [(2, "ARS"), (3, "Arsenal"), (4, "arsenal")] {
        let p = WildcardPlayer {
            team: label.to_string(),
            team_id: Some(1),
            ..player(id, Position::Defender, 50)
        };
        squad.add_player(Position::Defender, p, false).expect("fits");
    }
    let fourth = WildcardPlayer {
        team: "Gunners".to_string(),
        team_id: Some(1),
        ..player(5, Position::Defender, 50)
    };
    assert!(matches!(
        squad.add_player(Position::Defender, fourth, false),
        Err(SquadError::ClubLimit { .. })
    ));
}

#[test]
fn rejects_player_over_remaining_budget() {
    let mut squad = WildcardSquad::new(100);
    squad
        .add_player(Position::Forward, player(10, Position::Forward, 60), false)
        .expect("fits");
    let err = squad
        .add_player(Position::Forward, player(11, Position::Forward, 41), false)
        .unwrap_err();
    assert_eq!(
        err,
        SquadError::InsufficientBudget {
            cost: 41,
            remaining: 40
        }
    );
    // Exactly the remaining budget is allowed.
    squad
        .add_player(Position::Forward, player(11, Position::Forward, 40), false)
        .expect("exact fit");
    assert_eq!(squad.remaining_budget(), 0);
}

#[test]
fn removing_is_idempotent_and_clears_armband() {
    let mut squad = full_squad();
    squad.set_captain(10).expect("starter");
    squad.remove_player(10);
    assert!(!squad.contains(10));
    assert_eq!(squad.captain(), None);
    let before = squad.clone();
    squad.remove_player(10);
    squad.remove_player(404);
    assert_eq!(squad, before);
}

#[test]
fn same_position_substitution_swaps_in_place() {
    let mut squad = full_squad();
    squad.set_captain(2).expect("starter");
    squad.substitute(13, 2).expect("valid swap");
    assert_eq!(ids(squad.line(Position::Defender)), vec![13, 3, 4, 5]);
    assert_eq!(ids(squad.bench()), vec![12, 2, 14, 15]);
    assert_eq!(squad.formation(), Formation::F442);
    assert_eq!(squad.captain(), None);
}

#[test]
fn cross_position_substitution_switches_formation() {
    let mut squad = full_squad();
    squad.substitute(14, 10).expect("4-5-1 is valid");
    assert_eq!(squad.formation(), Formation::F451);
    assert_eq!(ids(squad.line(Position::Midfielder)), vec![6, 7, 8, 9, 14]);
    assert_eq!(ids(squad.line(Position::Forward)), vec![11]);
    assert_eq!(ids(squad.bench()), vec![12, 13, 10, 15]);

    let before = squad.clone();
    let err = squad.substitute(13, 11).unwrap_err();
    assert!(matches!(err, SquadError::InvalidSubstitution { .. }));
    assert!(err.to_string().contains("5-5-0"));
    assert_eq!(squad, before);
}

#[test]
fn substitution_into_open_slot_keeps_formation() {
    let mut squad = WildcardSquad::new(1000);
    add(&mut squad, 2, Position::Defender, false);
    add(&mut squad, 6, Position::Midfielder, false);
    add(&mut squad, 13, Position::Defender, true);
    squad.substitute(13, 6).expect("defender line has room");
    assert_eq!(squad.formation(), Formation::F442);
    assert_eq!(ids(squad.line(Position::Defender)), vec![2, 13]);
    assert!(squad.line(Position::Midfielder).is_empty());
    assert_eq!(ids(squad.bench()), vec![6]);
}

#[test]
fn goalkeepers_only_swap_with_goalkeepers() {
    let mut squad = full_squad();
    assert!(matches!(
        squad.substitute(12, 2),
        Err(SquadError::InvalidSubstitution { .. })
    ));
    assert!(matches!(
        squad.substitute(13, 1),
        Err(SquadError::InvalidSubstitution { .. })
    ));
    squad.substitute(12, 1).expect("keeper swap");
    assert_eq!(ids(squad.line(Position::Goalkeeper)), vec![12]);
}

#[test]
fn substitution_requires_bench_and_starter() {
    let mut squad = full_squad();
    assert_eq!(squad.substitute(2, 3), Err(SquadError::NotOnBench(2)));
    assert_eq!(squad.substitute(13, 14), Err(SquadError::NotStarter(14)));
}

#[test]
fn captain_and_vice_swap_when_reassigned() {
    let mut squad = full_squad();
    squad.set_captain(6).expect("starter");
    squad.set_vice_captain(7).expect("starter");
    squad.set_captain(7).expect("starter");
    assert_eq!(squad.captain(), Some(7));
    assert_eq!(squad.vice_captain(), Some(6));

    squad.set_vice_captain(7).expect("starter");
    assert_eq!(squad.vice_captain(), Some(7));
    assert_eq!(squad.captain(), Some(6));

    assert_eq!(squad.set_captain(14), Err(SquadError::NotStarter(14)));
    assert_eq!(squad.set_vice_captain(99), Err(SquadError::NotInSquad(99)));
}

#[test]
fn narrower_formation_moves_excess_starters_to_bench() {
    let mut squad = full_squad();
    squad.set_captain(5).expect("starter");
    squad.select_formation(Formation::F343);
    assert_eq!(squad.formation(), Formation::F343);
    assert_eq!(ids(squad.line(Position::Defender)), vec![2, 3, 4]);
    assert_eq!(ids(squad.bench()), vec![12, 13, 14, 15, 5]);
    assert_eq!(squad.player_count(), 15);
    assert_eq!(squad.captain(), None);
}

#[test]
fn clear_keeps_formation_and_budget() {
    let mut squad = full_squad();
    squad.apply(SquadAction::SelectFormation(Formation::F433)).expect("ok");
    squad.apply(SquadAction::Clear).expect("ok");
    assert_eq!(squad.player_count(), 0);
    assert_eq!(squad.formation(), Formation::F433);
    assert_eq!(squad.budget(), 1000);
}

#[test]
fn save_validation_reports_count_and_budget() {
    let mut squad = full_squad();
    squad.remove_player(15);
    assert_eq!(
        squad.validate_for_save(),
        Err(SquadError::IncompleteSquad { count: 14 })
    );

    let data = full_squad().to_squad_data();
    let team = WildcardTeam {
        squad_data: data,
        ..WildcardTeam::default()
    };
    let tight = WildcardSquad::from_shared(&team, 700);
    assert_eq!(
        tight.validate_for_save(),
        Err(SquadError::OverBudget { remaining: -50 })
    );
}

#[test]
fn squad_data_lists_starters_then_bench() {
    let mut squad = full_squad();
    squad.set_captain(10).expect("starter");
    let data = squad.to_squad_data();
    assert_eq!(data.formation.as_deref(), Some("4-4-2"));
    assert_eq!(data.captain, Some(10));
    let order: Vec<u32> = data.players.iter().map(|p| p.id).collect();
    assert_eq!(order, (1..=15).collect::<Vec<_>>());
    assert_eq!(data.players[0].element_type, 1);
    assert_eq!(data.players[14].element_type, 4);
}

fn shared(id: u32, element_type: u8) -> SquadDataPlayer {
    SquadDataPlayer {
        id,
        web_name: format!("S{id}"),
        team: Some(format!("T{id}")),
        team_id: None,
        element_type,
        now_cost: 50,
    }
}

#[test]
fn shared_squad_fills_lines_then_bench_in_payload_order() {
    let team = WildcardTeam {
        code: "WC-1".to_string(),
        squad_data: SquadData {
            formation: Some("4-4-2".to_string()),
            captain: Some(22),
            vice_captain: Some(2),
            players: vec![
                shared(1, 1),
                shared(2, 2),
                shared(3, 2),
                shared(4, 2),
                shared(5, 2),
                shared(21, 2),
                shared(22, 4),
                shared(12, 1),
                shared(6, 3),
                shared(30, 9),
                shared(2, 2),
            ],
        },
        ..WildcardTeam::default()
    };
    let squad = WildcardSquad::from_shared(&team, 1000);
    assert_eq!(ids(squad.line(Position::Goalkeeper)), vec![1]);
    assert_eq!(ids(squad.line(Position::Defender)), vec![2, 3, 4, 5]);
    assert_eq!(ids(squad.line(Position::Midfielder)), vec![6]);
    assert_eq!(ids(squad.line(Position::Forward)), vec![22]);
    // Overflow keeps payload order: DEF 21 came before GK 12.
    assert_eq!(ids(squad.bench()), vec![21, 12]);
    assert_eq!(squad.player_count(), 9);
    assert_eq!(squad.captain(), Some(22));
    assert_eq!(squad.vice_captain(), Some(2));
}

#[test]
fn shared_squad_drops_bench_armbands_and_bad_formation() {
    let team = WildcardTeam {
        squad_data: SquadData {
            formation: Some("2-2-6".to_string()),
            captain: Some(13),
            vice_captain: Some(1),
            players: vec![shared(1, 1), shared(12, 1), shared(13, 2)],
        },
        ..WildcardTeam::default()
    };
    let squad = WildcardSquad::from_shared(&team, 1000);
    assert_eq!(squad.formation(), Formation::F442);
    assert_eq!(ids(squad.bench()), vec![12]);
    assert_eq!(squad.captain(), Some(13));
    assert_eq!(squad.vice_captain(), Some(1));

    let team = WildcardTeam {
        squad_data: SquadData {
            formation: None,
            captain: Some(12),
            vice_captain: Some(12),
            players: vec![shared(1, 1), shared(12, 1)],
        },
        ..WildcardTeam::default()
    };
    let squad = WildcardSquad::from_shared(&team, 1000);
    assert_eq!(squad.captain(), None);
    assert_eq!(squad.vice_captain(), None);
}

#[test]
fn errors_read_like_alerts() {
    assert_eq!(format_cost(125), "12.5m");
    assert_eq!(format_cost(-5), "-0.5m");
    let err = SquadError::InsufficientBudget {
        cost: 131,
        remaining: 40,
    };
    assert_eq!(
        err.to_string(),
        "Not enough budget: player costs 13.1m but only 4.0m remains"
    );
    assert_eq!(
        SquadError::ClubLimit {
            club: "LIV".to_string()
        }
        .to_string(),
        "You already have 3 players from LIV"
    );
}

#[test]
fn overspend_on_empty_squad_leaves_budget_untouched() {
    let mut squad = WildcardSquad::new(1000);
    let err = squad
        .add_player(Position::Forward, player(10, Position::Forward, 1005), false)
        .unwrap_err();
    assert!(matches!(err, SquadError::InsufficientBudget { .. }));
    assert_eq!(squad.remaining_budget(), 1000);
    assert_eq!(squad.player_count(), 0);
}

#[test]
fn four_four_two_to_three_five_two_benches_one_defender() {
    let mut squad = WildcardSquad::new(1000);
    for id in 2..=5 {
        add(&mut squad, id, Position::Defender, false);
    }
    squad
        .apply(SquadAction::SelectFormation(Formation::F352))
        .expect("formation change");
    assert_eq!(ids(squad.line(Position::Defender)), vec![2, 3, 4]);
    assert_eq!(ids(squad.bench()), vec![5]);
}

#[test]
fn oversized_shared_squad_overflows_bench_without_error() {
    let mut players = Vec::new();
    let mut id = 0;
    for (element_type, count) in [(1u8, 2), (2, 6), (3, 6), (4, 4)] {
        for _ in 0..count {
            id += 1;
            players.push(shared(id, element_type));
        }
    }
    let team = WildcardTeam {
        squad_data: SquadData {
            players,
            ..SquadData::default()
        },
        ..WildcardTeam::default()
    };
    let squad = WildcardSquad::from_shared(&team, 1000);
    assert_eq!(squad.formation(), Formation::F442);
    assert_eq!(squad.line(Position::Defender).len(), 4);
    assert_eq!(squad.line(Position::Midfielder).len(), 4);
    assert_eq!(squad.line(Position::Forward).len(), 2);
    assert_eq!(squad.bench().len(), 7);
    assert_eq!(squad.player_count(), 18);
}
