use std::fs;
use std::path::PathBuf;

use fpl_terminal::api::{error_message, parse_json};
use fpl_terminal::models::{
    Bootstrap, EntryPicks, Landing, PlayersPage, Position, Top100Chart, WildcardTeam,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_players_page_fixture() {
    let raw = read_fixture("players_page.json");
    let page: PlayersPage = parse_json(&raw, "players").expect("fixture should parse");
    assert_eq!(page.players.len(), 3);
    assert_eq!(page.total, 612);
    assert!(page.has_next);

    let salah = &page.players[0];
    assert_eq!(salah.now_cost, 131);
    assert_eq!(salah.position(), Some(Position::Midfielder));
    assert_eq!(salah.display_name(), "M.Salah");

    // Empty web_name falls back to the surname.
    assert_eq!(page.players[1].display_name(), "Pickford");
    assert!(page.players[1].form.is_none());

    assert_eq!(page.players[2].position(), None);
    assert!(page.players[2].team.is_none());
}

#[test]
fn parses_shared_wildcard_fixture() {
    let raw = read_fixture("wildcard_team.json");
    let team: WildcardTeam = parse_json(&raw, "wildcard").expect("fixture should parse");
    assert!(team.success);
    assert_eq!(team.code, "WC-ABC123");
    assert_eq!(team.squad_data.formation.as_deref(), Some("4-4-2"));
    assert_eq!(team.squad_data.players.len(), 17);
    assert_eq!(team.squad_data.captain, Some(10));
}

#[test]
fn parses_bootstrap_and_picks_fixtures() {
    let bootstrap: Bootstrap =
        parse_json(&read_fixture("bootstrap.json"), "bootstrap").expect("bootstrap should parse");
    assert_eq!(bootstrap.current_event(), Some(17));
    assert_eq!(bootstrap.team_short(13), Some("MCI"));
    assert_eq!(bootstrap.element(10).map(|e| e.now_cost), Some(149));
    assert!(bootstrap.element(777).is_none());

    let picks: EntryPicks =
        parse_json(&read_fixture("entry_picks.json"), "picks").expect("picks should parse");
    assert_eq!(picks.entry_history.bank, 15);
    assert_eq!(picks.picks.len(), 5);
    assert!(picks.active_chip.is_none());
    assert!(picks.picks.iter().any(|p| p.is_captain && p.element == 10));
}

#[test]
fn parses_landing_fixture() {
    let landing: Landing =
        parse_json(&read_fixture("landing.json"), "landing").expect("landing should parse");
    assert_eq!(landing.current_gameweek, 17);
    assert_eq!(landing.movers.price.risers.len(), 1);
    assert_eq!(landing.movers.price.risers[0].change_label, "+0.1m");
    assert_eq!(landing.transfers.transfers_in.len(), 1);
    assert!(landing.transfers.transfers_out.is_empty());
    assert_eq!(landing.fixture_pressure.hardest[0].team, "Ipswich");
    assert_eq!(landing.news.len(), 1);
}

#[test]
fn parses_chart_with_missing_wicks() {
    let chart: Top100Chart =
        parse_json(&read_fixture("top100_chart.json"), "chart").expect("chart should parse");
    assert_eq!(chart.points.len(), 3);
    assert!(chart.points[2].min_points.is_none());
    assert!(chart.points[2].max_points.is_none());
}

#[test]
fn null_and_empty_bodies_are_errors() {
    let err = parse_json::<PlayersPage>("null", "players").unwrap_err();
    assert_eq!(err.to_string(), "empty players response");
    let err = parse_json::<PlayersPage>("  ", "players").unwrap_err();
    assert_eq!(err.to_string(), "empty players response");
    let page: PlayersPage = parse_json("{}", "players").expect("empty object uses defaults");
    assert!(page.players.is_empty());
}

#[test]
fn malformed_body_names_the_resource() {
    let err = parse_json::<PlayersPage>("{\"players\": [", "players").unwrap_err();
    assert!(format!("{err:#}").contains("invalid players json"));
}

#[test]
fn error_message_prefers_error_then_detail() {
    assert_eq!(error_message("{\"error\": \"Team not found\"}"), "Team not found");
    assert_eq!(error_message("{\"detail\": \"Not found.\"}"), "Not found.");
    assert_eq!(error_message("  "), "empty response");
    assert_eq!(error_message("<html>502</html>"), "<html>502</html>");
}
