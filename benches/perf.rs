use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use fpl_terminal::api::parse_json;
use fpl_terminal::charts::{bin_heatmap, trading_candles};
use fpl_terminal::models::{Bootstrap, EntryPicks, HeatPoint, PlayersPage, Position, Top100Chart, WildcardTeam};
use fpl_terminal::state::{AppState, Delta, Payload, PlayerSort, ProviderCommand, apply_delta};
use fpl_terminal::transfer_planner::{PlannerPlayer, TransferPlan};
use fpl_terminal::wildcard::{WildcardPlayer, WildcardSquad};

fn bench_players_parse(c: &mut Criterion) {
    c.bench_function("players_parse", |b| {
        b.iter(|| {
            let page: PlayersPage = parse_json(black_box(PLAYERS_JSON), "players").unwrap();
            black_box(page.players.len());
        })
    });
}

fn bench_shared_squad_load(c: &mut Criterion) {
    let team: WildcardTeam = parse_json(WILDCARD_JSON, "wildcard").unwrap();
    c.bench_function("shared_squad_load", |b| {
        b.iter(|| {
            let squad = WildcardSquad::from_shared(black_box(&team), 1000);
            black_box(squad.player_count());
        })
    });
}

fn bench_squad_build(c: &mut Criterion) {
    let lines = [
        (Position::Goalkeeper, 1usize, 1usize),
        (Position::Defender, 4, 1),
        (Position::Midfielder, 4, 1),
        (Position::Forward, 2, 1),
    ];
    c.bench_function("squad_build_and_substitute", |b| {
        b.iter(|| {
            let mut squad = WildcardSquad::new(1000);
            let mut id = 0u32;
            for (position, starters, bench) in lines {
                for slot in 0..starters + bench {
                    id += 1;
                    let player = WildcardPlayer {
                        id,
                        web_name: format!("P{id}"),
                        team: format!("T{}", id % 8),
                        team_id: None,
                        position,
                        now_cost: 50,
                        total_points: 0,
                        form: None,
                    };
                    squad.add_player(position, player, slot >= starters).unwrap();
                }
            }
            squad.substitute(12, 13).unwrap();
            black_box(squad.validate_for_save().is_ok());
        })
    });
}

fn bench_plan_revalidate(c: &mut Criterion) {
    let bootstrap: Bootstrap = parse_json(BOOTSTRAP_JSON, "bootstrap").unwrap();
    let picks: EntryPicks = parse_json(PICKS_JSON, "picks").unwrap();
    let mut plan = TransferPlan::from_picks(1, 18, &picks, &bootstrap);
    plan.horizon = 10;
    for (offset, out_id) in [1u32, 2, 328, 10].into_iter().enumerate() {
        let previous = plan.squad_for_week(18 + offset as u32);
        let Some(out) = previous.iter().find(|p| p.id == out_id).cloned() else {
            continue;
        };
        let player_in = PlannerPlayer {
            id: 1000 + out_id,
            web_name: format!("Swap {out_id}"),
            team: format!("N{out_id}"),
            position: out.position,
            now_cost: out.now_cost,
        };
        plan.add_transfer(18 + offset as u32, out_id, player_in).unwrap();
    }

    c.bench_function("plan_revalidate", |b| {
        b.iter(|| {
            let mut copy = plan.clone();
            black_box(copy.revalidate());
        })
    });
}

fn bench_players_sort(c: &mut Criterion) {
    let mut state = AppState::new();
    let mut page: PlayersPage = parse_json(PLAYERS_JSON, "players").unwrap();
    let template = page.players.clone();
    page.players = (0..500u32)
        .map(|idx| {
            let mut player = template[idx as usize % template.len()].clone();
            player.id = idx + 1;
            player.total_points = (idx * 37 % 250) as i32;
            player
        })
        .collect();
    let ProviderCommand::Fetch { generation, .. } = state.begin_fetch(state.players_request());
    apply_delta(
        &mut state,
        Delta::Fetched {
            generation,
            payload: Payload::Players(Ok(page)),
        },
    );
    state.players_sort = PlayerSort::Name;

    c.bench_function("players_sort_by_name", |b| {
        b.iter(|| black_box(state.visible_players().len()))
    });
}

fn bench_charts(c: &mut Criterion) {
    let chart: Top100Chart = parse_json(CHART_JSON, "chart").unwrap();
    let points: Vec<HeatPoint> = (0..2000)
        .map(|idx| HeatPoint {
            x: (idx * 7 % 100) as f64,
            y: (idx * 13 % 100) as f64,
        })
        .collect();

    c.bench_function("chart_candles", |b| {
        b.iter(|| black_box(trading_candles(black_box(&chart.points)).len()))
    });
    c.bench_function("heatmap_bin", |b| {
        b.iter(|| black_box(bin_heatmap(black_box(&points), 20, 12).cells.len()))
    });
}

criterion_group!(
    perf,
    bench_players_parse,
    bench_shared_squad_load,
    bench_squad_build,
    bench_plan_revalidate,
    bench_players_sort,
    bench_charts
);
criterion_main!(perf);

static PLAYERS_JSON: &str = include_str!("../tests/fixtures/players_page.json");
static WILDCARD_JSON: &str = include_str!("../tests/fixtures/wildcard_team.json");
static BOOTSTRAP_JSON: &str = include_str!("../tests/fixtures/bootstrap.json");
static PICKS_JSON: &str = include_str!("../tests/fixtures/entry_picks.json");
static CHART_JSON: &str = include_str!("../tests/fixtures/top100_chart.json");
