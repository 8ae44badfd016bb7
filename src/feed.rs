use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use anyhow::anyhow;
use serde::de::DeserializeOwned;

use crate::api::{self, Backend, Endpoint};
use crate::models::{Bootstrap, EntryHistory, EntryPicks};
use crate::state::{Delta, FetchRequest, Payload, PlannerBase, ProviderCommand};

/// Runs commands one at a time on a worker thread until either channel closes.
pub fn spawn_provider(
    backend: Arc<dyn Backend>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let pool = build_fetch_pool();
        while let Ok(cmd) = cmd_rx.recv() {
            let deltas = with_fetch_pool(&pool, || handle_command(backend.as_ref(), cmd));
            for delta in deltas {
                if tx.send(delta).is_err() {
                    return;
                }
            }
        }
    })
}

pub fn handle_command(backend: &dyn Backend, cmd: ProviderCommand) -> Vec<Delta> {
    match cmd {
        ProviderCommand::Fetch {
            generation,
            request,
        } => {
            let label = request_label(&request);
            let payload = execute(backend, request);
            let mut deltas = Vec::with_capacity(2);
            if let Some(err) = payload_error(&payload) {
                log::warn!("{label} failed: {err}");
                deltas.push(Delta::Log(format!("[WARN] {label}: {err}")));
            } else {
                log::debug!("{label} loaded (generation {generation})");
            }
            deltas.push(Delta::Fetched {
                generation,
                payload,
            });
            deltas
        }
    }
}

fn execute(backend: &dyn Backend, request: FetchRequest) -> Payload {
    match request {
        FetchRequest::Players {
            search,
            team,
            page,
            page_size,
        } => Payload::Players(get(
            backend,
            &Endpoint::Players {
                search,
                team,
                page,
                page_size,
            },
            "players",
        )),
        FetchRequest::PlayerDetail(id) => {
            Payload::PlayerDetail(get(backend, &Endpoint::Player(id), "player"))
        }
        FetchRequest::Fixtures { gameweek } => {
            Payload::Fixtures(get(backend, &Endpoint::Fixtures { gameweek }, "fixtures"))
        }
        FetchRequest::FixtureTicker { horizon } => Payload::FixtureTicker(get(
            backend,
            &Endpoint::FixtureTicker { horizon },
            "fixture ticker",
        )),
        FetchRequest::UpcomingFixtures { days } => Payload::UpcomingFixtures(get(
            backend,
            &Endpoint::UpcomingFixtures {
                days,
                competitions: Vec::new(),
            },
            "upcoming fixtures",
        )),
        FetchRequest::Landing => Payload::Landing(get(backend, &Endpoint::Landing, "landing")),
        FetchRequest::DreamTeam => {
            Payload::DreamTeam(get(backend, &Endpoint::DreamTeam, "dream team"))
        }
        FetchRequest::Top100Template => Payload::Top100Template(get(
            backend,
            &Endpoint::Top100Template,
            "top 100 template",
        )),
        FetchRequest::Top100BestValue => Payload::Top100BestValue(get(
            backend,
            &Endpoint::Top100BestValue,
            "top 100 best value",
        )),
        FetchRequest::Top100Chart => {
            Payload::Top100Chart(get(backend, &Endpoint::Top100Chart, "top 100 chart"))
        }
        FetchRequest::Top100Transfers => Payload::Top100Transfers(get(
            backend,
            &Endpoint::Top100Transfers,
            "top 100 transfers",
        )),
        FetchRequest::Top100Differentials => Payload::Top100Differentials(get(
            backend,
            &Endpoint::Top100Differentials,
            "top 100 differentials",
        )),
        FetchRequest::Bootstrap => {
            Payload::Bootstrap(get(backend, &Endpoint::Bootstrap, "bootstrap"))
        }
        FetchRequest::Entry(id) => Payload::Entry(get(backend, &Endpoint::Entry(id), "entry")),
        FetchRequest::EntryHistory(id) => {
            Payload::EntryHistory(get(backend, &Endpoint::EntryHistory(id), "entry history"))
        }
        FetchRequest::EntryPicks { entry, gameweek } => Payload::EntryPicks(get(
            backend,
            &Endpoint::EntryPicks { entry, gameweek },
            "entry picks",
        )),
        FetchRequest::EventLive(gw) => {
            Payload::EventLive(get(backend, &Endpoint::EventLive(gw), "event live"))
        }
        FetchRequest::ElementSummary(id) => Payload::ElementSummary(get(
            backend,
            &Endpoint::ElementSummary(id),
            "element summary",
        )),
        FetchRequest::LeagueLive(id) => {
            Payload::LeagueLive(get(backend, &Endpoint::LeagueLive(id), "league"))
        }
        FetchRequest::Radar(id) => Payload::Radar(get(backend, &Endpoint::Radar(id), "radar")),
        FetchRequest::CompareRadar(ids) => Payload::CompareRadar(get(
            backend,
            &Endpoint::CompareRadar(ids),
            "compare radar",
        )),
        FetchRequest::Heatmap { player, gameweek } => Payload::Heatmap(get(
            backend,
            &Endpoint::Heatmap { player, gameweek },
            "heatmap",
        )),
        FetchRequest::RecentMatches(id) => Payload::RecentMatches(get(
            backend,
            &Endpoint::RecentMatches(id),
            "recent matches",
        )),
        FetchRequest::PricePredictor => Payload::PricePredictor(get(
            backend,
            &Endpoint::PricePredictor,
            "price predictor",
        )),
        FetchRequest::PriceHistory { player, days } => Payload::PriceHistory(get(
            backend,
            &Endpoint::PriceHistory { player, days },
            "price history",
        )),
        FetchRequest::OptimizeTeam {
            settings,
            manager_id,
        } => Payload::OptimizeTeam(get(
            backend,
            &Endpoint::OptimizeTeam {
                budget: settings.budget,
                horizon: settings.horizon,
                include_unavailable: settings.include_unavailable,
                manager_id,
            },
            "optimizer",
        )),
        FetchRequest::WildcardTrack => Payload::WildcardTrack(
            api::send_with_body(
                backend,
                &Endpoint::WildcardTrack,
                &serde_json::json!({}),
                "wildcard track",
            )
            .map_err(error_text),
        ),
        FetchRequest::WildcardLoad(code) => Payload::WildcardLoad(
            api::fetch(backend, &Endpoint::Wildcard(code.clone()), "wildcard")
                .and_then(|team: crate::models::WildcardTeam| {
                    if team.squad_data.players.is_empty() && !team.success {
                        Err(anyhow!("share code {code} not found"))
                    } else {
                        Ok(team)
                    }
                })
                .map_err(error_text),
        ),
        FetchRequest::WildcardSave { code, body } => {
            let result = serde_json::to_value(&body)
                .map_err(anyhow::Error::from)
                .and_then(|value| {
                    api::send_with_body(
                        backend,
                        &Endpoint::WildcardSave(code),
                        &value,
                        "wildcard save",
                    )
                })
                .map_err(error_text);
            Payload::WildcardSave(result)
        }
        FetchRequest::PlannerBase { manager_id } => {
            Payload::PlannerBase(load_planner_base(backend, manager_id))
        }
    }
}

/// History and bootstrap in parallel, then the picks of the latest played gameweek.
fn load_planner_base(backend: &dyn Backend, manager_id: u32) -> Result<PlannerBase, String> {
    let (history, bootstrap) = rayon::join(
        || get::<EntryHistory>(backend, &Endpoint::EntryHistory(manager_id), "entry history"),
        || get::<Bootstrap>(backend, &Endpoint::Bootstrap, "bootstrap"),
    );
    let history = history?;
    let bootstrap = bootstrap?;
    let gameweek = history
        .latest()
        .map(|row| row.event)
        .or_else(|| bootstrap.current_event())
        .ok_or_else(|| format!("manager {manager_id} has no gameweek history"))?;
    let picks: EntryPicks = get(
        backend,
        &Endpoint::EntryPicks {
            entry: manager_id,
            gameweek,
        },
        "entry picks",
    )?;
    if picks.picks.is_empty() {
        return Err(format!("manager {manager_id} has no picks for GW{gameweek}"));
    }
    Ok(PlannerBase {
        manager_id,
        gameweek,
        picks,
        bootstrap,
    })
}

fn get<T: DeserializeOwned>(
    backend: &dyn Backend,
    endpoint: &Endpoint,
    what: &str,
) -> Result<T, String> {
    api::fetch(backend, endpoint, what).map_err(error_text)
}

fn error_text(err: anyhow::Error) -> String {
    format!("{err:#}")
}

fn request_label(request: &FetchRequest) -> &'static str {
    match request {
        FetchRequest::Players { .. } => "players",
        FetchRequest::PlayerDetail(_) => "player detail",
        FetchRequest::Fixtures { .. } => "fixtures",
        FetchRequest::FixtureTicker { .. } => "fixture ticker",
        FetchRequest::UpcomingFixtures { .. } => "upcoming fixtures",
        FetchRequest::Landing => "landing",
        FetchRequest::DreamTeam => "dream team",
        FetchRequest::Top100Template => "top 100 template",
        FetchRequest::Top100BestValue => "top 100 best value",
        FetchRequest::Top100Chart => "top 100 chart",
        FetchRequest::Top100Transfers => "top 100 transfers",
        FetchRequest::Top100Differentials => "top 100 differentials",
        FetchRequest::Bootstrap => "bootstrap",
        FetchRequest::Entry(_) => "manager",
        FetchRequest::EntryHistory(_) => "manager history",
        FetchRequest::EntryPicks { .. } => "manager picks",
        FetchRequest::EventLive(_) => "live points",
        FetchRequest::ElementSummary(_) => "element summary",
        FetchRequest::LeagueLive(_) => "league",
        FetchRequest::Radar(_) => "radar",
        FetchRequest::CompareRadar(_) => "compare radar",
        FetchRequest::Heatmap { .. } => "heatmap",
        FetchRequest::RecentMatches(_) => "recent matches",
        FetchRequest::PricePredictor => "price predictor",
        FetchRequest::PriceHistory { .. } => "price history",
        FetchRequest::OptimizeTeam { .. } => "optimizer",
        FetchRequest::WildcardTrack => "wildcard track",
        FetchRequest::WildcardLoad(_) => "shared wildcard",
        FetchRequest::WildcardSave { .. } => "wildcard save",
        FetchRequest::PlannerBase { .. } => "planner squad",
    }
}

fn payload_error(payload: &Payload) -> Option<&str> {
    let err = match payload {
        Payload::Players(r) => r.as_ref().err(),
        Payload::PlayerDetail(r) => r.as_ref().err(),
        Payload::Fixtures(r) => r.as_ref().err(),
        Payload::FixtureTicker(r) => r.as_ref().err(),
        Payload::UpcomingFixtures(r) => r.as_ref().err(),
        Payload::Landing(r) => r.as_ref().err(),
        Payload::DreamTeam(r) => r.as_ref().err(),
        Payload::Top100Template(r) => r.as_ref().err(),
        Payload::Top100BestValue(r) => r.as_ref().err(),
        Payload::Top100Chart(r) => r.as_ref().err(),
        Payload::Top100Transfers(r) => r.as_ref().err(),
        Payload::Top100Differentials(r) => r.as_ref().err(),
        Payload::Bootstrap(r) => r.as_ref().err(),
        Payload::Entry(r) => r.as_ref().err(),
        Payload::EntryHistory(r) => r.as_ref().err(),
        Payload::EntryPicks(r) => r.as_ref().err(),
        Payload::EventLive(r) => r.as_ref().err(),
        Payload::ElementSummary(r) => r.as_ref().err(),
        Payload::LeagueLive(r) => r.as_ref().err(),
        Payload::Radar(r) => r.as_ref().err(),
        Payload::CompareRadar(r) => r.as_ref().err(),
        Payload::Heatmap(r) => r.as_ref().err(),
        Payload::RecentMatches(r) => r.as_ref().err(),
        Payload::PricePredictor(r) => r.as_ref().err(),
        Payload::PriceHistory(r) => r.as_ref().err(),
        Payload::OptimizeTeam(r) => r.as_ref().err(),
        Payload::WildcardTrack(r) => r.as_ref().err(),
        Payload::WildcardLoad(r) => r.as_ref().err(),
        Payload::WildcardSave(r) => r.as_ref().err(),
        Payload::PlannerBase(r) => r.as_ref().err(),
    };
    err.map(String::as_str)
}

fn build_fetch_pool() -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(fetch_parallelism())
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}

fn fetch_parallelism() -> usize {
    std::env::var("FPL_FETCH_PARALLELISM")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(4)
        .clamp(2, 16)
}
