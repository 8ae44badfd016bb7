use std::collections::VecDeque;

use crate::charts::Heartbeat;
use crate::fetch::Resource;
use crate::models::{
    Bootstrap, CompareRadarResponse, DifferentialsResponse, DreamTeam, ElementSummary, EntryHistory,
    EntryPicks, EntrySummary, EventLive, FixturesPage, HeatmapResponse, Landing, LeagueLive,
    OptimizeResponse, PlayerDetail, PlayerSummary, PlayersPage, Position, PriceHistory,
    PricePredictorResponse, RadarResponse, RecentMatches, SaveRequest, SaveResponse,
    TemplateResponse, TickerResponse, Top100Chart, Top100Transfers, TrackResponse,
    UpcomingResponse, BestValueResponse, WildcardTeam,
};
use crate::persist::{AnalyzeSelection, LeagueSettings, OptimizerSettings, PlannerSettings};
use crate::transfer_planner::{PlanAction, PlannerPlayer, TransferPlan};
use crate::wildcard::{SquadAction, WildcardPlayer, WildcardSquad};

const MAX_LOGS: usize = 200;
const HEARTBEAT_TRAIL: usize = 120;
const HEARTBEAT_PERIOD: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Home,
    Players,
    Fixtures,
    Compare,
    Analyze,
    DreamTeam,
    Optimize,
    TransferPlanner,
    PricePredictor,
    LeagueAnalytics,
    Wildcard { code: Option<String> },
}

impl Screen {
    /// Navigation order, also used for the number-key shortcuts.
    pub fn all() -> [Screen; 11] {
        [
            Screen::Home,
            Screen::Players,
            Screen::Fixtures,
            Screen::Compare,
            Screen::Analyze,
            Screen::DreamTeam,
            Screen::Optimize,
            Screen::TransferPlanner,
            Screen::PricePredictor,
            Screen::LeagueAnalytics,
            Screen::Wildcard { code: None },
        ]
    }

    /// Unknown paths fall back to the home screen.
    pub fn from_path(path: &str) -> Screen {
        let trimmed = path.trim().trim_matches('/');
        let mut parts = trimmed.split('/').filter(|p| !p.is_empty());
        let head = parts.next().unwrap_or("");
        let tail = parts.next();
        if parts.next().is_some() {
            return Screen::Home;
        }
        match (head, tail) {
            ("", None) => Screen::Home,
            ("players", None) => Screen::Players,
            ("fixtures", None) => Screen::Fixtures,
            ("compare", None) => Screen::Compare,
            ("analyze", None) => Screen::Analyze,
            ("dream-team", None) => Screen::DreamTeam,
            ("optimize", None) => Screen::Optimize,
            ("transfer-planner", None) => Screen::TransferPlanner,
            ("price-predictor", None) => Screen::PricePredictor,
            ("league-analytics", None) => Screen::LeagueAnalytics,
            ("wildcard", None) => Screen::Wildcard { code: None },
            ("wildcard", Some(code)) => Screen::Wildcard {
                code: Some(code.to_string()),
            },
            _ => Screen::Home,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Screen::Home => "/".to_string(),
            Screen::Players => "/players".to_string(),
            Screen::Fixtures => "/fixtures".to_string(),
            Screen::Compare => "/compare".to_string(),
            Screen::Analyze => "/analyze".to_string(),
            Screen::DreamTeam => "/dream-team".to_string(),
            Screen::Optimize => "/optimize".to_string(),
            Screen::TransferPlanner => "/transfer-planner".to_string(),
            Screen::PricePredictor => "/price-predictor".to_string(),
            Screen::LeagueAnalytics => "/league-analytics".to_string(),
            Screen::Wildcard { code: None } => "/wildcard".to_string(),
            Screen::Wildcard { code: Some(code) } => format!("/wildcard/{code}"),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::Players => "Players",
            Screen::Fixtures => "Fixtures",
            Screen::Compare => "Compare",
            Screen::Analyze => "Analyze",
            Screen::DreamTeam => "Dream Team",
            Screen::Optimize => "Optimize",
            Screen::TransferPlanner => "Planner",
            Screen::PricePredictor => "Prices",
            Screen::LeagueAnalytics => "League",
            Screen::Wildcard { .. } => "Wildcard",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Screen::Home => 0,
            Screen::Players => 1,
            Screen::Fixtures => 2,
            Screen::Compare => 3,
            Screen::Analyze => 4,
            Screen::DreamTeam => 5,
            Screen::Optimize => 6,
            Screen::TransferPlanner => 7,
            Screen::PricePredictor => 8,
            Screen::LeagueAnalytics => 9,
            Screen::Wildcard { .. } => 10,
        }
    }

    pub fn next(&self) -> Screen {
        let all = Screen::all();
        all[(self.index() + 1) % all.len()].clone()
    }

    pub fn prev(&self) -> Screen {
        let all = Screen::all();
        all[(self.index() + all.len() - 1) % all.len()].clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSort {
    TotalPoints,
    Cost,
    Form,
    Name,
}

impl PlayerSort {
    pub fn next(self) -> Self {
        match self {
            PlayerSort::TotalPoints => PlayerSort::Cost,
            PlayerSort::Cost => PlayerSort::Form,
            PlayerSort::Form => PlayerSort::Name,
            PlayerSort::Name => PlayerSort::TotalPoints,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayerSort::TotalPoints => "points",
            PlayerSort::Cost => "cost",
            PlayerSort::Form => "form",
            PlayerSort::Name => "name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixturesTab {
    Gameweek,
    Ticker,
    Upcoming,
}

impl FixturesTab {
    pub fn next(self) -> Self {
        match self {
            FixturesTab::Gameweek => FixturesTab::Ticker,
            FixturesTab::Ticker => FixturesTab::Upcoming,
            FixturesTab::Upcoming => FixturesTab::Gameweek,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildcardFocus {
    Squad,
    Pool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Search,
    TeamFilter,
    Route,
    ManagerId,
    LeagueId,
    Gameweek,
    ShareCode,
    TeamName,
    Budget,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::Search => "Search players",
            PromptKind::TeamFilter => "Team filter (blank clears)",
            PromptKind::Route => "Go to route",
            PromptKind::ManagerId => "Manager id",
            PromptKind::LeagueId => "League id",
            PromptKind::Gameweek => "Gameweek",
            PromptKind::ShareCode => "Share code",
            PromptKind::TeamName => "Team name",
            PromptKind::Budget => "Budget (e.g. 100.0)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub buffer: String,
}

/// Storage writes produced while applying deltas; the UI loop flushes them.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    ShareCode(String),
    Plan(TransferPlan),
}

/// Inputs for the transfer planner base squad.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannerBase {
    pub manager_id: u32,
    pub gameweek: u32,
    pub picks: EntryPicks,
    pub bootstrap: Bootstrap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchRequest {
    Players {
        search: String,
        team: Option<String>,
        page: u32,
        page_size: u32,
    },
    PlayerDetail(u32),
    Fixtures {
        gameweek: Option<u32>,
    },
    FixtureTicker {
        horizon: u32,
    },
    UpcomingFixtures {
        days: u32,
    },
    Landing,
    DreamTeam,
    Top100Template,
    Top100BestValue,
    Top100Chart,
    Top100Transfers,
    Top100Differentials,
    Bootstrap,
    Entry(u32),
    EntryHistory(u32),
    EntryPicks {
        entry: u32,
        gameweek: u32,
    },
    EventLive(u32),
    ElementSummary(u32),
    LeagueLive(u32),
    Radar(u32),
    CompareRadar(Vec<u32>),
    Heatmap {
        player: u32,
        gameweek: u32,
    },
    RecentMatches(u32),
    PricePredictor,
    PriceHistory {
        player: u32,
        days: u32,
    },
    OptimizeTeam {
        settings: OptimizerSettings,
        manager_id: Option<u32>,
    },
    WildcardTrack,
    WildcardLoad(String),
    WildcardSave {
        code: String,
        body: SaveRequest,
    },
    /// History and bootstrap, then the picks of the latest played gameweek.
    PlannerBase {
        manager_id: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Players(Result<PlayersPage, String>),
    PlayerDetail(Result<PlayerDetail, String>),
    Fixtures(Result<FixturesPage, String>),
    FixtureTicker(Result<TickerResponse, String>),
    UpcomingFixtures(Result<UpcomingResponse, String>),
    Landing(Result<Landing, String>),
    DreamTeam(Result<DreamTeam, String>),
    Top100Template(Result<TemplateResponse, String>),
    Top100BestValue(Result<BestValueResponse, String>),
    Top100Chart(Result<Top100Chart, String>),
    Top100Transfers(Result<Top100Transfers, String>),
    Top100Differentials(Result<DifferentialsResponse, String>),
    Bootstrap(Result<Bootstrap, String>),
    Entry(Result<EntrySummary, String>),
    EntryHistory(Result<EntryHistory, String>),
    EntryPicks(Result<EntryPicks, String>),
    EventLive(Result<EventLive, String>),
    ElementSummary(Result<ElementSummary, String>),
    LeagueLive(Result<LeagueLive, String>),
    Radar(Result<RadarResponse, String>),
    CompareRadar(Result<CompareRadarResponse, String>),
    Heatmap(Result<HeatmapResponse, String>),
    RecentMatches(Result<RecentMatches, String>),
    PricePredictor(Result<PricePredictorResponse, String>),
    PriceHistory(Result<PriceHistory, String>),
    OptimizeTeam(Result<OptimizeResponse, String>),
    WildcardTrack(Result<TrackResponse, String>),
    WildcardLoad(Result<WildcardTeam, String>),
    WildcardSave(Result<SaveResponse, String>),
    PlannerBase(Result<PlannerBase, String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    Fetched { generation: u64, payload: Payload },
    Log(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCommand {
    Fetch {
        generation: u64,
        request: FetchRequest,
    },
}

pub struct AppState {
    pub screen: Screen,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
    pub alert: Option<String>,
    pub prompt: Option<Prompt>,
    pub heartbeat: Heartbeat,

    pub page_size: u32,
    pub ticker_horizon: u32,
    pub upcoming_days: u32,

    pub players: Resource<PlayersPage>,
    pub player_detail: Resource<PlayerDetail>,
    pub fixtures: Resource<FixturesPage>,
    pub ticker: Resource<TickerResponse>,
    pub upcoming: Resource<UpcomingResponse>,
    pub landing: Resource<Landing>,
    pub dream_team: Resource<DreamTeam>,
    pub top100_template: Resource<TemplateResponse>,
    pub top100_best_value: Resource<BestValueResponse>,
    pub top100_chart: Resource<Top100Chart>,
    pub top100_transfers: Resource<Top100Transfers>,
    pub top100_differentials: Resource<DifferentialsResponse>,
    pub bootstrap: Resource<Bootstrap>,
    pub entry: Resource<EntrySummary>,
    pub entry_history: Resource<EntryHistory>,
    pub entry_picks: Resource<EntryPicks>,
    pub event_live: Resource<EventLive>,
    pub element_summary: Resource<ElementSummary>,
    pub league_live: Resource<LeagueLive>,
    pub radar: Resource<RadarResponse>,
    pub compare_radar: Resource<CompareRadarResponse>,
    pub heatmap: Resource<HeatmapResponse>,
    pub recent_matches: Resource<RecentMatches>,
    pub price_predictor: Resource<PricePredictorResponse>,
    pub price_history: Resource<PriceHistory>,
    pub optimize: Resource<OptimizeResponse>,
    pub wildcard_track: Resource<TrackResponse>,
    pub wildcard_shared: Resource<WildcardTeam>,
    pub wildcard_save: Resource<SaveResponse>,
    pub planner_base: Resource<PlannerBase>,

    pub players_search: String,
    pub players_team: Option<String>,
    pub players_page: u32,
    pub players_position: Option<Position>,
    pub players_sort: PlayerSort,
    pub players_selected: usize,

    pub fixtures_tab: FixturesTab,
    pub fixtures_gameweek: Option<u32>,

    pub compare_ids: Vec<u32>,

    pub analyze: AnalyzeSelection,
    pub league: LeagueSettings,
    pub optimizer: OptimizerSettings,
    pub price_selected: usize,

    pub planner: Option<TransferPlan>,
    pub planner_settings: PlannerSettings,
    pub planner_week: u32,
    pub planner_selected: usize,
    pub planner_out: Option<u32>,

    pub squad: WildcardSquad,
    pub wildcard_focus: WildcardFocus,
    pub wildcard_position: Position,
    pub wildcard_selected: usize,
    pub wildcard_pool_selected: usize,
    pub wildcard_sub_pending: Option<u32>,
    pub share_code: Option<String>,
    pub wildcard_summary: Option<SaveResponse>,
    pub wildcard_team_name: String,

    pub pending_writes: Vec<PendingWrite>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Home,
            help_overlay: false,
            logs: VecDeque::with_capacity(MAX_LOGS),
            alert: None,
            prompt: None,
            heartbeat: Heartbeat::new(HEARTBEAT_TRAIL, HEARTBEAT_PERIOD),
            page_size: 50,
            ticker_horizon: 5,
            upcoming_days: 7,
            players: Resource::new(),
            player_detail: Resource::new(),
            fixtures: Resource::new(),
            ticker: Resource::new(),
            upcoming: Resource::new(),
            landing: Resource::new(),
            dream_team: Resource::new(),
            top100_template: Resource::new(),
            top100_best_value: Resource::new(),
            top100_chart: Resource::new(),
            top100_transfers: Resource::new(),
            top100_differentials: Resource::new(),
            bootstrap: Resource::new(),
            entry: Resource::new(),
            entry_history: Resource::new(),
            entry_picks: Resource::new(),
            event_live: Resource::new(),
            element_summary: Resource::new(),
            league_live: Resource::new(),
            radar: Resource::new(),
            compare_radar: Resource::new(),
            heatmap: Resource::new(),
            recent_matches: Resource::new(),
            price_predictor: Resource::new(),
            price_history: Resource::new(),
            optimize: Resource::new(),
            wildcard_track: Resource::new(),
            wildcard_shared: Resource::new(),
            wildcard_save: Resource::new(),
            planner_base: Resource::new(),
            players_search: String::new(),
            players_team: None,
            players_page: 1,
            players_position: None,
            players_sort: PlayerSort::TotalPoints,
            players_selected: 0,
            fixtures_tab: FixturesTab::Gameweek,
            fixtures_gameweek: None,
            compare_ids: Vec::new(),
            analyze: AnalyzeSelection::default(),
            league: LeagueSettings::default(),
            optimizer: OptimizerSettings::default(),
            price_selected: 0,
            planner: None,
            planner_settings: PlannerSettings::default(),
            planner_week: 0,
            planner_selected: 0,
            planner_out: None,
            squad: WildcardSquad::default(),
            wildcard_focus: WildcardFocus::Pool,
            wildcard_position: Position::Goalkeeper,
            wildcard_selected: 0,
            wildcard_pool_selected: 0,
            wildcard_sub_pending: None,
            share_code: None,
            wildcard_summary: None,
            wildcard_team_name: String::new(),
            pending_writes: Vec::new(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn raise_alert(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        self.push_log(format!("[WARN] {msg}"));
        self.alert = Some(msg);
    }

    /// Marks the matching resource as loading and tags the command with its generation.
    pub fn begin_fetch(&mut self, request: FetchRequest) -> ProviderCommand {
        let generation = match &request {
            FetchRequest::Players { .. } => self.players.begin(),
            FetchRequest::PlayerDetail(_) => self.player_detail.begin(),
            FetchRequest::Fixtures { .. } => self.fixtures.begin(),
            FetchRequest::FixtureTicker { .. } => self.ticker.begin(),
            FetchRequest::UpcomingFixtures { .. } => self.upcoming.begin(),
            FetchRequest::Landing => self.landing.begin(),
            FetchRequest::DreamTeam => self.dream_team.begin(),
            FetchRequest::Top100Template => self.top100_template.begin(),
            FetchRequest::Top100BestValue => self.top100_best_value.begin(),
            FetchRequest::Top100Chart => self.top100_chart.begin(),
            FetchRequest::Top100Transfers => self.top100_transfers.begin(),
            FetchRequest::Top100Differentials => self.top100_differentials.begin(),
            FetchRequest::Bootstrap => self.bootstrap.begin(),
            FetchRequest::Entry(_) => self.entry.begin(),
            FetchRequest::EntryHistory(_) => self.entry_history.begin(),
            FetchRequest::EntryPicks { .. } => self.entry_picks.begin(),
            FetchRequest::EventLive(_) => self.event_live.begin(),
            FetchRequest::ElementSummary(_) => self.element_summary.begin(),
            FetchRequest::LeagueLive(_) => self.league_live.begin(),
            FetchRequest::Radar(_) => self.radar.begin(),
            FetchRequest::CompareRadar(_) => self.compare_radar.begin(),
            FetchRequest::Heatmap { .. } => self.heatmap.begin(),
            FetchRequest::RecentMatches(_) => self.recent_matches.begin(),
            FetchRequest::PricePredictor => self.price_predictor.begin(),
            FetchRequest::PriceHistory { .. } => self.price_history.begin(),
            FetchRequest::OptimizeTeam { .. } => self.optimize.begin(),
            FetchRequest::WildcardTrack => self.wildcard_track.begin(),
            FetchRequest::WildcardLoad(_) => self.wildcard_shared.begin(),
            FetchRequest::WildcardSave { .. } => self.wildcard_save.begin(),
            FetchRequest::PlannerBase { .. } => self.planner_base.begin(),
        };
        ProviderCommand::Fetch {
            generation,
            request,
        }
    }

    pub fn players_request(&self) -> FetchRequest {
        FetchRequest::Players {
            search: self.players_search.clone(),
            team: self.players_team.clone(),
            page: self.players_page,
            page_size: self.page_size,
        }
    }

    /// Requests a screen needs when it is entered.
    pub fn requests_for_screen(&self) -> Vec<FetchRequest> {
        match &self.screen {
            Screen::Home => vec![
                FetchRequest::Landing,
                FetchRequest::Top100Chart,
                FetchRequest::Top100Template,
            ],
            Screen::Players => vec![self.players_request()],
            Screen::Fixtures => vec![
                FetchRequest::Fixtures {
                    gameweek: self.fixtures_gameweek,
                },
                FetchRequest::FixtureTicker {
                    horizon: self.ticker_horizon,
                },
                FetchRequest::UpcomingFixtures {
                    days: self.upcoming_days,
                },
            ],
            Screen::Compare => {
                if self.compare_ids.is_empty() {
                    Vec::new()
                } else {
                    vec![FetchRequest::CompareRadar(self.compare_ids.clone())]
                }
            }
            Screen::Analyze => {
                let Some(manager) = self.analyze.manager_id else {
                    return Vec::new();
                };
                let mut requests = vec![
                    FetchRequest::Entry(manager),
                    FetchRequest::EntryHistory(manager),
                    FetchRequest::Bootstrap,
                ];
                if let Some(gameweek) = self.analyze.gameweek {
                    requests.push(FetchRequest::EntryPicks {
                        entry: manager,
                        gameweek,
                    });
                    requests.push(FetchRequest::EventLive(gameweek));
                }
                requests
            }
            Screen::DreamTeam => vec![
                FetchRequest::DreamTeam,
                FetchRequest::Top100BestValue,
                FetchRequest::Top100Differentials,
                FetchRequest::Top100Transfers,
            ],
            Screen::Optimize => Vec::new(),
            Screen::TransferPlanner => {
                let mut requests = vec![self.players_request()];
                if let Some(manager_id) = self.planner_settings.manager_id {
                    requests.push(FetchRequest::PlannerBase { manager_id });
                }
                requests
            }
            Screen::PricePredictor => vec![FetchRequest::PricePredictor],
            Screen::LeagueAnalytics => match self.league.league_id {
                Some(id) => vec![FetchRequest::LeagueLive(id)],
                None => Vec::new(),
            },
            Screen::Wildcard { code } => {
                let mut requests = vec![self.players_request()];
                match code {
                    Some(code) => requests.push(FetchRequest::WildcardLoad(code.clone())),
                    None if self.share_code.is_none() => requests.push(FetchRequest::WildcardTrack),
                    None => {}
                }
                requests
            }
        }
    }

    /// Requests for the side panel of a selected player.
    pub fn player_panel_requests(&self, player_id: u32) -> Vec<FetchRequest> {
        let mut requests = vec![
            FetchRequest::PlayerDetail(player_id),
            FetchRequest::Radar(player_id),
            FetchRequest::RecentMatches(player_id),
            FetchRequest::ElementSummary(player_id),
            FetchRequest::PriceHistory {
                player: player_id,
                days: 30,
            },
        ];
        if let Some(gameweek) = self.current_gameweek() {
            requests.push(FetchRequest::Heatmap {
                player: player_id,
                gameweek,
            });
        }
        requests
    }

    pub fn current_gameweek(&self) -> Option<u32> {
        if let Some(gw) = self.landing.data().map(|l| l.current_gameweek).filter(|gw| *gw > 0) {
            return Some(gw);
        }
        if let Some(gw) = self.bootstrap.data().and_then(|b| b.current_event()) {
            return Some(gw);
        }
        self.fixtures.data().map(|f| f.gameweek).filter(|gw| *gw > 0)
    }

    /// Current page after the client-side position filter and sort.
    pub fn visible_players(&self) -> Vec<&PlayerSummary> {
        self.filtered_players(self.players_position)
    }

    pub fn filtered_players(&self, position: Option<Position>) -> Vec<&PlayerSummary> {
        let Some(page) = self.players.data() else {
            return Vec::new();
        };
        let mut rows: Vec<&PlayerSummary> = page
            .players
            .iter()
            .filter(|p| position.is_none() || p.position() == position)
            .collect();
        match self.players_sort {
            PlayerSort::TotalPoints => rows.sort_by(|a, b| b.total_points.cmp(&a.total_points)),
            PlayerSort::Cost => rows.sort_by(|a, b| b.now_cost.cmp(&a.now_cost)),
            PlayerSort::Form => rows.sort_by(|a, b| {
                b.form
                    .unwrap_or(0.0)
                    .total_cmp(&a.form.unwrap_or(0.0))
            }),
            PlayerSort::Name => rows.sort_by(|a, b| {
                a.display_name()
                    .to_ascii_lowercase()
                    .cmp(&b.display_name().to_ascii_lowercase())
            }),
        }
        rows
    }

    pub fn selected_player(&self) -> Option<&PlayerSummary> {
        self.visible_players().get(self.players_selected).copied()
    }

    pub fn clamp_players_selection(&mut self) {
        let len = self.visible_players().len();
        if len == 0 {
            self.players_selected = 0;
        } else if self.players_selected >= len {
            self.players_selected = len - 1;
        }
    }

    /// Adds or removes a player from the comparison set (max 4).
    pub fn toggle_compare(&mut self, player_id: u32) -> bool {
        if let Some(idx) = self.compare_ids.iter().position(|id| *id == player_id) {
            self.compare_ids.remove(idx);
            return true;
        }
        if self.compare_ids.len() >= 4 {
            self.raise_alert("Compare holds at most 4 players");
            return false;
        }
        self.compare_ids.push(player_id);
        true
    }

    /// Wildcard candidates for the active position, excluding current squad members.
    pub fn wildcard_pool(&self) -> Vec<&PlayerSummary> {
        self.filtered_players(Some(self.wildcard_position))
            .into_iter()
            .filter(|p| !self.squad.contains(p.id))
            .collect()
    }

    /// Squad rows in display order: GK, DEF, MID, FWD, then bench.
    pub fn wildcard_rows(&self) -> Vec<&WildcardPlayer> {
        Position::ALL
            .iter()
            .flat_map(|pos| self.squad.line(*pos).iter())
            .chain(self.squad.bench().iter())
            .collect()
    }

    pub fn selected_squad_player(&self) -> Option<&WildcardPlayer> {
        self.wildcard_rows().get(self.wildcard_selected).copied()
    }

    /// Applies a squad action; a rejection becomes a blocking alert.
    pub fn wildcard_apply(&mut self, action: SquadAction) -> bool {
        match self.squad.apply(action) {
            Ok(()) => {
                let rows = self.wildcard_rows().len();
                if rows == 0 {
                    self.wildcard_selected = 0;
                } else if self.wildcard_selected >= rows {
                    self.wildcard_selected = rows - 1;
                }
                true
            }
            Err(err) => {
                self.raise_alert(err.to_string());
                false
            }
        }
    }

    /// Picks the pending bench player, or completes the substitution with a starter.
    pub fn wildcard_substitute(&mut self) {
        let Some(selected) = self.selected_squad_player().map(|p| p.id) else {
            return;
        };
        let on_bench = self.squad.bench().iter().any(|p| p.id == selected);
        match (self.wildcard_sub_pending, on_bench) {
            (None, true) => {
                self.wildcard_sub_pending = Some(selected);
                self.push_log("[INFO] Pick a starter to swap in");
            }
            (None, false) => self.raise_alert("Select a bench player first"),
            (Some(bench_id), false) => {
                self.wildcard_sub_pending = None;
                self.wildcard_apply(SquadAction::Substitute {
                    bench_id,
                    starter_id: selected,
                });
            }
            (Some(_), true) => {
                self.wildcard_sub_pending = Some(selected);
            }
        }
    }

    pub fn save_request(&self) -> SaveRequest {
        SaveRequest {
            squad_data: self.squad.to_squad_data(),
            team_name: self.wildcard_team_name.clone(),
        }
    }

    pub fn planner_pool(&self, position: Position) -> Vec<PlannerPlayer> {
        let Some(plan) = self.planner.as_ref() else {
            return Vec::new();
        };
        let squad = plan.squad_for_week(self.planner_week);
        self.filtered_players(Some(position))
            .into_iter()
            .filter(|p| !squad.iter().any(|s| s.id == p.id))
            .filter_map(|p| {
                Some(PlannerPlayer {
                    id: p.id,
                    web_name: p.display_name().to_string(),
                    team: p.team.clone()?,
                    position,
                    now_cost: p.now_cost,
                })
            })
            .collect()
    }

    pub fn planner_apply(&mut self, action: PlanAction) -> bool {
        let Some(plan) = self.planner.as_mut() else {
            self.raise_alert("Load a manager squad first");
            return false;
        };
        match plan.apply(action) {
            Ok(pruned) => {
                let snapshot = plan.clone();
                if pruned > 0 {
                    self.push_log(format!(
                        "[INFO] Dropped {pruned} later transfer(s) that no longer fit"
                    ));
                }
                self.pending_writes.push(PendingWrite::Plan(snapshot));
                true
            }
            Err(err) => {
                self.raise_alert(err.to_string());
                false
            }
        }
    }

    pub fn take_pending_writes(&mut self) -> Vec<PendingWrite> {
        std::mem::take(&mut self.pending_writes)
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Log(msg) => state.push_log(msg),
        Delta::Fetched {
            generation,
            payload,
        } => apply_payload(state, generation, payload),
    }
}

fn apply_payload(state: &mut AppState, generation: u64, payload: Payload) {
    match payload {
        Payload::Players(result) => {
            if state.players.settle(generation, result) {
                state.clamp_players_selection();
            }
        }
        Payload::PlayerDetail(result) => {
            state.player_detail.settle(generation, result);
        }
        Payload::Fixtures(result) => {
            if state.fixtures.settle(generation, result) {
                if let Some(page) = state.fixtures.data() {
                    if page.gameweek > 0 {
                        state.fixtures_gameweek = Some(page.gameweek);
                    }
                }
            }
        }
        Payload::FixtureTicker(result) => {
            state.ticker.settle(generation, result);
        }
        Payload::UpcomingFixtures(result) => {
            state.upcoming.settle(generation, result);
        }
        Payload::Landing(result) => {
            state.landing.settle(generation, result);
        }
        Payload::DreamTeam(result) => {
            state.dream_team.settle(generation, result);
        }
        Payload::Top100Template(result) => {
            state.top100_template.settle(generation, result);
        }
        Payload::Top100BestValue(result) => {
            state.top100_best_value.settle(generation, result);
        }
        Payload::Top100Chart(result) => {
            state.top100_chart.settle(generation, result);
        }
        Payload::Top100Transfers(result) => {
            state.top100_transfers.settle(generation, result);
        }
        Payload::Top100Differentials(result) => {
            state.top100_differentials.settle(generation, result);
        }
        Payload::Bootstrap(result) => {
            state.bootstrap.settle(generation, result);
        }
        Payload::Entry(result) => {
            state.entry.settle(generation, result);
        }
        Payload::EntryHistory(result) => {
            state.entry_history.settle(generation, result);
        }
        Payload::EntryPicks(result) => {
            state.entry_picks.settle(generation, result);
        }
        Payload::EventLive(result) => {
            state.event_live.settle(generation, result);
        }
        Payload::ElementSummary(result) => {
            state.element_summary.settle(generation, result);
        }
        Payload::LeagueLive(result) => {
            state.league_live.settle(generation, result);
        }
        Payload::Radar(result) => {
            state.radar.settle(generation, result);
        }
        Payload::CompareRadar(result) => {
            state.compare_radar.settle(generation, result);
        }
        Payload::Heatmap(result) => {
            state.heatmap.settle(generation, result);
        }
        Payload::RecentMatches(result) => {
            state.recent_matches.settle(generation, result);
        }
        Payload::PricePredictor(result) => {
            if state.price_predictor.settle(generation, result) {
                state.price_selected = 0;
            }
        }
        Payload::PriceHistory(result) => {
            state.price_history.settle(generation, result);
        }
        Payload::OptimizeTeam(result) => {
            if state.optimize.settle(generation, result) {
                if let Some(err) = state.optimize.error().map(str::to_string) {
                    state.push_log(format!("[WARN] Optimizer failed: {err}"));
                }
            }
        }
        Payload::WildcardTrack(result) => {
            if !state.wildcard_track.settle(generation, result) {
                return;
            }
            let code = state
                .wildcard_track
                .data()
                .map(|t| t.code.trim().to_string())
                .filter(|c| !c.is_empty());
            match code {
                Some(code) if state.share_code.is_none() => {
                    state.push_log(format!("[INFO] Wildcard share code {code}"));
                    state.share_code = Some(code.clone());
                    state.pending_writes.push(PendingWrite::ShareCode(code));
                }
                Some(_) => {}
                None => {
                    let err = state
                        .wildcard_track
                        .error()
                        .unwrap_or("no code returned")
                        .to_string();
                    state.push_log(format!("[WARN] Wildcard tracking failed: {err}"));
                }
            }
        }
        Payload::WildcardLoad(result) => {
            if !state.wildcard_shared.settle(generation, result) {
                return;
            }
            if let Some(err) = state.wildcard_shared.error().map(str::to_string) {
                state.raise_alert(format!("Could not load shared squad: {err}"));
                return;
            }
            let Some(team) = state.wildcard_shared.data() else {
                return;
            };
            let squad = WildcardSquad::from_shared(team, state.squad.budget());
            let code = team.code.trim().to_string();
            let team_name = team.team_name.clone();
            let count = squad.player_count();
            state.squad = squad;
            state.wildcard_selected = 0;
            state.wildcard_sub_pending = None;
            if !team_name.is_empty() {
                state.wildcard_team_name = team_name;
            }
            if !code.is_empty() {
                state.share_code = Some(code.clone());
                state.pending_writes.push(PendingWrite::ShareCode(code.clone()));
            }
            // Now the active share code; refresh must not reload it.
            if matches!(state.screen, Screen::Wildcard { code: Some(_) }) {
                state.screen = Screen::Wildcard { code: None };
            }
            state.push_log(format!("[INFO] Loaded shared squad {code} ({count} players)"));
        }
        Payload::WildcardSave(result) => {
            if !state.wildcard_save.settle(generation, result) {
                return;
            }
            if let Some(err) = state.wildcard_save.error().map(str::to_string) {
                state.raise_alert(format!("Save failed: {err}"));
                return;
            }
            state.wildcard_summary = state.wildcard_save.data().cloned();
            if let Some(summary) = state.wildcard_summary.as_ref() {
                let msg = format!(
                    "[INFO] Squad saved: {:.1}m, {} predicted points",
                    summary.total_cost, summary.predicted_points
                );
                state.push_log(msg);
            }
        }
        Payload::PlannerBase(result) => {
            if !state.planner_base.settle(generation, result) {
                return;
            }
            let Some(base) = state.planner_base.data() else {
                return;
            };
            if state.planner_settings.manager_id != Some(base.manager_id) {
                return;
            }
            let mut fresh = TransferPlan::from_picks(
                base.manager_id,
                base.gameweek + 1,
                &base.picks,
                &base.bootstrap,
            );
            fresh.horizon = state.planner_settings.horizon;
            let (plan, pruned) = match state.planner.take() {
                Some(previous) => fresh.rebase(&previous),
                None => (fresh, 0),
            };
            if pruned > 0 {
                state.push_log(format!(
                    "[INFO] Dropped {pruned} planned transfer(s) after refreshing the squad"
                ));
            }
            state.planner_week = plan.start_gameweek;
            state.planner_selected = 0;
            state.planner_out = None;
            state.pending_writes.push(PendingWrite::Plan(plan.clone()));
            state.planner = Some(plan);
        }
    }
}
