use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Position::Goalkeeper),
            2 => Some(Position::Defender),
            3 => Some(Position::Midfielder),
            4 => Some(Position::Forward),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Position::Goalkeeper => 1,
            Position::Defender => 2,
            Position::Midfielder => 3,
            Position::Forward => 4,
        }
    }

    pub fn short(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

/// Row of `GET /api/players/`. Costs are integer tenths (`now_cost` 125 = 12.5m).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSummary {
    pub id: u32,
    pub first_name: String,
    pub second_name: String,
    pub web_name: String,
    pub team: Option<String>,
    pub team_id: Option<u32>,
    pub team_code: Option<u32>,
    pub now_cost: u32,
    pub total_points: i32,
    pub form: Option<f32>,
    pub avg_fdr: Option<f32>,
    pub element_type: u8,
    pub image_url: Option<String>,
    pub news: Option<String>,
    pub minutes: u32,
    pub goals_scored: u32,
    pub assists: u32,
    pub clean_sheets: u32,
    pub bonus: u32,
    pub selected_by_percent: Option<f32>,
}

impl PlayerSummary {
    pub fn position(&self) -> Option<Position> {
        Position::from_code(self.element_type)
    }

    pub fn display_name(&self) -> &str {
        if self.web_name.is_empty() {
            &self.second_name
        } else {
            &self.web_name
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayersPage {
    pub players: Vec<PlayerSummary>,
    pub count: u32,
    pub total: u32,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameweekPoints {
    pub game_week: u32,
    pub total_points: i32,
    pub minutes: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerDetail {
    #[serde(flatten)]
    pub summary: PlayerSummary,
    pub expected_goals: Option<f32>,
    pub expected_assists: Option<f32>,
    pub ict_index: Option<f32>,
    pub points_per_game: Option<f32>,
    pub gameweek_history: Vec<GameweekPoints>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub id: u32,
    pub event: Option<u32>,
    pub kickoff_time: Option<String>,
    pub team_h: Option<String>,
    pub team_h_short: Option<String>,
    pub team_a: Option<String>,
    pub team_a_short: Option<String>,
    pub team_h_difficulty: Option<u8>,
    pub team_a_difficulty: Option<u8>,
    pub team_h_score: Option<u32>,
    pub team_a_score: Option<u32>,
    pub finished: bool,
    pub started: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FixturesPage {
    pub gameweek: u32,
    pub fixtures: Vec<Fixture>,
    pub available_gameweeks: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TickerFixture {
    pub event: Option<u32>,
    pub opponent: String,
    pub is_home: bool,
    pub difficulty: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TickerRow {
    pub team: String,
    pub team_id: Option<u32>,
    pub fixtures: Vec<TickerFixture>,
}

impl TickerRow {
    pub fn average_difficulty(&self) -> Option<f32> {
        if self.fixtures.is_empty() {
            return None;
        }
        let sum: u32 = self.fixtures.iter().map(|f| f.difficulty as u32).sum();
        Some(sum as f32 / self.fixtures.len() as f32)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TickerResponse {
    pub horizon: u32,
    pub teams: Vec<TickerRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpcomingFixture {
    pub id: u64,
    pub competition: String,
    pub kickoff_time: Option<String>,
    pub home: String,
    pub away: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpcomingResponse {
    pub fixtures: Vec<UpcomingFixture>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerMover {
    pub id: u32,
    pub first_name: String,
    pub second_name: String,
    pub team: Option<String>,
    pub value: f64,
    pub now_cost: Option<u32>,
    pub total_points: Option<i32>,
    pub change_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MoverGroup {
    pub risers: Vec<PlayerMover>,
    pub fallers: Vec<PlayerMover>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Movers {
    pub price: MoverGroup,
    pub points: MoverGroup,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransferMovers {
    #[serde(rename = "in")]
    pub transfers_in: Vec<PlayerMover>,
    #[serde(rename = "out")]
    pub transfers_out: Vec<PlayerMover>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FixturePressure {
    pub team: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FixturePressureGroup {
    pub easiest: Vec<FixturePressure>,
    pub hardest: Vec<FixturePressure>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Pulse {
    pub value: f64,
    pub total_points_current: i64,
    pub total_transfers_in_event: i64,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NewsItem {
    pub id: u32,
    pub web_name: String,
    pub team: Option<String>,
    pub news: String,
    pub news_added: Option<String>,
}

/// Homepage bundle from `GET /api/landing/`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Landing {
    pub current_gameweek: u32,
    pub pulse: Pulse,
    pub movers: Movers,
    pub transfers: TransferMovers,
    pub fixture_pressure: FixturePressureGroup,
    pub news: Vec<NewsItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemplatePlayer {
    pub id: u32,
    pub web_name: String,
    pub team: Option<String>,
    pub element_type: u8,
    pub now_cost: u32,
    pub ownership: f64,
    pub captaincy: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TemplateResponse {
    pub gameweek: Option<u32>,
    pub players: Vec<TemplatePlayer>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BestValuePlayer {
    pub id: u32,
    pub web_name: String,
    pub team: Option<String>,
    pub element_type: u8,
    pub now_cost: u32,
    pub total_points: i32,
    pub points_per_million: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BestValueResponse {
    pub players: Vec<BestValuePlayer>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Top100ChartPoint {
    pub gameweek: u32,
    pub average_points: f64,
    pub min_points: Option<f64>,
    pub max_points: Option<f64>,
    pub overall_average: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Top100Chart {
    pub points: Vec<Top100ChartPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Top100Transfer {
    pub id: u32,
    pub web_name: String,
    pub team: Option<String>,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Top100Transfers {
    pub gameweek: Option<u32>,
    #[serde(rename = "in")]
    pub transfers_in: Vec<Top100Transfer>,
    #[serde(rename = "out")]
    pub transfers_out: Vec<Top100Transfer>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Differential {
    pub id: u32,
    pub web_name: String,
    pub team: Option<String>,
    pub element_type: u8,
    pub ownership: f64,
    pub total_points: i32,
    pub form: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DifferentialsResponse {
    pub players: Vec<Differential>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DreamPlayer {
    #[serde(flatten)]
    pub player: PlayerSummary,
    pub weighted_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DreamStarting {
    pub goalkeeper: Option<DreamPlayer>,
    pub defenders: Vec<DreamPlayer>,
    pub midfielders: Vec<DreamPlayer>,
    pub forwards: Vec<DreamPlayer>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DreamBench {
    pub goalkeeper: Option<DreamPlayer>,
    pub defender: Option<DreamPlayer>,
    pub midfielder: Option<DreamPlayer>,
    pub forward: Option<DreamPlayer>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DreamTeamStats {
    pub total_cost: f64,
    pub total_points: i32,
    pub avg_form: f64,
    pub formation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DreamTeam {
    pub starting_11: DreamStarting,
    pub bench: DreamBench,
    pub team_stats: DreamTeamStats,
}

impl DreamTeam {
    pub fn starters(&self) -> Vec<&DreamPlayer> {
        self.starting_11
            .goalkeeper
            .iter()
            .chain(self.starting_11.defenders.iter())
            .chain(self.starting_11.midfielders.iter())
            .chain(self.starting_11.forwards.iter())
            .collect()
    }

    pub fn bench_players(&self) -> Vec<&DreamPlayer> {
        [
            &self.bench.goalkeeper,
            &self.bench.defender,
            &self.bench.midfielder,
            &self.bench.forward,
        ]
        .into_iter()
        .filter_map(|p| p.as_ref())
        .collect()
    }
}

// Upstream fantasy platform shapes, passed through `/api/fpl/...`.

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BootstrapEvent {
    pub id: u32,
    pub name: String,
    pub deadline_time: Option<String>,
    pub is_current: bool,
    pub is_next: bool,
    pub finished: bool,
    pub average_entry_score: i32,
    pub highest_score: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BootstrapTeam {
    pub id: u32,
    pub name: String,
    pub short_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BootstrapElement {
    pub id: u32,
    pub web_name: String,
    pub team: u32,
    pub element_type: u8,
    pub now_cost: u32,
    pub total_points: i32,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Bootstrap {
    pub events: Vec<BootstrapEvent>,
    pub teams: Vec<BootstrapTeam>,
    pub elements: Vec<BootstrapElement>,
}

impl Bootstrap {
    pub fn current_event(&self) -> Option<u32> {
        self.events.iter().find(|e| e.is_current).map(|e| e.id)
    }

    pub fn team_short(&self, team_id: u32) -> Option<&str> {
        self.teams
            .iter()
            .find(|t| t.id == team_id)
            .map(|t| t.short_name.as_str())
    }

    pub fn element(&self, id: u32) -> Option<&BootstrapElement> {
        self.elements.iter().find(|e| e.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EntrySummary {
    pub id: u32,
    pub name: String,
    pub player_first_name: String,
    pub player_last_name: String,
    pub summary_overall_points: i32,
    pub summary_overall_rank: Option<u64>,
    pub summary_event_points: i32,
    pub current_event: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistoryRow {
    pub event: u32,
    pub points: i32,
    pub total_points: i32,
    pub rank: Option<u64>,
    pub overall_rank: Option<u64>,
    pub bank: i64,
    pub value: i64,
    pub event_transfers: u32,
    pub event_transfers_cost: u32,
    pub points_on_bench: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChipPlay {
    pub name: String,
    pub event: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EntryHistory {
    pub current: Vec<HistoryRow>,
    pub chips: Vec<ChipPlay>,
}

impl EntryHistory {
    pub fn latest(&self) -> Option<&HistoryRow> {
        self.current.iter().max_by_key(|row| row.event)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Pick {
    pub element: u32,
    pub position: u8,
    pub multiplier: u8,
    pub is_captain: bool,
    pub is_vice_captain: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PicksEntryHistory {
    pub event: u32,
    pub points: i32,
    pub bank: i64,
    pub value: i64,
    pub event_transfers: u32,
    pub event_transfers_cost: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EntryPicks {
    pub active_chip: Option<String>,
    pub entry_history: PicksEntryHistory,
    pub picks: Vec<Pick>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LiveStats {
    pub total_points: i32,
    pub minutes: u32,
    pub bonus: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LiveElement {
    pub id: u32,
    pub stats: LiveStats,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EventLive {
    pub elements: Vec<LiveElement>,
}

impl EventLive {
    pub fn points_for(&self, element: u32) -> Option<i32> {
        self.elements
            .iter()
            .find(|e| e.id == element)
            .map(|e| e.stats.total_points)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ElementFixture {
    pub event: Option<u32>,
    pub difficulty: u8,
    pub is_home: bool,
    pub team_h: u32,
    pub team_a: u32,
}

impl ElementFixture {
    pub fn opponent(&self) -> u32 {
        if self.is_home { self.team_a } else { self.team_h }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ElementHistory {
    pub round: u32,
    pub total_points: i32,
    pub minutes: u32,
    pub value: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ElementSummary {
    pub fixtures: Vec<ElementFixture>,
    pub history: Vec<ElementHistory>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LeagueInfo {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LeagueStanding {
    pub entry: u32,
    pub entry_name: String,
    pub player_name: String,
    pub rank: u32,
    pub last_rank: Option<u32>,
    pub total: i32,
    pub event_total: i32,
    pub live_points: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LeagueLive {
    pub league: LeagueInfo,
    pub gameweek: Option<u32>,
    pub standings: Vec<LeagueStanding>,
}

// SofaSport derived data.

pub const RADAR_AXES: [&str; 5] = ["Attacking", "Technical", "Tactical", "Defending", "Creativity"];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RadarAttributes {
    pub attacking: f64,
    pub technical: f64,
    pub tactical: f64,
    pub defending: f64,
    pub creativity: f64,
}

impl RadarAttributes {
    /// Values in `RADAR_AXES` order.
    pub fn values(&self) -> [f64; 5] {
        [
            self.attacking,
            self.technical,
            self.tactical,
            self.defending,
            self.creativity,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RadarResponse {
    pub player_id: u32,
    pub player_name: String,
    pub position: Option<String>,
    pub attributes: RadarAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompareRadarResponse {
    pub players: Vec<RadarResponse>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeatPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeatmapResponse {
    pub player_id: u32,
    pub gameweek: Option<u32>,
    pub points: Vec<HeatPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RecentMatch {
    pub date: Option<String>,
    pub opponent: String,
    pub is_home: bool,
    pub minutes: u32,
    pub rating: Option<f64>,
    pub goals: u32,
    pub assists: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RecentMatches {
    pub player_id: u32,
    pub matches: Vec<RecentMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PricePrediction {
    pub id: u32,
    pub web_name: String,
    pub team: Option<String>,
    pub now_cost: u32,
    pub progress: f64,
    pub predicted_change: i32,
    pub net_transfers: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PricePredictorResponse {
    pub last_updated: Option<String>,
    pub risers: Vec<PricePrediction>,
    pub fallers: Vec<PricePrediction>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PriceHistoryPoint {
    pub date: String,
    pub progress: f64,
    pub now_cost: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PriceHistory {
    pub player_id: u32,
    pub points: Vec<PriceHistoryPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OptimizedPlayer {
    pub id: u32,
    pub web_name: String,
    pub team: Option<String>,
    pub element_type: u8,
    pub now_cost: u32,
    pub expected_points: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct OptimizeResponse {
    pub status: String,
    pub budget: f64,
    pub horizon: u32,
    pub expected_points: f64,
    pub total_cost: f64,
    pub starting: Vec<OptimizedPlayer>,
    pub bench: Vec<OptimizedPlayer>,
    pub captain: Option<u32>,
    pub vice_captain: Option<u32>,
}

// Wildcard persistence.

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackResponse {
    pub success: bool,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadDataPlayer {
    pub id: u32,
    pub web_name: String,
    pub team: Option<String>,
    pub team_id: Option<u32>,
    pub element_type: u8,
    pub now_cost: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadData {
    pub players: Vec<SquadDataPlayer>,
    pub formation: Option<String>,
    pub captain: Option<u32>,
    pub vice_captain: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WildcardTeam {
    pub success: bool,
    pub code: String,
    pub squad_data: SquadData,
    pub total_cost: f64,
    pub predicted_points: i32,
    pub gameweek: Option<u32>,
    pub team_name: String,
    pub is_saved: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SaveRequest {
    pub squad_data: SquadData,
    pub team_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SaveResponse {
    pub success: bool,
    pub code: String,
    pub message: String,
    pub total_cost: f64,
    pub predicted_points: i32,
}
