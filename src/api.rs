use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::http_client::http_client;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
}

/// Every backend route the dashboard consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Players {
        search: String,
        team: Option<String>,
        page: u32,
        page_size: u32,
    },
    Player(u32),
    Fixtures {
        gameweek: Option<u32>,
    },
    FixtureTicker {
        horizon: u32,
    },
    UpcomingFixtures {
        days: u32,
        competitions: Vec<String>,
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
    Heatmap {
        player: u32,
        gameweek: u32,
    },
    RecentMatches(u32),
    CompareRadar(Vec<u32>),
    PricePredictor,
    PriceHistory {
        player: u32,
        days: u32,
    },
    OptimizeTeam {
        /// Tenths, like `now_cost`.
        budget: u32,
        horizon: u32,
        include_unavailable: bool,
        manager_id: Option<u32>,
    },
    WildcardTrack,
    Wildcard(String),
    WildcardSave(String),
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Players { .. } => "/api/players/".to_string(),
            Endpoint::Player(id) => format!("/api/players/{id}/"),
            Endpoint::Fixtures { .. } => "/api/fixtures/".to_string(),
            Endpoint::FixtureTicker { .. } => "/api/fixtures/ticker/".to_string(),
            Endpoint::UpcomingFixtures { .. } => "/api/fixtures/upcoming/".to_string(),
            Endpoint::Landing => "/api/landing/".to_string(),
            Endpoint::DreamTeam => "/api/dream-team/".to_string(),
            Endpoint::Top100Template => "/api/top100/template/".to_string(),
            Endpoint::Top100BestValue => "/api/top100/best-value/".to_string(),
            Endpoint::Top100Chart => "/api/top100/chart/".to_string(),
            Endpoint::Top100Transfers => "/api/top100/transfers/".to_string(),
            Endpoint::Top100Differentials => "/api/top100/differentials/".to_string(),
            Endpoint::Bootstrap => "/api/fpl/bootstrap-static/".to_string(),
            Endpoint::Entry(id) => format!("/api/fpl/entry/{id}/"),
            Endpoint::EntryHistory(id) => format!("/api/fpl/entry/{id}/history/"),
            Endpoint::EntryPicks { entry, gameweek } => {
                format!("/api/fpl/entry/{entry}/event/{gameweek}/picks/")
            }
            Endpoint::EventLive(gw) => format!("/api/fpl/event/{gw}/live/"),
            Endpoint::ElementSummary(id) => format!("/api/fpl/element-summary/{id}/"),
            Endpoint::LeagueLive(id) => format!("/api/fpl/league/{id}/live/"),
            Endpoint::Radar(id) => format!("/api/sofasport/player/{id}/radar/"),
            Endpoint::Heatmap { player, gameweek } => {
                format!("/api/sofasport/player/{player}/heatmap/{gameweek}/")
            }
            Endpoint::RecentMatches(id) => format!("/api/sofasport/player/{id}/recent-matches/"),
            Endpoint::CompareRadar(_) => "/api/sofasport/compare/radar/".to_string(),
            Endpoint::PricePredictor => "/api/price-predictor/".to_string(),
            Endpoint::PriceHistory { .. } => "/api/price-predictor/history/".to_string(),
            Endpoint::OptimizeTeam { .. } => "/api/optimize-team/".to_string(),
            Endpoint::WildcardTrack => "/api/wildcard/track/".to_string(),
            Endpoint::Wildcard(code) => format!("/api/wildcard/{}/", encode_segment(code)),
            Endpoint::WildcardSave(code) => {
                format!("/api/wildcard/{}/save/", encode_segment(code))
            }
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::Players {
                search,
                team,
                page,
                page_size,
            } => {
                let mut query = vec![
                    ("search", search.trim().to_string()),
                    ("page", (*page).max(1).to_string()),
                    ("page_size", page_size.to_string()),
                ];
                if let Some(team) = team.as_ref().filter(|t| !t.trim().is_empty()) {
                    query.push(("team", team.trim().to_string()));
                }
                query
            }
            Endpoint::Fixtures { gameweek } => gameweek
                .map(|gw| vec![("gameweek", gw.to_string())])
                .unwrap_or_default(),
            Endpoint::FixtureTicker { horizon } => vec![("horizon", horizon.to_string())],
            Endpoint::UpcomingFixtures { days, competitions } => {
                let mut query = vec![("days", days.to_string())];
                if !competitions.is_empty() {
                    query.push(("competitions", competitions.join(",")));
                }
                query
            }
            Endpoint::CompareRadar(ids) => vec![(
                "player_ids",
                ids.iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            )],
            Endpoint::PriceHistory { player, days } => vec![
                ("player_id", player.to_string()),
                ("days", days.to_string()),
            ],
            Endpoint::OptimizeTeam {
                budget,
                horizon,
                include_unavailable,
                manager_id,
            } => {
                let mut query = vec![
                    ("budget", format!("{:.1}", *budget as f64 / 10.0)),
                    ("horizon", horizon.to_string()),
                    ("include_unavailable", include_unavailable.to_string()),
                ];
                if let Some(id) = manager_id {
                    query.push(("manager_id", id.to_string()));
                }
                query
            }
            _ => Vec::new(),
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Endpoint::WildcardTrack => Method::Post,
            Endpoint::WildcardSave(_) => Method::Patch,
            _ => Method::Get,
        }
    }
}

fn encode_segment(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// The share code as it will appear in the URL, or `None` when nothing usable is left.
pub fn normalize_share_code(raw: &str) -> Option<String> {
    let code = encode_segment(raw);
    (!code.is_empty()).then_some(code)
}

/// Transport seam between the provider thread and the network.
pub trait Backend: Send + Sync {
    fn send(&self, endpoint: &Endpoint, body: Option<&Value>) -> Result<String>;
}

pub struct ApiClient {
    base: String,
    client: &'static Client,
}

impl ApiClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            client: http_client(timeout)?,
        })
    }

    pub fn url_for(&self, endpoint: &Endpoint) -> String {
        format!("{}{}", self.base, endpoint.path())
    }
}

impl Backend for ApiClient {
    fn send(&self, endpoint: &Endpoint, body: Option<&Value>) -> Result<String> {
        let url = self.url_for(endpoint);
        let mut req = match endpoint.method() {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Patch => self.client.patch(&url),
        }
        .header(ACCEPT, "application/json");
        let query = endpoint.query();
        if !query.is_empty() {
            req = req.query(&query);
        }
        if let Some(body) = body {
            req = req
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_string(body).context("serialize request body")?);
        }

        log::debug!("{:?} {url}", endpoint.method());
        let resp = req.send().with_context(|| format!("request to {url} failed"))?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            log::warn!("{url} returned {status}");
            return Err(anyhow!("http {}: {}", status.as_u16(), error_message(&body)));
        }
        Ok(body)
    }
}

/// Pulls `{"error": "..."}` out of a failure body, falling back to the raw text.
pub fn error_message(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(msg) = value.get("error").and_then(|v| v.as_str()) {
            return msg.to_string();
        }
        if let Some(msg) = value.get("detail").and_then(|v| v.as_str()) {
            return msg.to_string();
        }
    }
    if trimmed.is_empty() {
        return "empty response".to_string();
    }
    trimmed.chars().take(200).collect()
}

/// Decodes a body; an empty body or `null` is an error, not an empty value.
pub fn parse_json<T: DeserializeOwned>(raw: &str, what: &str) -> Result<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow!("empty {what} response"));
    }
    serde_json::from_str(trimmed).with_context(|| format!("invalid {what} json"))
}

pub fn fetch<T: DeserializeOwned>(
    backend: &dyn Backend,
    endpoint: &Endpoint,
    what: &str,
) -> Result<T> {
    let body = backend.send(endpoint, None)?;
    parse_json(&body, what)
}

pub fn send_with_body<T: DeserializeOwned>(
    backend: &dyn Backend,
    endpoint: &Endpoint,
    body: &Value,
    what: &str,
) -> Result<T> {
    let raw = backend.send(endpoint, Some(body))?;
    parse_json(&raw, what)
}
