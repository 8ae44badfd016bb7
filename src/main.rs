use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use env_logger::{Env, Target};
use rand::rngs::ThreadRng;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine, Rectangle};
use ratatui::widgets::{BarChart, Block, Borders, Clear, Paragraph, Sparkline, Wrap};

use fpl_terminal::api::{self, ApiClient};
use fpl_terminal::charts::{
    bin_heatmap, candle_bounds, polygon_segments, radar_point, radar_polygon, radar_rings,
    sparkline_values, trading_candles,
};
use fpl_terminal::config::AppConfig;
use fpl_terminal::feed;
use fpl_terminal::fetch::{Resource, ResourceView};
use fpl_terminal::models::{Position, RADAR_AXES, RadarResponse};
use fpl_terminal::persist::{
    self, AnalyzeSelection, Autosave, FileStorage, LeagueSettings, MemoryStorage,
    OptimizerSettings, Storage, keys,
};
use fpl_terminal::state::{
    self, AppState, FetchRequest, FixturesTab, PendingWrite, Prompt, PromptKind, Screen,
    WildcardFocus, apply_delta,
};
use fpl_terminal::transfer_planner::PlanAction;
use fpl_terminal::wildcard::{Formation, SquadAction, WildcardPlayer, WildcardSquad, format_cost};

const COMPARE_COLORS: [Color; 4] = [Color::Cyan, Color::Magenta, Color::Yellow, Color::Green];

struct App {
    state: AppState,
    config: AppConfig,
    storage: Box<dyn Storage>,
    session: MemoryStorage,
    autosave: Autosave,
    rng: ThreadRng,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<state::ProviderCommand>>,
}

impl App {
    fn new(
        config: AppConfig,
        storage: Box<dyn Storage>,
        cmd_tx: Option<mpsc::Sender<state::ProviderCommand>>,
    ) -> Self {
        let mut state = AppState::new();
        state.page_size = config.page_size;
        state.ticker_horizon = config.ticker_horizon;
        state.upcoming_days = config.upcoming_days;
        state.squad = WildcardSquad::new(config.budget);

        if let Some(draft) = persist::restore_draft(storage.as_ref(), config.budget) {
            state.push_log(format!(
                "[INFO] Restored wildcard draft from {} ({} players)",
                draft.saved_at,
                draft.squad.player_count()
            ));
            state.squad = draft.squad;
        }
        state.share_code = persist::load_share_code(storage.as_ref());
        state.planner_settings = persist::load_planner_settings(storage.as_ref());
        state.optimizer = persist::load_json::<OptimizerSettings>(
            storage.as_ref(),
            keys::OPTIMIZER_SETTINGS,
        )
        .unwrap_or_default();
        state.league =
            persist::load_json::<LeagueSettings>(storage.as_ref(), keys::LEAGUE_SETTINGS)
                .unwrap_or_default();
        if let Some(id) = state.planner_settings.manager_id {
            state.planner = persist::load_plan(storage.as_ref(), id);
        }

        let autosave = Autosave::new(config.autosave_interval, Instant::now());
        Self {
            state,
            config,
            storage,
            session: MemoryStorage::new(),
            autosave,
            rng: rand::thread_rng(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn request(&mut self, request: FetchRequest) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Backend unavailable");
            return;
        };
        let cmd = self.state.begin_fetch(request);
        if tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Provider stopped; request dropped");
        }
    }

    fn navigate(&mut self, mut screen: Screen) {
        if let Screen::Wildcard { code: Some(code) } = &mut screen {
            let Some(clean) = api::normalize_share_code(code) else {
                self.state.raise_alert(format!("Invalid share code: {code}"));
                return;
            };
            *code = clean;
        }
        log::info!("navigate {}", screen.path());
        self.state.screen = screen;
        self.state.help_overlay = false;
        if self.state.screen == Screen::Analyze {
            if let Some(selection) =
                persist::load_json::<AnalyzeSelection>(&self.session, keys::ANALYZE_SELECTION)
            {
                self.state.analyze = selection;
            }
        }
        self.refresh();
    }

    fn refresh(&mut self) {
        for request in self.state.requests_for_screen() {
            self.request(request);
        }
    }

    fn tick(&mut self) {
        self.flush_pending_writes();
        let now = Instant::now();
        if self.autosave.due(now) {
            self.save_draft(false);
        }
        self.state.heartbeat.step(&mut self.rng);
    }

    fn flush_pending_writes(&mut self) {
        for write in self.state.take_pending_writes() {
            let result = match &write {
                PendingWrite::ShareCode(code) => persist::save_share_code(self.storage.as_mut(), code),
                PendingWrite::Plan(plan) => persist::save_plan(self.storage.as_mut(), plan),
            };
            if let Err(err) = result {
                log::error!("storage write failed: {err:#}");
                self.state.push_log(format!("[WARN] Could not persist: {err}"));
            }
        }
    }

    fn save_draft(&mut self, manual: bool) {
        match persist::save_draft(self.storage.as_mut(), &self.state.squad) {
            Ok(draft) => {
                self.autosave.record(Instant::now());
                if manual {
                    self.state
                        .push_log(format!("[INFO] Draft saved at {}", draft.saved_at));
                }
            }
            Err(err) => {
                log::error!("draft save failed: {err:#}");
                self.state.push_log(format!("[WARN] Draft save failed: {err}"));
                self.autosave.record(Instant::now());
            }
        }
    }

    fn persist_settings(&mut self) {
        let storage = self.storage.as_mut();
        let results = [
            persist::save_json(storage, keys::OPTIMIZER_SETTINGS, &self.state.optimizer),
            persist::save_json(storage, keys::LEAGUE_SETTINGS, &self.state.league),
            persist::save_planner_settings(storage, &self.state.planner_settings),
        ];
        for err in results.into_iter().filter_map(Result::err) {
            log::error!("settings write failed: {err:#}");
            self.state.push_log(format!("[WARN] Could not persist settings: {err}"));
        }
    }

    fn persist_analyze(&mut self) {
        if let Err(err) =
            persist::save_json(&mut self.session, keys::ANALYZE_SELECTION, &self.state.analyze)
        {
            self.state.push_log(format!("[WARN] {err}"));
        }
    }

    fn open_prompt(&mut self, kind: PromptKind) {
        let buffer = match kind {
            PromptKind::Search => self.state.players_search.clone(),
            PromptKind::TeamFilter => self.state.players_team.clone().unwrap_or_default(),
            PromptKind::TeamName => self.state.wildcard_team_name.clone(),
            _ => String::new(),
        };
        self.state.prompt = Some(Prompt { kind, buffer });
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.alert.is_some() {
            self.state.alert = None;
            return;
        }
        if self.state.prompt.is_some() {
            self.on_prompt_key(key);
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('?') => {
                self.state.help_overlay = !self.state.help_overlay;
                return;
            }
            KeyCode::Tab => {
                let next = self.state.screen.next();
                self.navigate(next);
                return;
            }
            KeyCode::BackTab => {
                let prev = self.state.screen.prev();
                self.navigate(prev);
                return;
            }
            KeyCode::Char('g') => {
                self.open_prompt(PromptKind::Route);
                return;
            }
            KeyCode::Char('r') => {
                self.state.push_log("[INFO] Refreshing");
                self.refresh();
                return;
            }
            KeyCode::Char(c @ '0'..='9') => {
                let idx = if c == '0' { 9 } else { c as usize - '1' as usize };
                let screen = Screen::all()[idx].clone();
                self.navigate(screen);
                return;
            }
            KeyCode::Char('w') if !matches!(self.state.screen, Screen::Wildcard { .. }) => {
                self.navigate(Screen::Wildcard { code: None });
                return;
            }
            _ => {}
        }

        match self.state.screen.clone() {
            Screen::Players => self.on_players_key(key),
            Screen::Fixtures => self.on_fixtures_key(key),
            Screen::Compare => {
                if key.code == KeyCode::Char('x') {
                    self.state.compare_ids.clear();
                    self.state.compare_radar.reset();
                }
            }
            Screen::Analyze => self.on_analyze_key(key),
            Screen::Optimize => self.on_optimize_key(key),
            Screen::TransferPlanner => self.on_planner_key(key),
            Screen::PricePredictor => self.on_prices_key(key),
            Screen::LeagueAnalytics => match key.code {
                KeyCode::Char('l') => self.open_prompt(PromptKind::LeagueId),
                KeyCode::Char('m') => self.open_prompt(PromptKind::ManagerId),
                _ => {}
            },
            Screen::Wildcard { .. } => self.on_wildcard_key(key),
            Screen::Home | Screen::DreamTeam => {}
        }
    }

    fn on_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.state.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.state.prompt = None,
            KeyCode::Backspace => {
                prompt.buffer.pop();
            }
            KeyCode::Char(c) => prompt.buffer.push(c),
            KeyCode::Enter => {
                if let Some(prompt) = self.state.prompt.take() {
                    self.submit_prompt(prompt);
                }
            }
            _ => {}
        }
    }

    fn submit_prompt(&mut self, prompt: Prompt) {
        let value = prompt.buffer.trim().to_string();
        match prompt.kind {
            PromptKind::Search => {
                self.state.players_search = value;
                self.state.players_page = 1;
                self.state.players_selected = 0;
                self.state.wildcard_pool_selected = 0;
                let request = self.state.players_request();
                self.request(request);
            }
            PromptKind::TeamFilter => {
                self.state.players_team = (!value.is_empty()).then_some(value);
                self.state.players_page = 1;
                let request = self.state.players_request();
                self.request(request);
            }
            PromptKind::Route => {
                let route = if value.starts_with('/') {
                    value
                } else {
                    format!("/{value}")
                };
                self.navigate(Screen::from_path(&route));
            }
            PromptKind::ManagerId => {
                let Some(id) = parse_id(&value) else {
                    self.state.raise_alert(format!("Invalid manager id: {value}"));
                    return;
                };
                match self.state.screen {
                    Screen::Analyze => {
                        self.state.analyze.manager_id = Some(id);
                        self.state.analyze.gameweek = None;
                        self.persist_analyze();
                    }
                    Screen::TransferPlanner => {
                        self.state.planner_settings.manager_id = Some(id);
                        self.state.planner = persist::load_plan(self.storage.as_ref(), id);
                        self.persist_settings();
                    }
                    _ => {
                        self.state.league.manager_id = Some(id);
                        self.persist_settings();
                    }
                }
                self.refresh();
            }
            PromptKind::LeagueId => {
                let Some(id) = parse_id(&value) else {
                    self.state.raise_alert(format!("Invalid league id: {value}"));
                    return;
                };
                self.state.league.league_id = Some(id);
                self.persist_settings();
                self.refresh();
            }
            PromptKind::Gameweek => {
                let Some(gw) = parse_id(&value).filter(|gw| *gw <= 38) else {
                    self.state.raise_alert(format!("Invalid gameweek: {value}"));
                    return;
                };
                match self.state.screen {
                    Screen::Fixtures => {
                        self.state.fixtures_gameweek = Some(gw);
                        self.request(FetchRequest::Fixtures { gameweek: Some(gw) });
                    }
                    _ => {
                        self.state.analyze.gameweek = Some(gw);
                        self.persist_analyze();
                        self.refresh();
                    }
                }
            }
            PromptKind::ShareCode => {
                if value.is_empty() {
                    return;
                }
                self.navigate(Screen::Wildcard { code: Some(value) });
            }
            PromptKind::TeamName => {
                self.state.wildcard_team_name = value;
            }
            PromptKind::Budget => {
                let Some(tenths) = parse_budget(&value) else {
                    self.state.raise_alert(format!("Invalid budget: {value}"));
                    return;
                };
                self.state.optimizer.budget = tenths;
                self.persist_settings();
            }
        }
    }

    fn on_players_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let len = self.state.visible_players().len();
                if self.state.players_selected + 1 < len {
                    self.state.players_selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.players_selected = self.state.players_selected.saturating_sub(1);
            }
            KeyCode::Char('/') => self.open_prompt(PromptKind::Search),
            KeyCode::Char('t') => self.open_prompt(PromptKind::TeamFilter),
            KeyCode::Char('p') => {
                self.state.players_position = match self.state.players_position {
                    None => Some(Position::Goalkeeper),
                    Some(Position::Goalkeeper) => Some(Position::Defender),
                    Some(Position::Defender) => Some(Position::Midfielder),
                    Some(Position::Midfielder) => Some(Position::Forward),
                    Some(Position::Forward) => None,
                };
                self.state.clamp_players_selection();
            }
            KeyCode::Char('s') => {
                self.state.players_sort = self.state.players_sort.next();
            }
            KeyCode::Char(']') | KeyCode::Right => {
                let has_next = self.state.players.data().is_some_and(|p| p.has_next);
                if has_next {
                    self.state.players_page += 1;
                    self.state.players_selected = 0;
                    let request = self.state.players_request();
                    self.request(request);
                }
            }
            KeyCode::Char('[') | KeyCode::Left => {
                if self.state.players_page > 1 {
                    self.state.players_page -= 1;
                    self.state.players_selected = 0;
                    let request = self.state.players_request();
                    self.request(request);
                }
            }
            KeyCode::Enter => {
                let Some(id) = self.state.selected_player().map(|p| p.id) else {
                    return;
                };
                for request in self.state.player_panel_requests(id) {
                    self.request(request);
                }
            }
            KeyCode::Char('c') => {
                if let Some(id) = self.state.selected_player().map(|p| p.id) {
                    if self.state.toggle_compare(id) {
                        self.state
                            .push_log(format!("[INFO] Compare set: {:?}", self.state.compare_ids));
                    }
                }
            }
            _ => {}
        }
    }

    fn on_fixtures_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('v') => self.state.fixtures_tab = self.state.fixtures_tab.next(),
            KeyCode::Char('e') => self.open_prompt(PromptKind::Gameweek),
            KeyCode::Left | KeyCode::Right => {
                let Some(current) = self.state.fixtures_gameweek else {
                    return;
                };
                let available = self
                    .state
                    .fixtures
                    .data()
                    .map(|f| f.available_gameweeks.clone())
                    .unwrap_or_default();
                let target = if key.code == KeyCode::Left {
                    available.iter().copied().filter(|gw| *gw < current).max()
                } else {
                    available.iter().copied().filter(|gw| *gw > current).min()
                };
                if let Some(gw) = target {
                    self.state.fixtures_gameweek = Some(gw);
                    self.request(FetchRequest::Fixtures { gameweek: Some(gw) });
                }
            }
            _ => {}
        }
    }

    fn on_analyze_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('m') => self.open_prompt(PromptKind::ManagerId),
            KeyCode::Char('e') => self.open_prompt(PromptKind::Gameweek),
            KeyCode::Left | KeyCode::Right => {
                let latest = self
                    .state
                    .entry_history
                    .data()
                    .and_then(|h| h.latest())
                    .map(|row| row.event);
                let Some(latest) = latest else {
                    return;
                };
                let current = self.state.analyze.gameweek.unwrap_or(latest);
                let next = if key.code == KeyCode::Left {
                    current.saturating_sub(1).max(1)
                } else {
                    (current + 1).min(latest)
                };
                self.state.analyze.gameweek = Some(next);
                self.persist_analyze();
                self.refresh();
            }
            _ => {}
        }
    }

    fn on_optimize_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('b') => self.open_prompt(PromptKind::Budget),
            KeyCode::Char('h') => {
                self.state.optimizer.horizon = self.state.optimizer.horizon % 5 + 1;
                self.persist_settings();
            }
            KeyCode::Char('u') => {
                self.state.optimizer.include_unavailable = !self.state.optimizer.include_unavailable;
                self.persist_settings();
            }
            KeyCode::Enter => {
                let manager_id = self
                    .state
                    .planner_settings
                    .manager_id
                    .or(self.state.league.manager_id);
                self.request(FetchRequest::OptimizeTeam {
                    settings: self.state.optimizer,
                    manager_id,
                });
            }
            _ => {}
        }
    }

    fn on_planner_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('m') => self.open_prompt(PromptKind::ManagerId),
            KeyCode::Char('+') | KeyCode::Char('-') => {
                let horizon = self.state.planner_settings.horizon;
                let horizon = if key.code == KeyCode::Char('+') {
                    (horizon + 1).min(10)
                } else {
                    horizon.saturating_sub(1).max(1)
                };
                self.state.planner_settings.horizon = horizon;
                self.persist_settings();
                if self.state.planner.is_some() {
                    self.state.planner_apply(PlanAction::SetHorizon(horizon));
                }
            }
            KeyCode::Left | KeyCode::Right => {
                let Some(plan) = self.state.planner.as_ref() else {
                    return;
                };
                let (first, last) = (plan.start_gameweek, plan.last_gameweek());
                let week = self.state.planner_week.clamp(first, last);
                self.state.planner_week = if key.code == KeyCode::Left {
                    week.saturating_sub(1).max(first)
                } else {
                    (week + 1).min(last)
                };
                self.state.planner_selected = 0;
                self.state.planner_out = None;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                let len = self.planner_list_len();
                if self.state.planner_selected + 1 < len {
                    self.state.planner_selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.planner_selected = self.state.planner_selected.saturating_sub(1);
            }
            KeyCode::Esc => {
                self.state.planner_out = None;
                self.state.planner_selected = 0;
            }
            KeyCode::Enter => self.planner_select(),
            KeyCode::Char('d') => {
                let week = self.state.planner_week;
                let count = self
                    .state
                    .planner
                    .as_ref()
                    .map(|p| p.transfers(week).len())
                    .unwrap_or(0);
                if count > 0 {
                    self.state.planner_apply(PlanAction::Remove {
                        gameweek: week,
                        index: count - 1,
                    });
                }
            }
            KeyCode::Char('x') => {
                let week = self.state.planner_week;
                self.state.planner_apply(PlanAction::ClearWeek(week));
            }
            _ => {}
        }
    }

    fn planner_list_len(&self) -> usize {
        let Some(plan) = self.state.planner.as_ref() else {
            return 0;
        };
        let squad = plan.squad_for_week(self.state.planner_week);
        match self.state.planner_out {
            None => squad.len(),
            Some(out_id) => squad
                .iter()
                .find(|p| p.id == out_id)
                .map(|p| self.state.planner_pool(p.position).len())
                .unwrap_or(0),
        }
    }

    fn planner_select(&mut self) {
        let Some(plan) = self.state.planner.as_ref() else {
            self.state.raise_alert("Load a manager squad first");
            return;
        };
        let week = self.state.planner_week;
        let squad = plan.squad_for_week(week);
        match self.state.planner_out {
            None => {
                if let Some(player) = squad.get(self.state.planner_selected) {
                    self.state.planner_out = Some(player.id);
                    self.state.planner_selected = 0;
                }
            }
            Some(out_id) => {
                let Some(position) = squad.iter().find(|p| p.id == out_id).map(|p| p.position)
                else {
                    self.state.planner_out = None;
                    return;
                };
                let pool = self.state.planner_pool(position);
                let Some(player_in) = pool.get(self.state.planner_selected).cloned() else {
                    return;
                };
                if self.state.planner_apply(PlanAction::Add {
                    gameweek: week,
                    out_id,
                    player_in,
                }) {
                    self.state.planner_out = None;
                    self.state.planner_selected = 0;
                }
            }
        }
    }

    fn on_prices_key(&mut self, key: KeyEvent) {
        let len = self
            .state
            .price_predictor
            .data()
            .map(|p| p.risers.len() + p.fallers.len())
            .unwrap_or(0);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.state.price_selected + 1 < len {
                    self.state.price_selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.price_selected = self.state.price_selected.saturating_sub(1);
            }
            KeyCode::Enter => {
                let id = self.state.price_predictor.data().and_then(|p| {
                    p.risers
                        .iter()
                        .chain(p.fallers.iter())
                        .nth(self.state.price_selected)
                        .map(|row| row.id)
                });
                if let Some(id) = id {
                    self.request(FetchRequest::PriceHistory {
                        player: id,
                        days: 30,
                    });
                }
            }
            _ => {}
        }
    }

    fn on_wildcard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('o') => {
                self.state.wildcard_focus = match self.state.wildcard_focus {
                    WildcardFocus::Squad => WildcardFocus::Pool,
                    WildcardFocus::Pool => WildcardFocus::Squad,
                };
            }
            KeyCode::Char('f') => {
                let next = self.state.squad.formation().next();
                self.state.wildcard_apply(SquadAction::SelectFormation(next));
            }
            KeyCode::Char('p') => {
                self.state.wildcard_position = match self.state.wildcard_position {
                    Position::Goalkeeper => Position::Defender,
                    Position::Defender => Position::Midfielder,
                    Position::Midfielder => Position::Forward,
                    Position::Forward => Position::Goalkeeper,
                };
                self.state.wildcard_pool_selected = 0;
            }
            KeyCode::Char('/') => self.open_prompt(PromptKind::Search),
            KeyCode::Char('L') => self.open_prompt(PromptKind::ShareCode),
            KeyCode::Char('n') => self.open_prompt(PromptKind::TeamName),
            KeyCode::Char('S') => self.save_draft(true),
            KeyCode::Char('X') => {
                self.state.wildcard_apply(SquadAction::Clear);
                self.state.wildcard_summary = None;
                if let Err(err) = persist::clear_draft(self.storage.as_mut()) {
                    self.state.push_log(format!("[WARN] Could not clear draft: {err}"));
                } else {
                    self.state.push_log("[INFO] Draft cleared");
                }
            }
            KeyCode::Char('C') => self.save_to_cloud(),
            KeyCode::Char('j') | KeyCode::Down => match self.state.wildcard_focus {
                WildcardFocus::Pool => {
                    let len = self.state.wildcard_pool().len();
                    if self.state.wildcard_pool_selected + 1 < len {
                        self.state.wildcard_pool_selected += 1;
                    }
                }
                WildcardFocus::Squad => {
                    let len = self.state.wildcard_rows().len();
                    if self.state.wildcard_selected + 1 < len {
                        self.state.wildcard_selected += 1;
                    }
                }
            },
            KeyCode::Char('k') | KeyCode::Up => match self.state.wildcard_focus {
                WildcardFocus::Pool => {
                    self.state.wildcard_pool_selected =
                        self.state.wildcard_pool_selected.saturating_sub(1);
                }
                WildcardFocus::Squad => {
                    self.state.wildcard_selected = self.state.wildcard_selected.saturating_sub(1);
                }
            },
            KeyCode::Enter | KeyCode::Char('b') if self.state.wildcard_focus == WildcardFocus::Pool => {
                let bench = key.code == KeyCode::Char('b');
                let candidate = self
                    .state
                    .wildcard_pool()
                    .get(self.state.wildcard_pool_selected)
                    .and_then(|p| WildcardPlayer::from_summary(p));
                let Some(player) = candidate else {
                    return;
                };
                let slot = self.state.wildcard_position;
                self.state.wildcard_apply(SquadAction::AddPlayer {
                    slot,
                    player,
                    bench,
                });
            }
            KeyCode::Char('d') | KeyCode::Delete if self.state.wildcard_focus == WildcardFocus::Squad => {
                if let Some(id) = self.state.selected_squad_player().map(|p| p.id) {
                    self.state.wildcard_apply(SquadAction::RemovePlayer(id));
                }
            }
            KeyCode::Char('s') if self.state.wildcard_focus == WildcardFocus::Squad => {
                self.state.wildcard_substitute();
            }
            KeyCode::Char('c') if self.state.wildcard_focus == WildcardFocus::Squad => {
                if let Some(id) = self.state.selected_squad_player().map(|p| p.id) {
                    self.state.wildcard_apply(SquadAction::SetCaptain(id));
                }
            }
            KeyCode::Char('v') if self.state.wildcard_focus == WildcardFocus::Squad => {
                if let Some(id) = self.state.selected_squad_player().map(|p| p.id) {
                    self.state.wildcard_apply(SquadAction::SetViceCaptain(id));
                }
            }
            KeyCode::Esc => self.state.wildcard_sub_pending = None,
            _ => {}
        }
    }

    fn save_to_cloud(&mut self) {
        if let Err(err) = self.state.squad.validate_for_save() {
            self.state.raise_alert(err.to_string());
            return;
        }
        let Some(code) = self.state.share_code.clone() else {
            self.state
                .raise_alert("No share code yet; wait for tracking to finish");
            if self.state.wildcard_track.data().is_none() && !self.state.wildcard_track.is_loading() {
                self.request(FetchRequest::WildcardTrack);
            }
            return;
        };
        let body = self.state.save_request();
        self.save_draft(false);
        self.request(FetchRequest::WildcardSave { code, body });
    }
}

fn parse_id(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|id| *id > 0)
}

/// "100", "100.0" or "100.5" (millions) to tenths.
fn parse_budget(raw: &str) -> Option<u32> {
    let value = raw.trim().trim_end_matches('m').parse::<f64>().ok()?;
    if !value.is_finite() || value <= 0.0 || value > 200.0 {
        return None;
    }
    Some((value * 10.0).round() as u32)
}

fn init_logging(config: &AppConfig) {
    let Some(dir) = persist::cache_dir() else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("fpl_terminal.log"))
    else {
        return;
    };
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(config.log_filter.as_str()))
        .target(Target::Pipe(Box::new(file)))
        .try_init();
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = AppConfig::from_env();
    init_logging(&config);
    log::info!("starting against {}", config.api_base);

    let start = std::env::args()
        .nth(1)
        .map(|path| Screen::from_path(&path))
        .unwrap_or(Screen::Home);

    let storage: Box<dyn Storage> = match persist::storage_path(config.data_dir.as_deref()) {
        Some(path) => Box::new(FileStorage::open(path)),
        None => Box::new(MemoryStorage::new()),
    };

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let cmd_tx = match ApiClient::new(&config.api_base, config.http_timeout) {
        Ok(client) => {
            let backend: Arc<dyn api::Backend> = Arc::new(client);
            feed::spawn_provider(backend, tx, cmd_rx);
            Some(cmd_tx)
        }
        Err(err) => {
            log::error!("http client unavailable: {err:#}");
            None
        }
    };

    let mut app = App::new(config, storage, cmd_tx);
    if app.cmd_tx.is_none() {
        app.state.push_log("[WARN] Running offline; backend requests are disabled");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    app.navigate(start);
    let res = run_app(&mut terminal, &mut app, rx);

    app.save_draft(false);
    app.flush_pending_writes();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(frame.size());

    render_header(frame, chunks[0], app);

    let state = &app.state;
    let body = chunks[1];
    match &state.screen {
        Screen::Home => render_home(frame, body, state),
        Screen::Players => render_players(frame, body, state),
        Screen::Fixtures => render_fixtures(frame, body, state),
        Screen::Compare => render_compare(frame, body, state),
        Screen::Analyze => render_analyze(frame, body, state),
        Screen::DreamTeam => render_dream_team(frame, body, state),
        Screen::Optimize => render_optimize(frame, body, state),
        Screen::TransferPlanner => render_planner(frame, body, state),
        Screen::PricePredictor => render_prices(frame, body, state),
        Screen::LeagueAnalytics => render_league(frame, body, state),
        Screen::Wildcard { .. } => render_wildcard(frame, body, app),
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::TOP));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
    if let Some(prompt) = state.prompt.as_ref() {
        render_prompt(frame, frame.size(), prompt);
    }
    if let Some(alert) = state.alert.as_deref() {
        render_alert(frame, frame.size(), alert);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let state = &app.state;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(32)])
        .split(area);

    let tabs: Vec<Span> = Screen::all()
        .iter()
        .enumerate()
        .flat_map(|(idx, screen)| {
            let key = if idx == 9 { 0 } else { idx + 1 };
            let style = if screen.index() == state.screen.index() {
                Style::default().fg(Color::Black).bg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            };
            [
                Span::styled(format!(" {key}:{} ", screen.title()), style),
                Span::raw(" "),
            ]
        })
        .collect();
    let text = vec![
        Line::from(Span::styled(
            format!("FPL TERMINAL  {}", state.screen.path()),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(tabs),
    ];
    frame.render_widget(
        Paragraph::new(text).block(Block::default().borders(Borders::BOTTOM)),
        cols[0],
    );

    let points = state.heartbeat.points();
    let width = state.heartbeat.capacity() as f64;
    let pulse = Canvas::default()
        .x_bounds([0.0, width])
        .y_bounds([-1.0, 1.0])
        .paint(move |ctx| {
            for pair in points.windows(2) {
                ctx.draw(&CanvasLine {
                    x1: pair[0].0,
                    y1: pair[0].1,
                    x2: pair[1].0,
                    y2: pair[1].1,
                    color: Color::Green,
                });
            }
        });
    frame.render_widget(pulse, cols[1]);
}

fn footer_text(state: &AppState) -> String {
    let local = match &state.screen {
        Screen::Players => "j/k Move | / Search | t Team | p Pos | s Sort | [/] Page | Enter Detail | c Compare",
        Screen::Fixtures => "v View | ←/→ Gameweek | e Jump",
        Screen::Compare => "x Clear (mark players with c on Players)",
        Screen::Analyze => "m Manager | e Gameweek | ←/→ Gameweek",
        Screen::Optimize => "b Budget | h Horizon | u Unavailable | Enter Run",
        Screen::TransferPlanner => "m Manager | ←/→ Week | +/- Horizon | Enter Pick | d Undo | x Clear week",
        Screen::PricePredictor => "j/k Move | Enter History",
        Screen::LeagueAnalytics => "l League | m Manager",
        Screen::Wildcard { .. } => "o Focus | p Pos | f Formation | Enter/b Add | d Remove | s Sub | c/v Armband | S Save | C Cloud | L Load | X Clear",
        Screen::Home | Screen::DreamTeam => "",
    };
    format!("Tab/1-0 Screens | g Route | r Refresh | ? Help | q Quit | {local}")
}

fn console_text(state: &AppState) -> String {
    state
        .logs
        .iter()
        .rev()
        .take(5)
        .rev()
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn status_line<T>(resource: &Resource<T>, what: &str) -> Option<Line<'static>> {
    match resource.view() {
        ResourceView::Ready(_) => None,
        ResourceView::Loading => Some(Line::styled(
            format!("Loading {what}..."),
            Style::default().fg(Color::DarkGray),
        )),
        ResourceView::Failed(err) => Some(Line::styled(
            format!("Failed to load {what}: {err}"),
            Style::default().fg(Color::Red),
        )),
        ResourceView::Idle => Some(Line::styled(
            format!("No {what} loaded"),
            Style::default().fg(Color::DarkGray),
        )),
    }
}

fn block(title: &str) -> Block<'_> {
    Block::default().title(title).borders(Borders::ALL)
}

fn selected_style(selected: bool) -> Style {
    if selected {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    } else {
        Style::default()
    }
}

fn render_home(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(6)])
        .split(area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(rows[1]);

    let mut pulse_lines = Vec::new();
    if let Some(line) = status_line(&state.landing, "landing") {
        pulse_lines.push(line);
    }
    if let Some(landing) = state.landing.data() {
        pulse_lines.push(Line::from(format!(
            "GW{}  pulse {:.1}  points {}  transfers in {}",
            landing.current_gameweek,
            landing.pulse.value,
            landing.pulse.total_points_current,
            landing.pulse.total_transfers_in_event
        )));
        if let Some(updated) = landing.pulse.last_updated.as_deref() {
            pulse_lines.push(Line::styled(
                format!("updated {}", format_timestamp(updated)),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }
    frame.render_widget(Paragraph::new(pulse_lines).block(block("Pulse")), rows[0]);

    let mut movers = Vec::new();
    if let Some(landing) = state.landing.data() {
        movers.push(Line::styled("Price risers", Style::default().fg(Color::Green)));
        for m in landing.movers.price.risers.iter().take(5) {
            movers.push(Line::from(format!(
                "  {} {} {}",
                m.second_name,
                m.team.as_deref().unwrap_or(""),
                m.change_label
            )));
        }
        movers.push(Line::styled("Price fallers", Style::default().fg(Color::Red)));
        for m in landing.movers.price.fallers.iter().take(5) {
            movers.push(Line::from(format!(
                "  {} {} {}",
                m.second_name,
                m.team.as_deref().unwrap_or(""),
                m.change_label
            )));
        }
        movers.push(Line::styled("Most transferred in", Style::default().fg(Color::Cyan)));
        for m in landing.transfers.transfers_in.iter().take(5) {
            movers.push(Line::from(format!("  {} {:.0}", m.second_name, m.value)));
        }
    }
    frame.render_widget(Paragraph::new(movers).block(block("Movers")), cols[0]);

    let mut right = Vec::new();
    if let Some(landing) = state.landing.data() {
        right.push(Line::styled("Easiest fixtures", Style::default().fg(Color::Green)));
        for team in landing.fixture_pressure.easiest.iter().take(5) {
            right.push(Line::from(format!("  {:<14} {:.2}", team.team, team.score)));
        }
        right.push(Line::styled("Hardest fixtures", Style::default().fg(Color::Red)));
        for team in landing.fixture_pressure.hardest.iter().take(5) {
            right.push(Line::from(format!("  {:<14} {:.2}", team.team, team.score)));
        }
        right.push(Line::styled("News", Style::default().fg(Color::Yellow)));
        for item in landing.news.iter().take(4) {
            right.push(Line::from(format!("  {}: {}", item.web_name, item.news)));
        }
    }
    frame.render_widget(
        Paragraph::new(right)
            .wrap(Wrap { trim: true })
            .block(block("Fixtures & News")),
        cols[1],
    );

    render_top100_chart(frame, cols[2], state);
}

fn render_top100_chart(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(chart) = state.top100_chart.data() else {
        let line = status_line(&state.top100_chart, "top 100 chart")
            .unwrap_or_else(|| Line::from(""));
        frame.render_widget(Paragraph::new(line).block(block("Top 100")), area);
        return;
    };
    let candles = trading_candles(&chart.points);
    if candles.is_empty() {
        frame.render_widget(
            Paragraph::new("No gameweeks yet").block(block("Top 100")),
            area,
        );
        return;
    }
    let (low, high) = candle_bounds(&candles);
    let count = candles.len() as f64;
    let canvas = Canvas::default()
        .block(block("Top 100 average points"))
        .x_bounds([0.0, count])
        .y_bounds([low, high])
        .paint(move |ctx| {
            for (idx, candle) in candles.iter().enumerate() {
                let x = idx as f64 + 0.5;
                let color = if candle.rising() { Color::Green } else { Color::Red };
                ctx.draw(&CanvasLine {
                    x1: x,
                    y1: candle.low,
                    x2: x,
                    y2: candle.high,
                    color,
                });
                let bottom = candle.open.min(candle.close);
                ctx.draw(&Rectangle {
                    x: x - 0.3,
                    y: bottom,
                    width: 0.6,
                    height: (candle.close - candle.open).abs().max(0.01),
                    color,
                });
            }
        });
    frame.render_widget(canvas, area);
}

fn render_players(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let mut lines = Vec::new();
    let filter = format!(
        "search '{}' | team {} | pos {} | sort {} | page {}",
        state.players_search,
        state.players_team.as_deref().unwrap_or("all"),
        state.players_position.map(|p| p.short()).unwrap_or("all"),
        state.players_sort.label(),
        state.players_page
    );
    lines.push(Line::styled(filter, Style::default().fg(Color::DarkGray)));
    if let Some(line) = status_line(&state.players, "players") {
        lines.push(line);
    }
    let rows = state.visible_players();
    let visible = cols[0].height.saturating_sub(4) as usize;
    let (start, end) = visible_range(state.players_selected, rows.len(), visible);
    for (idx, player) in rows.iter().enumerate().take(end).skip(start) {
        let marker = if state.compare_ids.contains(&player.id) { "*" } else { " " };
        lines.push(Line::styled(
            format!(
                "{marker}{:<16} {:<4} {:<4} {:>6} {:>4} {:>5}",
                truncate(player.display_name(), 16),
                player.team.as_deref().unwrap_or("-"),
                player.position().map(|p| p.short()).unwrap_or("?"),
                format_cost(player.now_cost as i64),
                player.total_points,
                player.form.map(|f| format!("{f:.1}")).unwrap_or_else(|| "-".into())
            ),
            selected_style(idx == state.players_selected),
        ));
    }
    if let Some(page) = state.players.data() {
        lines.push(Line::styled(
            format!("{} of {} players, page {}/{}", page.count, page.total, page.page, page.total_pages.max(1)),
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Paragraph::new(lines).block(block("Players")), cols[0]);

    render_player_panel(frame, cols[1], state);
}

fn render_player_panel(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),
            Constraint::Min(8),
            Constraint::Length(4),
        ])
        .split(area);

    let mut lines = Vec::new();
    if let Some(line) = status_line(&state.player_detail, "player") {
        lines.push(line);
    }
    if let Some(detail) = state.player_detail.data() {
        let p = &detail.summary;
        lines.push(Line::styled(
            format!("{} {}", p.first_name, p.second_name),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        lines.push(Line::from(format!(
            "{} | {} | {} pts | form {}",
            format_cost(p.now_cost as i64),
            p.team.as_deref().unwrap_or("-"),
            p.total_points,
            p.form.map(|f| format!("{f:.1}")).unwrap_or_else(|| "-".into())
        )));
        lines.push(Line::from(format!(
            "xG {:.2} xA {:.2} ICT {:.1}",
            detail.expected_goals.unwrap_or(0.0),
            detail.expected_assists.unwrap_or(0.0),
            detail.ict_index.unwrap_or(0.0)
        )));
        if let Some(news) = p.news.as_deref().filter(|n| !n.is_empty()) {
            lines.push(Line::styled(news.to_string(), Style::default().fg(Color::Yellow)));
        }
        if let Some(recent) = state.recent_matches.data() {
            let ratings: Vec<String> = recent
                .matches
                .iter()
                .take(5)
                .map(|m| m.rating.map(|r| format!("{r:.1}")).unwrap_or_else(|| "-".into()))
                .collect();
            lines.push(Line::from(format!("Recent ratings: {}", ratings.join(" "))));
        }
        if let Some(summary) = state.element_summary.data() {
            let bootstrap = state.bootstrap.data();
            let next: Vec<Span> = summary
                .fixtures
                .iter()
                .take(5)
                .map(|fixture| {
                    let opponent = fixture.opponent();
                    let short = bootstrap
                        .and_then(|b| b.team_short(opponent))
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("#{opponent}"));
                    let label = if fixture.is_home {
                        short.to_uppercase()
                    } else {
                        short.to_lowercase()
                    };
                    Span::styled(
                        format!(" {label:<4}"),
                        Style::default().fg(Color::Black).bg(fdr_color(fixture.difficulty)),
                    )
                })
                .collect();
            if !next.is_empty() {
                let mut spans = vec![Span::raw("Next")];
                spans.extend(next);
                lines.push(Line::from(spans));
            }
            let minutes: Vec<String> = summary
                .history
                .iter()
                .rev()
                .take(5)
                .map(|h| format!("GW{} {}'", h.round, h.minutes))
                .collect();
            if !minutes.is_empty() {
                lines.push(Line::from(format!("Minutes: {}", minutes.join(" "))));
            }
        }
    }
    frame.render_widget(Paragraph::new(lines).block(block("Player")), rows[0]);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    let radar: Vec<&RadarResponse> = state.radar.data().into_iter().collect();
    render_radar(frame, charts[0], &radar, "Radar");
    render_heatmap(frame, charts[1], state);

    let history: Vec<f64> = state
        .player_detail
        .data()
        .map(|d| d.gameweek_history.iter().map(|g| g.total_points as f64).collect())
        .unwrap_or_default();
    let bars = sparkline_values(&history);
    frame.render_widget(
        Sparkline::default()
            .block(block("Points by gameweek"))
            .data(&bars)
            .style(Style::default().fg(Color::Cyan)),
        rows[2],
    );
}

fn render_radar(frame: &mut Frame, area: Rect, players: &[&RadarResponse], title: &str) {
    if players.is_empty() {
        frame.render_widget(Paragraph::new("No radar data").block(block(title)), area);
        return;
    }
    let polygons: Vec<(Vec<(f64, f64)>, Color)> = players
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            (
                radar_polygon(&p.attributes.values(), (0.0, 0.0), 1.0),
                COMPARE_COLORS[idx % COMPARE_COLORS.len()],
            )
        })
        .collect();
    let rings = radar_rings(RADAR_AXES.len(), 4, (0.0, 0.0), 1.0);
    let canvas = Canvas::default()
        .block(block(title))
        .x_bounds([-1.4, 1.4])
        .y_bounds([-1.2, 1.2])
        .paint(move |ctx| {
            for ring in &rings {
                for (a, b) in polygon_segments(ring) {
                    ctx.draw(&CanvasLine {
                        x1: a.0,
                        y1: a.1,
                        x2: b.0,
                        y2: b.1,
                        color: Color::DarkGray,
                    });
                }
            }
            for (idx, label) in RADAR_AXES.iter().enumerate() {
                let (x, y) = radar_point((0.0, 0.0), 1.1, idx, RADAR_AXES.len(), 100.0);
                ctx.print(x, y, *label);
            }
            for (points, color) in &polygons {
                for (a, b) in polygon_segments(points) {
                    ctx.draw(&CanvasLine {
                        x1: a.0,
                        y1: a.1,
                        x2: b.0,
                        y2: b.1,
                        color: *color,
                    });
                }
            }
        });
    frame.render_widget(canvas, area);
}

fn render_heatmap(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(heatmap) = state.heatmap.data() else {
        let line = status_line(&state.heatmap, "heatmap").unwrap_or_else(|| Line::from(""));
        frame.render_widget(Paragraph::new(line).block(block("Heatmap")), area);
        return;
    };
    let grid = bin_heatmap(&heatmap.points, 12, 8);
    let canvas = Canvas::default()
        .block(block("Heatmap"))
        .x_bounds([0.0, 100.0])
        .y_bounds([0.0, 100.0])
        .paint(move |ctx| {
            let cell_w = 100.0 / grid.cols as f64;
            let cell_h = 100.0 / grid.rows as f64;
            for row in 0..grid.rows {
                for col in 0..grid.cols {
                    let heat = grid.get(col, row);
                    if heat <= 0.0 {
                        continue;
                    }
                    let color = if heat > 0.66 {
                        Color::Red
                    } else if heat > 0.33 {
                        Color::Yellow
                    } else {
                        Color::Green
                    };
                    ctx.draw(&Rectangle {
                        x: col as f64 * cell_w,
                        y: row as f64 * cell_h,
                        width: cell_w * 0.9,
                        height: cell_h * 0.9,
                        color,
                    });
                }
            }
            ctx.draw(&Rectangle {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 100.0,
                color: Color::DarkGray,
            });
            ctx.draw(&CanvasLine {
                x1: 50.0,
                y1: 0.0,
                x2: 50.0,
                y2: 100.0,
                color: Color::DarkGray,
            });
        });
    frame.render_widget(canvas, area);
}

fn render_fixtures(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut lines = Vec::new();
    let title = match state.fixtures_tab {
        FixturesTab::Gameweek => {
            if let Some(line) = status_line(&state.fixtures, "fixtures") {
                lines.push(line);
            }
            if let Some(page) = state.fixtures.data() {
                for fixture in &page.fixtures {
                    let score = match (fixture.team_h_score, fixture.team_a_score) {
                        (Some(h), Some(a)) => format!("{h}-{a}"),
                        _ => "v".to_string(),
                    };
                    lines.push(Line::from(format!(
                        "{:<17} {:>4} ({}) {:^5} ({}) {:<4}",
                        fixture
                            .kickoff_time
                            .as_deref()
                            .map(format_timestamp)
                            .unwrap_or_else(|| "TBD".into()),
                        fixture.team_h_short.as_deref().unwrap_or("?"),
                        fixture.team_h_difficulty.unwrap_or(0),
                        score,
                        fixture.team_a_difficulty.unwrap_or(0),
                        fixture.team_a_short.as_deref().unwrap_or("?"),
                    )));
                }
            }
            format!(
                "Fixtures GW{}",
                state
                    .fixtures_gameweek
                    .map(|g| g.to_string())
                    .unwrap_or_else(|| "-".into())
            )
        }
        FixturesTab::Ticker => {
            if let Some(line) = status_line(&state.ticker, "ticker") {
                lines.push(line);
            }
            if let Some(ticker) = state.ticker.data() {
                let mut rows: Vec<_> = ticker.teams.iter().collect();
                rows.sort_by(|a, b| {
                    a.average_difficulty()
                        .unwrap_or(5.0)
                        .total_cmp(&b.average_difficulty().unwrap_or(5.0))
                });
                for row in rows {
                    let mut spans = vec![Span::raw(format!("{:<5}", row.team))];
                    for fixture in &row.fixtures {
                        let label = if fixture.is_home {
                            fixture.opponent.to_uppercase()
                        } else {
                            fixture.opponent.to_lowercase()
                        };
                        spans.push(Span::styled(
                            format!(" {:<4}", label),
                            Style::default().fg(Color::Black).bg(fdr_color(fixture.difficulty)),
                        ));
                    }
                    lines.push(Line::from(spans));
                }
            }
            format!("Fixture ticker ({} GWs)", state.ticker_horizon)
        }
        FixturesTab::Upcoming => {
            if let Some(line) = status_line(&state.upcoming, "upcoming fixtures") {
                lines.push(line);
            }
            if let Some(upcoming) = state.upcoming.data() {
                for fixture in &upcoming.fixtures {
                    lines.push(Line::from(format!(
                        "{:<17} {:<10} {} v {}",
                        fixture
                            .kickoff_time
                            .as_deref()
                            .map(format_timestamp)
                            .unwrap_or_else(|| "TBD".into()),
                        truncate(&fixture.competition, 10),
                        fixture.home,
                        fixture.away
                    )));
                }
            }
            format!("Upcoming ({} days)", state.upcoming_days)
        }
    };
    frame.render_widget(Paragraph::new(lines).block(block(&title)), area);
}

fn fdr_color(difficulty: u8) -> Color {
    match difficulty {
        0 | 1 => Color::Green,
        2 => Color::LightGreen,
        3 => Color::Gray,
        4 => Color::LightRed,
        _ => Color::Red,
    }
}

fn render_compare(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);
    let players: Vec<&RadarResponse> = state
        .compare_radar
        .data()
        .map(|c| c.players.iter().collect())
        .unwrap_or_default();
    render_radar(frame, cols[0], &players, "Compare radar");

    let mut lines = Vec::new();
    if state.compare_ids.is_empty() {
        lines.push(Line::from("Mark players with 'c' on the Players screen"));
    } else if let Some(line) = status_line(&state.compare_radar, "comparison") {
        lines.push(line);
    }
    for (idx, player) in players.iter().enumerate() {
        lines.push(Line::styled(
            player.player_name.clone(),
            Style::default()
                .fg(COMPARE_COLORS[idx % COMPARE_COLORS.len()])
                .add_modifier(Modifier::BOLD),
        ));
        for (axis, value) in RADAR_AXES.iter().zip(player.attributes.values()) {
            lines.push(Line::from(format!("  {axis:<11} {value:>5.1}")));
        }
    }
    frame.render_widget(Paragraph::new(lines).block(block("Players")), cols[1]);
}

fn render_analyze(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let mut lines = Vec::new();
    match state.analyze.manager_id {
        None => lines.push(Line::from("Press m to enter a manager id")),
        Some(_) => {
            if let Some(line) = status_line(&state.entry, "manager") {
                lines.push(line);
            }
            if let Some(entry) = state.entry.data() {
                lines.push(Line::styled(
                    format!("{} ({} {})", entry.name, entry.player_first_name, entry.player_last_name),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                lines.push(Line::from(format!(
                    "Overall {} pts | rank {}",
                    entry.summary_overall_points,
                    entry
                        .summary_overall_rank
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "-".into())
                )));
            }
            if let Some(history) = state.entry_history.data() {
                for row in history.current.iter().rev().take(8) {
                    lines.push(Line::from(format!(
                        "GW{:<2} {:>3} pts  rank {:>8}  bank {}  hits {}",
                        row.event,
                        row.points,
                        row.overall_rank.map(|r| r.to_string()).unwrap_or_default(),
                        format_cost(row.bank),
                        row.event_transfers_cost
                    )));
                }
                for chip in &history.chips {
                    lines.push(Line::styled(
                        format!("Chip {} in GW{}", chip.name, chip.event),
                        Style::default().fg(Color::Yellow),
                    ));
                }
            }
        }
    }
    frame.render_widget(Paragraph::new(lines).block(block("Manager")), cols[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(6)])
        .split(cols[1]);

    let mut picks_lines = Vec::new();
    if state.analyze.gameweek.is_none() {
        picks_lines.push(Line::from("Press e to pick a gameweek"));
    } else if let Some(line) = status_line(&state.entry_picks, "picks") {
        picks_lines.push(line);
    }
    if let (Some(picks), Some(bootstrap)) = (state.entry_picks.data(), state.bootstrap.data()) {
        let live = state.event_live.data();
        for pick in &picks.picks {
            let name = bootstrap
                .element(pick.element)
                .map(|e| e.web_name.as_str())
                .unwrap_or("?");
            let points = live
                .and_then(|l| l.points_for(pick.element))
                .map(|p| (p * pick.multiplier as i32).to_string())
                .unwrap_or_else(|| "-".into());
            let armband = if pick.is_captain {
                " (C)"
            } else if pick.is_vice_captain {
                " (V)"
            } else {
                ""
            };
            let style = if pick.position > 11 {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            picks_lines.push(Line::styled(format!("{:>2}. {name}{armband}  {points}", pick.position), style));
        }
        if let Some(chip) = picks.active_chip.as_deref() {
            picks_lines.push(Line::styled(format!("Chip: {chip}"), Style::default().fg(Color::Yellow)));
        }
    }
    let title = format!(
        "Picks GW{}",
        state.analyze.gameweek.map(|g| g.to_string()).unwrap_or_else(|| "-".into())
    );
    frame.render_widget(Paragraph::new(picks_lines).block(block(&title)), right[0]);

    let points: Vec<f64> = state
        .entry_history
        .data()
        .map(|h| h.current.iter().map(|r| r.points as f64).collect())
        .unwrap_or_default();
    let bars = sparkline_values(&points);
    frame.render_widget(
        Sparkline::default()
            .block(block("Points per gameweek"))
            .data(&bars)
            .style(Style::default().fg(Color::Green)),
        right[1],
    );
}

fn render_dream_team(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mut lines = Vec::new();
    if let Some(line) = status_line(&state.dream_team, "dream team") {
        lines.push(line);
    }
    if let Some(team) = state.dream_team.data() {
        lines.push(Line::styled(
            format!(
                "{} | {:.1}m | {} pts | form {:.1}",
                team.team_stats.formation,
                team.team_stats.total_cost,
                team.team_stats.total_points,
                team.team_stats.avg_form
            ),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        for player in team.starters() {
            lines.push(Line::from(format!(
                "{:<4} {:<16} {:<4} {:>6.1}",
                player.player.position().map(|p| p.short()).unwrap_or("?"),
                truncate(player.player.display_name(), 16),
                player.player.team.as_deref().unwrap_or("-"),
                player.weighted_score
            )));
        }
        lines.push(Line::styled("Bench", Style::default().fg(Color::DarkGray)));
        for player in team.bench_players() {
            lines.push(Line::styled(
                format!(
                    "{:<4} {:<16} {:<4}",
                    player.player.position().map(|p| p.short()).unwrap_or("?"),
                    truncate(player.player.display_name(), 16),
                    player.player.team.as_deref().unwrap_or("-"),
                ),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }
    frame.render_widget(Paragraph::new(lines).block(block("Dream team")), cols[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(cols[1]);

    let value: Vec<(String, u64)> = state
        .top100_best_value
        .data()
        .map(|b| {
            b.players
                .iter()
                .take(8)
                .map(|p| (truncate(&p.web_name, 6), (p.points_per_million * 10.0).round() as u64))
                .collect()
        })
        .unwrap_or_default();
    let value_refs: Vec<(&str, u64)> = value.iter().map(|(n, v)| (n.as_str(), *v)).collect();
    frame.render_widget(
        BarChart::default()
            .block(block("Best value (pts/m x10)"))
            .data(value_refs.as_slice())
            .bar_width(6)
            .bar_style(Style::default().fg(Color::Cyan)),
        right[0],
    );

    let mut lines = Vec::new();
    if let Some(diff) = state.top100_differentials.data() {
        lines.push(Line::styled("Differentials", Style::default().fg(Color::Magenta)));
        for p in diff.players.iter().take(5) {
            lines.push(Line::from(format!("  {:<14} {:>5.1}% {:>4} pts", p.web_name, p.ownership, p.total_points)));
        }
    }
    if let Some(transfers) = state.top100_transfers.data() {
        lines.push(Line::styled("Top 100 in", Style::default().fg(Color::Green)));
        for t in transfers.transfers_in.iter().take(4) {
            lines.push(Line::from(format!("  {:<14} {}", t.web_name, t.count)));
        }
        lines.push(Line::styled("Top 100 out", Style::default().fg(Color::Red)));
        for t in transfers.transfers_out.iter().take(4) {
            lines.push(Line::from(format!("  {:<14} {}", t.web_name, t.count)));
        }
    }
    frame.render_widget(Paragraph::new(lines).block(block("Top 100")), right[1]);
}

fn render_optimize(frame: &mut Frame, area: Rect, state: &AppState) {
    let settings = &state.optimizer;
    let mut lines = vec![Line::styled(
        format!(
            "Budget {} | horizon {} GW | unavailable {}",
            format_cost(settings.budget as i64),
            settings.horizon,
            if settings.include_unavailable { "included" } else { "excluded" }
        ),
        Style::default().fg(Color::DarkGray),
    )];
    match state.optimize.view() {
        ResourceView::Idle => lines.push(Line::from("Press Enter to run the optimizer")),
        ResourceView::Loading => lines.push(Line::from("Optimizing...")),
        ResourceView::Failed(err) => lines.push(Line::styled(
            format!("Failed to optimize: {err}"),
            Style::default().fg(Color::Red),
        )),
        ResourceView::Ready(result) => {
            lines.push(Line::styled(
                format!(
                    "{} | {:.1} expected pts | cost {:.1}m",
                    result.status, result.expected_points, result.total_cost
                ),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            for player in &result.starting {
                let armband = if result.captain == Some(player.id) {
                    " (C)"
                } else if result.vice_captain == Some(player.id) {
                    " (V)"
                } else {
                    ""
                };
                lines.push(Line::from(format!(
                    "{:<4} {:<16}{armband:<4} {:<4} {:>6} {:>5.1}",
                    Position::from_code(player.element_type).map(|p| p.short()).unwrap_or("?"),
                    truncate(&player.web_name, 16),
                    player.team.as_deref().unwrap_or("-"),
                    format_cost(player.now_cost as i64),
                    player.expected_points
                )));
            }
            lines.push(Line::styled("Bench", Style::default().fg(Color::DarkGray)));
            for player in &result.bench {
                lines.push(Line::styled(
                    format!("     {:<16}     {:<4} {:>6}", truncate(&player.web_name, 16), player.team.as_deref().unwrap_or("-"), format_cost(player.now_cost as i64)),
                    Style::default().fg(Color::DarkGray),
                ));
            }
        }
    }
    frame.render_widget(Paragraph::new(lines).block(block("Optimizer")), area);
}

fn render_planner(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let Some(plan) = state.planner.as_ref() else {
        let mut lines = Vec::new();
        match state.planner_settings.manager_id {
            None => lines.push(Line::from("Press m to enter a manager id")),
            Some(_) => {
                if let Some(line) = status_line(&state.planner_base, "manager squad") {
                    lines.push(line);
                }
            }
        }
        frame.render_widget(Paragraph::new(lines).block(block("Transfer planner")), area);
        return;
    };

    let week = state.planner_week.clamp(plan.start_gameweek, plan.last_gameweek());
    let squad = plan.squad_for_week(week);
    let mut lines = vec![Line::styled(
        format!(
            "GW{week} ({}-{}) | bank {} | hits -{} (total -{})",
            plan.start_gameweek,
            plan.last_gameweek(),
            format_cost(plan.bank_after(week)),
            plan.hit_cost(week),
            plan.total_hits()
        ),
        Style::default().fg(Color::DarkGray),
    )];
    for (idx, player) in squad.iter().enumerate() {
        let selected = state.planner_out.is_none() && idx == state.planner_selected;
        let marked = state.planner_out == Some(player.id);
        let style = if marked {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            selected_style(selected)
        };
        lines.push(Line::styled(
            format!(
                "{:<4} {:<16} {:<4} {:>6}",
                player.position.short(),
                truncate(&player.web_name, 16),
                player.team,
                format_cost(player.now_cost as i64)
            ),
            style,
        ));
    }
    frame.render_widget(Paragraph::new(lines).block(block("Squad")), cols[0]);

    let mut right = Vec::new();
    for (idx, transfer) in plan.transfers(week).iter().enumerate() {
        right.push(Line::from(format!(
            "{}. {} -> {}",
            idx + 1,
            transfer.out.web_name,
            transfer.player_in.web_name
        )));
    }
    if let Some(out_id) = state.planner_out {
        if let Some(out) = squad.iter().find(|p| p.id == out_id) {
            right.push(Line::styled(
                format!("Replace {} with:", out.web_name),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            let visible = cols[1].height.saturating_sub(4 + right.len() as u16) as usize;
            let pool = state.planner_pool(out.position);
            let (start, end) = visible_range(state.planner_selected, pool.len(), visible);
            for (idx, player) in pool.iter().enumerate().take(end).skip(start) {
                right.push(Line::styled(
                    format!(
                        "{:<16} {:<4} {:>6}",
                        truncate(&player.web_name, 16),
                        player.team,
                        format_cost(player.now_cost as i64)
                    ),
                    selected_style(idx == state.planner_selected),
                ));
            }
        }
    } else if plan.transfers(week).is_empty() {
        right.push(Line::from("No transfers planned; Enter picks a player to sell"));
    }
    frame.render_widget(
        Paragraph::new(right).block(block(&format!("Transfers GW{week}"))),
        cols[1],
    );
}

fn render_prices(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let mut lines = Vec::new();
    if let Some(line) = status_line(&state.price_predictor, "price predictions") {
        lines.push(line);
    }
    if let Some(prices) = state.price_predictor.data() {
        if let Some(updated) = prices.last_updated.as_deref() {
            lines.push(Line::styled(
                format!("updated {}", format_timestamp(updated)),
                Style::default().fg(Color::DarkGray),
            ));
        }
        let rows = prices
            .risers
            .iter()
            .map(|p| (p, Color::Green))
            .chain(prices.fallers.iter().map(|p| (p, Color::Red)));
        for (idx, (row, color)) in rows.enumerate() {
            let style = if idx == state.price_selected {
                selected_style(true)
            } else {
                Style::default().fg(color)
            };
            lines.push(Line::styled(
                format!(
                    "{:<16} {:<4} {:>6} {:>6.1}% {:+}",
                    truncate(&row.web_name, 16),
                    row.team.as_deref().unwrap_or("-"),
                    format_cost(row.now_cost as i64),
                    row.progress,
                    row.predicted_change
                ),
                style,
            ));
        }
    }
    frame.render_widget(Paragraph::new(lines).block(block("Price changes")), cols[0]);

    let progress: Vec<f64> = state
        .price_history
        .data()
        .map(|h| h.points.iter().map(|p| p.progress).collect())
        .unwrap_or_default();
    let bars = sparkline_values(&progress);
    let title = match state.price_history.view() {
        ResourceView::Failed(_) => "Progress history (failed)",
        ResourceView::Loading => "Progress history (loading)",
        _ => "Progress history",
    };
    frame.render_widget(
        Sparkline::default()
            .block(block(title))
            .data(&bars)
            .style(Style::default().fg(Color::Yellow)),
        cols[1],
    );
}

fn render_league(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut lines = Vec::new();
    match state.league.league_id {
        None => lines.push(Line::from("Press l to enter a league id")),
        Some(_) => {
            if let Some(line) = status_line(&state.league_live, "league") {
                lines.push(line);
            }
        }
    }
    let mut title = "League".to_string();
    if let Some(league) = state.league_live.data() {
        title = format!(
            "{} (GW{})",
            league.league.name,
            league.gameweek.map(|g| g.to_string()).unwrap_or_else(|| "-".into())
        );
        for row in &league.standings {
            let movement = match row.last_rank {
                Some(last) if last > row.rank => Span::styled("▲", Style::default().fg(Color::Green)),
                Some(last) if last < row.rank => Span::styled("▼", Style::default().fg(Color::Red)),
                _ => Span::raw(" "),
            };
            let style = if state.league.manager_id == Some(row.entry) {
                Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan)
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{:>3} ", row.rank), style),
                movement,
                Span::styled(
                    format!(
                        " {:<20} {:<16} {:>5} {:>4} {:>4}",
                        truncate(&row.entry_name, 20),
                        truncate(&row.player_name, 16),
                        row.total,
                        row.event_total,
                        row.live_points.map(|p| p.to_string()).unwrap_or_default()
                    ),
                    style,
                ),
            ]));
        }
    }
    frame.render_widget(Paragraph::new(lines).block(block(&title)), area);
}

fn render_wildcard(frame: &mut Frame, area: Rect, app: &App) {
    let state = &app.state;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let squad = &state.squad;
    let saved = if app.autosave.saved_visible(Instant::now()) { " | saved" } else { "" };
    let mut lines = vec![Line::styled(
        format!(
            "{} | {}/15 | spent {} | left {}{}",
            squad.formation().name(),
            squad.player_count(),
            format_cost(squad.total_cost() as i64),
            format_cost(squad.remaining_budget()),
            saved
        ),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    let mut row_idx = 0usize;
    for position in Position::ALL {
        let cap = squad.formation().capacity(position);
        lines.push(Line::styled(
            format!("{} {}/{}", position.short(), squad.line(position).len(), cap),
            Style::default().fg(Color::DarkGray),
        ));
        for player in squad.line(position) {
            lines.push(squad_row(state, player, row_idx));
            row_idx += 1;
        }
    }
    lines.push(Line::styled(
        format!("Bench {}/4", squad.bench().len()),
        Style::default().fg(Color::DarkGray),
    ));
    for player in squad.bench() {
        lines.push(squad_row(state, player, row_idx));
        row_idx += 1;
    }
    if let Some(code) = state.share_code.as_deref() {
        lines.push(Line::styled(
            format!("Share code {code}  ({})", Screen::Wildcard { code: Some(code.to_string()) }.path()),
            Style::default().fg(Color::Cyan),
        ));
    } else if let Some(line) = status_line(&state.wildcard_track, "share code") {
        lines.push(line);
    }
    if state.wildcard_shared.is_loading() {
        lines.push(Line::from("Loading shared squad..."));
    }
    if state.wildcard_save.is_loading() {
        lines.push(Line::from("Saving..."));
    }
    if let Some(summary) = state.wildcard_summary.as_ref() {
        lines.push(Line::styled(
            format!(
                "Saved {}: {:.1}m, {} predicted pts",
                if state.wildcard_team_name.is_empty() { "squad" } else { state.wildcard_team_name.as_str() },
                summary.total_cost,
                summary.predicted_points
            ),
            Style::default().fg(Color::Green),
        ));
    }
    let squad_title = match state.wildcard_focus {
        WildcardFocus::Squad => "Squad *",
        WildcardFocus::Pool => "Squad",
    };
    frame.render_widget(Paragraph::new(lines).block(block(squad_title)), cols[0]);

    let mut pool_lines = Vec::new();
    if let Some(line) = status_line(&state.players, "players") {
        pool_lines.push(line);
    }
    let pool = state.wildcard_pool();
    let visible = cols[1].height.saturating_sub(3) as usize;
    let (start, end) = visible_range(state.wildcard_pool_selected, pool.len(), visible);
    for (idx, player) in pool.iter().enumerate().take(end).skip(start) {
        let selected = state.wildcard_focus == WildcardFocus::Pool && idx == state.wildcard_pool_selected;
        pool_lines.push(Line::styled(
            format!(
                "{:<16} {:<4} {:>6} {:>4}",
                truncate(player.display_name(), 16),
                player.team.as_deref().unwrap_or("-"),
                format_cost(player.now_cost as i64),
                player.total_points
            ),
            selected_style(selected),
        ));
    }
    let pool_title = format!(
        "{} pool{}",
        state.wildcard_position.short(),
        if state.wildcard_focus == WildcardFocus::Pool { " *" } else { "" }
    );
    frame.render_widget(Paragraph::new(pool_lines).block(block(&pool_title)), cols[1]);
}

fn squad_row(state: &AppState, player: &WildcardPlayer, row_idx: usize) -> Line<'static> {
    let squad = &state.squad;
    let armband = if squad.captain() == Some(player.id) {
        "(C)"
    } else if squad.vice_captain() == Some(player.id) {
        "(V)"
    } else {
        ""
    };
    let selected = state.wildcard_focus == WildcardFocus::Squad && row_idx == state.wildcard_selected;
    let style = if state.wildcard_sub_pending == Some(player.id) {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        selected_style(selected)
    };
    Line::styled(
        format!(
            "  {:<16} {:<3} {:<4} {:>6}",
            truncate(&player.web_name, 16),
            armband,
            player.team,
            format_cost(player.now_cost as i64)
        ),
        style,
    )
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max.saturating_sub(1)).chain(std::iter::once('…')).collect()
}

fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(dt) => dt.with_timezone(&Local).format("%a %d %b %H:%M").to_string(),
        Err(_) => raw.trim().chars().take(16).collect::<String>().replace('T', " "),
    }
}

fn render_prompt(frame: &mut Frame, area: Rect, prompt: &Prompt) {
    let popup = centered_rect(50, 20, area);
    frame.render_widget(Clear, popup);
    let text = format!("{}_\n\nEnter confirm | Esc cancel", prompt.buffer);
    frame.render_widget(
        Paragraph::new(text).block(block(prompt.kind.label())),
        popup,
    );
}

fn render_alert(frame: &mut Frame, area: Rect, alert: &str) {
    let popup = centered_rect(50, 25, area);
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(format!("{alert}\n\nPress any key"))
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::Red))
            .block(block("Cannot do that")),
        popup,
    );
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let formations = Formation::ALL
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(" ");
    let text = [
        "FPL Terminal - Help".to_string(),
        String::new(),
        "Global:".to_string(),
        "  1-9, 0       Screens (w Wildcard)".to_string(),
        "  Tab/S-Tab    Next/previous screen".to_string(),
        "  g            Go to route (e.g. /wildcard/WC-ABC123)".to_string(),
        "  r            Refresh screen data".to_string(),
        "  ?            Toggle help".to_string(),
        "  q            Quit".to_string(),
        String::new(),
        "Wildcard:".to_string(),
        "  o            Switch squad/pool focus".to_string(),
        "  p            Pool position".to_string(),
        format!("  f            Formation ({formations})"),
        "  Enter / b    Add to line / bench".to_string(),
        "  d            Remove".to_string(),
        "  s            Bench substitution (bench, then starter)".to_string(),
        "  c / v        Captain / vice".to_string(),
        "  S / C        Save draft / save to cloud".to_string(),
        "  L / n        Load share code / team name".to_string(),
        "  X            Clear draft".to_string(),
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
