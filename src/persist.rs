use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::transfer_planner::{DEFAULT_HORIZON, TransferPlan};
use crate::wildcard::{DEFAULT_BUDGET, WildcardSquad};

const STORE_DIR: &str = "fpl_terminal";
const STORE_FILE: &str = "storage.json";
const STORE_VERSION: u32 = 1;

pub const DRAFT_VERSION: u32 = 1;

pub mod keys {
    pub const WILDCARD_DRAFT: &str = "wildcard_draft";
    pub const WILDCARD_CODE: &str = "wildcard_code";
    pub const PLANNER_MANAGER_ID: &str = "planner_manager_id";
    pub const PLANNER_HORIZON: &str = "planner_horizon";
    pub const OPTIMIZER_SETTINGS: &str = "optimizer_settings";
    pub const LEAGUE_SETTINGS: &str = "league_settings";
    pub const ANALYZE_SELECTION: &str = "analyze_selection";

    pub fn transfer_plan(manager_id: u32) -> String {
        format!("transfer_plan:{manager_id}")
    }
}

/// String key/value gateway. Every persisted value goes through here.
pub trait Storage: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StoreFile {
    version: u32,
    entries: BTreeMap<String, String>,
}

/// Whole-file JSON store, rewritten atomically on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Opens the store at `path`. A missing, corrupt or wrong-version file is
    /// treated as empty.
    pub fn open(path: PathBuf) -> Self {
        let entries = match load_store_file(&path) {
            Some(store) if store.version == STORE_VERSION => store.entries,
            Some(store) => {
                log::warn!(
                    "ignoring storage {} with version {}",
                    path.display(),
                    store.version
                );
                BTreeMap::new()
            }
            None => BTreeMap::new(),
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| anyhow!("storage path has no parent"))?;
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        let store = StoreFile {
            version: STORE_VERSION,
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string(&store).context("serialize storage")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| format!("replace {}", self.path.display()))?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

fn load_store_file(path: &Path) -> Option<StoreFile> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<StoreFile>(&raw) {
        Ok(store) => Some(store),
        Err(err) => {
            log::warn!("corrupt storage {}: {err}", path.display());
            None
        }
    }
}

/// Process-lifetime store (the per-session selections).
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// `FPL_DATA_DIR`, else `$XDG_DATA_HOME/fpl_terminal`, else `~/.local/share/fpl_terminal`.
pub fn storage_path(data_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = data_dir {
        return Some(dir.join(STORE_FILE));
    }
    if let Ok(base) = std::env::var("XDG_DATA_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(STORE_DIR).join(STORE_FILE));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(STORE_DIR)
            .join(STORE_FILE),
    )
}

/// Directory for the log file, following the XDG cache convention.
pub fn cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(STORE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(STORE_DIR))
}

pub fn load_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("discarding unreadable {key}: {err}");
            None
        }
    }
}

pub fn save_json<T: Serialize>(storage: &mut dyn Storage, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value).with_context(|| format!("serialize {key}"))?;
    storage.set(key, raw)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildcardDraft {
    pub version: u32,
    pub saved_at: String,
    pub squad: WildcardSquad,
}

impl WildcardDraft {
    pub fn snapshot(squad: &WildcardSquad) -> Self {
        Self {
            version: DRAFT_VERSION,
            saved_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            squad: squad.clone(),
        }
    }
}

pub fn save_draft(storage: &mut dyn Storage, squad: &WildcardSquad) -> Result<WildcardDraft> {
    let draft = WildcardDraft::snapshot(squad);
    save_json(storage, keys::WILDCARD_DRAFT, &draft)?;
    Ok(draft)
}

pub fn load_draft(storage: &dyn Storage) -> Option<WildcardDraft> {
    load_json(storage, keys::WILDCARD_DRAFT)
}

/// Loads the draft with its budget replaced by `budget`.
pub fn restore_draft(storage: &dyn Storage, budget: u32) -> Option<WildcardDraft> {
    let mut draft = load_draft(storage)?;
    draft.squad.set_budget(budget);
    Some(draft)
}

pub fn clear_draft(storage: &mut dyn Storage) -> Result<()> {
    storage.remove(keys::WILDCARD_DRAFT)
}

pub fn load_share_code(storage: &dyn Storage) -> Option<String> {
    storage
        .get(keys::WILDCARD_CODE)
        .map(|code| code.trim().to_string())
        .filter(|code| !code.is_empty())
}

pub fn save_share_code(storage: &mut dyn Storage, code: &str) -> Result<()> {
    storage.set(keys::WILDCARD_CODE, code.trim().to_string())
}

pub fn load_plan(storage: &dyn Storage, manager_id: u32) -> Option<TransferPlan> {
    load_json(storage, &keys::transfer_plan(manager_id))
}

pub fn save_plan(storage: &mut dyn Storage, plan: &TransferPlan) -> Result<()> {
    save_json(storage, &keys::transfer_plan(plan.manager_id), plan)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Tenths.
    pub budget: u32,
    pub horizon: u32,
    pub include_unavailable: bool,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET,
            horizon: 3,
            include_unavailable: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeagueSettings {
    pub manager_id: Option<u32>,
    pub league_id: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeSelection {
    pub manager_id: Option<u32>,
    pub gameweek: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    pub manager_id: Option<u32>,
    pub horizon: u32,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            manager_id: None,
            horizon: DEFAULT_HORIZON,
        }
    }
}

pub fn load_planner_settings(storage: &dyn Storage) -> PlannerSettings {
    PlannerSettings {
        manager_id: storage
            .get(keys::PLANNER_MANAGER_ID)
            .and_then(|raw| raw.trim().parse().ok()),
        horizon: storage
            .get(keys::PLANNER_HORIZON)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .map(|h| h.clamp(1, 10))
            .unwrap_or(DEFAULT_HORIZON),
    }
}

pub fn save_planner_settings(storage: &mut dyn Storage, settings: &PlannerSettings) -> Result<()> {
    match settings.manager_id {
        Some(id) => storage.set(keys::PLANNER_MANAGER_ID, id.to_string())?,
        None => storage.remove(keys::PLANNER_MANAGER_ID)?,
    }
    storage.set(keys::PLANNER_HORIZON, settings.horizon.to_string())
}

const SAVED_FLAG: Duration = Duration::from_secs(2);

/// Periodic draft save timer plus the short-lived "saved" indicator.
#[derive(Debug, Clone)]
pub struct Autosave {
    interval: Duration,
    last: Instant,
    saved_until: Option<Instant>,
}

impl Autosave {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last: now,
            saved_until: None,
        }
    }

    pub fn due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) >= self.interval
    }

    pub fn record(&mut self, now: Instant) {
        self.last = now;
        self.saved_until = Some(now + SAVED_FLAG);
    }

    pub fn saved_visible(&self, now: Instant) -> bool {
        self.saved_until.is_some_and(|until| now < until)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
