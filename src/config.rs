use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::wildcard::DEFAULT_BUDGET;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Runtime settings read from the environment (after `.env.local` / `.env`).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base: String,
    pub http_timeout: Duration,
    pub autosave_interval: Duration,
    pub budget: u32,
    pub page_size: u32,
    pub ticker_horizon: u32,
    pub upcoming_days: u32,
    pub data_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |key: &str| {
            lookup(key)
                .and_then(|val| val.trim().parse::<u64>().ok())
        };

        let api_base = lookup("FPL_API_BASE")
            .map(|val| val.trim().trim_end_matches('/').to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let data_dir = lookup("FPL_DATA_DIR")
            .filter(|val| !val.trim().is_empty())
            .map(PathBuf::from);
        let log_filter = lookup("FPL_LOG")
            .filter(|val| !val.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());

        Self {
            api_base,
            http_timeout: Duration::from_secs(number("FPL_HTTP_TIMEOUT_SECS").unwrap_or(10).max(1)),
            autosave_interval: Duration::from_secs(number("FPL_AUTOSAVE_SECS").unwrap_or(30).max(5)),
            budget: number("FPL_BUDGET")
                .map(|val| val.min(u32::MAX as u64) as u32)
                .unwrap_or(DEFAULT_BUDGET),
            page_size: number("FPL_PAGE_SIZE").unwrap_or(50).clamp(10, 500) as u32,
            ticker_horizon: number("FPL_TICKER_HORIZON").unwrap_or(5).clamp(1, 10) as u32,
            upcoming_days: number("FPL_UPCOMING_DAYS").unwrap_or(7).clamp(1, 14) as u32,
            data_dir,
            log_filter,
        }
    }
}
