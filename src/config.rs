use std::path::PathBuf;

use chrono::NaiveDate;
use rust_decimal::prelude::*;

use crate::models::DailyRate;

pub const DEFAULT_STORE_PATH: &str = "ttm_rates.csv";
pub const DEFAULT_BASE_URL: &str = "https://www.murc-kawasesouba.jp/fx/past/index.php?id=";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("ttm-converter/", env!("CARGO_PKG_VERSION"));

/// Where and how daily quotes are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateSourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for RateSourceConfig {
    fn default() -> Self {
        RateSourceConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub store_path: PathBuf,
    pub rate_source: RateSourceConfig,
    /// Seeds an empty store; backfill starts the day after it.
    pub anchor: DailyRate,
}

impl Config {
    pub fn new(store_path: PathBuf, rate_source: RateSourceConfig) -> Self {
        Config {
            store_path,
            rate_source,
            anchor: default_anchor(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(PathBuf::from(DEFAULT_STORE_PATH), RateSourceConfig::default())
    }
}

/// 2024-12-31, TTS 159.18 / TTB 157.18.
pub fn default_anchor() -> DailyRate {
    let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default();
    DailyRate::new(date, dec!(159.18), dec!(157.18))
}
