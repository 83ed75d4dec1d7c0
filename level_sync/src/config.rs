//! TOML-backed run configuration.
//!
//! Every section has full defaults, so a missing config file means "run with
//! the stock settings". Unknown fields are rejected to catch typos early.

use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use shared_utils::env::get_env_var_or;

use crate::levels::LevelConfig;
use crate::toplist::ToplistFilter;

/// Environment override for the SQLite database path.
pub const DATABASE_PATH_VAR: &str = "LEVEL_SYNC_DATABASE_PATH";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    /// Pipeline-wide settings.
    pub run: RunCfg,
    /// Gainers-list admission thresholds.
    pub toplist: ToplistCfg,
    /// Store location.
    pub store: StoreCfg,
    /// News sources.
    pub news: NewsCfg,
}

/// Pipeline-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RunCfg {
    /// Store collection the records live in.
    pub collection: String,
    /// Exchange time zone, IANA name.
    pub timezone: String,
    /// Data-reporting lag in minutes; shifts every fetch window back.
    pub delay_minutes: i64,
    /// Opening-range start, local `HH:MM`, inclusive.
    pub opening_range_start: String,
    /// Opening-range end, local `HH:MM`, inclusive.
    pub opening_range_end: String,
    /// Maximum number of key levels per record.
    pub key_level_count: usize,
}

impl Default for RunCfg {
    fn default() -> Self {
        Self {
            collection: "fundamentals_of_top_list_symbols".to_string(),
            timezone: "America/New_York".to_string(),
            delay_minutes: 0,
            opening_range_start: "09:31".to_string(),
            opening_range_end: "09:45".to_string(),
            key_level_count: 5,
        }
    }
}

/// Gainers-list admission thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ToplistCfg {
    /// Lowest admissible last price, exclusive.
    pub min_price: f64,
    /// Highest admissible last price, exclusive.
    pub max_price: f64,
    /// Minimum day change percentage, exclusive.
    pub min_change_percent: f64,
    /// Longest admissible ticker symbol.
    pub max_symbol_len: usize,
}

impl Default for ToplistCfg {
    fn default() -> Self {
        Self {
            min_price: 1.0,
            max_price: 50.0,
            min_change_percent: 50.0,
            max_symbol_len: 4,
        }
    }
}

/// Store location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StoreCfg {
    /// Path of the SQLite database file.
    pub database_path: String,
}

impl Default for StoreCfg {
    fn default() -> Self {
        Self {
            database_path: "level_sync.db".to_string(),
        }
    }
}

/// News sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct NewsCfg {
    /// Base URL of the secondary news feed; `None` disables it.
    pub newsfilter_base_url: Option<String>,
    /// Articles fetched per symbol from the provider feed.
    pub article_limit: u32,
}

impl Default for NewsCfg {
    fn default() -> Self {
        Self {
            newsfilter_base_url: Some("https://news.enomars.org/api/news".to_string()),
            article_limit: 5,
        }
    }
}

impl AppConfig {
    /// Parses a config from TOML text.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(text).context("parsing configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config file, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                Self::from_toml(&text)
            }
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.tz()?;
        anyhow::ensure!(
            self.run.key_level_count > 0,
            "key_level_count must be at least 1"
        );
        Ok(())
    }

    /// The configured exchange time zone.
    pub fn tz(&self) -> anyhow::Result<Tz> {
        Tz::from_str(&self.run.timezone)
            .map_err(|_| anyhow::anyhow!("unknown timezone: {}", self.run.timezone))
    }

    /// The derivation tunables this config implies.
    pub fn level_config(&self) -> LevelConfig {
        LevelConfig {
            opening_range_start: self.run.opening_range_start.clone(),
            opening_range_end: self.run.opening_range_end.clone(),
            key_level_count: self.run.key_level_count,
        }
    }

    /// The database path, with the [`DATABASE_PATH_VAR`] environment
    /// variable taking precedence over the config file.
    pub fn database_path(&self) -> String {
        get_env_var_or(DATABASE_PATH_VAR, &self.store.database_path)
    }

    /// The toplist admission filter this config implies.
    pub fn toplist_filter(&self) -> ToplistFilter {
        ToplistFilter {
            min_price: self.toplist.min_price,
            max_price: self.toplist.max_price,
            min_change_percent: self.toplist.min_change_percent,
            max_symbol_len: self.toplist.max_symbol_len,
        }
    }
}
