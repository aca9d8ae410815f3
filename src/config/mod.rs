//! Configuration layer: typed settings with layered precedence (file → env).

use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheConfig;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "risalto";
const ENV_PREFIX: &str = "RISALTO";

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_STORE_DEADLINE_MS: u64 = 5_000;
const DEFAULT_MOST_VIEWED_LIMIT: u32 = 10;
const DEFAULT_TOP_INFLUENCERS_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub rankings: RankingSettings,
    pub cache: CacheConfig,
}

impl Settings {
    /// Load settings from `config/default`, an optional local `risalto`
    /// file, an optional explicit file, then `RISALTO__*` environment
    /// variables, later sources overriding earlier ones.
    pub fn load(explicit_file: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
            .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

        if let Some(path) = explicit_file {
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Compact,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

/// Defaults and deadlines owned by the ranking core.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingSettings {
    /// Rows returned by most-viewed-blogs when the caller supplies no
    /// usable limit.
    pub most_viewed_default_limit: NonZeroU32,
    /// Rows returned by top-influencers when the caller supplies no usable
    /// limit.
    pub top_influencers_default_limit: NonZeroU32,
    /// Bound on any single store call, in milliseconds. Exceeding it is a
    /// transient failure and never populates the cache.
    pub store_deadline_ms: u64,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            most_viewed_default_limit: NonZeroU32::new(DEFAULT_MOST_VIEWED_LIMIT)
                .unwrap_or(NonZeroU32::MIN),
            top_influencers_default_limit: NonZeroU32::new(DEFAULT_TOP_INFLUENCERS_LIMIT)
                .unwrap_or(NonZeroU32::MIN),
            store_deadline_ms: DEFAULT_STORE_DEADLINE_MS,
        }
    }
}

impl RankingSettings {
    pub fn store_deadline(&self) -> Duration {
        Duration::from_millis(self.store_deadline_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_and_deadline() {
        let settings = RankingSettings::default();
        assert_eq!(settings.most_viewed_default_limit.get(), 10);
        assert_eq!(settings.top_influencers_default_limit.get(), 10);
        assert_eq!(settings.store_deadline(), Duration::from_millis(5_000));
    }

    #[test]
    fn default_settings_compose() {
        let settings = Settings::default();
        assert_eq!(settings.database.max_connections, 8);
        assert_eq!(settings.cache.most_viewed_ttl_secs, 300);
        assert_eq!(settings.cache.top_influencers_ttl_secs, 600);
        assert_eq!(settings.logging.level, LogLevel::Info);
    }

    #[test]
    fn log_level_maps_to_level_filter() {
        assert_eq!(LevelFilter::from(LogLevel::Debug), LevelFilter::DEBUG);
        assert_eq!(LevelFilter::from(LogLevel::Error), LevelFilter::ERROR);
    }
}
