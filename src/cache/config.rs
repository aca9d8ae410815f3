//! Cache configuration.
//!
//! TTLs are fixed per query and intentionally NOT invalidated by writes;
//! rankings may lag counters by up to one TTL. In a multi-instance
//! deployment each instance holds its own cache and instances may diverge
//! within the TTL window.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_MOST_VIEWED_TTL_SECS: u64 = 5 * 60;
const DEFAULT_TOP_INFLUENCERS_TTL_SECS: u64 = 10 * 60;

/// Cache configuration from `risalto.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL in seconds for the most-viewed-blogs query.
    pub most_viewed_ttl_secs: u64,
    /// TTL in seconds for the top-influencers query.
    pub top_influencers_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            most_viewed_ttl_secs: DEFAULT_MOST_VIEWED_TTL_SECS,
            top_influencers_ttl_secs: DEFAULT_TOP_INFLUENCERS_TTL_SECS,
        }
    }
}

impl CacheConfig {
    pub fn most_viewed_ttl(&self) -> Duration {
        Duration::from_secs(self.most_viewed_ttl_secs)
    }

    pub fn top_influencers_ttl(&self) -> Duration {
        Duration::from_secs(self.top_influencers_ttl_secs)
    }
}
