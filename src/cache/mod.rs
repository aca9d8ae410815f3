//! Ranked-query cache: TTL-bounded storage for the two aggregation results.
//!
//! Mutations (new blogs, view increments, like toggles) do NOT invalidate
//! entries; bounded staleness within each query's TTL is an accepted design
//! trade-off. Memory stays bounded by the small, fixed set of distinct
//! (query, limit) pairs actually requested, so there is no eviction beyond
//! TTL expiry and overwrite-on-recompute.

pub mod config;
pub mod keys;
pub(crate) mod lock;
pub mod store;

pub use config::CacheConfig;
pub use keys::{RankedQuery, RankedQueryKey};
pub use store::{QueryCache, RankedQueryCache};
