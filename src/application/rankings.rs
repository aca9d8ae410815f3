//! Ranked read models: most-viewed blogs and top influencers.
//!
//! Both queries are served through the [`RankedQueryCache`]; a miss runs the
//! store's aggregation once per cache key and shares the result with every
//! concurrent caller. Counter mutations do not invalidate entries, so a
//! ranking may lag the counters by up to the query's TTL.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::histogram;
use thiserror::Error;
use tracing::instrument;

use crate::application::repos::{
    BlogSummary, InfluencerSummary, RankingQueryRepo, RepoError, with_deadline,
};
use crate::cache::{RankedQueryCache, RankedQueryKey};
use crate::config::RankingSettings;

/// A caller-supplied limit before validation. Zero, negative, and
/// non-numeric inputs all resolve to the configured default instead of
/// erroring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimitParam(Option<NonZeroU32>);

impl LimitParam {
    pub fn from_value(value: Option<i64>) -> Self {
        let positive = value
            .and_then(|raw| u32::try_from(raw).ok())
            .and_then(NonZeroU32::new);
        Self(positive)
    }

    /// Parse a raw query-string value; anything that is not a positive
    /// integer falls back to the default at resolution time.
    pub fn from_raw(raw: Option<&str>) -> Self {
        Self::from_value(raw.and_then(|value| value.trim().parse::<i64>().ok()))
    }

    pub fn resolve(self, default: NonZeroU32) -> u32 {
        self.0.unwrap_or(default).get()
    }
}

#[derive(Debug, Error)]
pub enum RankingError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Computes the two ranked, joined views over mutable counters.
#[derive(Clone)]
pub struct RankingService {
    rankings: Arc<dyn RankingQueryRepo>,
    cache: Arc<RankedQueryCache>,
    most_viewed_default_limit: NonZeroU32,
    top_influencers_default_limit: NonZeroU32,
    store_deadline: Duration,
}

impl RankingService {
    pub fn new(
        rankings: Arc<dyn RankingQueryRepo>,
        cache: Arc<RankedQueryCache>,
        settings: &RankingSettings,
    ) -> Self {
        Self {
            rankings,
            cache,
            most_viewed_default_limit: settings.most_viewed_default_limit,
            top_influencers_default_limit: settings.top_influencers_default_limit,
            store_deadline: settings.store_deadline(),
        }
    }

    /// Blogs ordered by views desc, creation time desc, id asc, joined with
    /// owner profiles and annotated with influencer status.
    #[instrument(skip(self), fields(query = "most-viewed-blogs"))]
    pub async fn most_viewed_blogs(
        &self,
        limit: LimitParam,
    ) -> Result<Arc<Vec<BlogSummary>>, RankingError> {
        let limit = limit.resolve(self.most_viewed_default_limit);
        let key = RankedQueryKey::most_viewed(limit);

        let summaries = self
            .cache
            .most_viewed
            .get_or_compute(key, || async move {
                let started = Instant::now();
                let rows =
                    with_deadline(self.store_deadline, self.rankings.most_viewed_blogs(limit))
                        .await?;
                histogram!("risalto_ranked_compute_ms", "query" => "most-viewed-blogs")
                    .record(started.elapsed().as_secs_f64() * 1000.0);
                Ok::<_, RepoError>(Arc::new(rows))
            })
            .await?;

        Ok(summaries)
    }

    /// Influencers ordered by aggregate views over all their blogs. Owners
    /// without an influencer record are invisible regardless of views.
    #[instrument(skip(self), fields(query = "top-influencers"))]
    pub async fn top_influencers(
        &self,
        limit: LimitParam,
    ) -> Result<Arc<Vec<InfluencerSummary>>, RankingError> {
        let limit = limit.resolve(self.top_influencers_default_limit);
        let key = RankedQueryKey::top_influencers(limit);

        let summaries = self
            .cache
            .top_influencers
            .get_or_compute(key, || async move {
                let started = Instant::now();
                let rows =
                    with_deadline(self.store_deadline, self.rankings.top_influencers(limit))
                        .await?;
                histogram!("risalto_ranked_compute_ms", "query" => "top-influencers")
                    .record(started.elapsed().as_secs_f64() * 1000.0);
                Ok::<_, RepoError>(Arc::new(rows))
            })
            .await?;

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_limit() -> NonZeroU32 {
        NonZeroU32::new(10).expect("non-zero")
    }

    #[test]
    fn positive_limit_is_honored() {
        assert_eq!(LimitParam::from_value(Some(3)).resolve(default_limit()), 3);
        assert_eq!(LimitParam::from_raw(Some("25")).resolve(default_limit()), 25);
    }

    #[test]
    fn non_positive_limit_falls_back_to_default() {
        assert_eq!(LimitParam::from_value(Some(0)).resolve(default_limit()), 10);
        assert_eq!(LimitParam::from_value(Some(-4)).resolve(default_limit()), 10);
        assert_eq!(LimitParam::from_value(None).resolve(default_limit()), 10);
    }

    #[test]
    fn non_numeric_limit_falls_back_to_default() {
        assert_eq!(LimitParam::from_raw(Some("abc")).resolve(default_limit()), 10);
        assert_eq!(LimitParam::from_raw(Some("")).resolve(default_limit()), 10);
        assert_eq!(LimitParam::from_raw(None).resolve(default_limit()), 10);
    }
}
