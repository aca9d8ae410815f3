//! Cache key definitions.
//!
//! A key carries the query name AND every parameter that affects the result
//! shape — at minimum the limit. Keying on the name alone while varying the
//! limit would serve one limit's rows for another.

use std::fmt;

/// The two ranked queries this cache fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankedQuery {
    MostViewedBlogs,
    TopInfluencers,
}

impl RankedQuery {
    pub fn name(self) -> &'static str {
        match self {
            RankedQuery::MostViewedBlogs => "most-viewed-blogs",
            RankedQuery::TopInfluencers => "top-influencers",
        }
    }
}

/// Cache key for one ranked query at one limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RankedQueryKey {
    pub query: RankedQuery,
    pub limit: u32,
}

impl RankedQueryKey {
    pub fn most_viewed(limit: u32) -> Self {
        Self {
            query: RankedQuery::MostViewedBlogs,
            limit,
        }
    }

    pub fn top_influencers(limit: u32) -> Self {
        Self {
            query: RankedQuery::TopInfluencers,
            limit,
        }
    }
}

impl fmt::Display for RankedQueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.query.name(), self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_with_different_limits_are_distinct() {
        assert_ne!(RankedQueryKey::most_viewed(10), RankedQueryKey::most_viewed(20));
        assert_eq!(RankedQueryKey::most_viewed(10), RankedQueryKey::most_viewed(10));
    }

    #[test]
    fn rendered_form_is_name_colon_limit() {
        assert_eq!(RankedQueryKey::most_viewed(10).to_string(), "most-viewed-blogs:10");
        assert_eq!(
            RankedQueryKey::top_influencers(5).to_string(),
            "top-influencers:5"
        );
    }
}
