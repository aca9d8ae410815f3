//! Repository traits describing persistence adapters.
//!
//! Two interchangeable implementations exist: a Postgres strategy that pushes
//! grouping, sorting, joining, and limiting down to the database
//! ([`crate::infra::db::PostgresRepositories`]) and an in-memory strategy that
//! joins via maps keyed by id ([`crate::infra::memory::MemoryRepositories`]).
//! Both must produce identical ordering and row-exclusion semantics.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{BlogRecord, CommentRecord, InfluencerRecord, UserRecord};
use crate::domain::slug::BlogSlug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("store deadline exceeded")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    /// True for transient failures that must never populate a cache entry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Persistence(_))
    }
}

/// Await a store call under a bounded deadline. Exceeding the deadline
/// surfaces as [`RepoError::Timeout`], a transient failure.
pub async fn with_deadline<T>(
    deadline: Duration,
    fut: impl Future<Output = Result<T, RepoError>>,
) -> Result<T, RepoError> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(RepoError::Timeout),
    }
}

#[derive(Debug, Clone)]
pub struct NewBlogParams {
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub video_id: String,
    pub video_thumbnail: Option<String>,
    pub slug: BlogSlug,
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait BlogsRepo: Send + Sync {
    /// Insert a blog, enforcing the (slug base, slug key) uniqueness
    /// constraint. A collision surfaces as [`RepoError::Duplicate`].
    async fn insert_blog(&self, params: NewBlogParams) -> Result<BlogRecord, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<BlogRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &BlogSlug) -> Result<Option<BlogRecord>, RepoError>;

    /// Indexed lookup of the blog owned by `owner_id` whose slug base equals
    /// `base`. When several share a base the most recently created wins.
    async fn find_by_owner_and_base(
        &self,
        owner_id: Uuid,
        base: &str,
    ) -> Result<Option<BlogRecord>, RepoError>;

    /// All blogs, newest first, at most `limit` rows.
    async fn list_recent(&self, limit: u32) -> Result<Vec<BlogRecord>, RepoError>;

    /// Blogs owned by `owner_id`, newest first.
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<BlogRecord>, RepoError>;
}

/// Result of one like toggle: whether the user now likes the entity, and the
/// like count after the mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeOutcome {
    pub liked: bool,
    pub like_count: u64,
}

#[async_trait]
pub trait EngagementRepo: Send + Sync {
    /// Flip `user_id`'s membership in the blog's liker set as one atomic
    /// conditional mutation at the store, never read-then-write.
    async fn toggle_blog_like(
        &self,
        blog_id: Uuid,
        user_id: Uuid,
    ) -> Result<LikeOutcome, RepoError>;

    async fn toggle_comment_like(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<LikeOutcome, RepoError>;

    /// Atomically increment the blog's view counter by exactly one.
    async fn increment_blog_views(&self, blog_id: Uuid) -> Result<(), RepoError>;
}

/// One row of the most-viewed-blogs ranking, already joined with the owner's
/// public profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub video_id: String,
    pub video_thumbnail: Option<String>,
    pub views: i64,
    pub like_count: u64,
    pub created_at: OffsetDateTime,
    pub owner: OwnerProfile,
    pub owner_is_influencer: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerProfile {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfluencerProfile {
    pub bio: Option<String>,
    pub website_link: Option<String>,
    pub social_links: Vec<String>,
}

/// One row of the top-influencers ranking: aggregate view/blog counters
/// joined with the owner's public profile and influencer profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfluencerSummary {
    pub owner: OwnerProfile,
    pub profile: InfluencerProfile,
    pub total_views: u64,
    pub blog_count: u64,
}

#[async_trait]
pub trait RankingQueryRepo: Send + Sync {
    /// Blogs ordered by views descending; ties broken by creation time
    /// descending, then id ascending. Rows whose owner is missing are
    /// excluded, never an error. At most `limit` rows.
    async fn most_viewed_blogs(&self, limit: u32) -> Result<Vec<BlogSummary>, RepoError>;

    /// Blogs grouped by owner with summed views and blog counts, restricted
    /// to owners holding an influencer record (inner join). Ordered by total
    /// views descending, latest blog creation time descending, then owner id
    /// ascending. Dangling owner or profile rows are excluded.
    async fn top_influencers(&self, limit: u32) -> Result<Vec<InfluencerSummary>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewCommentParams {
    pub blog_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Insert a comment. A missing blog surfaces as [`RepoError::NotFound`].
    async fn insert_comment(&self, params: NewCommentParams) -> Result<CommentRecord, RepoError>;

    /// Comments for a blog, newest first.
    async fn list_for_blog(&self, blog_id: Uuid) -> Result<Vec<CommentRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct InfluencerProfileParams {
    pub user_id: Uuid,
    pub bio: Option<String>,
    pub website_link: Option<String>,
    pub social_links: Vec<String>,
}

#[async_trait]
pub trait InfluencersRepo: Send + Sync {
    /// Create the influencer profile for a user. A second registration for
    /// the same user surfaces as [`RepoError::Duplicate`].
    async fn create_profile(
        &self,
        params: InfluencerProfileParams,
    ) -> Result<InfluencerRecord, RepoError>;

    /// Update an existing profile in place.
    async fn update_profile(
        &self,
        params: InfluencerProfileParams,
    ) -> Result<InfluencerRecord, RepoError>;

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<InfluencerRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewUserParams {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: Option<String>,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn insert_user(&self, params: NewUserParams) -> Result<UserRecord, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn with_deadline_passes_through_results() {
        let result = with_deadline(Duration::from_secs(1), async { Ok::<_, RepoError>(7) }).await;
        assert_eq!(result.expect("value"), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn with_deadline_maps_elapsed_to_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, RepoError>(7)
        };
        let result = with_deadline(Duration::from_millis(50), slow).await;
        assert!(matches!(result, Err(RepoError::Timeout)));
    }

    #[test]
    fn timeout_is_transient_but_duplicate_is_not() {
        assert!(RepoError::Timeout.is_transient());
        assert!(
            !RepoError::Duplicate {
                constraint: "blogs_slug_base_slug_key_key".to_string()
            }
            .is_transient()
        );
        assert!(!RepoError::NotFound.is_transient());
    }
}
