//! Blog publication and slug-based identity resolution.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::application::repos::{BlogsRepo, NewBlogParams, RepoError, with_deadline};
use crate::domain::entities::BlogRecord;
use crate::domain::slug::{self, BlogSlug, SlugError};

/// Slug-conflict retries before giving up. Each retry advances the
/// disambiguator timestamp, so exhaustion means something other than a
/// same-millisecond race is wrong.
const MAX_SLUG_ATTEMPTS: usize = 8;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    SlugExhausted { base: String },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct BlogDraft {
    pub title: String,
    pub content: String,
    pub video_id: String,
    pub video_thumbnail: Option<String>,
}

/// Creates blogs with practically-unique slugs and resolves slug identities.
#[derive(Clone)]
pub struct BlogService {
    blogs: Arc<dyn BlogsRepo>,
    store_deadline: Duration,
}

impl BlogService {
    pub fn new(blogs: Arc<dyn BlogsRepo>, store_deadline: Duration) -> Self {
        Self {
            blogs,
            store_deadline,
        }
    }

    /// Publish a blog owned by `owner_id`.
    ///
    /// The slug disambiguator is built from the owner id and the creation
    /// instant at millisecond resolution. Two inserts by the same owner with
    /// the same title within one millisecond collide deterministically, so a
    /// uniqueness Conflict from the store is answered by regenerating with a
    /// strictly later timestamp and retrying.
    #[instrument(skip(self, draft), fields(owner = %owner_id, title = %draft.title))]
    pub async fn publish(
        &self,
        owner_id: Uuid,
        draft: BlogDraft,
    ) -> Result<BlogRecord, PublishError> {
        let base = slug::derive_base(&draft.title)?;
        let mut stamp_ms = unix_millis(OffsetDateTime::now_utc());

        for attempt in 0..MAX_SLUG_ATTEMPTS {
            let slug = BlogSlug::new(base.clone(), slug::disambiguator(owner_id, stamp_ms));
            let params = NewBlogParams {
                owner_id,
                title: draft.title.clone(),
                content: draft.content.clone(),
                video_id: draft.video_id.clone(),
                video_thumbnail: draft.video_thumbnail.clone(),
                slug,
                created_at: OffsetDateTime::now_utc(),
            };

            match with_deadline(self.store_deadline, self.blogs.insert_blog(params)).await {
                Ok(record) => return Ok(record),
                Err(RepoError::Duplicate { constraint }) => {
                    warn!(
                        attempt,
                        constraint = %constraint,
                        base = %base,
                        "Slug collision; retrying with a fresh timestamp"
                    );
                    // A wall-clock read inside the same millisecond would
                    // regenerate the identical key, so advance monotonically.
                    let now_ms = unix_millis(OffsetDateTime::now_utc());
                    stamp_ms = now_ms.max(stamp_ms + 1);
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(PublishError::SlugExhausted { base })
    }

    /// Locate the blog owned by `owner_id` whose slug base equals `base`.
    /// Lookup is indexed on the two slug fields, never a pattern scan.
    pub async fn resolve(
        &self,
        owner_id: Uuid,
        base: &str,
    ) -> Result<Option<BlogRecord>, RepoError> {
        with_deadline(
            self.store_deadline,
            self.blogs.find_by_owner_and_base(owner_id, base),
        )
        .await
    }

    pub async fn find_by_slug(&self, slug: &BlogSlug) -> Result<Option<BlogRecord>, RepoError> {
        with_deadline(self.store_deadline, self.blogs.find_by_slug(slug)).await
    }

    /// The newest blogs across all owners, at most `limit` rows.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<BlogRecord>, RepoError> {
        with_deadline(self.store_deadline, self.blogs.list_recent(limit)).await
    }

    /// Every blog owned by `owner_id`, newest first.
    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<BlogRecord>, RepoError> {
        with_deadline(self.store_deadline, self.blogs.list_for_owner(owner_id)).await
    }
}

fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Rejects the first `conflicts` inserts as slug duplicates, recording
    /// every attempted slug.
    struct ConflictingRepo {
        conflicts: usize,
        attempts: Mutex<Vec<BlogSlug>>,
    }

    impl ConflictingRepo {
        fn new(conflicts: usize) -> Self {
            Self {
                conflicts,
                attempts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BlogsRepo for ConflictingRepo {
        async fn insert_blog(&self, params: NewBlogParams) -> Result<BlogRecord, RepoError> {
            let mut attempts = self.attempts.lock().expect("attempts lock");
            attempts.push(params.slug.clone());
            if attempts.len() <= self.conflicts {
                return Err(RepoError::Duplicate {
                    constraint: "blogs_slug_base_slug_key_key".to_string(),
                });
            }
            Ok(BlogRecord {
                id: Uuid::new_v4(),
                owner_id: params.owner_id,
                title: params.title,
                content: params.content,
                video_id: params.video_id,
                video_thumbnail: params.video_thumbnail,
                slug: params.slug,
                views: 0,
                likers: Vec::new(),
                created_at: params.created_at,
                updated_at: params.created_at,
            })
        }

        async fn find_by_id(&self, _id: Uuid) -> Result<Option<BlogRecord>, RepoError> {
            Ok(None)
        }

        async fn find_by_slug(&self, _slug: &BlogSlug) -> Result<Option<BlogRecord>, RepoError> {
            Ok(None)
        }

        async fn find_by_owner_and_base(
            &self,
            _owner_id: Uuid,
            _base: &str,
        ) -> Result<Option<BlogRecord>, RepoError> {
            Ok(None)
        }

        async fn list_recent(&self, _limit: u32) -> Result<Vec<BlogRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn list_for_owner(&self, _owner_id: Uuid) -> Result<Vec<BlogRecord>, RepoError> {
            Ok(Vec::new())
        }
    }

    fn draft() -> BlogDraft {
        BlogDraft {
            title: "My Journey".to_string(),
            content: "body".to_string(),
            video_id: "vid-1".to_string(),
            video_thumbnail: None,
        }
    }

    #[tokio::test]
    async fn slug_conflict_retries_with_a_fresh_key() {
        let repo = Arc::new(ConflictingRepo::new(2));
        let service = BlogService::new(repo.clone(), Duration::from_secs(5));

        let record = service
            .publish(Uuid::new_v4(), draft())
            .await
            .expect("publish after retries");
        assert_eq!(record.slug.base(), "my-journey");

        let attempts = repo.attempts.lock().expect("attempts lock");
        assert_eq!(attempts.len(), 3);
        // Every retry advanced the timestamp, so no key repeats.
        assert_ne!(attempts[0].key(), attempts[1].key());
        assert_ne!(attempts[1].key(), attempts[2].key());
    }

    #[tokio::test]
    async fn persistent_conflicts_exhaust_the_retry_budget() {
        let repo = Arc::new(ConflictingRepo::new(usize::MAX));
        let service = BlogService::new(repo.clone(), Duration::from_secs(5));

        let result = service.publish(Uuid::new_v4(), draft()).await;
        assert!(matches!(result, Err(PublishError::SlugExhausted { .. })));
        assert_eq!(
            repo.attempts.lock().expect("attempts lock").len(),
            MAX_SLUG_ATTEMPTS
        );
    }
}
