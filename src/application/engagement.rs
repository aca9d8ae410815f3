//! Idempotent like/unlike toggles and view-count increments.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::application::repos::{EngagementRepo, LikeOutcome, RepoError, with_deadline};

#[derive(Debug, Error)]
pub enum EngagementError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Applies engagement mutations against individual entities. Each mutation
/// is a single atomic operation at the store; two toggles by the same user
/// return the liker set to its original state.
#[derive(Clone)]
pub struct EngagementService {
    engagement: Arc<dyn EngagementRepo>,
    store_deadline: Duration,
}

impl EngagementService {
    pub fn new(engagement: Arc<dyn EngagementRepo>, store_deadline: Duration) -> Self {
        Self {
            engagement,
            store_deadline,
        }
    }

    #[instrument(skip(self))]
    pub async fn toggle_blog_like(
        &self,
        blog_id: Uuid,
        user_id: Uuid,
    ) -> Result<LikeOutcome, EngagementError> {
        let outcome = with_deadline(
            self.store_deadline,
            self.engagement.toggle_blog_like(blog_id, user_id),
        )
        .await?;
        counter!("risalto_like_toggle_total", "entity" => "blog").increment(1);
        Ok(outcome)
    }

    #[instrument(skip(self))]
    pub async fn toggle_comment_like(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<LikeOutcome, EngagementError> {
        let outcome = with_deadline(
            self.store_deadline,
            self.engagement.toggle_comment_like(comment_id, user_id),
        )
        .await?;
        counter!("risalto_like_toggle_total", "entity" => "comment").increment(1);
        Ok(outcome)
    }

    /// Increment the blog's view counter by exactly one. Repeated calls from
    /// the same viewer all count; there is no deduplication by viewer or
    /// session.
    #[instrument(skip(self))]
    pub async fn record_view(&self, blog_id: Uuid) -> Result<(), EngagementError> {
        with_deadline(
            self.store_deadline,
            self.engagement.increment_blog_views(blog_id),
        )
        .await?;
        counter!("risalto_view_record_total").increment(1);
        Ok(())
    }
}
