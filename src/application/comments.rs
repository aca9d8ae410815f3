//! Comment creation and listing.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::application::repos::{CommentsRepo, NewCommentParams, RepoError, with_deadline};
use crate::domain::entities::CommentRecord;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("comment body is empty")]
    EmptyBody,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentsRepo>,
    store_deadline: Duration,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentsRepo>, store_deadline: Duration) -> Self {
        Self {
            comments,
            store_deadline,
        }
    }

    /// Attach a comment to a blog. A missing blog surfaces as
    /// [`RepoError::NotFound`] for the caller to report.
    #[instrument(skip(self, body), fields(blog = %blog_id, author = %author_id))]
    pub async fn add_comment(
        &self,
        blog_id: Uuid,
        author_id: Uuid,
        body: String,
    ) -> Result<CommentRecord, CommentError> {
        if body.trim().is_empty() {
            return Err(CommentError::EmptyBody);
        }

        let params = NewCommentParams {
            blog_id,
            author_id,
            body,
            created_at: OffsetDateTime::now_utc(),
        };
        let record = with_deadline(self.store_deadline, self.comments.insert_comment(params))
            .await?;
        Ok(record)
    }

    /// Comments for a blog, newest first.
    pub async fn list_for_blog(&self, blog_id: Uuid) -> Result<Vec<CommentRecord>, CommentError> {
        let records =
            with_deadline(self.store_deadline, self.comments.list_for_blog(blog_id)).await?;
        Ok(records)
    }
}
