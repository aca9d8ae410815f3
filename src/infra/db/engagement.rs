//! Engagement mutations, each a single atomic statement at the store.

use async_trait::async_trait;
use sqlx::{query, query_as};
use uuid::Uuid;

use crate::application::repos::{EngagementRepo, LikeOutcome, RepoError};

use super::{PostgresRepositories, convert_count, map_sqlx_error};

// One statement flips like membership: the DELETE fires when the row exists,
// the INSERT fires only when it did not. The snapshot taken at statement start
// does not see this statement's own writes, so the post-toggle count is the
// snapshot count plus inserted minus removed.
const TOGGLE_BLOG_LIKE: &str = "WITH removed AS ( \
        DELETE FROM blog_likes WHERE blog_id = $1 AND user_id = $2 RETURNING 1 \
    ), inserted AS ( \
        INSERT INTO blog_likes (blog_id, user_id) \
        SELECT $1, $2 \
        WHERE EXISTS (SELECT 1 FROM blogs WHERE id = $1) \
          AND NOT EXISTS (SELECT 1 FROM removed) \
        ON CONFLICT DO NOTHING \
        RETURNING 1 \
    ) \
    SELECT \
        EXISTS (SELECT 1 FROM inserted) AS liked, \
        ((SELECT count(*) FROM blog_likes WHERE blog_id = $1) \
            + (SELECT count(*) FROM inserted) \
            - (SELECT count(*) FROM removed)) AS like_count, \
        EXISTS (SELECT 1 FROM blogs WHERE id = $1) AS target_exists";

const TOGGLE_COMMENT_LIKE: &str = "WITH removed AS ( \
        DELETE FROM comment_likes WHERE comment_id = $1 AND user_id = $2 RETURNING 1 \
    ), inserted AS ( \
        INSERT INTO comment_likes (comment_id, user_id) \
        SELECT $1, $2 \
        WHERE EXISTS (SELECT 1 FROM comments WHERE id = $1) \
          AND NOT EXISTS (SELECT 1 FROM removed) \
        ON CONFLICT DO NOTHING \
        RETURNING 1 \
    ) \
    SELECT \
        EXISTS (SELECT 1 FROM inserted) AS liked, \
        ((SELECT count(*) FROM comment_likes WHERE comment_id = $1) \
            + (SELECT count(*) FROM inserted) \
            - (SELECT count(*) FROM removed)) AS like_count, \
        EXISTS (SELECT 1 FROM comments WHERE id = $1) AS target_exists";

#[derive(sqlx::FromRow)]
struct ToggleRow {
    liked: bool,
    like_count: i64,
    target_exists: bool,
}

impl ToggleRow {
    fn into_outcome(self) -> Result<LikeOutcome, RepoError> {
        if !self.target_exists {
            return Err(RepoError::NotFound);
        }
        Ok(LikeOutcome {
            liked: self.liked,
            like_count: convert_count(self.like_count),
        })
    }
}

#[async_trait]
impl EngagementRepo for PostgresRepositories {
    async fn toggle_blog_like(
        &self,
        blog_id: Uuid,
        user_id: Uuid,
    ) -> Result<LikeOutcome, RepoError> {
        query_as::<_, ToggleRow>(TOGGLE_BLOG_LIKE)
            .bind(blog_id)
            .bind(user_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .into_outcome()
    }

    async fn toggle_comment_like(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<LikeOutcome, RepoError> {
        query_as::<_, ToggleRow>(TOGGLE_COMMENT_LIKE)
            .bind(comment_id)
            .bind(user_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .into_outcome()
    }

    async fn increment_blog_views(&self, blog_id: Uuid) -> Result<(), RepoError> {
        let result = query("UPDATE blogs SET views = views + 1, updated_at = now() WHERE id = $1")
            .bind(blog_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
