use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CommentsRepo, NewCommentParams, RepoError};
use crate::domain::entities::CommentRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    blog_id: Uuid,
    author_id: Uuid,
    body: String,
    created_at: OffsetDateTime,
    likers: Vec<Uuid>,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            blog_id: row.blog_id,
            author_id: row.author_id,
            body: row.body,
            likers: row.likers,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CommentsRepo for PostgresRepositories {
    async fn insert_comment(&self, params: NewCommentParams) -> Result<CommentRecord, RepoError> {
        let sql = "INSERT INTO comments (blog_id, author_id, body, created_at) \
            VALUES ($1, $2, $3, $4) \
            RETURNING id, blog_id, author_id, body, created_at, ARRAY[]::uuid[] AS likers";

        let row = query_as::<_, CommentRow>(sql)
            .bind(params.blog_id)
            .bind(params.author_id)
            .bind(&params.body)
            .bind(params.created_at)
            .fetch_one(self.pool())
            .await
            .map_err(|err| match map_sqlx_error(err) {
                // The blog foreign key is the only FK a comment insert can
                // trip; a missing blog is a NotFound, not bad input.
                RepoError::InvalidInput { .. } => RepoError::NotFound,
                other => other,
            })?;

        Ok(row.into())
    }

    async fn list_for_blog(&self, blog_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let sql = "SELECT c.id, c.blog_id, c.author_id, c.body, c.created_at, \
                ARRAY(SELECT cl.user_id FROM comment_likes cl \
                      WHERE cl.comment_id = c.id ORDER BY cl.user_id) AS likers \
            FROM comments c \
            WHERE c.blog_id = $1 \
            ORDER BY c.created_at DESC, c.id ASC";

        let rows = query_as::<_, CommentRow>(sql)
            .bind(blog_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
