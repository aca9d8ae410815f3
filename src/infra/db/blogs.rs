use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{BlogsRepo, NewBlogParams, RepoError};
use crate::domain::entities::BlogRecord;
use crate::domain::slug::BlogSlug;

use super::{PostgresRepositories, map_sqlx_error};

const BLOG_COLUMNS: &str = "b.id, b.owner_id, b.title, b.content, b.video_id, \
    b.video_thumbnail, b.slug_base, b.slug_key, b.views, b.created_at, b.updated_at, \
    ARRAY(SELECT bl.user_id FROM blog_likes bl WHERE bl.blog_id = b.id ORDER BY bl.user_id) AS likers";

#[derive(sqlx::FromRow)]
struct BlogRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    content: String,
    video_id: String,
    video_thumbnail: Option<String>,
    slug_base: String,
    slug_key: String,
    views: i64,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    likers: Vec<Uuid>,
}

impl From<BlogRow> for BlogRecord {
    fn from(row: BlogRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            content: row.content,
            video_id: row.video_id,
            video_thumbnail: row.video_thumbnail,
            slug: BlogSlug::new(row.slug_base, row.slug_key),
            views: row.views,
            likers: row.likers,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl BlogsRepo for PostgresRepositories {
    async fn insert_blog(&self, params: NewBlogParams) -> Result<BlogRecord, RepoError> {
        let sql = "INSERT INTO blogs \
            (owner_id, title, content, video_id, video_thumbnail, slug_base, slug_key, created_at, updated_at) \
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
            RETURNING id, owner_id, title, content, video_id, video_thumbnail, \
                slug_base, slug_key, views, created_at, updated_at, \
                ARRAY[]::uuid[] AS likers";

        let row = query_as::<_, BlogRow>(sql)
            .bind(params.owner_id)
            .bind(&params.title)
            .bind(&params.content)
            .bind(&params.video_id)
            .bind(&params.video_thumbnail)
            .bind(params.slug.base())
            .bind(params.slug.key())
            .bind(params.created_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<BlogRecord>, RepoError> {
        let sql = format!("SELECT {BLOG_COLUMNS} FROM blogs b WHERE b.id = $1");
        let row = query_as::<_, BlogRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn find_by_slug(&self, slug: &BlogSlug) -> Result<Option<BlogRecord>, RepoError> {
        let sql =
            format!("SELECT {BLOG_COLUMNS} FROM blogs b WHERE b.slug_base = $1 AND b.slug_key = $2");
        let row = query_as::<_, BlogRow>(&sql)
            .bind(slug.base())
            .bind(slug.key())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn find_by_owner_and_base(
        &self,
        owner_id: Uuid,
        base: &str,
    ) -> Result<Option<BlogRecord>, RepoError> {
        let sql = format!(
            "SELECT {BLOG_COLUMNS} FROM blogs b \
             WHERE b.owner_id = $1 AND b.slug_base = $2 \
             ORDER BY b.created_at DESC, b.id ASC \
             LIMIT 1"
        );
        let row = query_as::<_, BlogRow>(&sql)
            .bind(owner_id)
            .bind(base)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<BlogRecord>, RepoError> {
        let sql = format!(
            "SELECT {BLOG_COLUMNS} FROM blogs b \
             ORDER BY b.created_at DESC, b.id ASC \
             LIMIT $1"
        );
        let rows = query_as::<_, BlogRow>(&sql)
            .bind(i64::from(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<BlogRecord>, RepoError> {
        let sql = format!(
            "SELECT {BLOG_COLUMNS} FROM blogs b \
             WHERE b.owner_id = $1 \
             ORDER BY b.created_at DESC, b.id ASC"
        );
        let rows = query_as::<_, BlogRow>(&sql)
            .bind(owner_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
