use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{InfluencerProfileParams, InfluencersRepo, RepoError};
use crate::domain::entities::InfluencerRecord;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct InfluencerRow {
    user_id: Uuid,
    bio: Option<String>,
    website_link: Option<String>,
    social_links: Vec<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<InfluencerRow> for InfluencerRecord {
    fn from(row: InfluencerRow) -> Self {
        Self {
            user_id: row.user_id,
            bio: row.bio,
            website_link: row.website_link,
            social_links: row.social_links,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl InfluencersRepo for PostgresRepositories {
    async fn create_profile(
        &self,
        params: InfluencerProfileParams,
    ) -> Result<InfluencerRecord, RepoError> {
        let sql = "INSERT INTO influencers (user_id, bio, website_link, social_links) \
            VALUES ($1, $2, $3, $4) \
            RETURNING user_id, bio, website_link, social_links, created_at, updated_at";

        let row = query_as::<_, InfluencerRow>(sql)
            .bind(params.user_id)
            .bind(&params.bio)
            .bind(&params.website_link)
            .bind(&params.social_links)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_profile(
        &self,
        params: InfluencerProfileParams,
    ) -> Result<InfluencerRecord, RepoError> {
        let sql = "UPDATE influencers \
            SET bio = $2, website_link = $3, social_links = $4, updated_at = now() \
            WHERE user_id = $1 \
            RETURNING user_id, bio, website_link, social_links, created_at, updated_at";

        let row = query_as::<_, InfluencerRow>(sql)
            .bind(params.user_id)
            .bind(&params.bio)
            .bind(&params.website_link)
            .bind(&params.social_links)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(Into::into).ok_or(RepoError::NotFound)
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<InfluencerRecord>, RepoError> {
        let sql = "SELECT user_id, bio, website_link, social_links, created_at, updated_at \
            FROM influencers WHERE user_id = $1";

        let row = query_as::<_, InfluencerRow>(sql)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Into::into))
    }
}
