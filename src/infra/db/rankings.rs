//! Ranked read queries pushed down to Postgres.
//!
//! Both queries inner-join before limiting, so a dangling owner row never
//! consumes a limit slot, and both carry the full deterministic ORDER BY with
//! id as the final tiebreaker.

use async_trait::async_trait;
use sqlx::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    BlogSummary, InfluencerProfile, InfluencerSummary, OwnerProfile, RankingQueryRepo, RepoError,
};

use super::{PostgresRepositories, convert_count, map_sqlx_error};

const MOST_VIEWED_BLOGS: &str = "SELECT \
        b.id, b.title, b.slug_base, b.slug_key, b.video_id, b.video_thumbnail, \
        b.views, b.created_at, \
        (SELECT count(*) FROM blog_likes bl WHERE bl.blog_id = b.id) AS like_count, \
        u.id AS owner_id, u.username, u.first_name, u.last_name, u.profile_picture, \
        EXISTS (SELECT 1 FROM influencers i WHERE i.user_id = u.id) AS owner_is_influencer \
    FROM blogs b \
    INNER JOIN users u ON u.id = b.owner_id \
    ORDER BY b.views DESC, b.created_at DESC, b.id ASC \
    LIMIT $1";

const TOP_INFLUENCERS: &str = "SELECT \
        u.id AS owner_id, u.username, u.first_name, u.last_name, u.profile_picture, \
        i.bio, i.website_link, i.social_links, \
        s.total_views, s.blog_count \
    FROM ( \
        SELECT b.owner_id, \
               SUM(b.views)::BIGINT AS total_views, \
               COUNT(*) AS blog_count, \
               MAX(b.created_at) AS latest_blog_at \
        FROM blogs b \
        GROUP BY b.owner_id \
    ) s \
    INNER JOIN influencers i ON i.user_id = s.owner_id \
    INNER JOIN users u ON u.id = s.owner_id \
    ORDER BY s.total_views DESC, s.latest_blog_at DESC, u.id ASC \
    LIMIT $1";

#[derive(sqlx::FromRow)]
struct MostViewedRow {
    id: Uuid,
    title: String,
    slug_base: String,
    slug_key: String,
    video_id: String,
    video_thumbnail: Option<String>,
    views: i64,
    created_at: OffsetDateTime,
    like_count: i64,
    owner_id: Uuid,
    username: String,
    first_name: String,
    last_name: String,
    profile_picture: Option<String>,
    owner_is_influencer: bool,
}

impl From<MostViewedRow> for BlogSummary {
    fn from(row: MostViewedRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: format!("{}-{}", row.slug_base, row.slug_key),
            video_id: row.video_id,
            video_thumbnail: row.video_thumbnail,
            views: row.views,
            like_count: convert_count(row.like_count),
            created_at: row.created_at,
            owner: OwnerProfile {
                id: row.owner_id,
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
                profile_picture: row.profile_picture,
            },
            owner_is_influencer: row.owner_is_influencer,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TopInfluencerRow {
    owner_id: Uuid,
    username: String,
    first_name: String,
    last_name: String,
    profile_picture: Option<String>,
    bio: Option<String>,
    website_link: Option<String>,
    social_links: Vec<String>,
    total_views: i64,
    blog_count: i64,
}

impl From<TopInfluencerRow> for InfluencerSummary {
    fn from(row: TopInfluencerRow) -> Self {
        Self {
            owner: OwnerProfile {
                id: row.owner_id,
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
                profile_picture: row.profile_picture,
            },
            profile: InfluencerProfile {
                bio: row.bio,
                website_link: row.website_link,
                social_links: row.social_links,
            },
            total_views: convert_count(row.total_views),
            blog_count: convert_count(row.blog_count),
        }
    }
}

#[async_trait]
impl RankingQueryRepo for PostgresRepositories {
    async fn most_viewed_blogs(&self, limit: u32) -> Result<Vec<BlogSummary>, RepoError> {
        let rows = query_as::<_, MostViewedRow>(MOST_VIEWED_BLOGS)
            .bind(i64::from(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn top_influencers(&self, limit: u32) -> Result<Vec<InfluencerSummary>, RepoError> {
        let rows = query_as::<_, TopInfluencerRow>(TOP_INFLUENCERS)
            .bind(i64::from(limit))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
