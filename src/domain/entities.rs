//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::slug::BlogSlug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub video_id: String,
    pub video_thumbnail: Option<String>,
    pub slug: BlogSlug,
    /// Monotonically non-decreasing outside explicit correction.
    pub views: i64,
    /// User ids that currently like this blog, sorted for determinism.
    pub likers: Vec<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Public profile fields of a user. The credential hash lives with the Auth
/// collaborator and never enters this crate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub profile_picture: Option<String>,
    pub created_at: OffsetDateTime,
}

/// At most one per user. Presence of this record is the sole signal that a
/// user ranks as an influencer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfluencerRecord {
    pub user_id: Uuid,
    pub bio: Option<String>,
    pub website_link: Option<String>,
    pub social_links: Vec<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub blog_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub likers: Vec<Uuid>,
    pub created_at: OffsetDateTime,
}
