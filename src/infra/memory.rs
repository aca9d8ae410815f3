//! In-memory repository implementations.
//!
//! The application-side join strategy: rows are joined via maps keyed by id
//! and sorted in Rust. Ordering and row-exclusion semantics are contractually
//! identical to the Postgres pushdown strategy in [`crate::infra::db`].
//! Doubles as the test double for every service.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    BlogSummary, BlogsRepo, CommentsRepo, EngagementRepo, InfluencerProfile,
    InfluencerProfileParams, InfluencerSummary, InfluencersRepo, LikeOutcome, NewBlogParams,
    NewCommentParams, NewUserParams, OwnerProfile, RankingQueryRepo, RepoError, UsersRepo,
};
use crate::cache::lock::{rw_read, rw_write};
use crate::domain::entities::{BlogRecord, CommentRecord, InfluencerRecord, UserRecord};
use crate::domain::slug::BlogSlug;

const SOURCE: &str = "infra::memory";

const SLUG_CONSTRAINT: &str = "blogs_slug_base_slug_key_key";
const USERNAME_CONSTRAINT: &str = "users_username_key";
const EMAIL_CONSTRAINT: &str = "users_email_key";
const INFLUENCER_CONSTRAINT: &str = "influencers_pkey";

#[derive(Debug, Clone)]
struct StoredBlog {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    content: String,
    video_id: String,
    video_thumbnail: Option<String>,
    slug: BlogSlug,
    views: i64,
    likers: BTreeSet<Uuid>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl StoredBlog {
    fn to_record(&self) -> BlogRecord {
        BlogRecord {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title.clone(),
            content: self.content.clone(),
            video_id: self.video_id.clone(),
            video_thumbnail: self.video_thumbnail.clone(),
            slug: self.slug.clone(),
            views: self.views,
            likers: self.likers.iter().copied().collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredComment {
    id: Uuid,
    blog_id: Uuid,
    author_id: Uuid,
    body: String,
    likers: BTreeSet<Uuid>,
    created_at: OffsetDateTime,
}

impl StoredComment {
    fn to_record(&self) -> CommentRecord {
        CommentRecord {
            id: self.id,
            blog_id: self.blog_id,
            author_id: self.author_id,
            body: self.body.clone(),
            likers: self.likers.iter().copied().collect(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, UserRecord>,
    influencers: HashMap<Uuid, InfluencerRecord>,
    blogs: HashMap<Uuid, StoredBlog>,
    comments: HashMap<Uuid, StoredComment>,
}

/// In-memory store shared through an `Arc`; every trait method takes one
/// lock for its whole mutation, so each operation is atomic with respect to
/// the store.
#[derive(Clone, Default)]
pub struct MemoryRepositories {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct read access for tests and callers that need the raw record.
    pub fn blog(&self, id: Uuid) -> Option<BlogRecord> {
        rw_read(&self.state, SOURCE, "blog")
            .blogs
            .get(&id)
            .map(StoredBlog::to_record)
    }

    pub fn comment(&self, id: Uuid) -> Option<CommentRecord> {
        rw_read(&self.state, SOURCE, "comment")
            .comments
            .get(&id)
            .map(StoredComment::to_record)
    }

    /// Overwrite a blog's view counter. Explicit correction path; normal
    /// mutation goes through [`EngagementRepo::increment_blog_views`].
    pub fn set_views(&self, blog_id: Uuid, views: i64) {
        let mut state = rw_write(&self.state, SOURCE, "set_views");
        if let Some(blog) = state.blogs.get_mut(&blog_id) {
            blog.views = views;
        }
    }
}

#[async_trait]
impl UsersRepo for MemoryRepositories {
    async fn insert_user(&self, params: NewUserParams) -> Result<UserRecord, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "insert_user");

        if state
            .users
            .values()
            .any(|user| user.username == params.username)
        {
            return Err(RepoError::Duplicate {
                constraint: USERNAME_CONSTRAINT.to_string(),
            });
        }
        if state.users.values().any(|user| user.email == params.email) {
            return Err(RepoError::Duplicate {
                constraint: EMAIL_CONSTRAINT.to_string(),
            });
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            username: params.username,
            email: params.email,
            first_name: params.first_name,
            last_name: params.last_name,
            profile_picture: params.profile_picture,
            created_at: OffsetDateTime::now_utc(),
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Ok(rw_read(&self.state, SOURCE, "find_user")
            .users
            .get(&id)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        Ok(rw_read(&self.state, SOURCE, "find_by_username")
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }
}

#[async_trait]
impl InfluencersRepo for MemoryRepositories {
    async fn create_profile(
        &self,
        params: InfluencerProfileParams,
    ) -> Result<InfluencerRecord, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "create_profile");

        if !state.users.contains_key(&params.user_id) {
            return Err(RepoError::InvalidInput {
                message: format!("user {} does not exist", params.user_id),
            });
        }
        if state.influencers.contains_key(&params.user_id) {
            return Err(RepoError::Duplicate {
                constraint: INFLUENCER_CONSTRAINT.to_string(),
            });
        }

        let now = OffsetDateTime::now_utc();
        let record = InfluencerRecord {
            user_id: params.user_id,
            bio: params.bio,
            website_link: params.website_link,
            social_links: params.social_links,
            created_at: now,
            updated_at: now,
        };
        state.influencers.insert(record.user_id, record.clone());
        Ok(record)
    }

    async fn update_profile(
        &self,
        params: InfluencerProfileParams,
    ) -> Result<InfluencerRecord, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "update_profile");
        let record = state
            .influencers
            .get_mut(&params.user_id)
            .ok_or(RepoError::NotFound)?;

        record.bio = params.bio;
        record.website_link = params.website_link;
        record.social_links = params.social_links;
        record.updated_at = OffsetDateTime::now_utc();
        Ok(record.clone())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<InfluencerRecord>, RepoError> {
        Ok(rw_read(&self.state, SOURCE, "find_influencer")
            .influencers
            .get(&user_id)
            .cloned())
    }
}

#[async_trait]
impl BlogsRepo for MemoryRepositories {
    async fn insert_blog(&self, params: NewBlogParams) -> Result<BlogRecord, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "insert_blog");

        if !state.users.contains_key(&params.owner_id) {
            return Err(RepoError::InvalidInput {
                message: format!("owner {} does not exist", params.owner_id),
            });
        }
        if state.blogs.values().any(|blog| blog.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: SLUG_CONSTRAINT.to_string(),
            });
        }

        let blog = StoredBlog {
            id: Uuid::new_v4(),
            owner_id: params.owner_id,
            title: params.title,
            content: params.content,
            video_id: params.video_id,
            video_thumbnail: params.video_thumbnail,
            slug: params.slug,
            views: 0,
            likers: BTreeSet::new(),
            created_at: params.created_at,
            updated_at: params.created_at,
        };
        let record = blog.to_record();
        state.blogs.insert(blog.id, blog);
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<BlogRecord>, RepoError> {
        Ok(rw_read(&self.state, SOURCE, "find_blog")
            .blogs
            .get(&id)
            .map(StoredBlog::to_record))
    }

    async fn find_by_slug(&self, slug: &BlogSlug) -> Result<Option<BlogRecord>, RepoError> {
        Ok(rw_read(&self.state, SOURCE, "find_blog_by_slug")
            .blogs
            .values()
            .find(|blog| &blog.slug == slug)
            .map(StoredBlog::to_record))
    }

    async fn find_by_owner_and_base(
        &self,
        owner_id: Uuid,
        base: &str,
    ) -> Result<Option<BlogRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "find_by_owner_and_base");
        let newest = state
            .blogs
            .values()
            .filter(|blog| blog.owner_id == owner_id && blog.slug.base() == base)
            .max_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| b.id.cmp(&a.id))
            });
        Ok(newest.map(StoredBlog::to_record))
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<BlogRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "list_recent");
        let mut records: Vec<BlogRecord> =
            state.blogs.values().map(StoredBlog::to_record).collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<BlogRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "list_for_owner");
        let mut records: Vec<BlogRecord> = state
            .blogs
            .values()
            .filter(|blog| blog.owner_id == owner_id)
            .map(StoredBlog::to_record)
            .collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }
}

#[async_trait]
impl EngagementRepo for MemoryRepositories {
    async fn toggle_blog_like(
        &self,
        blog_id: Uuid,
        user_id: Uuid,
    ) -> Result<LikeOutcome, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "toggle_blog_like");
        let blog = state.blogs.get_mut(&blog_id).ok_or(RepoError::NotFound)?;

        let liked = blog.likers.insert(user_id);
        if !liked {
            blog.likers.remove(&user_id);
        }
        Ok(LikeOutcome {
            liked,
            like_count: blog.likers.len() as u64,
        })
    }

    async fn toggle_comment_like(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<LikeOutcome, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "toggle_comment_like");
        let comment = state
            .comments
            .get_mut(&comment_id)
            .ok_or(RepoError::NotFound)?;

        let liked = comment.likers.insert(user_id);
        if !liked {
            comment.likers.remove(&user_id);
        }
        Ok(LikeOutcome {
            liked,
            like_count: comment.likers.len() as u64,
        })
    }

    async fn increment_blog_views(&self, blog_id: Uuid) -> Result<(), RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "increment_blog_views");
        let blog = state.blogs.get_mut(&blog_id).ok_or(RepoError::NotFound)?;
        blog.views += 1;
        blog.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }
}

#[async_trait]
impl CommentsRepo for MemoryRepositories {
    async fn insert_comment(&self, params: NewCommentParams) -> Result<CommentRecord, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "insert_comment");

        if !state.blogs.contains_key(&params.blog_id) {
            return Err(RepoError::NotFound);
        }

        let comment = StoredComment {
            id: Uuid::new_v4(),
            blog_id: params.blog_id,
            author_id: params.author_id,
            body: params.body,
            likers: BTreeSet::new(),
            created_at: params.created_at,
        };
        let record = comment.to_record();
        state.comments.insert(comment.id, comment);
        Ok(record)
    }

    async fn list_for_blog(&self, blog_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "list_comments");
        let mut records: Vec<CommentRecord> = state
            .comments
            .values()
            .filter(|comment| comment.blog_id == blog_id)
            .map(StoredComment::to_record)
            .collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(records)
    }
}

fn owner_profile(user: &UserRecord) -> OwnerProfile {
    OwnerProfile {
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        profile_picture: user.profile_picture.clone(),
    }
}

#[async_trait]
impl RankingQueryRepo for MemoryRepositories {
    async fn most_viewed_blogs(&self, limit: u32) -> Result<Vec<BlogSummary>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "most_viewed_blogs");

        // Join before sorting so a dangling owner never consumes a limit
        // slot, matching the SQL strategy's inner-join-then-limit order.
        let mut joined: Vec<(&StoredBlog, &UserRecord)> = state
            .blogs
            .values()
            .filter_map(|blog| state.users.get(&blog.owner_id).map(|owner| (blog, owner)))
            .collect();

        joined.sort_by(|(a, _), (b, _)| {
            b.views
                .cmp(&a.views)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });

        let summaries = joined
            .into_iter()
            .take(limit as usize)
            .map(|(blog, owner)| BlogSummary {
                id: blog.id,
                title: blog.title.clone(),
                slug: blog.slug.to_string(),
                video_id: blog.video_id.clone(),
                video_thumbnail: blog.video_thumbnail.clone(),
                views: blog.views,
                like_count: blog.likers.len() as u64,
                created_at: blog.created_at,
                owner: owner_profile(owner),
                owner_is_influencer: state.influencers.contains_key(&owner.id),
            })
            .collect();

        Ok(summaries)
    }

    async fn top_influencers(&self, limit: u32) -> Result<Vec<InfluencerSummary>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "top_influencers");

        struct Totals {
            total_views: u64,
            blog_count: u64,
            latest_blog_at: OffsetDateTime,
        }

        let mut by_owner: HashMap<Uuid, Totals> = HashMap::new();
        for blog in state.blogs.values() {
            let entry = by_owner.entry(blog.owner_id).or_insert(Totals {
                total_views: 0,
                blog_count: 0,
                latest_blog_at: blog.created_at,
            });
            entry.total_views += blog.views.max(0) as u64;
            entry.blog_count += 1;
            if blog.created_at > entry.latest_blog_at {
                entry.latest_blog_at = blog.created_at;
            }
        }

        // Inner join: owners lacking an influencer record or a user record
        // are invisible, whatever their view totals.
        let mut rows: Vec<(Uuid, Totals)> = by_owner
            .into_iter()
            .filter(|(owner_id, _)| {
                state.influencers.contains_key(owner_id) && state.users.contains_key(owner_id)
            })
            .collect();

        rows.sort_by(|(a_id, a), (b_id, b)| {
            b.total_views
                .cmp(&a.total_views)
                .then_with(|| b.latest_blog_at.cmp(&a.latest_blog_at))
                .then_with(|| a_id.cmp(b_id))
        });

        let summaries = rows
            .into_iter()
            .take(limit as usize)
            .filter_map(|(owner_id, totals)| {
                let user = state.users.get(&owner_id)?;
                let influencer = state.influencers.get(&owner_id)?;
                Some(InfluencerSummary {
                    owner: owner_profile(user),
                    profile: InfluencerProfile {
                        bio: influencer.bio.clone(),
                        website_link: influencer.website_link.clone(),
                        social_links: influencer.social_links.clone(),
                    },
                    total_views: totals.total_views,
                    blog_count: totals.blog_count,
                })
            })
            .collect();

        Ok(summaries)
    }
}
