//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{CommentRecord, PostRecord, SessionRecord, UserRecord};
use crate::domain::types::Category;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct NewPostParams {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub author_id: Uuid,
    pub author_name: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub published: bool,
}

/// Field update for an existing post. `image_url` of `None` keeps the stored
/// value; every other field overwrites.
#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub category: Category,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CategoryCount {
    pub category: Category,
    pub count: u64,
}

/// Whole-site aggregates over published posts.
#[derive(Debug, Clone)]
pub struct SiteTotals {
    pub total_posts: u64,
    pub total_views: u64,
    pub category_counts: Vec<CategoryCount>,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Published posts by descending view count.
    async fn top_viewed_published(&self, limit: i64) -> Result<Vec<PostRecord>, RepoError>;

    /// Published posts by descending creation time, optionally scoped to one
    /// category. Serves the blog list, the home page, and the category page.
    async fn recent_published(
        &self,
        category: Option<Category>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn count_published(&self, category: Option<Category>) -> Result<u64, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;

    async fn find_published_by_title(&self, title: &str) -> Result<Option<PostRecord>, RepoError>;

    /// Other published posts in the same category, newest first.
    async fn related_published(
        &self,
        category: Category,
        exclude: Uuid,
        limit: i64,
    ) -> Result<Vec<PostRecord>, RepoError>;

    /// Case-insensitive substring match over title, content, and tags of
    /// published posts.
    async fn search_published(
        &self,
        query: &str,
        limit: i64,
    ) -> Result<Vec<PostRecord>, RepoError>;

    async fn site_totals(&self) -> Result<SiteTotals, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: NewPostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;

    /// Atomically bumps the view counter and returns the updated record.
    async fn increment_views(&self, id: Uuid) -> Result<PostRecord, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewCommentParams {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub content: String,
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments for one post, newest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError>;

    async fn create_comment(&self, params: NewCommentParams) -> Result<CommentRecord, RepoError>;

    /// Removes every comment attached to a post; returns how many went.
    async fn delete_for_post(&self, post_id: Uuid) -> Result<u64, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewUserParams {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    /// Inserts a new account; username and email collisions surface as
    /// `RepoError::Duplicate`.
    async fn create_user(&self, params: NewUserParams) -> Result<UserRecord, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewSessionParams {
    pub user_id: Uuid,
    pub token_hash: Vec<u8>,
    pub expires_at: OffsetDateTime,
}

#[async_trait]
pub trait SessionsRepo: Send + Sync {
    async fn create_session(&self, params: NewSessionParams) -> Result<SessionRecord, RepoError>;

    /// Resolves an unexpired session token hash to its account.
    async fn find_user_by_token(
        &self,
        token_hash: &[u8],
    ) -> Result<Option<UserRecord>, RepoError>;

    async fn delete_session(&self, token_hash: &[u8]) -> Result<(), RepoError>;
}
