//! Post browsing, authoring, and comments.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::application::repos::{
    CommentsRepo, NewCommentParams, NewPostParams, PostsRepo, PostsWriteRepo, RepoError,
    SiteTotals, UpdatePostParams,
};
use crate::domain::entities::{CommentRecord, PostRecord, UserRecord};
use crate::domain::error::DomainError;
use crate::domain::posts;
use crate::domain::types::Category;

const HOME_FEATURED_LIMIT: i64 = 3;
const HOME_RECENT_LIMIT: i64 = 6;
const LIST_PAGE_SIZE: i64 = 9;
const RELATED_LIMIT: i64 = 3;

#[derive(Clone)]
pub struct BlogService {
    posts: Arc<dyn PostsRepo>,
    posts_write: Arc<dyn PostsWriteRepo>,
    comments: Arc<dyn CommentsRepo>,
}

#[derive(Debug, Error)]
pub enum BlogError {
    #[error("post not found")]
    NotFound,
    #[error("only the author may modify this post")]
    NotAuthor,
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Raw form fields for creating or editing a post.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: String,
    pub tags: String,
    pub image_url: String,
}

#[derive(Debug, Clone)]
pub struct HomePage {
    pub featured: Vec<PostRecord>,
    pub recent: Vec<PostRecord>,
}

#[derive(Debug, Clone)]
pub struct PostListPage {
    pub posts: Vec<PostRecord>,
    pub page: u32,
    pub total_pages: u32,
    pub total: u64,
    pub category: Option<Category>,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostRecord,
    pub comments: Vec<CommentRecord>,
    pub related: Vec<PostRecord>,
}

impl BlogService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        posts_write: Arc<dyn PostsWriteRepo>,
        comments: Arc<dyn CommentsRepo>,
    ) -> Self {
        Self {
            posts,
            posts_write,
            comments,
        }
    }

    /// Most-viewed and most-recent published posts. A store failure degrades
    /// to an empty section rather than an error page.
    pub async fn home(&self) -> HomePage {
        let featured = self
            .posts
            .top_viewed_published(HOME_FEATURED_LIMIT)
            .await
            .unwrap_or_else(|err| {
                warn!(
                    target = "voce::application::blog",
                    op = "blog::home_featured",
                    error = %err,
                    "Store unavailable; rendering home without featured posts"
                );
                Vec::new()
            });
        let recent = self
            .posts
            .recent_published(None, HOME_RECENT_LIMIT, 0)
            .await
            .unwrap_or_else(|err| {
                warn!(
                    target = "voce::application::blog",
                    op = "blog::home_recent",
                    error = %err,
                    "Store unavailable; rendering home without recent posts"
                );
                Vec::new()
            });
        HomePage { featured, recent }
    }

    /// One page of the published post list, newest first, optionally scoped
    /// to a category. Degrades to an empty first page on store failure.
    pub async fn list(&self, page: u32, category: Option<Category>) -> PostListPage {
        let page = page.max(1);
        match self.fetch_list(page, category).await {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    target = "voce::application::blog",
                    op = "blog::list",
                    page,
                    error = %err,
                    "Store unavailable; rendering an empty post list"
                );
                PostListPage {
                    posts: Vec::new(),
                    page: 1,
                    total_pages: 1,
                    total: 0,
                    category,
                }
            }
        }
    }

    async fn fetch_list(
        &self,
        page: u32,
        category: Option<Category>,
    ) -> Result<PostListPage, RepoError> {
        let offset = i64::from(page - 1) * LIST_PAGE_SIZE;
        let posts = self
            .posts
            .recent_published(category, LIST_PAGE_SIZE, offset)
            .await?;
        let total = self.posts.count_published(category).await?;
        let total_pages = u32::try_from(total.div_ceil(LIST_PAGE_SIZE as u64))
            .unwrap_or(u32::MAX)
            .max(1);
        Ok(PostListPage {
            posts,
            page,
            total_pages,
            total,
            category,
        })
    }

    /// A single post with its comments (newest first) and up to three other
    /// published posts from the same category. Counts the view when the post
    /// is published; unpublished posts are visible only to their author.
    pub async fn detail(&self, id: Uuid, viewer: Option<Uuid>) -> Result<PostDetail, BlogError> {
        let Some(post) = self.posts.find_by_id(id).await? else {
            return Err(BlogError::NotFound);
        };
        if !post.published && viewer != Some(post.author_id) {
            return Err(BlogError::NotFound);
        }

        let post = if post.published {
            self.posts_write.increment_views(post.id).await?
        } else {
            post
        };

        let comments = self.comments.list_for_post(post.id).await?;
        let related = self
            .posts
            .related_published(post.category, post.id, RELATED_LIMIT)
            .await?;

        Ok(PostDetail {
            post,
            comments,
            related,
        })
    }

    pub async fn create(
        &self,
        author: &UserRecord,
        input: PostInput,
    ) -> Result<PostRecord, BlogError> {
        let params = build_new_post(author, input)?;
        Ok(self.posts_write.create_post(params).await?)
    }

    pub async fn update(
        &self,
        actor: Uuid,
        id: Uuid,
        input: PostInput,
    ) -> Result<PostRecord, BlogError> {
        let existing = self.owned_post(actor, id).await?;
        let params = build_post_update(existing.id, input)?;
        Ok(self.posts_write.update_post(params).await?)
    }

    /// Removes a post and every comment attached to it.
    pub async fn delete(&self, actor: Uuid, id: Uuid) -> Result<(), BlogError> {
        let existing = self.owned_post(actor, id).await?;
        self.comments.delete_for_post(existing.id).await?;
        self.posts_write.delete_post(existing.id).await?;
        Ok(())
    }

    /// The post to edit, with the author check already done.
    pub async fn editable(&self, actor: Uuid, id: Uuid) -> Result<PostRecord, BlogError> {
        self.owned_post(actor, id).await
    }

    pub async fn add_comment(
        &self,
        author: &UserRecord,
        post_id: Uuid,
        content: &str,
    ) -> Result<CommentRecord, BlogError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("comment text is required").into());
        }
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(BlogError::NotFound);
        }
        let params = NewCommentParams {
            post_id,
            author_id: author.id,
            author_name: author.username.clone(),
            content: trimmed.to_owned(),
        };
        Ok(self.comments.create_comment(params).await?)
    }

    pub async fn site_totals(&self) -> Result<SiteTotals, BlogError> {
        Ok(self.posts.site_totals().await?)
    }

    async fn owned_post(&self, actor: Uuid, id: Uuid) -> Result<PostRecord, BlogError> {
        let Some(post) = self.posts.find_by_id(id).await? else {
            return Err(BlogError::NotFound);
        };
        if post.author_id != actor {
            return Err(BlogError::NotAuthor);
        }
        Ok(post)
    }
}

fn build_new_post(author: &UserRecord, input: PostInput) -> Result<NewPostParams, DomainError> {
    let (title, content, excerpt, category, tags) = validate_post_fields(&input)?;
    let image_url = if input.image_url.trim().is_empty() {
        // new posts get the bundled placeholder written into the record
        Some(posts::DEFAULT_UPLOAD_IMAGE.to_owned())
    } else {
        Some(input.image_url.trim().to_owned())
    };
    Ok(NewPostParams {
        title,
        content,
        excerpt,
        author_id: author.id,
        author_name: author.username.clone(),
        category,
        tags,
        image_url,
        published: true,
    })
}

fn build_post_update(id: Uuid, input: PostInput) -> Result<UpdatePostParams, DomainError> {
    let (title, content, excerpt, category, tags) = validate_post_fields(&input)?;
    let image_url = if input.image_url.trim().is_empty() {
        // blank keeps whatever the post already had
        None
    } else {
        Some(input.image_url.trim().to_owned())
    };
    Ok(UpdatePostParams {
        id,
        title,
        content,
        excerpt,
        category,
        tags,
        image_url,
    })
}

fn validate_post_fields(
    input: &PostInput,
) -> Result<(String, String, Option<String>, Category, Vec<String>), DomainError> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title is required"));
    }
    let content = input.content.trim();
    if content.is_empty() {
        return Err(DomainError::validation("content is required"));
    }
    let category = input
        .category
        .parse::<Category>()
        .map_err(|()| DomainError::unknown_category(input.category.trim()))?;
    let excerpt = match input.excerpt.trim() {
        "" => None,
        stored => Some(stored.to_owned()),
    };
    Ok((
        title.to_owned(),
        content.to_owned(),
        excerpt,
        category,
        posts::normalize_tags(&input.tags),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> UserRecord {
        UserRecord {
            id: Uuid::new_v4(),
            username: "maria".to_owned(),
            email: "maria@example.com".to_owned(),
            password_hash: "x".to_owned(),
            created_at: time::OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn valid_input() -> PostInput {
        PostInput {
            title: "A title".to_owned(),
            content: "Body".to_owned(),
            excerpt: String::new(),
            category: "Technology".to_owned(),
            tags: "rust, web".to_owned(),
            image_url: String::new(),
        }
    }

    #[test]
    fn new_posts_default_the_image_and_publish() {
        let params = build_new_post(&author(), valid_input()).unwrap();
        assert_eq!(params.image_url.as_deref(), Some(posts::DEFAULT_UPLOAD_IMAGE));
        assert!(params.published);
        assert_eq!(params.tags, vec!["rust", "web"]);
        assert_eq!(params.excerpt, None);
    }

    #[test]
    fn updates_keep_the_stored_image_when_blank() {
        let params = build_post_update(Uuid::new_v4(), valid_input()).unwrap();
        assert_eq!(params.image_url, None);

        let mut with_image = valid_input();
        with_image.image_url = " /uploads/new.png ".to_owned();
        let params = build_post_update(Uuid::new_v4(), with_image).unwrap();
        assert_eq!(params.image_url.as_deref(), Some("/uploads/new.png"));
    }

    #[test]
    fn rejects_missing_title_content_and_unknown_category() {
        let mut input = valid_input();
        input.title = "  ".to_owned();
        assert!(build_new_post(&author(), input).is_err());

        let mut input = valid_input();
        input.content = String::new();
        assert!(build_new_post(&author(), input).is_err());

        let mut input = valid_input();
        input.category = "technology".to_owned();
        let err = build_new_post(&author(), input).unwrap_err();
        assert!(matches!(err, DomainError::UnknownCategory { .. }));
    }
}
