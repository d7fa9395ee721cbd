//! Full-text-ish search over published posts.

use std::sync::Arc;

use thiserror::Error;

use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::entities::PostRecord;

const SEARCH_LIMIT: i64 = 10;

#[derive(Clone)]
pub struct SearchService {
    posts: Arc<dyn PostsRepo>,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl SearchService {
    pub fn new(posts: Arc<dyn PostsRepo>) -> Self {
        Self { posts }
    }

    /// Case-insensitive substring match over title, content, and tags of
    /// published posts. An empty query matches everything, capped at the
    /// search limit.
    pub async fn search(&self, query: &str) -> Result<Vec<PostRecord>, SearchError> {
        Ok(self.posts.search_published(query, SEARCH_LIMIT).await?)
    }
}
