//! Category pages and the per-category stats aggregation behind them.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::warn;

use crate::application::repos::{PostsRepo, RepoError};
use crate::application::snapshot::{CATEGORY_STATS_KEY, SnapshotStore};
use crate::domain::entities::PostRecord;
use crate::domain::stats::{CategoryStats, StatsSnapshot};
use crate::domain::types::Category;

/// Posts fetched per category page. The same fetch feeds the stats, so
/// `total_posts`/`total_views` describe this window, not the whole table.
pub const CATEGORY_PAGE_LIMIT: i64 = 12;

#[derive(Clone)]
pub struct CategoryService {
    posts: Arc<dyn PostsRepo>,
    snapshots: Arc<dyn SnapshotStore>,
}

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("unknown category `{name}`")]
    InvalidCategory { name: String },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CategoryPage {
    pub category: Category,
    pub posts: Vec<PostRecord>,
    pub stats: CategoryStats,
}

impl CategoryService {
    pub fn new(posts: Arc<dyn PostsRepo>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self { posts, snapshots }
    }

    /// Loads the newest published posts for a category and recomputes its
    /// stats from that same fetch, merging them into the persisted stats
    /// snapshot. Unknown names fail before any store or snapshot access.
    pub async fn page(&self, name: &str) -> Result<CategoryPage, CategoryError> {
        let Ok(category) = name.parse::<Category>() else {
            return Err(CategoryError::InvalidCategory {
                name: name.to_owned(),
            });
        };

        let posts = self
            .posts
            .recent_published(Some(category), CATEGORY_PAGE_LIMIT, 0)
            .await?;
        let stats = CategoryStats::compute(&posts);
        self.persist_stats(category, &stats).await;

        Ok(CategoryPage {
            category,
            posts,
            stats,
        })
    }

    /// Stats for one category, recomputed from live data. Shares its fetch
    /// and persistence behavior with `page`.
    pub async fn get_stats(&self, name: &str) -> Result<CategoryStats, CategoryError> {
        Ok(self.page(name).await?.stats)
    }

    /// Overwrites one category's entry in the stats snapshot, leaving every
    /// other key as it was on disk.
    async fn persist_stats(&self, category: Category, stats: &CategoryStats) {
        let mut snapshot = self.read_snapshot().await;
        snapshot.insert(category.as_str().to_owned(), stats.clone());
        match serde_json::to_value(&snapshot) {
            Ok(value) => self.snapshots.write(CATEGORY_STATS_KEY, &value).await,
            Err(err) => {
                warn!(
                    target = "voce::application::category",
                    op = "category::persist_stats",
                    key = CATEGORY_STATS_KEY,
                    category = %category,
                    error = %err,
                    "Could not serialize category stats for the snapshot"
                );
            }
        }
    }

    async fn read_snapshot(&self) -> StatsSnapshot {
        let Some(value) = self.snapshots.read(CATEGORY_STATS_KEY).await else {
            return StatsSnapshot::default();
        };
        match serde_json::from_value(value) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                counter!("voce_snapshot_corrupt_total", "key" => CATEGORY_STATS_KEY).increment(1);
                warn!(
                    target = "voce::application::category",
                    op = "category::read_snapshot",
                    key = CATEGORY_STATS_KEY,
                    error = %err,
                    "Category stats snapshot is malformed; starting from empty"
                );
                StatsSnapshot::default()
            }
        }
    }
}
