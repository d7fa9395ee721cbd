//! Featured feed reconciliation between live post data and the snapshot.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::repos::{PostsRepo, RepoError};
use crate::application::snapshot::{FEATURED_KEY, SnapshotStore};
use crate::domain::featured::{FEATURED_LIMIT, FeaturedEntry, SnapshotEntry};

#[derive(Clone)]
pub struct FeaturedService {
    posts: Arc<dyn PostsRepo>,
    snapshots: Arc<dyn SnapshotStore>,
}

#[derive(Debug, Error)]
pub enum FeaturedError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl FeaturedService {
    pub fn new(posts: Arc<dyn PostsRepo>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self { posts, snapshots }
    }

    /// The featured feed: the top `FEATURED_LIMIT` published posts by view
    /// count, straight from the store when it has any, otherwise snapshot
    /// entries re-matched by title against live posts.
    ///
    /// The result is persisted back to the snapshot unless it is empty, so a
    /// transient outage never erases the last good feed. The raw snapshot is
    /// never returned as-is: entries that cannot be matched to a live post
    /// are dropped, and matched entries carry the live post's fields,
    /// including its id.
    pub async fn get_featured(&self) -> Result<Vec<FeaturedEntry>, FeaturedError> {
        let live = match self.posts.top_viewed_published(FEATURED_LIMIT).await {
            Ok(posts) => posts,
            Err(err) => {
                warn!(
                    target = "voce::application::featured",
                    op = "featured::top_viewed",
                    error = %err,
                    "Store unavailable for featured feed; reconciling from snapshot"
                );
                Vec::new()
            }
        };

        let entries = if live.is_empty() {
            counter!("voce_featured_fallback_total").increment(1);
            self.reconcile_from_snapshot().await?
        } else {
            counter!("voce_featured_live_total").increment(1);
            live.iter().map(FeaturedEntry::from_post).collect()
        };

        if !entries.is_empty() {
            self.persist(&entries).await;
        }

        Ok(entries)
    }

    /// Matches each stored entry against a live published post by title.
    /// Matches are rebuilt entirely from the live record; misses are dropped.
    async fn reconcile_from_snapshot(&self) -> Result<Vec<FeaturedEntry>, FeaturedError> {
        let stale = self.read_snapshot().await;
        let mut reconciled = Vec::with_capacity(stale.len());
        for entry in &stale {
            match self.posts.find_published_by_title(&entry.title).await? {
                Some(post) => reconciled.push(FeaturedEntry::from_post(&post)),
                None => {
                    debug!(
                        target = "voce::application::featured",
                        title = %entry.title,
                        snapshot_id = %entry.id,
                        "Dropping snapshot entry with no live counterpart"
                    );
                }
            }
        }
        Ok(reconciled)
    }

    async fn read_snapshot(&self) -> Vec<SnapshotEntry> {
        let Some(value) = self.snapshots.read(FEATURED_KEY).await else {
            return Vec::new();
        };
        match serde_json::from_value(value) {
            Ok(entries) => entries,
            Err(err) => {
                counter!("voce_snapshot_corrupt_total", "key" => FEATURED_KEY).increment(1);
                warn!(
                    target = "voce::application::featured",
                    op = "featured::read_snapshot",
                    key = FEATURED_KEY,
                    error = %err,
                    "Featured snapshot is malformed; treating as empty"
                );
                Vec::new()
            }
        }
    }

    async fn persist(&self, entries: &[FeaturedEntry]) {
        match serde_json::to_value(entries) {
            Ok(value) => self.snapshots.write(FEATURED_KEY, &value).await,
            Err(err) => {
                warn!(
                    target = "voce::application::featured",
                    op = "featured::persist",
                    key = FEATURED_KEY,
                    error = %err,
                    "Could not serialize featured entries for the snapshot"
                );
            }
        }
    }
}
