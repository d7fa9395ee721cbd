use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use voce::application::category::{CategoryError, CategoryService};
use voce::application::repos::{PostsRepo, RepoError, SiteTotals};
use voce::application::snapshot::{CATEGORY_STATS_KEY, SnapshotStore};
use voce::domain::entities::PostRecord;
use voce::domain::stats::TOP_TAGS_LIMIT;
use voce::domain::types::Category;

struct ScriptedPosts {
    page: Vec<PostRecord>,
    fail: bool,
    recent_calls: Mutex<Vec<(Option<Category>, i64, i64)>>,
}

impl ScriptedPosts {
    fn with_page(page: Vec<PostRecord>) -> Self {
        Self {
            page,
            fail: false,
            recent_calls: Mutex::new(Vec::new()),
        }
    }

    fn unavailable() -> Self {
        Self {
            page: Vec::new(),
            fail: true,
            recent_calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PostsRepo for ScriptedPosts {
    async fn top_viewed_published(&self, _limit: i64) -> Result<Vec<PostRecord>, RepoError> {
        Ok(Vec::new())
    }

    async fn recent_published(
        &self,
        category: Option<Category>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        self.recent_calls.lock().await.push((category, limit, offset));
        if self.fail {
            return Err(RepoError::Timeout);
        }
        Ok(self.page.clone())
    }

    async fn count_published(&self, _category: Option<Category>) -> Result<u64, RepoError> {
        Ok(self.page.len() as u64)
    }

    async fn find_by_id(&self, _id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        Ok(None)
    }

    async fn find_published_by_title(&self, _title: &str) -> Result<Option<PostRecord>, RepoError> {
        Ok(None)
    }

    async fn related_published(
        &self,
        _category: Category,
        _exclude: Uuid,
        _limit: i64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        Ok(Vec::new())
    }

    async fn search_published(
        &self,
        _query: &str,
        _limit: i64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        Ok(Vec::new())
    }

    async fn site_totals(&self) -> Result<SiteTotals, RepoError> {
        Ok(SiteTotals {
            total_posts: 0,
            total_views: 0,
            category_counts: Vec::new(),
        })
    }
}

#[derive(Default)]
struct CountingSnapshots {
    entries: Mutex<HashMap<String, Value>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingSnapshots {
    async fn seed(&self, key: &str, value: Value) {
        self.entries.lock().await.insert(key.to_owned(), value);
    }

    async fn dump(&self, key: &str) -> Option<Value> {
        self.entries.lock().await.get(key).cloned()
    }
}

#[async_trait]
impl SnapshotStore for CountingSnapshots {
    async fn read(&self, key: &str) -> Option<Value> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().await.get(key).cloned()
    }

    async fn write(&self, key: &str, value: &Value) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .await
            .insert(key.to_owned(), value.clone());
    }
}

fn science_post(views: i64, tags: &[&str]) -> PostRecord {
    PostRecord {
        id: Uuid::new_v4(),
        title: "Observations".to_owned(),
        content: "Body".to_owned(),
        excerpt: None,
        author_id: Uuid::new_v4(),
        author_name: "nadia".to_owned(),
        category: Category::Science,
        tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
        image_url: None,
        views,
        published: true,
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

#[tokio::test]
async fn page_computes_stats_from_the_display_fetch() {
    let posts = Arc::new(ScriptedPosts::with_page(vec![
        science_post(30, &["space", "physics"]),
        science_post(12, &["space"]),
    ]));
    let snapshots = Arc::new(CountingSnapshots::default());

    let service = CategoryService::new(posts.clone(), snapshots.clone());
    let page = service.page("Science").await.unwrap();

    assert_eq!(page.category, Category::Science);
    assert_eq!(page.stats.total_posts, 2);
    assert_eq!(page.stats.total_views, 42);
    assert_eq!(page.stats.top_tags, vec!["space", "physics"]);

    // One fetch serves both the page and the stats.
    let calls = posts.recent_calls.lock().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], (Some(Category::Science), 12, 0));
}

#[tokio::test]
async fn persisting_stats_overwrites_only_the_fetched_category() {
    let posts = Arc::new(ScriptedPosts::with_page(vec![science_post(5, &["space"])]));
    let snapshots = Arc::new(CountingSnapshots::default());
    snapshots
        .seed(
            CATEGORY_STATS_KEY,
            json!({
                "Art": {"totalPosts": 4, "totalViews": 90, "topTags": ["paint"]},
                "Mystery": {"totalPosts": 1, "totalViews": 3, "topTags": []}
            }),
        )
        .await;

    let service = CategoryService::new(posts, snapshots.clone());
    service.page("Science").await.unwrap();

    let written = snapshots.dump(CATEGORY_STATS_KEY).await.unwrap();
    assert_eq!(written["Science"]["totalPosts"], 1);
    assert_eq!(written["Science"]["totalViews"], 5);
    // Entries for other categories survive the rewrite, even ones this
    // build has no variant for.
    assert_eq!(written["Art"]["totalViews"], 90);
    assert_eq!(written["Mystery"]["totalPosts"], 1);
}

#[tokio::test]
async fn unknown_category_fails_before_any_store_or_snapshot_access() {
    let posts = Arc::new(ScriptedPosts::with_page(Vec::new()));
    let snapshots = Arc::new(CountingSnapshots::default());

    let service = CategoryService::new(posts.clone(), snapshots.clone());
    let err = service.page("Cooking").await.unwrap_err();

    assert!(matches!(
        err,
        CategoryError::InvalidCategory { ref name } if name == "Cooking"
    ));
    assert!(posts.recent_calls.lock().await.is_empty());
    assert_eq!(snapshots.reads.load(Ordering::SeqCst), 0);
    assert_eq!(snapshots.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_stats_snapshot_starts_from_empty() {
    let posts = Arc::new(ScriptedPosts::with_page(vec![science_post(7, &[])]));
    let snapshots = Arc::new(CountingSnapshots::default());
    snapshots.seed(CATEGORY_STATS_KEY, json!([1, 2, 3])).await;

    let service = CategoryService::new(posts, snapshots.clone());
    service.page("Science").await.unwrap();

    let written = snapshots.dump(CATEGORY_STATS_KEY).await.unwrap();
    let map = written.as_object().unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(written["Science"]["totalViews"], 7);
}

#[tokio::test]
async fn store_failures_propagate_to_the_caller() {
    let posts = Arc::new(ScriptedPosts::unavailable());
    let snapshots = Arc::new(CountingSnapshots::default());

    let service = CategoryService::new(posts, snapshots.clone());
    let err = service.page("Science").await.unwrap_err();

    assert!(matches!(err, CategoryError::Repo(RepoError::Timeout)));
    assert_eq!(snapshots.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn top_tags_cap_at_the_ranking_limit() {
    let posts = Arc::new(ScriptedPosts::with_page(vec![science_post(
        1,
        &["a", "b", "c", "d", "e", "f", "g"],
    )]));
    let snapshots = Arc::new(CountingSnapshots::default());

    let service = CategoryService::new(posts, snapshots);
    let stats = service.get_stats("Science").await.unwrap();

    assert_eq!(stats.top_tags.len(), TOP_TAGS_LIMIT);
    assert_eq!(stats.top_tags, vec!["a", "b", "c", "d", "e"]);
}
