use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::debugging::DebuggingRecorder;
use time::OffsetDateTime;
use uuid::Uuid;

use voce::application::featured::FeaturedService;
use voce::application::repos::{PostsRepo, RepoError, SiteTotals};
use voce::application::snapshot::SnapshotStore;
use voce::domain::entities::PostRecord;
use voce::domain::types::Category;
use voce::infra::snapshot::FileSnapshotStore;

struct FixedPosts {
    top: Vec<PostRecord>,
}

#[async_trait]
impl PostsRepo for FixedPosts {
    async fn top_viewed_published(&self, _limit: i64) -> Result<Vec<PostRecord>, RepoError> {
        Ok(self.top.clone())
    }

    async fn recent_published(
        &self,
        _category: Option<Category>,
        _limit: i64,
        _offset: i64,
    ) -> Result<Vec<PostRecord>, RepoError> {
        Ok(Vec::new())
    }

    async fn count_published(&self, _category: Option<Category>) -> Result<u64, RepoError> {
        Ok(0)
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

fn post(title: &str) -> PostRecord {
    PostRecord {
        id: Uuid::new_v4(),
        title: title.to_owned(),
        content: "Body".to_owned(),
        excerpt: None,
        author_id: Uuid::new_v4(),
        author_name: "maria".to_owned(),
        category: Category::Technology,
        tags: Vec::new(),
        image_url: None,
        views: 12,
        published: true,
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

#[tokio::test]
async fn featured_and_snapshot_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let dir = tempfile::tempdir().unwrap();
    // A corrupt document on disk exercises the corrupt-read path first.
    std::fs::write(dir.path().join("featured.json"), b"{oops").unwrap();
    let store: Arc<dyn SnapshotStore> =
        Arc::new(FileSnapshotStore::new(dir.path().to_path_buf()).unwrap());

    // Fallback path: store has nothing live, snapshot is unreadable.
    let empty = FeaturedService::new(Arc::new(FixedPosts { top: Vec::new() }), store.clone());
    assert!(empty.get_featured().await.unwrap().is_empty());

    // Live path: entries come from the store and are persisted back.
    let live = FeaturedService::new(
        Arc::new(FixedPosts {
            top: vec![post("Hit")],
        }),
        store.clone(),
    );
    assert_eq!(live.get_featured().await.unwrap().len(), 1);

    // A clean read of the persisted document.
    assert!(store.read("featured").await.is_some());

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "voce_featured_live_total",
        "voce_featured_fallback_total",
        "voce_snapshot_read_total",
        "voce_snapshot_write_total",
        "voce_snapshot_corrupt_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
