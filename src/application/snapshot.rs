//! Advisory snapshot cache consumed by the featured and category services.

use async_trait::async_trait;
use serde_json::Value;

/// Key under which the featured feed is persisted.
pub const FEATURED_KEY: &str = "featured";

/// Key under which the per-category stats mapping is persisted.
pub const CATEGORY_STATS_KEY: &str = "category-stats";

/// Best-effort JSON blob store keyed by logical name.
///
/// The cache is advisory, never authoritative: implementations log their own
/// I/O failures, callers observe a failed read as absent and a failed write
/// as a no-op. Concurrent writers race with last-write-wins semantics, which
/// is accepted for a single-process deployment.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn read(&self, key: &str) -> Option<Value>;

    async fn write(&self, key: &str, value: &Value);
}
