//! Filesystem-backed snapshot persistence.

use std::path::PathBuf;

use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};

use crate::application::snapshot::SnapshotStore;

/// Snapshot store writing one JSON document per key under a root directory.
///
/// Reads never fail the caller: a missing file, an unreadable file, or a
/// payload that is not valid JSON all surface as `None` and the caller
/// proceeds with its empty default. Writes replace the whole document via a
/// temporary file and rename so readers never observe a partial payload.
#[derive(Debug)]
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    /// Initialise a store rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn read(&self, key: &str) -> Option<Value> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(key, "no snapshot file present");
                counter!("voce_snapshot_read_total", "key" => key.to_owned(), "outcome" => "miss")
                    .increment(1);
                return None;
            }
            Err(err) => {
                warn!(key, error = %err, "failed to read snapshot file");
                counter!("voce_snapshot_read_total", "key" => key.to_owned(), "outcome" => "error")
                    .increment(1);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                counter!("voce_snapshot_read_total", "key" => key.to_owned(), "outcome" => "hit")
                    .increment(1);
                Some(value)
            }
            Err(err) => {
                warn!(key, error = %err, "snapshot file is not valid JSON, treating as empty");
                counter!("voce_snapshot_read_total", "key" => key.to_owned(), "outcome" => "corrupt")
                    .increment(1);
                counter!("voce_snapshot_corrupt_total", "key" => key.to_owned()).increment(1);
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &Value) {
        let payload = match serde_json::to_vec_pretty(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(key, error = %err, "failed to serialise snapshot payload");
                counter!("voce_snapshot_write_total", "key" => key.to_owned(), "outcome" => "error")
                    .increment(1);
                return;
            }
        };

        let path = self.path_for(key);
        let staging = self.root.join(format!("{key}.json.tmp"));

        if let Err(err) = fs::write(&staging, &payload).await {
            warn!(key, error = %err, "failed to stage snapshot file");
            counter!("voce_snapshot_write_total", "key" => key.to_owned(), "outcome" => "error")
                .increment(1);
            return;
        }

        if let Err(err) = fs::rename(&staging, &path).await {
            warn!(key, error = %err, "failed to replace snapshot file");
            let _ = fs::remove_file(&staging).await;
            counter!("voce_snapshot_write_total", "key" => key.to_owned(), "outcome" => "error")
                .increment(1);
            return;
        }

        counter!("voce_snapshot_write_total", "key" => key.to_owned(), "outcome" => "ok")
            .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn round_trips_a_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().to_path_buf()).unwrap();

        store.write("featured", &json!([{"title": "Hello"}])).await;
        let value = store.read("featured").await.unwrap();

        assert_eq!(value, json!([{"title": "Hello"}]));
    }

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().to_path_buf()).unwrap();

        assert!(store.read("featured").await.is_none());
    }

    #[tokio::test]
    async fn invalid_json_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("featured.json"), b"{not json").unwrap();

        assert!(store.read("featured").await.is_none());
    }

    #[tokio::test]
    async fn write_replaces_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().to_path_buf()).unwrap();

        store.write("category-stats", &json!({"Technology": {"totalPosts": 1}})).await;
        store.write("category-stats", &json!({"Art": {"totalPosts": 2}})).await;

        let value = store.read("category-stats").await.unwrap();
        assert_eq!(value, json!({"Art": {"totalPosts": 2}}));
    }
}
