//! Featured feed projection and its snapshot wire form.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{entities::PostRecord, posts, types::Category};

/// Maximum number of entries in the featured feed.
pub const FEATURED_LIMIT: i64 = 6;

/// A resolved featured entry. Always built from a live post, so `id` is a
/// real post identifier; seeded snapshot files with synthetic ids never
/// reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedEntry {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub category: Category,
    pub views: i64,
    pub image_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub tags: Vec<String>,
}

impl FeaturedEntry {
    pub fn from_post(post: &PostRecord) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            excerpt: posts::display_excerpt(post.excerpt.as_deref(), &post.content),
            author: post.author_name.clone(),
            category: post.category,
            views: post.views,
            image_url: posts::card_image_url(post.image_url.as_deref()).to_owned(),
            created_at: post.created_at,
            tags: post.tags.clone(),
        }
    }
}

/// Stored form of a featured entry as read back from the snapshot.
///
/// Only the fields reconciliation consumes are captured: entries are matched
/// against live posts by title, and every other field is replaced with live
/// values. `id` stays a plain string because seeded snapshots carry synthetic
/// ids that do not parse as UUIDs; those never survive reconciliation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SnapshotEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn sample_post() -> PostRecord {
        PostRecord {
            id: Uuid::new_v4(),
            title: "Edge caching in practice".to_owned(),
            content: "c".repeat(400),
            excerpt: None,
            author_id: Uuid::new_v4(),
            author_name: "maria".to_owned(),
            category: Category::Technology,
            tags: vec!["caching".to_owned(), "web".to_owned()],
            image_url: None,
            views: 42,
            published: true,
            created_at: datetime!(2024-01-05 12:00 UTC),
            updated_at: datetime!(2024-01-06 09:30 UTC),
        }
    }

    #[test]
    fn from_post_applies_excerpt_and_image_defaults() {
        let entry = FeaturedEntry::from_post(&sample_post());
        assert_eq!(entry.excerpt.chars().count(), posts::EXCERPT_LENGTH + 3);
        assert_eq!(entry.image_url, posts::DEFAULT_CARD_IMAGE);
        assert_eq!(entry.views, 42);
        assert_eq!(entry.tags, vec!["caching", "web"]);
    }

    #[test]
    fn serializes_with_camel_case_keys_and_rfc3339_dates() {
        let entry = FeaturedEntry::from_post(&sample_post());
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("imageUrl").is_some());
        assert_eq!(
            json.get("createdAt").and_then(|v| v.as_str()),
            Some("2024-01-05T12:00:00Z")
        );
        assert_eq!(
            json.get("category").and_then(|v| v.as_str()),
            Some("Technology")
        );
    }

    #[test]
    fn snapshot_entries_tolerate_synthetic_ids_and_extra_fields() {
        let raw = r#"[
            {"id": "1", "title": "Seeded", "category": "Nonsense", "views": "many"},
            {"title": "No id at all"}
        ]"#;
        let entries: Vec<SnapshotEntry> = serde_json::from_str(raw).unwrap();
        assert_eq!(entries[0].id, "1");
        assert_eq!(entries[0].title, "Seeded");
        assert_eq!(entries[1].id, "");
        assert_eq!(entries[1].title, "No id at all");
    }
}
