//! Per-category statistics and the tag ranking rules behind them.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::entities::PostRecord;

/// Number of tags reported per category.
pub const TOP_TAGS_LIMIT: usize = 5;

/// Aggregated statistics for a single category.
///
/// `total_posts` and `total_views` cover the same limited fetch that feeds
/// the category page, so they reflect the displayed window rather than the
/// whole table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    #[serde(default)]
    pub total_posts: u64,
    #[serde(default)]
    pub total_views: u64,
    #[serde(default)]
    pub top_tags: Vec<String>,
}

/// Persisted mapping from category display name to its stats. Keys stay
/// plain strings so entries for names this build does not know about pass
/// through a rewrite untouched.
pub type StatsSnapshot = BTreeMap<String, CategoryStats>;

impl CategoryStats {
    pub fn compute(posts: &[PostRecord]) -> Self {
        let total_views = posts.iter().map(|post| post.views.max(0) as u64).sum();
        let top_tags = rank_tags(
            posts
                .iter()
                .flat_map(|post| post.tags.iter().map(String::as_str)),
        );
        Self {
            total_posts: posts.len() as u64,
            total_views,
            top_tags,
        }
    }
}

/// Ranks tags by descending frequency, keeping at most `TOP_TAGS_LIMIT`.
/// Ties preserve the order in which tags first appeared in the input.
pub fn rank_tags<'a, I>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut first_seen: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for tag in tags {
        counts
            .entry(tag)
            .and_modify(|count| *count += 1)
            .or_insert_with(|| {
                first_seen.push(tag);
                1
            });
    }

    // Stable sort keeps first-seen order for equal frequencies.
    first_seen.sort_by_key(|tag| Reverse(counts.get(tag).copied().unwrap_or(0)));
    first_seen
        .into_iter()
        .take(TOP_TAGS_LIMIT)
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;
    use uuid::Uuid;

    use crate::domain::types::Category;

    use super::*;

    fn post_with(views: i64, tags: &[&str]) -> PostRecord {
        PostRecord {
            id: Uuid::new_v4(),
            title: "t".to_owned(),
            content: "c".to_owned(),
            excerpt: None,
            author_id: Uuid::new_v4(),
            author_name: "a".to_owned(),
            category: Category::Technology,
            tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
            image_url: None,
            views,
            published: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn compute_sums_views_and_counts_posts() {
        let posts = vec![post_with(10, &["ai", "ml"]), post_with(5, &["ai"])];
        let stats = CategoryStats::compute(&posts);
        assert_eq!(stats.total_posts, 2);
        assert_eq!(stats.total_views, 15);
        assert_eq!(stats.top_tags, vec!["ai", "ml"]);
    }

    #[test]
    fn rank_tags_orders_by_frequency_then_first_seen() {
        let ranked = rank_tags(vec!["b", "a", "a", "c", "b", "d"]);
        // a and b both occur twice; b appeared first.
        assert_eq!(ranked, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn rank_tags_caps_at_limit() {
        let ranked = rank_tags(vec!["one", "two", "three", "four", "five", "six"]);
        assert_eq!(ranked.len(), TOP_TAGS_LIMIT);
        assert_eq!(ranked, vec!["one", "two", "three", "four", "five"]);
    }

    #[test]
    fn compute_handles_empty_fetch() {
        let stats = CategoryStats::compute(&[]);
        assert_eq!(stats, CategoryStats::default());
    }

    #[test]
    fn snapshot_round_trips_unknown_keys() {
        let raw = r#"{
            "Technology": {"totalPosts": 3, "totalViews": 120, "topTags": ["ai"]},
            "Retrofuturism": {"totalPosts": 1, "totalViews": 9, "topTags": []}
        }"#;
        let snapshot: StatsSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains_key("Retrofuturism"));
        let back = serde_json::to_string(&snapshot).unwrap();
        assert!(back.contains("Retrofuturism"));
    }
}
