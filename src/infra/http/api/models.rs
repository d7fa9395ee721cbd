//! Wire models for the public JSON endpoints.

use serde::Serialize;
use uuid::Uuid;

use crate::application::repos::SiteTotals;
use crate::domain::entities::PostRecord;
use crate::domain::posts;

/// One search result card. Display fallbacks for the excerpt and image
/// are applied server side so the client renders fields verbatim.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: Uuid,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub category: &'static str,
    pub views: i64,
    pub image_url: String,
}

impl SearchHit {
    pub fn from_record(post: &PostRecord) -> Self {
        Self {
            id: post.id,
            title: post.title.clone(),
            excerpt: posts::display_excerpt(post.excerpt.as_deref(), &post.content),
            author: post.author_name.clone(),
            category: post.category.as_str(),
            views: post.views,
            image_url: posts::card_image_url(post.image_url.as_deref()).to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCountBody {
    pub category: &'static str,
    pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_posts: u64,
    pub total_views: u64,
    pub category_counts: Vec<CategoryCountBody>,
}

impl StatsResponse {
    pub fn from_totals(totals: SiteTotals) -> Self {
        Self {
            total_posts: totals.total_posts,
            total_views: totals.total_views,
            category_counts: totals
                .category_counts
                .into_iter()
                .map(|entry| CategoryCountBody {
                    category: entry.category.as_str(),
                    count: entry.count,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::CategoryCount;
    use crate::domain::types::Category;
    use time::OffsetDateTime;

    fn record(title: &str, content: &str) -> PostRecord {
        PostRecord {
            id: Uuid::new_v4(),
            title: title.to_owned(),
            content: content.to_owned(),
            excerpt: None,
            author_id: Uuid::new_v4(),
            author_name: "nadia".to_owned(),
            category: Category::Science,
            tags: Vec::new(),
            image_url: None,
            views: 7,
            published: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn search_hit_serializes_camel_case_with_fallbacks() {
        let hit = SearchHit::from_record(&record("Hello", "body text"));
        let json = serde_json::to_value(&hit).unwrap();

        assert_eq!(json["title"], "Hello");
        assert_eq!(json["excerpt"], "body text");
        assert_eq!(json["category"], "Science");
        assert!(json["imageUrl"].as_str().unwrap().contains("unsplash"));
        assert!(json.get("image_url").is_none());
    }

    #[test]
    fn stats_response_carries_per_category_counts() {
        let body = StatsResponse::from_totals(SiteTotals {
            total_posts: 12,
            total_views: 340,
            category_counts: vec![CategoryCount {
                category: Category::Art,
                count: 5,
            }],
        });
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["totalPosts"], 12);
        assert_eq!(json["totalViews"], 340);
        assert_eq!(json["categoryCounts"][0]["category"], "Art");
        assert_eq!(json["categoryCounts"][0]["count"], 5);
    }
}
