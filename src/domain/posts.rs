//! Presentation rules for posts: excerpt derivation, image fallbacks,
//! tag normalization, date formatting.

use time::{Date, format_description::FormatItem, macros::format_description};

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");

/// Number of characters of body text used when a post carries no excerpt.
pub const EXCERPT_LENGTH: usize = 150;

pub const DEFAULT_CARD_IMAGE: &str =
    "https://images.unsplash.com/photo-1451187580459-43490279c0fa?w=800&q=90";
pub const DEFAULT_DETAIL_IMAGE: &str =
    "https://images.unsplash.com/photo-1451187580459-43490279c0fa?w=1920&q=80";
pub const DEFAULT_UPLOAD_IMAGE: &str = "/static/images/default-blog.svg";

/// Stored excerpt when present and non-empty, otherwise the leading
/// `EXCERPT_LENGTH` characters of the body followed by an ellipsis.
pub fn display_excerpt(excerpt: Option<&str>, content: &str) -> String {
    match excerpt {
        Some(stored) if !stored.is_empty() => stored.to_owned(),
        _ => {
            let mut derived: String = content.chars().take(EXCERPT_LENGTH).collect();
            derived.push_str("...");
            derived
        }
    }
}

pub fn card_image_url(stored: Option<&str>) -> &str {
    match stored {
        Some(url) if !url.is_empty() => url,
        _ => DEFAULT_CARD_IMAGE,
    }
}

pub fn detail_image_url(stored: Option<&str>) -> &str {
    match stored {
        Some(url) if !url.is_empty() => url,
        _ => DEFAULT_DETAIL_IMAGE,
    }
}

/// Splits a comma-separated tag list, trimming whitespace and dropping
/// empty segments.
pub fn normalize_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect()
}

pub fn format_human_date(date: Date) -> String {
    date.format(HUMAN_DATE_FORMAT).expect("valid calendar date")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_excerpt_prefers_stored_text() {
        let excerpt = display_excerpt(Some("A short teaser."), "ignored body");
        assert_eq!(excerpt, "A short teaser.");
    }

    #[test]
    fn display_excerpt_derives_from_content_when_missing() {
        let body = "word ".repeat(60);
        let derived = display_excerpt(None, &body);
        assert_eq!(derived.chars().count(), EXCERPT_LENGTH + 3);
        assert!(derived.ends_with("..."));
    }

    #[test]
    fn display_excerpt_treats_empty_stored_value_as_missing() {
        let derived = display_excerpt(Some(""), "body text");
        assert_eq!(derived, "body text...");
    }

    #[test]
    fn display_excerpt_counts_characters_not_bytes() {
        let body = "é".repeat(200);
        let derived = display_excerpt(None, &body);
        assert_eq!(derived.chars().count(), EXCERPT_LENGTH + 3);
    }

    #[test]
    fn image_fallbacks_apply_to_missing_and_empty() {
        assert_eq!(card_image_url(None), DEFAULT_CARD_IMAGE);
        assert_eq!(card_image_url(Some("")), DEFAULT_CARD_IMAGE);
        assert_eq!(card_image_url(Some("/uploads/a.png")), "/uploads/a.png");
        assert_eq!(detail_image_url(None), DEFAULT_DETAIL_IMAGE);
    }

    #[test]
    fn normalize_tags_trims_and_drops_empties() {
        assert_eq!(
            normalize_tags(" rust, web ,, tooling ,"),
            vec!["rust", "web", "tooling"]
        );
        assert!(normalize_tags("").is_empty());
        assert!(normalize_tags(" , ,").is_empty());
    }
}
