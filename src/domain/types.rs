//! Shared domain enumerations aligned with persisted database enums.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Editorial category (mirrors Postgres enum `post_category`).
///
/// The taxonomy is fixed; routes and snapshots refer to categories by their
/// capitalized display names, so serde keeps the variant names verbatim.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "post_category", rename_all = "snake_case")]
pub enum Category {
    Technology,
    Politics,
    Lifestyle,
    Art,
    Science,
    Business,
    Health,
    Education,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Technology,
        Category::Politics,
        Category::Lifestyle,
        Category::Art,
        Category::Science,
        Category::Business,
        Category::Health,
        Category::Education,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Technology => "Technology",
            Self::Politics => "Politics",
            Self::Lifestyle => "Lifestyle",
            Self::Art => "Art",
            Self::Science => "Science",
            Self::Business => "Business",
            Self::Health => "Health",
            Self::Education => "Education",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    // Exact match on the capitalized display name; `technology` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Technology" => Ok(Self::Technology),
            "Politics" => Ok(Self::Politics),
            "Lifestyle" => Ok(Self::Lifestyle),
            "Art" => Ok(Self::Art),
            "Science" => Ok(Self::Science),
            "Business" => Ok(Self::Business),
            "Health" => Ok(Self::Health),
            "Education" => Ok(Self::Education),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_display_names_only() {
        assert_eq!("Technology".parse::<Category>(), Ok(Category::Technology));
        assert_eq!("Education".parse::<Category>(), Ok(Category::Education));
        assert!("technology".parse::<Category>().is_err());
        assert!("TECHNOLOGY".parse::<Category>().is_err());
        assert!("Sports".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn serde_uses_display_names() {
        let json = serde_json::to_string(&Category::Lifestyle).unwrap();
        assert_eq!(json, "\"Lifestyle\"");
        let parsed: Category = serde_json::from_str("\"Science\"").unwrap();
        assert_eq!(parsed, Category::Science);
    }

    #[test]
    fn all_covers_every_display_name_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }
}
