//! Article Model
//!
//! The catalog's domain resource and its creation payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One published article.
///
/// `id` is assigned by the remote store on creation and stable thereafter.
/// Articles are never updated or deleted through this engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Stable identifier, unique across the store
    pub id: u64,
    pub title: String,
    pub description: String,
    /// Ordered category labels, at least one
    pub categories: Vec<String>,
    pub published_at: DateTime<Utc>,
    pub cover_image_url: String,
    /// Free text; paragraphs are separated by a blank line
    pub content: String,
}

impl Article {
    /// Splits `content` into paragraphs on the blank-line convention.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.content
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Payload for creating an article; the store assigns the `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDraft {
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub published_at: DateTime<Utc>,
    pub cover_image_url: String,
    pub content: String,
}

impl ArticleDraft {
    /// Validates the draft before it is sent to the store.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.title.trim().is_empty() {
            return Some("Title cannot be empty".to_string());
        }
        if self.categories.is_empty() {
            return Some("At least one category is required".to_string());
        }
        if self.categories.iter().any(|c| c.trim().is_empty()) {
            return Some("Category labels cannot be empty".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_draft() -> ArticleDraft {
        ArticleDraft {
            title: "Ownership in Practice".to_string(),
            description: "Borrowing without tears".to_string(),
            categories: vec!["rust".to_string(), "tutorial".to_string()],
            published_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            cover_image_url: "https://example.com/cover.png".to_string(),
            content: "First paragraph.\n\nSecond paragraph.".to_string(),
        }
    }

    #[test]
    fn test_article_wire_names_are_camel_case() {
        let article = Article {
            id: 7,
            title: "t".to_string(),
            description: "d".to_string(),
            categories: vec!["rust".to_string()],
            published_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            cover_image_url: "u".to_string(),
            content: "c".to_string(),
        };
        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains("\"publishedAt\""));
        assert!(json.contains("\"coverImageUrl\""));
        assert!(json.contains("\"categories\""));
    }

    #[test]
    fn test_article_deserialize() {
        let json = r#"{
            "id": 7,
            "title": "t",
            "description": "d",
            "categories": ["rust"],
            "publishedAt": "2024-03-01T12:00:00Z",
            "coverImageUrl": "u",
            "content": "c"
        }"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.id, 7);
        assert_eq!(article.categories, vec!["rust"]);
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let mut article: Article = serde_json::from_value(serde_json::json!({
            "id": 1,
            "title": "t",
            "description": "d",
            "categories": ["rust"],
            "publishedAt": "2024-03-01T12:00:00Z",
            "coverImageUrl": "u",
            "content": "One.\n\nTwo.\n\n\n\nThree."
        }))
        .unwrap();
        assert_eq!(article.paragraphs().collect::<Vec<_>>(), vec!["One.", "Two.", "Three."]);

        article.content = "Single paragraph only.".to_string();
        assert_eq!(article.paragraphs().count(), 1);
    }

    #[test]
    fn test_validate_valid_draft() {
        assert!(sample_draft().validate().is_none());
    }

    #[test]
    fn test_validate_empty_title() {
        let mut draft = sample_draft();
        draft.title = "   ".to_string();
        assert!(draft.validate().is_some());
    }

    #[test]
    fn test_validate_requires_category() {
        let mut draft = sample_draft();
        draft.categories.clear();
        assert!(draft.validate().is_some());

        draft.categories = vec!["".to_string()];
        assert!(draft.validate().is_some());
    }
}
