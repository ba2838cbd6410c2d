//! Content Item Model
//!
//! Uploaded course material and the search/filter predicate used by the
//! content panel.

use serde::{Deserialize, Serialize};

/// A piece of course material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: i64,
    pub title: String,
    #[serde(rename = "class")]
    pub class_code: String,
    /// syllabus, document, video or image
    #[serde(rename = "type")]
    pub content_type: String,
    /// Human-readable size, e.g. `2.3 MB`
    pub size: String,
    /// `YYYY-MM-DD`
    pub upload_date: String,
    pub views: u32,
    /// Average completion percentage
    pub progress: u8,
}

/// Search and filter criteria for content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFilter {
    /// Case-insensitive match on title or class code
    #[serde(default)]
    pub search: Option<String>,
    /// Exact content type, `all` or absent for any
    #[serde(default, rename = "type")]
    pub content_type: Option<String>,
    /// Exact class code, `all` or absent for any
    #[serde(default, rename = "class")]
    pub class_code: Option<String>,
}

impl ContentFilter {
    pub fn matches(&self, item: &ContentItem) -> bool {
        let matches_search = self.search.as_deref().map_or(true, |term| {
            let term = term.to_lowercase();
            item.title.to_lowercase().contains(&term)
                || item.class_code.to_lowercase().contains(&term)
        });

        matches_search
            && matches_exact(self.content_type.as_deref(), &item.content_type)
            && matches_exact(self.class_code.as_deref(), &item.class_code)
    }

    pub fn apply<'a>(&self, items: &'a [ContentItem]) -> Vec<&'a ContentItem> {
        items.iter().filter(|item| self.matches(item)).collect()
    }
}

fn matches_exact(wanted: Option<&str>, actual: &str) -> bool {
    match wanted {
        None | Some("all") => true,
        Some(value) => value == actual,
    }
}

#[allow(clippy::too_many_arguments)]
fn item(
    id: i64,
    title: &str,
    class_code: &str,
    content_type: &str,
    size: &str,
    upload_date: &str,
    views: u32,
    progress: u8,
) -> ContentItem {
    ContentItem {
        id,
        title: title.to_string(),
        class_code: class_code.to_string(),
        content_type: content_type.to_string(),
        size: size.to_string(),
        upload_date: upload_date.to_string(),
        views,
        progress,
    }
}

/// Content shipped with the dashboard
pub fn default_content() -> Vec<ContentItem> {
    vec![
        item(1, "Course Syllabus - Fall 2024", "CS101", "syllabus", "2.3 MB", "2024-01-15", 156, 85),
        item(2, "Chapter 1: Introduction to Programming", "CS101", "document", "1.8 MB", "2024-01-18", 89, 92),
        item(3, "Data Structures Overview Video", "DS201", "video", "45.2 MB", "2024-01-20", 67, 78),
        item(4, "Algorithm Complexity Diagram", "ALG301", "image", "0.8 MB", "2024-01-22", 34, 65),
        item(5, "Assignment Guidelines", "CS101", "document", "1.2 MB", "2024-01-24", 123, 88),
    ]
}
