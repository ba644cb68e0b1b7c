//! Post model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use super::FrontMatter;

/// Category shown when a post does not declare one
pub const DEFAULT_CATEGORY: &str = "Tech";

/// A blog post backed by a markdown file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Slug (file name without extension)
    pub id: String,

    /// Post title
    pub title: String,

    /// Publication date as written in the front-matter
    pub date: String,

    /// Parsed publication date, when the front-matter date is readable
    #[serde(skip)]
    pub published_at: Option<NaiveDateTime>,

    pub category: String,

    pub description: Option<String>,

    /// Cover image
    pub image: Option<String>,

    /// Rendered HTML content (only populated for single-post reads)
    pub content_html: Option<String>,

    /// Full source file path
    #[serde(skip)]
    pub source: PathBuf,

    /// Custom front-matter fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Post {
    /// Build the post metadata from its slug, source path and front-matter
    pub fn from_front_matter(id: String, source: PathBuf, fm: FrontMatter) -> Self {
        let published_at = fm.parse_date();
        Self {
            title: fm.title.unwrap_or_else(|| id.clone()),
            date: fm.date.unwrap_or_default(),
            published_at,
            category: fm
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            description: fm.description,
            image: fm.image,
            content_html: None,
            source,
            extra: fm.extra,
            id,
        }
    }

    /// URL path of the post page
    pub fn path(&self) -> String {
        format!("/blog/{}", self.id)
    }
}

/// Sort posts newest first; undated posts go last, ties by slug
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| b.date.cmp(&a.date))
            .then_with(|| a.id.cmp(&b.id))
    });
}
