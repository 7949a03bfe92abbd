//! Categories and tags
//!
//! Both are small labelled records used to organize the catalog. Every task
//! belongs to exactly one category and may carry any number of tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, TagId};

pub const LABEL_MIN_LEN: usize = 3;
pub const LABEL_MAX_LEN: usize = 64;

/// Lowercase URL-friendly form of a title
///
/// Runs of characters outside `[A-Za-z0-9-]` collapse into a single `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_gap = false;

    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            slug.push(c.to_ascii_lowercase());
            in_gap = false;
        } else if !in_gap {
            slug.push('-');
            in_gap = true;
        }
    }

    slug
}

/// Returns true if a category or tag title has an acceptable length
pub fn is_valid_label(title: &str) -> bool {
    let len = title.trim().chars().count();
    (LABEL_MIN_LEN..=LABEL_MAX_LEN).contains(&len)
}

/// A category that groups tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into().trim().to_string();
        let now = Utc::now();
        Self {
            id: CategoryId::new(&title, now),
            slug: slugify(&title),
            title,
            created_at: now,
            updated_at: now,
        }
    }

    /// Renames the category and regenerates the slug
    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into().trim().to_string();
        self.slug = slugify(&self.title);
        self.updated_at = Utc::now();
    }
}

/// A free-form label attached to tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub title: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(title: impl Into<String>) -> Self {
        let title = title.into().trim().to_string();
        let now = Utc::now();
        Self {
            id: TagId::new(&title, now),
            slug: slugify(&title),
            title,
            created_at: now,
            updated_at: now,
        }
    }

    /// Renames the tag and regenerates the slug
    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into().trim().to_string();
        self.slug = slugify(&self.title);
        self.updated_at = Utc::now();
    }

    /// Case-insensitive title match
    pub fn matches_title(&self, title: &str) -> bool {
        self.title.eq_ignore_ascii_case(title.trim())
    }
}
