use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_AUTHOR: &str = "Admin";
pub const EXCERPT_MAX_CHARS: usize = 300;
pub const GENERATED_EXCERPT_CHARS: usize = 150;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub author: String,
    pub author_id: Option<Uuid>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub featured_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new post. Content is already sanitized.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub author: Option<Author>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub featured_image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
}

impl Post {
    pub fn new(slug: String, draft: NewPost) -> Self {
        let now = Utc::now();
        let (author, author_id) = match draft.author {
            Some(author) => (author.name, Some(author.id)),
            None => (DEFAULT_AUTHOR.to_string(), None),
        };
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            slug,
            content: draft.content,
            excerpt: draft.excerpt,
            author,
            author_id,
            categories: draft.categories,
            tags: draft.tags,
            published: draft.published,
            featured_image: draft.featured_image,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lower-cases `title` and collapses every run of non-alphanumeric
/// characters into a single hyphen, trimming hyphens at both ends.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Trims labels, drops empty ones and removes duplicates keeping first
/// occurrence order.
pub fn normalize_labels(labels: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let label = label.trim();
        if !label.is_empty() && !out.iter().any(|l| l == label) {
            out.push(label.to_string());
        }
    }
    out
}

/// Cuts plain text to at most `max_chars` characters, preferring a word
/// boundary, and marks the cut with an ellipsis.
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= max_chars {
        return text;
    }

    let cut: String = text.chars().take(max_chars).collect();
    let cut = match cut.rfind(' ') {
        Some(idx) if idx > max_chars / 2 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}...", cut.trim_end())
}

/// Predicate over posts shared by listing and search.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub published_only: bool,
    pub query: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

impl PostFilter {
    pub fn published() -> Self {
        Self {
            published_only: true,
            ..Self::default()
        }
    }

    pub fn everything() -> Self {
        Self::default()
    }

    pub fn matches(&self, post: &Post) -> bool {
        if self.published_only && !post.published {
            return false;
        }
        if let Some(query) = &self.query {
            let needle = query.to_lowercase();
            let hit = post.title.to_lowercase().contains(&needle)
                || post.content.to_lowercase().contains(&needle)
                || post
                    .excerpt
                    .as_deref()
                    .is_some_and(|e| e.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !post.categories.iter().any(|c| c == category) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !post.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        true
    }
}
