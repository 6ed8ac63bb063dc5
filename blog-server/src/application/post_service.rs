use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use crate::data::post_repository::{PostRepository, SLUG_TAKEN};
use crate::domain::error::DomainError;
use crate::domain::pagination::{Page, PageInfo, Pagination};
use crate::domain::post::{
    Author, EXCERPT_MAX_CHARS, GENERATED_EXCERPT_CHARS, NewPost, Post, PostFilter,
    normalize_labels, slugify, truncate_excerpt,
};
use crate::infrastructure::sanitize::{plain_text, sanitize_html};

#[derive(Debug, Clone, Default)]
pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub published: Option<bool>,
    pub featured_image: Option<String>,
    pub author: Option<Author>,
}

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Post, DomainError> {
        self.repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::post_not_found(slug))
    }

    /// Newest first. Drafts only show up for the admin dashboard.
    pub async fn list(
        &self,
        pagination: Pagination,
        include_drafts: bool,
    ) -> Result<Page<Post>, DomainError> {
        let filter = if include_drafts {
            PostFilter::everything()
        } else {
            PostFilter::published()
        };
        let (posts, total) = self.repo.list(&filter, pagination).await?;
        Ok(Page {
            posts,
            pagination: PageInfo::new(pagination, total),
        })
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: CreatePostInput) -> Result<Post, DomainError> {
        let (title, content) = validate_fields(&input.title, &input.content)?;

        let slug = slugify(title);
        if slug.is_empty() {
            return Err(DomainError::validation(
                "title must contain at least one letter or digit",
            ));
        }

        let excerpt = match input.excerpt.as_deref().map(str::trim) {
            Some(excerpt) if !excerpt.is_empty() => {
                if excerpt.chars().count() > EXCERPT_MAX_CHARS {
                    return Err(DomainError::validation(format!(
                        "excerpt must be at most {EXCERPT_MAX_CHARS} characters"
                    )));
                }
                Some(excerpt.to_string())
            }
            _ => Some(truncate_excerpt(&plain_text(&content), GENERATED_EXCERPT_CHARS))
                .filter(|e| !e.is_empty()),
        };

        let featured_image = match input.featured_image.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                if !is_safe_image_url(url) {
                    return Err(DomainError::validation("featured image must be an http(s) or site-relative URL"));
                }
                Some(url.to_string())
            }
            _ => None,
        };

        if self.repo.find_by_slug(&slug).await?.is_some() {
            return Err(DomainError::Conflict(SLUG_TAKEN.into()));
        }

        let post = Post::new(
            slug,
            NewPost {
                title: title.to_string(),
                content,
                excerpt,
                author: input.author,
                categories: normalize_labels(input.categories),
                tags: normalize_labels(input.tags),
                published: input.published.unwrap_or(true),
                featured_image,
            },
        );
        self.repo.create(post).await
    }

    /// The slug stays fixed even when the title changes.
    #[instrument(skip(self, title, content))]
    pub async fn update(&self, slug: &str, title: &str, content: &str) -> Result<Post, DomainError> {
        let (title, content) = validate_fields(title, content)?;
        self.repo
            .update_content(slug, title, &content, Utc::now())
            .await?
            .ok_or_else(|| DomainError::post_not_found(slug))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, slug: &str) -> Result<(), DomainError> {
        if !self.repo.delete(slug).await? {
            return Err(DomainError::post_not_found(slug));
        }
        info!(slug = %slug, "post removed");
        Ok(())
    }
}

/// Returns the trimmed title and the sanitized content.
fn validate_fields<'a>(title: &'a str, content: &str) -> Result<(&'a str, String), DomainError> {
    let title = title.trim();
    if title.is_empty() || content.trim().is_empty() {
        return Err(DomainError::validation("title and content are required"));
    }
    let content = sanitize_html(content);
    if content.trim().is_empty() {
        return Err(DomainError::validation("content is empty after sanitization"));
    }
    Ok((title, content))
}

fn is_safe_image_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    (url.starts_with('/') && !url.starts_with("//"))
        || lower.starts_with("https://")
        || lower.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::InMemoryPostRepository;
    use chrono::Duration;
    use uuid::Uuid;

    fn service() -> (PostService, Arc<InMemoryPostRepository>) {
        let repo = Arc::new(InMemoryPostRepository::default());
        (PostService::new(repo.clone()), repo)
    }

    fn input(title: &str, content: &str) -> CreatePostInput {
        CreatePostInput {
            title: title.into(),
            content: content.into(),
            ..CreatePostInput::default()
        }
    }

    #[tokio::test]
    async fn create_then_get_by_slug() {
        let (posts, _) = service();
        let created = posts
            .create(input("Hello, Rust World!", "<p>First post</p>"))
            .await
            .unwrap();
        assert_eq!(created.slug, "hello-rust-world");

        let fetched = posts.get_by_slug("hello-rust-world").await.unwrap();
        assert_eq!(fetched.title, "Hello, Rust World!");
        assert_eq!(fetched.content, "<p>First post</p>");
        assert_eq!(fetched.excerpt.as_deref(), Some("First post"));
        assert_eq!(fetched.author, "Admin");
        assert!(fetched.published);
    }

    #[tokio::test]
    async fn colliding_slug_conflicts() {
        let (posts, _) = service();
        posts.create(input("Hello World", "a")).await.unwrap();
        let err = posts.create(input("hello -- world!", "b")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let (posts, _) = service();
        for (title, content) in [("", "x"), ("  ", "x"), ("T", ""), ("T", " \n ")] {
            let err = posts.create(input(title, content)).await.unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{title:?}/{content:?}");
        }
        let err = posts.create(input("???", "x")).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn content_is_sanitized_on_every_write() {
        let (posts, _) = service();
        let created = posts
            .create(input("Xss", r#"<p onclick="x()">hi</p><script>alert(1)</script>"#))
            .await
            .unwrap();
        assert_eq!(created.content, "<p>hi</p>");

        let updated = posts
            .update("xss", "Xss", r#"<a href="javascript:alert(1)">x</a>"#)
            .await
            .unwrap();
        assert!(!updated.content.contains("javascript:"));

        let err = posts
            .create(input("Only script", "<script>alert(1)</script>"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn excerpt_limits() {
        let (posts, _) = service();
        let mut long = input("Long excerpt", "body");
        long.excerpt = Some("x".repeat(301));
        assert!(matches!(
            posts.create(long).await.unwrap_err(),
            DomainError::Validation(_)
        ));

        let generated = posts
            .create(input("Generated", &format!("<p>{}</p>", "lorem ipsum ".repeat(40))))
            .await
            .unwrap();
        let excerpt = generated.excerpt.unwrap();
        assert!(excerpt.chars().count() <= GENERATED_EXCERPT_CHARS + 3);
        assert!(excerpt.starts_with("lorem ipsum"));
    }

    #[tokio::test]
    async fn featured_image_must_be_safe() {
        let (posts, _) = service();
        let mut bad = input("Pic", "body");
        bad.featured_image = Some("javascript:alert(1)".into());
        assert!(matches!(
            posts.create(bad).await.unwrap_err(),
            DomainError::Validation(_)
        ));

        let mut ok = input("Pic", "body");
        ok.featured_image = Some("/uploads/1-cat.png".into());
        ok.categories = vec!["Tech".into(), "Tech".into()];
        let post = posts.create(ok).await.unwrap();
        assert_eq!(post.featured_image.as_deref(), Some("/uploads/1-cat.png"));
        assert_eq!(post.categories, vec!["Tech"]);
    }

    #[tokio::test]
    async fn update_keeps_slug_and_refreshes_timestamp() {
        let (posts, _) = service();
        let created = posts.create(input("Original", "v1")).await.unwrap();

        let updated = posts
            .update("original", "Completely New Title", "<p>v2</p>")
            .await
            .unwrap();
        assert_eq!(updated.slug, "original");
        assert_eq!(updated.title, "Completely New Title");
        assert_eq!(updated.content, "<p>v2</p>");
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);

        assert!(posts.get_by_slug("completely-new-title").await.is_err());
    }

    #[tokio::test]
    async fn update_errors() {
        let (posts, _) = service();
        assert!(matches!(
            posts.update("missing", "T", "c").await.unwrap_err(),
            DomainError::NotFound(_)
        ));
        posts.create(input("Here", "c")).await.unwrap();
        assert!(matches!(
            posts.update("here", "", "c").await.unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (posts, _) = service();
        posts.create(input("Doomed", "bye")).await.unwrap();
        posts.delete("doomed").await.unwrap();

        assert!(matches!(
            posts.get_by_slug("doomed").await.unwrap_err(),
            DomainError::NotFound(_)
        ));
        assert!(matches!(
            posts.delete("doomed").await.unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn list_paginates_newest_first() {
        let (posts, repo) = service();
        let base = Utc::now();
        for i in 0..12 {
            let mut post = Post::new(
                format!("post-{i}"),
                NewPost {
                    title: format!("Post {i}"),
                    content: "c".into(),
                    excerpt: None,
                    author: None,
                    categories: vec![],
                    tags: vec![],
                    published: true,
                    featured_image: None,
                },
            );
            post.id = Uuid::new_v4();
            post.created_at = base + Duration::minutes(i);
            repo.create(post).await.unwrap();
        }

        let page = posts.list(Pagination::new(2, 5), false).await.unwrap();
        let slugs: Vec<_> = page.posts.iter().map(|p| p.slug.as_str()).collect();
        // ranks 6-10 newest first are post-6 .. post-2
        assert_eq!(slugs, vec!["post-6", "post-5", "post-4", "post-3", "post-2"]);
        assert_eq!(page.pagination.total, 12);
        assert_eq!(page.pagination.pages, 3);
        assert_eq!(page.pagination.page, 2);
    }

    #[tokio::test]
    async fn public_list_hides_drafts() {
        let (posts, _) = service();
        let mut draft = input("Draft", "wip");
        draft.published = Some(false);
        posts.create(draft).await.unwrap();
        posts.create(input("Live", "out")).await.unwrap();

        let public = posts.list(Pagination::default(), false).await.unwrap();
        assert_eq!(public.pagination.total, 1);
        let admin = posts.list(Pagination::default(), true).await.unwrap();
        assert_eq!(admin.pagination.total, 2);
    }
}
