use std::sync::Arc;

use tracing::instrument;

use crate::data::post_repository::PostRepository;
use crate::domain::error::DomainError;
use crate::domain::pagination::{Page, PageInfo, Pagination};
use crate::domain::post::{Post, PostFilter};

/// Search criteria. Blank strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub pagination: Pagination,
}

impl SearchParams {
    fn into_filter(self) -> (PostFilter, Pagination) {
        let present = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let filter = PostFilter {
            published_only: true,
            query: present(self.q),
            category: present(self.category),
            tag: present(self.tag),
        };
        (filter, self.pagination)
    }
}

/// Substring search over published posts; no ranking.
#[derive(Clone)]
pub struct SearchService {
    repo: Arc<dyn PostRepository>,
}

impl SearchService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self))]
    pub async fn search(&self, params: SearchParams) -> Result<Page<Post>, DomainError> {
        let (filter, pagination) = params.into_filter();
        let (posts, total) = self.repo.list(&filter, pagination).await?;
        Ok(Page {
            posts,
            pagination: PageInfo::new(pagination, total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::post_service::{CreatePostInput, PostService};
    use crate::data::memory::InMemoryPostRepository;
    use crate::domain::post::NewPost;
    use chrono::{Duration, Utc};

    async fn seeded() -> SearchService {
        let repo = Arc::new(InMemoryPostRepository::default());
        let posts = PostService::new(repo.clone());
        let seed = [
            ("Learning REACT hooks", "<p>state</p>", None, vec!["Tech"], vec!["js"], true),
            ("Gardening", "<p>tomatoes</p>", Some("why I left react"), vec!["Life"], vec![], true),
            ("Rust ownership", "<p>we use React-like props</p>", None, vec!["tech"], vec!["rust"], true),
            ("Plain", "<p>nothing here</p>", None, vec!["Tech"], vec!["rust"], true),
            ("React draft", "<p>unfinished</p>", None, vec!["Tech"], vec![], false),
        ];
        for (title, content, excerpt, categories, tags, published) in seed {
            posts
                .create(CreatePostInput {
                    title: title.into(),
                    content: content.into(),
                    excerpt: excerpt.map(Into::into),
                    categories: categories.into_iter().map(Into::into).collect(),
                    tags: tags.into_iter().map(Into::into).collect(),
                    published: Some(published),
                    ..CreatePostInput::default()
                })
                .await
                .unwrap();
        }
        SearchService::new(repo)
    }

    fn titles(page: &Page<Post>) -> Vec<String> {
        let mut titles: Vec<_> = page.posts.iter().map(|p| p.title.clone()).collect();
        titles.sort();
        titles
    }

    #[tokio::test]
    async fn query_matches_title_content_or_excerpt_case_insensitively() {
        let search = seeded().await;
        let page = search
            .search(SearchParams {
                q: Some("react".into()),
                ..SearchParams::default()
            })
            .await
            .unwrap();
        assert_eq!(
            titles(&page),
            vec!["Gardening", "Learning REACT hooks", "Rust ownership"]
        );
        assert_eq!(page.pagination.total, 3);
    }

    #[tokio::test]
    async fn category_is_exact_membership() {
        let search = seeded().await;
        let page = search
            .search(SearchParams {
                category: Some("Tech".into()),
                ..SearchParams::default()
            })
            .await
            .unwrap();
        assert_eq!(titles(&page), vec!["Learning REACT hooks", "Plain"]);
    }

    #[tokio::test]
    async fn filters_combine() {
        let search = seeded().await;
        let page = search
            .search(SearchParams {
                q: Some("REACT".into()),
                tag: Some("rust".into()),
                ..SearchParams::default()
            })
            .await
            .unwrap();
        assert_eq!(titles(&page), vec!["Rust ownership"]);
    }

    #[tokio::test]
    async fn results_are_paginated_newest_first() {
        let repo = Arc::new(InMemoryPostRepository::default());
        let base = Utc::now();
        for i in 0..7 {
            let mut post = Post::new(
                format!("rust-{i}"),
                NewPost {
                    title: format!("Rust {i}"),
                    content: "<p>borrowck</p>".into(),
                    excerpt: None,
                    author: None,
                    categories: vec!["Tech".into()],
                    tags: vec![],
                    // every third post is a draft: 0, 3, 6
                    published: i % 3 != 0,
                    featured_image: None,
                },
            );
            post.created_at = base + Duration::minutes(i);
            repo.create(post).await.unwrap();
        }
        let search = SearchService::new(repo);

        let page = search
            .search(SearchParams {
                q: Some("BORROW".into()),
                category: Some("Tech".into()),
                pagination: Pagination::new(2, 3),
                ..SearchParams::default()
            })
            .await
            .unwrap();
        let slugs: Vec<_> = page.posts.iter().map(|p| p.slug.as_str()).collect();
        // published newest first: 5, 4, 2, 1
        assert_eq!(slugs, vec!["rust-1"]);
        assert_eq!(page.pagination.total, 4);
        assert_eq!(page.pagination.pages, 2);

        let first = search
            .search(SearchParams {
                pagination: Pagination::new(1, 3),
                ..SearchParams::default()
            })
            .await
            .unwrap();
        let slugs: Vec<_> = first.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["rust-5", "rust-4", "rust-2"]);
    }

    #[tokio::test]
    async fn blank_criteria_return_all_published() {
        let search = seeded().await;
        let page = search
            .search(SearchParams {
                q: Some("   ".into()),
                category: Some(String::new()),
                ..SearchParams::default()
            })
            .await
            .unwrap();
        assert_eq!(page.pagination.total, 4);
        assert!(page.posts.iter().all(|p| p.published));
    }
}
