//! In-memory repositories backing the service and handler tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::data::post_repository::{PostRepository, SLUG_TAKEN};
use crate::data::user_repository::{EMAIL_TAKEN, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::pagination::Pagination;
use crate::domain::post::{Post, PostFilter};
use crate::domain::user::User;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(DomainError::Conflict(EMAIL_TAKEN.into()));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: Mutex<Vec<Post>>,
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        if posts.iter().any(|p| p.slug == post.slug) {
            return Err(DomainError::Conflict(SLUG_TAKEN.into()));
        }
        posts.push(post.clone());
        Ok(post)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, DomainError> {
        let posts = self.posts.lock().unwrap();
        Ok(posts.iter().find(|p| p.slug == slug).cloned())
    }

    async fn update_content(
        &self,
        slug: &str,
        title: &str,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        Ok(posts.iter_mut().find(|p| p.slug == slug).map(|post| {
            post.title = title.to_string();
            post.content = content.to_string();
            post.updated_at = updated_at;
            post.clone()
        }))
    }

    async fn delete(&self, slug: &str) -> Result<bool, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| p.slug != slug);
        Ok(posts.len() != before)
    }

    async fn list(
        &self,
        filter: &PostFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Post>, u64), DomainError> {
        let posts = self.posts.lock().unwrap();
        let mut matches: Vec<Post> = posts.iter().filter(|p| filter.matches(p)).cloned().collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matches.len() as u64;
        let page = matches
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit as usize)
            .collect();
        Ok((page, total))
    }
}
