use crate::data::{map_read_error, map_write_error};
use crate::domain::error::DomainError;
use crate::domain::pagination::Pagination;
use crate::domain::post::{Post, PostFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

pub const SLUG_TAKEN: &str = "a post with this title already exists";

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Fails with `Conflict` when the slug is already stored.
    async fn create(&self, post: Post) -> Result<Post, DomainError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, DomainError>;
    async fn update_content(
        &self,
        slug: &str,
        title: &str,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, DomainError>;
    /// Returns `false` when nothing was deleted.
    async fn delete(&self, slug: &str) -> Result<bool, DomainError>;
    /// Newest first, plus the total number of matches.
    async fn list(
        &self,
        filter: &PostFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Post>, u64), DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str = "id, title, slug, content, excerpt, author, author_id, categories, \
     tags, published, featured_image, created_at, updated_at";

// $1 published only, $2 ILIKE pattern, $3 category, $4 tag
const FILTER_CLAUSE: &str = r#"
    WHERE (NOT $1 OR published)
      AND ($2::TEXT IS NULL
           OR title ILIKE $2
           OR content ILIKE $2
           OR COALESCE(excerpt, '') ILIKE $2)
      AND ($3::TEXT IS NULL OR $3 = ANY(categories))
      AND ($4::TEXT IS NULL OR $4 = ANY(tags))
"#;

/// `%`, `_` and `\` in user input match literally.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, title, slug, content, excerpt, author, author_id,
                               categories, tags, published, featured_image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.author)
        .bind(post.author_id)
        .bind(&post.categories)
        .bind(&post.tags)
        .bind(post.published)
        .bind(&post.featured_image)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, SLUG_TAKEN))?;

        info!(post_id = %post.id, slug = %post.slug, "post created");
        Ok(post)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, DomainError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE slug = $1");
        sqlx::query_as::<_, Post>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_read_error)
    }

    async fn update_content(
        &self,
        slug: &str,
        title: &str,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, DomainError> {
        let sql = format!(
            "UPDATE posts SET title = $1, content = $2, updated_at = $3 \
             WHERE slug = $4 RETURNING {POST_COLUMNS}"
        );
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(title)
            .bind(content)
            .bind(updated_at)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, SLUG_TAKEN))?;

        if post.is_some() {
            info!(slug = %slug, "post updated");
        }
        Ok(post)
    }

    async fn delete(&self, slug: &str) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(map_read_error)?;

        let removed = deleted.rows_affected() > 0;
        if removed {
            info!(slug = %slug, "post deleted");
        }
        Ok(removed)
    }

    async fn list(
        &self,
        filter: &PostFilter,
        pagination: Pagination,
    ) -> Result<(Vec<Post>, u64), DomainError> {
        let pattern = filter.query.as_deref().map(like_pattern);

        let count_sql = format!("SELECT COUNT(*) FROM posts {FILTER_CLAUSE}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(filter.published_only)
            .bind(&pattern)
            .bind(&filter.category)
            .bind(&filter.tag)
            .fetch_one(&self.pool)
            .await
            .map_err(map_read_error)?;

        let select_sql = format!(
            "SELECT {POST_COLUMNS} FROM posts {FILTER_CLAUSE} \
             ORDER BY created_at DESC, id DESC LIMIT $5 OFFSET $6"
        );
        let posts = sqlx::query_as::<_, Post>(&select_sql)
            .bind(filter.published_only)
            .bind(&pattern)
            .bind(&filter.category)
            .bind(&filter.tag)
            .bind(i64::from(pagination.limit))
            .bind(pagination.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_read_error)?;

        Ok((posts, total.max(0) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("react"), "%react%");
        assert_eq!(like_pattern("100%_done\\"), "%100\\%\\_done\\\\%");
    }
}
