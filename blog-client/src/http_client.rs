use crate::error::BlogClientError;
use crate::{NewPost, Post, PostPage, SearchQuery, UploadedFile, User};
use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

pub const AUTH_COOKIE: &str = "auth-token";

const TOKEN_FILE: &str = ".blog_token";

#[derive(Clone)]
pub struct BlogClient {
    client: Client,
    base_url: String,
    token_path: PathBuf,
    token: Option<String>,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct PostEnvelope {
    post: Post,
}

#[derive(Deserialize)]
struct MessageEnvelope {
    message: String,
}

impl BlogClient {
    /// Connects to `endpoint`, picking up a session saved by an earlier login.
    pub async fn connect(endpoint: &str) -> Result<Self, BlogClientError> {
        Self::with_token_file(endpoint, TOKEN_FILE).await
    }

    pub async fn with_token_file(
        endpoint: &str,
        token_path: impl AsRef<Path>,
    ) -> Result<Self, BlogClientError> {
        let token_path = token_path.as_ref().to_path_buf();
        let token = match tokio::fs::read_to_string(&token_path).await {
            Ok(t) if !t.trim().is_empty() => Some(t.trim().to_string()),
            Ok(_) => None,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            client: Client::builder().build()?,
            base_url: endpoint.trim_end_matches('/').to_string(),
            token_path,
            token,
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    async fn set_token(&mut self, token: String) -> Result<(), BlogClientError> {
        tokio::fs::write(&self.token_path, &token).await?;
        self.token = Some(token);
        Ok(())
    }

    async fn clear_token(&mut self) -> Result<(), BlogClientError> {
        self.token = None;
        match tokio::fs::remove_file(&self.token_path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn with_session(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.header(COOKIE, format!("{AUTH_COOKIE}={token}")),
            None => req,
        }
    }

    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, BlogClientError> {
        let resp = self
            .client
            .post(self.url("/auth/register"))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "name": name,
            }))
            .send()
            .await?;

        let body: UserEnvelope = parse(resp).await?;
        Ok(body.user)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, BlogClientError> {
        let resp = self
            .client
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(BlogClientError::from_http_response(resp).await);
        }
        let token = session_token(resp.headers()).ok_or_else(|| BlogClientError::Server {
            status: resp.status().as_u16(),
            message: "login response carried no session cookie".into(),
        })?;
        let body: UserEnvelope = resp.json().await?;
        self.set_token(token).await?;
        Ok(body.user)
    }

    /// Ends the server session and forgets the stored token.
    pub async fn logout(&mut self) -> Result<(), BlogClientError> {
        let resp = self
            .with_session(self.client.post(self.url("/auth/logout")))
            .send()
            .await?;
        let _: MessageEnvelope = parse(resp).await?;
        self.clear_token().await
    }

    pub async fn me(&self) -> Result<User, BlogClientError> {
        let resp = self
            .with_session(self.client.get(self.url("/auth/me")))
            .send()
            .await?;
        let body: UserEnvelope = parse(resp).await?;
        Ok(body.user)
    }

    pub async fn list_posts(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<PostPage, BlogClientError> {
        let resp = self
            .client
            .get(self.url("/posts"))
            .query(&page_query(page, limit))
            .send()
            .await?;
        parse(resp).await
    }

    /// Every post including drafts. Admin only.
    pub async fn admin_posts(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<PostPage, BlogClientError> {
        let resp = self
            .with_session(self.client.get(self.url("/admin/posts")))
            .query(&page_query(page, limit))
            .send()
            .await?;
        parse(resp).await
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<PostPage, BlogClientError> {
        let resp = self
            .client
            .get(self.url("/posts/search"))
            .query(query)
            .send()
            .await?;
        parse(resp).await
    }

    pub async fn get_post(&self, slug: &str) -> Result<Post, BlogClientError> {
        let resp = self
            .client
            .get(self.url(&format!("/posts/{slug}")))
            .send()
            .await?;
        let body: PostEnvelope = parse(resp).await?;
        Ok(body.post)
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<Post, BlogClientError> {
        let resp = self
            .with_session(self.client.post(self.url("/posts")))
            .json(post)
            .send()
            .await?;
        let body: PostEnvelope = parse(resp).await?;
        Ok(body.post)
    }

    pub async fn update_post(
        &self,
        slug: &str,
        title: &str,
        content: &str,
    ) -> Result<Post, BlogClientError> {
        let resp = self
            .with_session(self.client.put(self.url(&format!("/posts/{slug}"))))
            .json(&serde_json::json!({
                "title": title,
                "content": content,
            }))
            .send()
            .await?;
        let body: PostEnvelope = parse(resp).await?;
        Ok(body.post)
    }

    pub async fn delete_post(&self, slug: &str) -> Result<(), BlogClientError> {
        let resp = self
            .with_session(self.client.delete(self.url(&format!("/posts/{slug}"))))
            .send()
            .await?;
        let _: MessageEnvelope = parse(resp).await?;
        Ok(())
    }

    /// Uploads an image from disk and returns its public URL.
    pub async fn upload(&self, path: impl AsRef<Path>) -> Result<UploadedFile, BlogClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(image_mime(path))?;

        let resp = self
            .with_session(self.client.post(self.url("/upload")))
            .multipart(Form::new().part("file", part))
            .send()
            .await?;
        parse(resp).await
    }
}

async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, BlogClientError> {
    if resp.status().is_success() {
        Ok(resp.json().await?)
    } else {
        Err(BlogClientError::from_http_response(resp).await)
    }
}

fn page_query(page: Option<u32>, limit: Option<u32>) -> Vec<(&'static str, u32)> {
    let mut query = Vec::new();
    if let Some(page) = page {
        query.push(("page", page));
    }
    if let Some(limit) = limit {
        query.push(("limit", limit));
    }
    query
}

/// Pulls the session token out of the `Set-Cookie` headers of a login response.
fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookie| {
            let pair = cookie.split(';').next()?.trim();
            let (name, value) = pair.split_once('=')?;
            (name == AUTH_COOKIE && !value.is_empty()).then(|| value.to_string())
        })
}

fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
