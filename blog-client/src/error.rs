use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlogClientError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl BlogClientError {
    pub async fn from_http_response(resp: reqwest::Response) -> Self {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Self::from_status(status, &body)
    }

    /// Maps a non-success status and its `{"error": ...}` body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| body.trim().to_string());
        match status {
            StatusCode::NOT_FOUND => BlogClientError::NotFound(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                BlogClientError::Unauthorized(message)
            }
            StatusCode::CONFLICT => BlogClientError::Conflict(message),
            s if s.is_client_error() => BlogClientError::InvalidRequest(message),
            s => BlogClientError::Server {
                status: s.as_u16(),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_status_and_error_body() {
        let err = BlogClientError::from_status(StatusCode::CONFLICT, r#"{"error":"user already exists"}"#);
        assert!(matches!(err, BlogClientError::Conflict(ref m) if m == "user already exists"));

        let err = BlogClientError::from_status(StatusCode::BAD_REQUEST, "plain text");
        assert!(matches!(err, BlogClientError::InvalidRequest(ref m) if m == "plain text"));

        let err = BlogClientError::from_status(StatusCode::BAD_GATEWAY, "");
        assert!(matches!(err, BlogClientError::Server { status: 502, .. }));
    }
}
