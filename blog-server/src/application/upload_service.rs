use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

use crate::domain::error::DomainError;
use crate::infrastructure::config::UploadConfig;
use crate::infrastructure::security::Claims;

/// Accepted image types and the extension each is stored under.
pub const ALLOWED_CONTENT_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

/// A file received from the client, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoredFile {
    pub url: String,
    pub filename: String,
}

#[derive(Clone)]
pub struct UploadService {
    config: UploadConfig,
    last_stamp: Arc<AtomicI64>,
}

impl UploadService {
    pub fn new(config: UploadConfig) -> Self {
        Self {
            config,
            last_stamp: Arc::new(AtomicI64::new(0)),
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.config.max_bytes
    }

    #[instrument(skip_all)]
    pub async fn store(
        &self,
        requester: Option<&Claims>,
        file: Option<UploadedFile>,
    ) -> Result<StoredFile, DomainError> {
        if !requester.is_some_and(Claims::is_admin) {
            return Err(DomainError::Unauthorized);
        }
        let file = file
            .filter(|f| !f.bytes.is_empty())
            .ok_or_else(|| DomainError::validation("no file uploaded"))?;

        let content_type = file.content_type.as_deref().unwrap_or_default();
        let extension = ALLOWED_CONTENT_TYPES
            .iter()
            .find(|(allowed, _)| *allowed == content_type)
            .map(|(_, ext)| *ext)
            .ok_or_else(|| {
                DomainError::validation(format!("unsupported file type '{content_type}'"))
            })?;
        if file.bytes.len() > self.config.max_bytes {
            return Err(DomainError::validation(format!(
                "file exceeds {} bytes",
                self.config.max_bytes
            )));
        }

        let filename = format!(
            "{}-{}.{extension}",
            self.next_stamp(),
            file_stem(&safe_file_name(&file.filename))
        );
        let path: PathBuf = self.config.dir.join(&filename);

        tokio::fs::create_dir_all(&self.config.dir)
            .await
            .map_err(|e| DomainError::Internal(format!("cannot create upload dir: {e}")))?;
        let mut out = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    DomainError::Conflict(format!("file '{filename}' already exists"))
                }
                _ => DomainError::Internal(format!("cannot create {}: {e}", path.display())),
            })?;
        out.write_all(&file.bytes)
            .await
            .map_err(|e| DomainError::Internal(format!("cannot write {}: {e}", path.display())))?;
        out.flush()
            .await
            .map_err(|e| DomainError::Internal(format!("cannot write {}: {e}", path.display())))?;

        info!(filename = %filename, size = file.bytes.len(), "file uploaded");
        Ok(StoredFile {
            url: format!("{}/{}", self.config.public_path, filename),
            filename,
        })
    }

    /// Millisecond timestamp, strictly increasing within the process.
    fn next_stamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        now.max(previous + 1)
    }
}

/// Final path component with anything outside `[A-Za-z0-9._-]` replaced.
fn safe_file_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Drops the client's extension; the stored one comes from the content type.
fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::Role;
    use uuid::Uuid;

    fn service(dir: &std::path::Path) -> UploadService {
        UploadService::new(UploadConfig {
            dir: dir.to_path_buf(),
            public_path: "/uploads".into(),
            max_bytes: 16,
        })
    }

    fn admin() -> Claims {
        Claims::new(Uuid::new_v4(), "owner@blog.dev", Role::Admin)
    }

    fn png(name: &str, bytes: &[u8]) -> Option<UploadedFile> {
        Some(UploadedFile {
            filename: name.into(),
            content_type: Some("image/png".into()),
            bytes: bytes.to_vec(),
        })
    }

    #[tokio::test]
    async fn stores_file_under_stamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = service(dir.path());

        let stored = uploads
            .store(Some(&admin()), png("cat photo.png", b"\x89PNG"))
            .await
            .unwrap();
        assert!(stored.filename.ends_with("-cat-photo.png"));
        assert_eq!(stored.url, format!("/uploads/{}", stored.filename));

        let written = std::fs::read(dir.path().join(&stored.filename)).unwrap();
        assert_eq!(written, b"\x89PNG");
    }

    #[tokio::test]
    async fn same_name_twice_gets_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = service(dir.path());
        let a = uploads.store(Some(&admin()), png("a.png", b"1")).await.unwrap();
        let b = uploads.store(Some(&admin()), png("a.png", b"2")).await.unwrap();
        assert_ne!(a.filename, b.filename);
    }

    #[tokio::test]
    async fn non_admins_are_unauthorized() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = service(dir.path());
        let user = Claims::new(Uuid::new_v4(), "reader@blog.dev", Role::User);

        for requester in [None, Some(&user)] {
            let err = uploads.store(requester, png("a.png", b"1")).await.unwrap_err();
            assert!(matches!(err, DomainError::Unauthorized));
        }
    }

    #[tokio::test]
    async fn rejects_missing_oversized_or_disallowed_files() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = service(dir.path());
        let admin = admin();

        let missing = uploads.store(Some(&admin), None).await.unwrap_err();
        assert!(matches!(missing, DomainError::Validation(_)));

        let empty = uploads.store(Some(&admin), png("a.png", b"")).await.unwrap_err();
        assert!(matches!(empty, DomainError::Validation(_)));

        let big = uploads
            .store(Some(&admin), png("a.png", &[0u8; 17]))
            .await
            .unwrap_err();
        assert!(matches!(big, DomainError::Validation(_)));

        let svg = UploadedFile {
            filename: "x.svg".into(),
            content_type: Some("image/svg+xml".into()),
            bytes: b"<svg/>".to_vec(),
        };
        let err = uploads.store(Some(&admin), Some(svg)).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn extension_follows_the_declared_type() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = service(dir.path());

        let stored = uploads
            .store(Some(&admin()), png("evil.html", b"<script>"))
            .await
            .unwrap();
        assert!(stored.filename.ends_with("-evil.png"));
        assert!(stored.url.ends_with(".png"));
        assert!(dir.path().join(&stored.filename).exists());

        let jpeg = UploadedFile {
            filename: "holiday.JPEG".into(),
            content_type: Some("image/jpeg".into()),
            bytes: b"jpg".to_vec(),
        };
        let stored = uploads.store(Some(&admin()), Some(jpeg)).await.unwrap();
        assert!(stored.filename.ends_with("-holiday.jpg"));

        let bare = uploads.store(Some(&admin()), png("noext", b"1")).await.unwrap();
        assert!(bare.filename.ends_with("-noext.png"));
    }

    #[test]
    fn file_names_cannot_escape_the_upload_dir() {
        assert_eq!(safe_file_name("../../etc/passwd"), "passwd");
        assert_eq!(safe_file_name("C:\\Users\\me\\pic 1.jpg"), "pic-1.jpg");
        assert_eq!(safe_file_name(".hidden"), "hidden");
        assert_eq!(safe_file_name("..."), "upload");
        assert_eq!(safe_file_name(""), "upload");
        assert_eq!(file_stem("archive.tar.gz"), "archive.tar");
        assert_eq!(file_stem("upload"), "upload");
    }
}
