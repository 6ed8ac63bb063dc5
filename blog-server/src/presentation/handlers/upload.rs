use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{HttpRequest, HttpResponse, post, web};
use futures_util::TryStreamExt;
use tracing::info;

use crate::application::upload_service::{UploadService, UploadedFile};
use crate::domain::error::DomainError;
use crate::presentation::utils::{AuthenticatedUser, request_id};

const FILE_FIELD: &str = "file";

#[post("/upload")]
pub async fn upload_file(
    req: HttpRequest,
    user: Option<AuthenticatedUser>,
    uploads: web::Data<UploadService>,
    mut payload: Multipart,
) -> Result<HttpResponse, DomainError> {
    let requester = user.map(|u| u.0);
    if !requester.as_ref().is_some_and(|c| c.is_admin()) {
        return Err(DomainError::Unauthorized);
    }

    let mut file = None;
    while let Some(field) = payload.try_next().await.map_err(multipart_error)? {
        if field.name() == Some(FILE_FIELD) && file.is_none() {
            file = Some(read_field(field, uploads.max_bytes()).await?);
        }
    }

    let stored = uploads.store(requester.as_ref(), file).await?;

    info!(
        request_id = %request_id(&req),
        filename = %stored.filename,
        "upload stored"
    );

    Ok(HttpResponse::Ok().json(stored))
}

/// Buffers one field, giving up as soon as it grows past `max_bytes`.
async fn read_field(mut field: Field, max_bytes: usize) -> Result<UploadedFile, DomainError> {
    let filename = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .unwrap_or_default()
        .to_string();
    let content_type = field.content_type().map(|mime| mime.essence_str().to_string());

    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
        if bytes.len() + chunk.len() > max_bytes {
            return Err(DomainError::validation(format!(
                "file exceeds {max_bytes} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        filename,
        content_type,
        bytes,
    })
}

fn multipart_error(err: MultipartError) -> DomainError {
    DomainError::validation(format!("invalid multipart body: {err}"))
}
