//! Axum route handlers for the resume ingestion endpoint.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::debug;

use crate::auth::AuthedUser;
use crate::errors::AppError;
use crate::ingest::file_validator::UploadedFile;
use crate::ingest::pipeline::IngestSuccess;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

/// POST /functions/v1/parse-resume
///
/// Authentication is checked by the `AuthedUser` extractor before the body is read.
/// CORS preflight (`OPTIONS`) is answered by the router's `CorsLayer`.
pub async fn handle_parse_resume(
    State(state): State<AppState>,
    user: AuthedUser,
    multipart: Multipart,
) -> Result<Json<IngestSuccess>, AppError> {
    let max_size = state.pipeline.settings().max_file_size_bytes;
    let upload = read_upload(multipart, max_size).await?;
    let response = state.pipeline.ingest(&user, upload).await?;
    Ok(Json(response))
}

/// Any other method on the ingestion path.
pub async fn handle_method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Pulls the `file` field out of the multipart body. Other fields are skipped.
async fn read_upload(mut multipart: Multipart, max_size: usize) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_size))?
    {
        if field.name() != Some(FILE_FIELD) {
            debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_size))?;

        return Ok(UploadedFile {
            bytes,
            mime_type,
            file_name,
        });
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}

fn multipart_error(err: MultipartError, max_size: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::BadRequest(format!(
            "File too large (maximum is {max_size} bytes)"
        ))
    } else {
        AppError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}
