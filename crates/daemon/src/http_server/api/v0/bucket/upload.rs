use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};

use common::prelude::BucketError;

use crate::ServiceState;

/// Multipart part carrying the file; its filename names the stored file.
pub const FILE_FIELD: &str = "file";
/// Optional text part naming the target bucket.
pub const BUCKET_FIELD: &str = "bucket";

pub async fn handler(
    State(state): State<ServiceState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, UploadError> {
    let mut bucket: Option<String> = None;
    let mut file: Option<(String, axum::body::Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Multipart parsing error: {}", e);
        UploadError::Multipart(e)
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            BUCKET_FIELD => {
                bucket = Some(field.text().await?);
            }
            FILE_FIELD => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| {
                        UploadError::InvalidRequest("file part has no filename".into())
                    })?;
                let data = field.bytes().await?;
                tracing::debug!(filename = %filename, size = data.len(), "received file part");
                file = Some((filename, data));
            }
            _ => {
                tracing::warn!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let (filename, data) =
        file.ok_or_else(|| UploadError::InvalidRequest("file is required".into()))?;

    let receipt = state
        .uploader()
        .upload(bucket.as_deref(), &filename, &data)
        .await?;

    tracing::info!(
        bucket = %receipt.bucket,
        name = %receipt.name,
        size = receipt.size,
        "upload stored"
    );

    Ok((http::StatusCode::OK, "OK"))
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            UploadError::InvalidRequest(msg) => (
                http::StatusCode::BAD_REQUEST,
                format!("Bad request: {}", msg),
            )
                .into_response(),
            UploadError::Multipart(e) => {
                (e.status(), format!("Bad request: {}", e.body_text())).into_response()
            }
            UploadError::Bucket(e) if e.is_client_error() => (
                http::StatusCode::BAD_REQUEST,
                format!("Bad request: {}", e),
            )
                .into_response(),
            UploadError::Bucket(e) => {
                tracing::error!("upload failed: {}", e);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Unexpected error".to_string(),
                )
                    .into_response()
            }
        }
    }
}
