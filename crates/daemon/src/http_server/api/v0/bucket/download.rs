use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use common::prelude::BucketError;

use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Bucket-qualified path of the file, e.g. `photos/a.png`
    #[serde(default)]
    pub file: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Query(req): Query<DownloadRequest>,
) -> Result<Response, DownloadError> {
    if req.file.is_empty() {
        return Err(DownloadError::MissingParameter);
    }

    let download = state.downloader().open(&req.file).await?;

    tracing::info!(
        file = %req.file,
        content_type = download.content_type,
        size = download.size,
        "download started"
    );

    // size and type are settled before any header goes out
    let disposition = format!(
        "attachment; filename=\"{}\"",
        quote_filename(&download.name)
    );
    let body = Body::from_stream(ReaderStream::new(download.file));

    let response = Response::builder()
        .status(http::StatusCode::OK)
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_TYPE, download.content_type)
        .header(header::CONTENT_LENGTH, download.size)
        .body(body)?;

    Ok(response)
}

/// Escape a filename for a quoted-string header parameter. Control characters
/// are dropped since they cannot appear in a header value.
fn quote_filename(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len());
    for c in name.chars().filter(|c| !c.is_control()) {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("missing file parameter")]
    MissingParameter,
    #[error("Bucket error: {0}")]
    Bucket(#[from] BucketError),
    #[error("failed to build response: {0}")]
    Response(#[from] http::Error),
}

impl IntoResponse for DownloadError {
    fn into_response(self) -> Response {
        match self {
            DownloadError::MissingParameter => (
                http::StatusCode::BAD_REQUEST,
                "Bad request: missing file parameter".to_string(),
            )
                .into_response(),
            DownloadError::Bucket(BucketError::NotFound(file)) => {
                tracing::debug!(file = %file, "download of missing file");
                (http::StatusCode::NOT_FOUND, "File not found.").into_response()
            }
            DownloadError::Bucket(e) if e.is_client_error() => (
                http::StatusCode::BAD_REQUEST,
                format!("Bad request: {}", e),
            )
                .into_response(),
            e => {
                tracing::error!("download failed: {}", e);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Unexpected error".to_string(),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_filename() {
        assert_eq!(quote_filename("a.png"), "a.png");
        assert_eq!(quote_filename("say \"hi\".txt"), "say \\\"hi\\\".txt");
        assert_eq!(quote_filename("back\\slash"), "back\\\\slash");
        assert_eq!(quote_filename("line\nbreak"), "linebreak");
        assert_eq!(quote_filename("été.txt"), "été.txt");
    }
}
