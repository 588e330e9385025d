use axum::extract::{Json, Query, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::{Bucket, BucketError};

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct ListRequest {
    /// Only list buckets whose name contains this substring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[arg(long)]
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub buckets: Vec<Bucket>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<ListRequest>,
) -> Result<impl IntoResponse, ListError> {
    list(&state, req).await
}

/// Same listing with the filter taken from the query string.
pub async fn handler_get(
    State(state): State<ServiceState>,
    Query(req): Query<ListRequest>,
) -> Result<impl IntoResponse, ListError> {
    list(&state, req).await
}

async fn list(state: &ServiceState, req: ListRequest) -> Result<Response, ListError> {
    let filter = req.bucket.filter(|f| !f.is_empty());
    let buckets = state.enumerator().list_blocking(filter).await?;

    tracing::debug!(buckets = buckets.len(), "listed buckets");

    Ok((http::StatusCode::OK, Json(ListResponse { buckets })).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("enumeration failed: {0}")]
    Bucket(#[from] BucketError),
}

impl IntoResponse for ListError {
    fn into_response(self) -> Response {
        tracing::error!("bucket list failed: {}", self);
        (
            http::StatusCode::INTERNAL_SERVER_ERROR,
            "unknown server error",
        )
            .into_response()
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for ListRequest {
    type Response = ListResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v0/bucket/list")?;
        Ok(client.post(full_url).json(&self))
    }
}
