use axum::routing::{get, post};
use axum::Router;

use crate::ServiceState;

pub mod download;
pub mod list;
pub mod upload;

pub use download::DownloadRequest;
pub use list::{ListRequest, ListResponse};

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/list", get(list::handler_get).post(list::handler))
        .route("/upload", post(upload::handler))
        .route("/download", get(download::handler))
        .with_state(state)
}
