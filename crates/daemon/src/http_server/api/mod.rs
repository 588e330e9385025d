use axum::routing::{get, post};
use axum::Router;
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use http::Method;
use tower_http::cors::{Any, CorsLayer};

pub mod client;
pub mod v0;

use crate::ServiceState;

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST])
        .allow_headers(vec![ACCEPT, CONTENT_TYPE, ORIGIN])
        .allow_origin(Any)
        .allow_credentials(false)
}

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/v0", v0::router(state.clone()))
        .with_state(state)
        .layer(cors_layer())
}

/// Unversioned paths older clients post to and fetch from.
pub fn legacy_router(state: ServiceState) -> Router<ServiceState> {
    use v0::bucket::{download, list, upload};

    Router::new()
        .route("/upload", post(upload::handler))
        .route("/download", get(download::handler))
        .route("/bucket/list", get(list::handler_get))
        .with_state(state)
        .layer(cors_layer())
}
