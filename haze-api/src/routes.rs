//! API route configuration.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::handlers;
use crate::middleware::admission_middleware;
use crate::state::AppState;

/// Room for multipart boundaries and the component text parts on top of the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.upload_max_bytes + MULTIPART_OVERHEAD;

    let blurhash = Router::new()
        .route(
            "/upload",
            post(handlers::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/url", post(handlers::encode_url))
        .route("/batch", post(handlers::encode_batch))
        .route("/decode/:hash", get(handlers::decode_hash))
        .route("/stats", get(handlers::get_stats));

    Router::new()
        // Health check
        .route("/", get(handlers::health_check))
        .route("/health", get(handlers::health_check))

        .nest("/api/blurhash", blurhash)
        .fallback(handlers::not_found)

        .layer(middleware::from_fn_with_state(state.clone(), admission_middleware))

        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))

        .with_state(state)
}
