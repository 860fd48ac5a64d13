//! Router assembly.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    // Leave headroom above the sum of per-file ceilings for multipart framing.
    let body_limit =
        state.config.max_file_size_bytes() * state.config.max_files_per_batch() + 1024 * 1024;

    Router::new()
        .route("/api/upload", post(handlers::upload::upload))
        .route("/api/auth-status", get(handlers::auth::auth_status))
        .route("/auth", get(handlers::auth::authorize))
        .route("/oauth2callback", get(handlers::auth::oauth_callback))
        .route("/api/qr-url", get(handlers::qr::qr_url))
        .fallback_service(ServeDir::new("public"))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
