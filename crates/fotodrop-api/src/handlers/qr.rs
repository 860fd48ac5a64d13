//! `GET /api/qr-url` — the externally reachable upload page URL, for
//! rendering a scannable code client-side.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct QrUrl {
    pub url: String,
}

pub async fn qr_url(State(state): State<Arc<AppState>>) -> Json<QrUrl> {
    Json(QrUrl {
        url: state.config.frontend_url(),
    })
}
