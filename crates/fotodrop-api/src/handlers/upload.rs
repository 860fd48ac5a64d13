//! `POST /api/upload` — stage the batch, dispatch it, report the aggregate.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fotodrop_core::{AuthRequiredResponse, UploadResponse};

use crate::dispatcher;
use crate::error::HttpAppError;
use crate::state::AppState;

pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, HttpAppError> {
    // Authorization gates the whole batch; nothing is staged or dispatched
    // without a credential. The service-account variant has no authorize
    // flow, so a missing key there surfaces as per-file failures instead.
    if !state.storage.is_authorized().await {
        if let Some(url) = state.storage.auth_url().await {
            let auth_url = match url {
                Ok(url) => Some(url),
                Err(err) => {
                    tracing::warn!(error = %err, "cannot build consent URL");
                    None
                }
            };
            return Ok((
                StatusCode::UNAUTHORIZED,
                Json(AuthRequiredResponse {
                    error: "authorization_required".to_string(),
                    auth_url,
                    message: "The Drive connection has not been set up by the organizer yet. \
                              Please try again later."
                        .to_string(),
                }),
            )
                .into_response());
        }
    }

    let staged = state.stager.stage(&mut multipart).await?;
    let result = dispatcher::dispatch(state.storage.as_ref(), staged).await;

    let message = format!("{} file(s) uploaded successfully!", result.uploaded.len());
    Ok(Json(UploadResponse {
        success: true,
        uploaded: result.uploaded,
        errors: result.errors,
        message,
    })
    .into_response())
}
