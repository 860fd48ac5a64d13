//! Authorization endpoints: status probe, consent redirect, OAuth callback.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Serialize)]
pub struct AuthStatus {
    pub authorized: bool,
}

pub async fn auth_status(State(state): State<Arc<AppState>>) -> Json<AuthStatus> {
    Json(AuthStatus {
        authorized: state.storage.is_authorized().await,
    })
}

/// `GET /auth` — send the operator to the backend's consent screen.
pub async fn authorize(State(state): State<Arc<AppState>>) -> Response {
    match state.storage.auth_url().await {
        Some(Ok(url)) => Redirect::temporary(&url).into_response(),
        Some(Err(err)) => {
            tracing::error!(error = %err, "authorize flow unavailable");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(setup_page(&err.to_string()))).into_response()
        }
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(setup_page(
                "This deployment uses a service-account key; there is no interactive \
                 authorize flow.",
            )),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// `GET /oauth2callback` — exchange the code, persist the token, and render
/// a human-readable result page.
pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error {
        tracing::warn!(error = %error, "consent was denied");
        return (
            StatusCode::BAD_REQUEST,
            Html(result_page(false, &format!("Consent was not granted: {}", error))),
        )
            .into_response();
    }

    let Some(code) = query.code else {
        return (
            StatusCode::BAD_REQUEST,
            Html(result_page(false, "The callback is missing the authorization code.")),
        )
            .into_response();
    };

    match state.storage.complete_authorization(&code).await {
        Ok(()) => {
            tracing::info!("OAuth authorization completed");
            Html(result_page(
                true,
                "Drive is connected. Guests can start uploading now.",
            ))
            .into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "authorization code exchange failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(result_page(false, &err.to_string())),
            )
                .into_response()
        }
    }
}

fn result_page(success: bool, detail: &str) -> String {
    let (title, heading) = if success {
        ("Authorization complete", "&#9989; Authorization complete")
    } else {
        ("Authorization failed", "&#10060; Authorization failed")
    };
    format!(
        "<!DOCTYPE html><html><head><title>{title}</title></head>\
         <body style=\"font-family: sans-serif; text-align: center; padding-top: 4em\">\
         <h1>{heading}</h1><p>{detail}</p></body></html>"
    )
}

fn setup_page(detail: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Setup required</title></head>\
         <body style=\"font-family: sans-serif; padding: 2em\">\
         <h1>Setup required</h1><p>{detail}</p>\
         <p>Create an OAuth 2.0 Client ID in the Google Cloud Console, download it as \
         <code>credentials.json</code>, place it next to the server, and restart.</p>\
         </body></html>"
    )
}
