//! Fotodrop API server
//!
//! Axum HTTP surface for the guest-upload pipeline: multipart staging into
//! local temporary files, per-file dispatch to the Drive adapter, the OAuth
//! authorize/callback endpoints, and the QR URL endpoint.

pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod stager;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
