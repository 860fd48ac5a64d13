//! Fotodrop Core Library
//!
//! Shared configuration, error types, and domain models for the fotodrop
//! guest-upload service. The API server, the Drive adapter, and the headless
//! upload client all build on this crate.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{AuthVariant, Config};
pub use error::AppError;
pub use models::{
    AuthRequiredResponse, BatchResult, StagedFile, UploadFailure, UploadResponse, UploadedFile,
};
