//! Error types module
//!
//! The unified `AppError` taxonomy for the upload pipeline. Per-file failures
//! (`Backend`, `Filesystem`) are collected into the batch result and never
//! abort the batch; `Validation` and `Auth` short-circuit a request before any
//! dispatch; `Configuration` needs operator intervention and is not retryable.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Authorization required: {0}")]
    Auth(String),

    #[error("Remote storage error: {0}")]
    Backend(String),

    #[error("Filesystem error: {0}")]
    Filesystem(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this failure is scoped to a single file and the batch can
    /// continue, or poisons the whole request.
    pub fn is_per_file(&self) -> bool {
        matches!(self, AppError::Backend(_) | AppError::Filesystem(_))
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Filesystem(err.to_string())
    }
}
