//! Storage operation errors.

use fotodrop_core::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// No valid credential. For the OAuth variant this also means the
    /// persisted token was discarded and re-authorization is required.
    #[error("Authorization required: {0}")]
    AuthRequired(String),

    #[error("Drive API error: {0}")]
    Backend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::AuthRequired(msg) => AppError::Auth(msg),
            StorageError::Backend(msg) => AppError::Backend(msg),
            StorageError::Config(msg) => AppError::Configuration(msg),
            StorageError::Io(e) => AppError::Filesystem(e.to_string()),
            StorageError::Transport(e) => AppError::Backend(e.to_string()),
        }
    }
}
