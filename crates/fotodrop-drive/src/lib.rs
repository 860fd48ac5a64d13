//! Fotodrop Drive Library
//!
//! Remote-storage layer for the upload pipeline. Defines the `RemoteStorage`
//! capability trait with two concrete variants (service-account key file and
//! OAuth), the Google Drive wire API behind the `DriveApi` trait, the cached
//! folder resolver, and the credential store that gates upload dispatch.

pub mod api;
pub mod error;
pub mod factory;
pub mod oauth;
pub mod resolver;
pub mod service_account;
pub mod traits;

// Re-export commonly used types
pub use api::{AccessToken, DriveApi, DriveFile, DriveHttp, FolderHandle};
pub use error::{StorageError, StorageResult};
pub use factory::create_storage;
pub use oauth::{CredentialState, CredentialStore, OAuthStorage};
pub use resolver::FolderResolver;
pub use service_account::ServiceAccountStorage;
pub use traits::RemoteStorage;
