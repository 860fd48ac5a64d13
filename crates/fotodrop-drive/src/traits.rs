//! Remote storage abstraction trait
//!
//! Both credential variants (service-account key file and OAuth) expose the
//! same capability set; the dispatcher and the HTTP handlers only ever see
//! `Arc<dyn RemoteStorage>`, selected once at startup by the factory.

use async_trait::async_trait;
use fotodrop_core::{StagedFile, UploadedFile};

use crate::error::StorageResult;

#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Whether the server currently holds a usable write credential. Checked
    /// synchronously before any file in a batch is dispatched.
    async fn is_authorized(&self) -> bool;

    /// Consent URL to start the authorize flow. `None` for variants without
    /// an interactive flow (service-account).
    async fn auth_url(&self) -> Option<StorageResult<String>>;

    /// Exchange an authorization code and persist the resulting token.
    async fn complete_authorization(&self, code: &str) -> StorageResult<()>;

    /// Upload one staged file into the destination folder (resolved and
    /// cached internally) and return its remote identity.
    async fn upload(&self, staged: &StagedFile) -> StorageResult<UploadedFile>;
}
