//! Destination folder resolution with a process-lifetime cache.

use tokio::sync::RwLock;

use crate::api::{AccessToken, DriveApi, FolderHandle};
use crate::error::StorageResult;

/// Finds or creates the named destination folder and caches its handle for
/// the rest of the process. The cache never expires and is never invalidated.
///
/// Query-then-create is not transactional: two cold-cache resolutions racing
/// from overlapping requests may each create a folder. The first write into
/// the cache wins and later uploads converge on it; the stray duplicate is
/// tolerated rather than corrected.
pub struct FolderResolver {
    name: String,
    cached: RwLock<Option<FolderHandle>>,
}

impl FolderResolver {
    pub fn new(name: impl Into<String>) -> Self {
        FolderResolver {
            name: name.into(),
            cached: RwLock::new(None),
        }
    }

    pub fn folder_name(&self) -> &str {
        &self.name
    }

    pub async fn resolve(
        &self,
        api: &dyn DriveApi,
        token: &AccessToken,
    ) -> StorageResult<FolderHandle> {
        if let Some(handle) = self.cached.read().await.clone() {
            return Ok(handle);
        }

        let handle = match api.find_folder(token, &self.name).await? {
            Some(handle) => {
                tracing::info!(folder = %self.name, id = %handle, "found destination folder");
                handle
            }
            None => {
                let handle = api.create_folder(token, &self.name).await?;
                tracing::info!(folder = %self.name, id = %handle, "created destination folder");
                handle
            }
        };

        let mut slot = self.cached.write().await;
        if let Some(existing) = slot.clone() {
            // A concurrent resolution got here first; reuse its handle.
            return Ok(existing);
        }
        *slot = Some(handle.clone());
        Ok(handle)
    }
}
