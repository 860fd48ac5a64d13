//! Batch dispatch: per-file upload with independent error handling.

use fotodrop_core::{BatchResult, StagedFile};
use fotodrop_drive::RemoteStorage;

/// Dispatch every staged file to the storage adapter. One file's failure
/// never aborts the rest: the result always partitions the whole batch into
/// successes and failures. Each temporary file is removed as soon as its
/// dispatch finishes, whichever way it went.
pub async fn dispatch(storage: &dyn RemoteStorage, staged: Vec<StagedFile>) -> BatchResult {
    let mut result = BatchResult::default();

    for file in staged {
        let name = file.original_name().to_string();
        tracing::info!(file = %name, bytes = file.size(), "uploading");

        match storage.upload(&file).await {
            Ok(uploaded) => result.record_success(uploaded),
            Err(err) => {
                tracing::error!(file = %name, error = %err, "upload failed");
                result.record_failure(name, err.to_string());
            }
        }
        // `file` drops here, deleting its temporary path.
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fotodrop_core::UploadedFile;
    use fotodrop_drive::{StorageError, StorageResult};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Adapter stub that fails uploads whose name contains "bad".
    struct ScriptedStorage {
        calls: AtomicUsize,
    }

    impl ScriptedStorage {
        fn new() -> Self {
            ScriptedStorage {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RemoteStorage for ScriptedStorage {
        async fn is_authorized(&self) -> bool {
            true
        }

        async fn auth_url(&self) -> Option<StorageResult<String>> {
            None
        }

        async fn complete_authorization(&self, _code: &str) -> StorageResult<()> {
            Ok(())
        }

        async fn upload(&self, staged: &StagedFile) -> StorageResult<UploadedFile> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = staged.original_name();
            if name.contains("bad") {
                return Err(StorageError::Backend(
                    "HTTP 403: The user does not have sufficient permissions".into(),
                ));
            }
            Ok(UploadedFile {
                name: name.to_string(),
                id: format!("drive-{}", name),
                web_view_link: Some(format!("https://drive.example/view/{}", name)),
            })
        }
    }

    fn stage_files(dir: &std::path::Path, names: &[&str]) -> (Vec<StagedFile>, Vec<PathBuf>) {
        let mut staged = Vec::new();
        let mut paths = Vec::new();
        for name in names {
            let mut file = StagedFile::reserve(dir, name, "image/jpeg");
            std::fs::write(file.path(), b"bytes").unwrap();
            file.set_size(5);
            paths.push(file.path().to_path_buf());
            staged.push(file);
        }
        (staged, paths)
    }

    #[tokio::test]
    async fn all_success_batch_has_no_failures_and_no_leftover_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ScriptedStorage::new();
        let (staged, paths) = stage_files(dir.path(), &["a.jpg", "b.jpg", "c.jpg"]);

        let result = dispatch(&storage, staged).await;

        assert_eq!(result.uploaded.len(), 3);
        assert!(result.errors.is_empty());
        assert_eq!(storage.calls.load(Ordering::SeqCst), 3);
        for path in paths {
            assert!(!path.exists(), "temp file leaked: {}", path.display());
        }
    }

    #[tokio::test]
    async fn mixed_batch_partitions_every_file_and_cleans_up_both_ways() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ScriptedStorage::new();
        let (staged, paths) = stage_files(dir.path(), &["good.jpg", "bad.jpg", "also-good.jpg"]);

        let result = dispatch(&storage, staged).await;

        assert_eq!(result.total(), 3);
        assert_eq!(result.uploaded.len(), 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].name, "bad.jpg");
        assert!(result.errors[0].error.contains("permissions"));
        for path in paths {
            assert!(!path.exists(), "temp file leaked: {}", path.display());
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_later_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ScriptedStorage::new();
        let (staged, _) = stage_files(dir.path(), &["bad.jpg", "after.jpg"]);

        let result = dispatch(&storage, staged).await;

        assert_eq!(storage.calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.uploaded.len(), 1);
        assert_eq!(result.uploaded[0].name, "after.jpg");
    }
}
