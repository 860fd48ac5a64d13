//! Domain models shared across the server and the upload client.

use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One uploaded-but-not-yet-dispatched file, persisted under the local
/// uploads directory.
///
/// The temporary file is removed exactly once, when the `StagedFile` is
/// dropped. Every exit path of the request (success, per-file failure,
/// validation abort) goes through that drop, so staged files cannot outlive
/// the request that created them.
#[derive(Debug)]
pub struct StagedFile {
    original_name: String,
    content_type: String,
    path: PathBuf,
    size: u64,
}

impl StagedFile {
    /// Reserve a collision-resistant temporary path for `original_name`
    /// under `uploads_dir`. The file itself is written by the stager.
    pub fn reserve(uploads_dir: &Path, original_name: &str, content_type: &str) -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        let path = uploads_dir.join(format!("{}-{:09}{}", millis, suffix, ext));

        StagedFile {
            original_name: original_name.to_string(),
            content_type: content_type.to_string(),
            path,
            size: 0,
        }
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Record the byte count actually persisted to the temporary path.
    pub fn set_size(&mut self, size: u64) {
        self.size = size;
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        // Cleanup is best-effort: a leaked temp file is a disk-space problem,
        // not a correctness one, so log and move on.
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to remove temporary upload file"
                );
            }
        }
    }
}

/// One successfully dispatched file, as reported to the client.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub id: String,
    #[serde(rename = "webViewLink")]
    pub web_view_link: Option<String>,
}

/// One failed dispatch, keyed by the original file name.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadFailure {
    pub name: String,
    pub error: String,
}

/// Aggregate outcome of one batch. Every staged file lands in exactly one of
/// the two lists.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BatchResult {
    pub uploaded: Vec<UploadedFile>,
    pub errors: Vec<UploadFailure>,
}

impl BatchResult {
    pub fn record_success(&mut self, file: UploadedFile) {
        self.uploaded.push(file);
    }

    pub fn record_failure(&mut self, name: impl Into<String>, error: impl Into<String>) {
        self.errors.push(UploadFailure {
            name: name.into(),
            error: error.into(),
        });
    }

    pub fn total(&self) -> usize {
        self.uploaded.len() + self.errors.len()
    }
}

/// Wire shape of a `200` response from `POST /api/upload`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub uploaded: Vec<UploadedFile>,
    pub errors: Vec<UploadFailure>,
    pub message: String,
}

/// Wire shape of a `401` response from `POST /api/upload`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthRequiredResponse {
    pub error: String,
    #[serde(rename = "authUrl", skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reserved_paths_keep_the_original_extension() {
        let dir = tempdir().unwrap();
        let staged = StagedFile::reserve(dir.path(), "holiday.JPG", "image/jpeg");
        let name = staged.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with(".jpg"), "got {}", name);
        assert!(staged.path().starts_with(dir.path()));
    }

    #[test]
    fn reserved_paths_do_not_collide() {
        let dir = tempdir().unwrap();
        let a = StagedFile::reserve(dir.path(), "a.png", "image/png");
        let b = StagedFile::reserve(dir.path(), "a.png", "image/png");
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn drop_removes_the_temporary_file() {
        let dir = tempdir().unwrap();
        let path;
        {
            let staged = StagedFile::reserve(dir.path(), "clip.mp4", "video/mp4");
            path = staged.path().to_path_buf();
            std::fs::write(&path, b"fake video").unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn batch_result_partitions_every_file() {
        let mut result = BatchResult::default();
        result.record_success(UploadedFile {
            name: "a.jpg".into(),
            id: "drive-1".into(),
            web_view_link: Some("https://drive.example/view/drive-1".into()),
        });
        result.record_failure("b.jpg", "quota exceeded");
        assert_eq!(result.total(), 2);
        assert_eq!(result.uploaded.len(), 1);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn upload_response_uses_drive_field_names() {
        let json = serde_json::to_value(UploadedFile {
            name: "a.jpg".into(),
            id: "x".into(),
            web_view_link: Some("link".into()),
        })
        .unwrap();
        assert!(json.get("webViewLink").is_some());
    }
}
