//! Upload staging: multipart fields to validated local temporary files.

use std::path::PathBuf;

use axum::extract::multipart::{Field, Multipart};
use fotodrop_core::{AppError, Config, StagedFile};
use tokio::io::AsyncWriteExt;

/// Receives the `files` multipart field(s), validates each against the
/// type allow-list and size ceilings, and persists them under the uploads
/// directory with collision-resistant names.
///
/// Validation failures reject the whole request before any dispatch; files
/// staged up to that point are cleaned up by their drop guards.
#[derive(Clone)]
pub struct Stager {
    uploads_dir: PathBuf,
    max_files: usize,
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl Stager {
    pub fn from_config(config: &Config) -> Self {
        Stager {
            uploads_dir: config.uploads_dir().to_path_buf(),
            max_files: config.max_files_per_batch(),
            max_file_size: config.max_file_size_bytes(),
            allowed_extensions: config.allowed_extensions().to_vec(),
            allowed_content_types: config.allowed_content_types().to_vec(),
        }
    }

    /// Server-side allow-list check, independent of whatever the client
    /// filtered. Both the extension and the declared type must match.
    pub fn validate(&self, file_name: &str, content_type: &str) -> Result<(), AppError> {
        let extension = std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if !self.allowed_extensions.iter().any(|e| *e == extension)
            || !self
                .allowed_content_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(content_type))
        {
            return Err(AppError::Validation(format!(
                "'{}' is not an accepted type; only images and videos can be uploaded",
                file_name
            )));
        }
        Ok(())
    }

    pub async fn stage(&self, multipart: &mut Multipart) -> Result<Vec<StagedFile>, AppError> {
        let mut staged = Vec::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("malformed multipart request: {}", e)))?
        {
            if field.name() != Some("files") {
                continue;
            }

            if staged.len() == self.max_files {
                return Err(AppError::Validation(format!(
                    "at most {} files per upload",
                    self.max_files
                )));
            }

            staged.push(self.stage_field(field).await?);
        }

        if staged.is_empty() {
            return Err(AppError::Validation(
                "please select at least one file".to_string(),
            ));
        }

        Ok(staged)
    }

    async fn stage_field(&self, mut field: Field<'_>) -> Result<StagedFile, AppError> {
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("file entry without a filename".to_string()))?;
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        self.validate(&file_name, &content_type)?;

        let mut staged = StagedFile::reserve(&self.uploads_dir, &file_name, &content_type);
        let mut out = tokio::fs::File::create(staged.path()).await?;
        let mut written: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("upload stream interrupted: {}", e)))?
        {
            written += chunk.len() as u64;
            if written > self.max_file_size as u64 {
                return Err(AppError::Validation(format!(
                    "'{}' exceeds the {} MiB per-file limit",
                    file_name,
                    self.max_file_size / 1024 / 1024
                )));
            }
            out.write_all(&chunk).await?;
        }
        out.flush().await?;

        staged.set_size(written);
        tracing::debug!(file = %file_name, bytes = written, path = %staged.path().display(), "staged upload");
        Ok(staged)
    }
}
