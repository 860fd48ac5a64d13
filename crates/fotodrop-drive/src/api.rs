//! Google Drive v3 wire API.
//!
//! The backend is treated as an opaque service with three operations: find a
//! folder, create a folder, upload an object. `DriveApi` is the seam the
//! folder resolver and both storage variants work against; `DriveHttp` is the
//! production implementation, tests substitute mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

const API_BASE: &str = "https://www.googleapis.com/drive/v3";
const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Bearer token attached to outgoing Drive calls.
#[derive(Clone, Debug)]
pub struct AccessToken {
    secret: String,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        AccessToken {
            secret: secret.into(),
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

/// Opaque identifier of a destination folder on Drive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderHandle(pub String);

impl std::fmt::Display for FolderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata Drive returns for a created file.
#[derive(Clone, Debug, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "webViewLink")]
    pub web_view_link: Option<String>,
}

/// The three backend operations the pipeline needs.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Find a non-trashed folder with exactly the given name.
    async fn find_folder(
        &self,
        token: &AccessToken,
        name: &str,
    ) -> StorageResult<Option<FolderHandle>>;

    async fn create_folder(&self, token: &AccessToken, name: &str) -> StorageResult<FolderHandle>;

    async fn upload_object(
        &self,
        token: &AccessToken,
        folder: &FolderHandle,
        name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<DriveFile>;
}

/// Production Drive client over the REST API.
#[derive(Clone)]
pub struct DriveHttp {
    client: reqwest::Client,
    api_base: String,
    upload_base: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileListEntry>,
}

#[derive(Debug, Deserialize)]
struct FileListEntry {
    id: String,
}

impl DriveHttp {
    pub fn new(client: reqwest::Client) -> Self {
        DriveHttp {
            client,
            api_base: API_BASE.to_string(),
            upload_base: UPLOAD_BASE.to_string(),
        }
    }

    /// Point the client at a different API host. Used by tests.
    pub fn with_base_urls(mut self, api_base: String, upload_base: String) -> Self {
        self.api_base = api_base;
        self.upload_base = upload_base;
        self
    }

    async fn into_storage_error(response: reqwest::Response) -> StorageError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        map_error_body(status.as_u16(), &body)
    }
}

/// Map a non-success Drive response to the error taxonomy. Expired or revoked
/// grants come back as 401s, or 403s carrying `invalid_grant`-style reasons.
pub(crate) fn map_error_body(status: u16, body: &str) -> StorageError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.pointer("/error_description"))
                .and_then(|m| m.as_str().map(String::from))
        })
        .unwrap_or_else(|| body.chars().take(200).collect());

    let invalid_grant = body.contains("invalid_grant")
        || body.contains("invalid_token")
        || body.contains("UNAUTHENTICATED");

    if status == 401 || invalid_grant {
        StorageError::AuthRequired(message)
    } else {
        StorageError::Backend(format!("HTTP {}: {}", status, message))
    }
}

#[async_trait]
impl DriveApi for DriveHttp {
    async fn find_folder(
        &self,
        token: &AccessToken,
        name: &str,
    ) -> StorageResult<Option<FolderHandle>> {
        let query = format!(
            "mimeType='{}' and name='{}' and trashed=false",
            FOLDER_MIME_TYPE,
            name.replace('\\', "\\\\").replace('\'', "\\'")
        );

        let response = self
            .client
            .get(format!("{}/files", self.api_base))
            .bearer_auth(token.secret())
            .query(&[("q", query.as_str()), ("fields", "files(id, name)")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::into_storage_error(response).await);
        }

        let list: FileList = response.json().await?;
        Ok(list.files.into_iter().next().map(|f| FolderHandle(f.id)))
    }

    async fn create_folder(&self, token: &AccessToken, name: &str) -> StorageResult<FolderHandle> {
        let response = self
            .client
            .post(format!("{}/files", self.api_base))
            .bearer_auth(token.secret())
            .query(&[("fields", "id, name")])
            .json(&serde_json::json!({
                "name": name,
                "mimeType": FOLDER_MIME_TYPE,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::into_storage_error(response).await);
        }

        let entry: FileListEntry = response.json().await?;
        Ok(FolderHandle(entry.id))
    }

    async fn upload_object(
        &self,
        token: &AccessToken,
        folder: &FolderHandle,
        name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<DriveFile> {
        // Drive's simple multipart upload is multipart/related: a JSON
        // metadata part followed by the media bytes.
        let metadata = serde_json::json!({
            "name": name,
            "parents": [folder.0],
        });
        let boundary = format!("fotodrop-{}", uuid::Uuid::new_v4().simple());

        let mut body = Vec::with_capacity(data.len() + 512);
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.extend_from_slice(metadata.to_string().as_bytes());
        body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(&data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        let response = self
            .client
            .post(format!("{}/files", self.upload_base))
            .bearer_auth(token.secret())
            .query(&[
                ("uploadType", "multipart"),
                ("fields", "id, name, webViewLink"),
            ])
            .header(
                "Content-Type",
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::into_storage_error(response).await);
        }

        Ok(response.json().await?)
    }
}
