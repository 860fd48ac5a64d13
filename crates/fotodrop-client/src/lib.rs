//! Headless upload client for the fotodrop API.
//!
//! The browser page keeps an ordered pending-file list, filters it by MIME
//! type, submits one multipart request with progress reporting, and
//! reconciles the server's response into UI state. `UploadController` is the
//! same state machine for CLI tooling and tests.

pub mod progress;

use std::path::Path;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use bytes::Bytes;
use fotodrop_core::UploadResponse;
use tokio::sync::mpsc::{self, UnboundedReceiver};

pub use progress::{UploadEvent, UploadOutcome};

/// MIME types the picker accepts, mirroring the server's allow-list.
const ACCEPTED_TYPES: [&str; 9] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "video/mp4",
    "video/quicktime",
    "video/x-msvideo",
    "video/x-matroska",
    "video/webm",
];

/// One selected-but-not-yet-submitted file.
#[derive(Clone, Debug)]
pub struct PendingFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Bytes) -> Self {
        PendingFile {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Load from disk, inferring the content type from the extension.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("not a file path: {}", path.display()))?
            .to_string();
        let content_type = content_type_for(&name).to_string();
        let data = Bytes::from(std::fs::read(path)?);
        Ok(PendingFile {
            name,
            content_type,
            data,
        })
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

fn content_type_for(name: &str) -> &'static str {
    match Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

/// Human-readable size with binary (1024-based) prefixes, two decimal places
/// at most: `0 Bytes`, `1.5 KB`, `1 MB`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    let exponent = (((bytes as f64).ln() / 1024f64.ln()).floor() as usize).min(UNITS.len() - 1);
    let value = ((bytes as f64 / 1024f64.powi(exponent as i32)) * 100.0).round() / 100.0;
    format!("{} {}", value, UNITS[exponent])
}

/// Outcome of reconciliation, for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

/// Client-side upload state: an ordered pending list plus the submit flow.
pub struct UploadController {
    base_url: String,
    client: reqwest::Client,
    pending: Vec<PendingFile>,
}

impl UploadController {
    pub fn new(base_url: impl Into<String>) -> Self {
        UploadController {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            pending: Vec::new(),
        }
    }

    /// Add files to the pending list, dropping any with a type outside the
    /// allow-list. Returns how many were skipped so the caller can warn.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = PendingFile>) -> usize {
        let mut skipped = 0;
        for file in files {
            if ACCEPTED_TYPES.contains(&file.content_type.as_str()) {
                self.pending.push(file);
            } else {
                tracing::debug!(file = %file.name, content_type = %file.content_type, "skipping unsupported type");
                skipped += 1;
            }
        }
        skipped
    }

    pub fn pending(&self) -> &[PendingFile] {
        &self.pending
    }

    /// Remove by display position; later entries keep their relative order.
    pub fn remove(&mut self, index: usize) -> Option<PendingFile> {
        if index < self.pending.len() {
            Some(self.pending.remove(index))
        } else {
            None
        }
    }

    /// The submit action is disabled whenever nothing is pending.
    pub fn submit_enabled(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Submit every pending file as one multipart request. Events arrive on
    /// the returned channel: zero or more `Progress`, then exactly one
    /// `Completed` or `Failed`. The pending list is left untouched until the
    /// outcome is reconciled.
    pub fn submit(&self) -> UnboundedReceiver<UploadEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.client.clone();
        let url = format!("{}/api/upload", self.base_url.trim_end_matches('/'));
        let files = self.pending.clone();

        tokio::spawn(async move {
            let total: u64 = files.iter().map(PendingFile::size).sum();
            let sent = Arc::new(AtomicU64::new(0));

            let mut form = reqwest::multipart::Form::new();
            for file in files {
                let size = file.size();
                let stream =
                    progress::progress_chunks(file.data, sent.clone(), total, tx.clone());
                let part = reqwest::multipart::Part::stream_with_length(
                    reqwest::Body::wrap_stream(stream),
                    size,
                )
                .file_name(file.name.clone());
                let part = match part.mime_str(&file.content_type) {
                    Ok(part) => part,
                    Err(err) => {
                        let _ = tx.send(UploadEvent::Failed(format!(
                            "'{}' has an invalid content type: {}",
                            file.name, err
                        )));
                        return;
                    }
                };
                form = form.part("files", part);
            }

            let response = match client.post(&url).multipart(form).send().await {
                Ok(response) => response,
                Err(err) => {
                    let _ = tx.send(UploadEvent::Failed(format!("connection error: {}", err)));
                    return;
                }
            };

            let status = response.status().as_u16();
            let outcome = match status {
                200 => match response.json::<UploadResponse>().await {
                    Ok(body) => UploadOutcome::Accepted(body),
                    Err(err) => {
                        let _ =
                            tx.send(UploadEvent::Failed(format!("malformed response: {}", err)));
                        return;
                    }
                },
                401 => {
                    let auth_url = response
                        .json::<serde_json::Value>()
                        .await
                        .ok()
                        .and_then(|v| v["authUrl"].as_str().map(String::from));
                    UploadOutcome::Unauthorized { auth_url }
                }
                other => UploadOutcome::ServerError(other),
            };
            let _ = tx.send(UploadEvent::Completed(outcome));
        });

        rx
    }

    /// Fold the terminal event back into controller state.
    ///
    /// A successful batch clears the pending list; an unauthorized or failed
    /// submit keeps it so the same selection can be retried.
    pub fn reconcile(&mut self, event: &UploadEvent) -> StatusMessage {
        match event {
            UploadEvent::Completed(UploadOutcome::Accepted(response)) if response.success => {
                self.pending.clear();
                let text = if response.errors.is_empty() {
                    response.message.clone()
                } else {
                    format!("{} ({} failed)", response.message, response.errors.len())
                };
                StatusMessage {
                    kind: StatusKind::Success,
                    text,
                }
            }
            UploadEvent::Completed(UploadOutcome::Accepted(response)) => StatusMessage {
                kind: StatusKind::Error,
                text: format!("upload failed: {}", response.message),
            },
            UploadEvent::Completed(UploadOutcome::Unauthorized { .. }) => StatusMessage {
                kind: StatusKind::Error,
                text: "The system is not connected to Drive yet. Please try again later."
                    .to_string(),
            },
            UploadEvent::Completed(UploadOutcome::ServerError(status)) => StatusMessage {
                kind: StatusKind::Error,
                text: format!("server error (HTTP {}); please try again", status),
            },
            UploadEvent::Failed(reason) => StatusMessage {
                kind: StatusKind::Error,
                text: format!("error: {}", reason),
            },
            UploadEvent::Progress(_) => StatusMessage {
                kind: StatusKind::Error,
                text: "upload still in progress".to_string(),
            },
        }
    }
}
