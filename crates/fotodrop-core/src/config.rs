//! Configuration module
//!
//! Environment-driven configuration for the upload server and the Drive
//! adapter. Everything is read once at startup into an owned `Config`;
//! handlers and services only see accessor methods.

use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_FILE_SIZE_BYTES: usize = 100 * 1024 * 1024;
const DEFAULT_MAX_FILES_PER_BATCH: usize = 10;
const DEFAULT_FOLDER_NAME: &str = "Event Photos";

/// Which credential source the Drive adapter uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthVariant {
    /// Service-account key file; no interactive authorize flow.
    ServiceAccount,
    /// OAuth client credentials with a persisted, refresh-capable token.
    OAuth,
}

impl AuthVariant {
    fn parse(value: &str) -> Result<Self, anyhow::Error> {
        match value.to_lowercase().as_str() {
            "service-account" | "service_account" => Ok(AuthVariant::ServiceAccount),
            "oauth" => Ok(AuthVariant::OAuth),
            other => Err(anyhow::anyhow!(
                "DRIVE_AUTH must be 'service-account' or 'oauth', got '{}'",
                other
            )),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    server_port: u16,
    frontend_url: Option<String>,
    uploads_dir: PathBuf,
    folder_name: String,
    auth_variant: AuthVariant,
    service_account_key_path: PathBuf,
    oauth_credentials_path: PathBuf,
    oauth_token_path: PathBuf,
    max_file_size_bytes: usize,
    max_files_per_batch: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        // Missing .env is fine; env vars may come from the process environment.
        let _ = dotenvy::dotenv();

        let server_port = match env::var("PORT") {
            Ok(port) => port
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("PORT must be a number, got '{}'", port))?,
            Err(_) => DEFAULT_PORT,
        };

        let config = Config {
            server_port,
            frontend_url: env::var("FRONTEND_URL").ok(),
            uploads_dir: env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            folder_name: env::var("DRIVE_FOLDER_NAME")
                .unwrap_or_else(|_| DEFAULT_FOLDER_NAME.to_string()),
            auth_variant: match env::var("DRIVE_AUTH") {
                Ok(value) => AuthVariant::parse(&value)?,
                Err(_) => AuthVariant::ServiceAccount,
            },
            service_account_key_path: env::var("SERVICE_ACCOUNT_KEY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("service-account-key.json")),
            oauth_credentials_path: env::var("OAUTH_CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("credentials.json")),
            oauth_token_path: env::var("OAUTH_TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("token.json")),
            max_file_size_bytes: parse_usize_env("MAX_FILE_SIZE_BYTES")?
                .unwrap_or(DEFAULT_MAX_FILE_SIZE_BYTES),
            max_files_per_batch: parse_usize_env("MAX_FILES_PER_BATCH")?
                .unwrap_or(DEFAULT_MAX_FILES_PER_BATCH),
            allowed_extensions: default_allowed_extensions(),
            allowed_content_types: default_allowed_content_types(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_files_per_batch == 0 {
            return Err(anyhow::anyhow!("MAX_FILES_PER_BATCH must be at least 1"));
        }
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_BYTES must be at least 1"));
        }
        Ok(())
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    /// Externally reachable base URL for the upload page (QR target).
    pub fn frontend_url(&self) -> String {
        self.frontend_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.server_port))
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn folder_name(&self) -> &str {
        &self.folder_name
    }

    pub fn auth_variant(&self) -> AuthVariant {
        self.auth_variant
    }

    pub fn service_account_key_path(&self) -> &Path {
        &self.service_account_key_path
    }

    pub fn oauth_credentials_path(&self) -> &Path {
        &self.oauth_credentials_path
    }

    pub fn oauth_token_path(&self) -> &Path {
        &self.oauth_token_path
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_bytes
    }

    pub fn max_files_per_batch(&self) -> usize {
        self.max_files_per_batch
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.allowed_content_types
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Config {
    /// Build a config for tests without touching the environment.
    pub fn for_tests(uploads_dir: PathBuf) -> Self {
        Config {
            server_port: DEFAULT_PORT,
            frontend_url: None,
            uploads_dir,
            folder_name: DEFAULT_FOLDER_NAME.to_string(),
            auth_variant: AuthVariant::ServiceAccount,
            service_account_key_path: PathBuf::from("service-account-key.json"),
            oauth_credentials_path: PathBuf::from("credentials.json"),
            oauth_token_path: PathBuf::from("token.json"),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_files_per_batch: DEFAULT_MAX_FILES_PER_BATCH,
            allowed_extensions: default_allowed_extensions(),
            allowed_content_types: default_allowed_content_types(),
        }
    }
}

fn parse_usize_env(key: &str) -> Result<Option<usize>, anyhow::Error> {
    match env::var(key) {
        Ok(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{} must be a number, got '{}'", key, value)),
        Err(_) => Ok(None),
    }
}

fn default_allowed_extensions() -> Vec<String> {
    ["jpeg", "jpg", "png", "gif", "mp4", "mov", "avi", "mkv", "webm"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_allowed_content_types() -> Vec<String> {
    [
        "image/jpeg",
        "image/jpg",
        "image/png",
        "image/gif",
        "video/mp4",
        "video/quicktime",
        "video/x-msvideo",
        "video/x-matroska",
        "video/webm",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
