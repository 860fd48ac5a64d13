//! OAuth storage variant and its credential store.
//!
//! This is the one externally observable state machine in the system:
//! `Unconfigured` until an authorization code has been exchanged and the
//! token persisted, `Authorized` while the persisted token is usable, and
//! `Expired` once the backend reports the grant invalid — at which point the
//! persisted record is destroyed and uploads fail until re-authorization.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use fotodrop_core::{StagedFile, UploadedFile};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::api::{AccessToken, DriveApi};
use crate::error::{StorageError, StorageResult};
use crate::resolver::FolderResolver;
use crate::traits::RemoteStorage;

const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// OAuth client credentials, from the Google Cloud Console download
/// (`credentials.json`, either the `web` or `installed` section).
#[derive(Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Deserialize)]
struct SecretsFile {
    web: Option<ClientSecrets>,
    installed: Option<ClientSecrets>,
}

/// Persisted token record. Whatever the token exchange returned is kept via
/// the flattened `extra` map; the typed fields are the ones we act on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TokenRecord {
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => at <= Utc::now(),
            None => false,
        }
    }
}

/// Raw token endpoint response (code exchange and refresh).
#[derive(Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

impl TokenExchangeResponse {
    fn into_record(self, previous_refresh: Option<String>) -> TokenRecord {
        TokenRecord {
            access_token: self.access_token,
            // Google omits the refresh token on re-exchange; keep the old one.
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: self.expires_in.map(|s| Utc::now() + Duration::seconds(s)),
            extra: self.extra,
        }
    }
}

/// Externally observable credential state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialState {
    Unconfigured,
    Authorized,
    Expired,
}

/// Process-wide owner of the OAuth credential state. The state only moves
/// through `persist` (→ Authorized) and `invalidate` (→ Expired); everything
/// else is read-only.
pub struct CredentialStore {
    token_path: PathBuf,
    inner: RwLock<(CredentialState, Option<TokenRecord>)>,
}

impl CredentialStore {
    /// Load the persisted token, if any, so authorization survives restarts.
    pub fn load(token_path: impl Into<PathBuf>) -> Self {
        let token_path = token_path.into();
        let inner = match std::fs::read_to_string(&token_path)
            .ok()
            .and_then(|raw| serde_json::from_str::<TokenRecord>(&raw).ok())
        {
            Some(record) => {
                tracing::info!(path = %token_path.display(), "loaded persisted OAuth token");
                (CredentialState::Authorized, Some(record))
            }
            None => (CredentialState::Unconfigured, None),
        };

        CredentialStore {
            token_path,
            inner: RwLock::new(inner),
        }
    }

    pub async fn state(&self) -> CredentialState {
        self.inner.read().await.0
    }

    pub async fn is_authorized(&self) -> bool {
        self.inner.read().await.1.is_some()
    }

    pub async fn current(&self) -> Option<TokenRecord> {
        self.inner.read().await.1.clone()
    }

    /// Persist a fresh token and transition to `Authorized`.
    pub async fn persist(&self, record: TokenRecord) -> StorageResult<()> {
        let raw = serde_json::to_string(&record)
            .map_err(|e| StorageError::Config(format!("failed to serialize token: {}", e)))?;
        tokio::fs::write(&self.token_path, raw).await?;

        *self.inner.write().await = (CredentialState::Authorized, Some(record));
        tracing::info!(path = %self.token_path.display(), "persisted OAuth token");
        Ok(())
    }

    /// Discard the persisted token after the backend reported the grant
    /// invalid. File removal is best-effort.
    pub async fn invalidate(&self) {
        if let Err(err) = tokio::fs::remove_file(&self.token_path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.token_path.display(),
                    error = %err,
                    "failed to remove invalidated token file"
                );
            }
        }
        *self.inner.write().await = (CredentialState::Expired, None);
        tracing::warn!("OAuth grant invalidated; re-authorization required");
    }
}

pub struct OAuthStorage {
    credentials_path: PathBuf,
    fallback_redirect_uri: String,
    secrets: RwLock<Option<ClientSecrets>>,
    store: CredentialStore,
    http: reqwest::Client,
    api: Arc<dyn DriveApi>,
    resolver: FolderResolver,
}

impl OAuthStorage {
    pub fn new(
        credentials_path: impl Into<PathBuf>,
        token_path: impl Into<PathBuf>,
        fallback_redirect_uri: impl Into<String>,
        folder_name: impl Into<String>,
        http: reqwest::Client,
        api: Arc<dyn DriveApi>,
    ) -> Self {
        OAuthStorage {
            credentials_path: credentials_path.into(),
            fallback_redirect_uri: fallback_redirect_uri.into(),
            secrets: RwLock::new(None),
            store: CredentialStore::load(token_path),
            http,
            api,
            resolver: FolderResolver::new(folder_name),
        }
    }

    pub fn credential_store(&self) -> &CredentialStore {
        &self.store
    }

    async fn secrets(&self) -> StorageResult<ClientSecrets> {
        if let Some(secrets) = self.secrets.read().await.clone() {
            return Ok(secrets);
        }
        let secrets = load_secrets(&self.credentials_path)?;
        *self.secrets.write().await = Some(secrets.clone());
        Ok(secrets)
    }

    fn redirect_uri(&self, secrets: &ClientSecrets) -> String {
        secrets
            .redirect_uris
            .first()
            .cloned()
            .unwrap_or_else(|| self.fallback_redirect_uri.clone())
    }

    /// Current bearer token, refreshing first when it is past expiry and a
    /// refresh token is available. A stale token without a refresh token is
    /// attached as-is; the backend's rejection drives invalidation.
    async fn access_token(&self) -> StorageResult<AccessToken> {
        let record = self.store.current().await.ok_or_else(|| {
            StorageError::AuthRequired(
                "no OAuth authorization; an operator must visit /auth first".to_string(),
            )
        })?;

        if record.is_expired() {
            if let Some(refresh_token) = record.refresh_token.clone() {
                return self.refresh(record, refresh_token).await;
            }
        }

        Ok(AccessToken::new(record.access_token))
    }

    async fn refresh(
        &self,
        record: TokenRecord,
        refresh_token: String,
    ) -> StorageResult<AccessToken> {
        let secrets = self.secrets().await?;
        let response = self
            .http
            .post(&secrets.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let err = crate::api::map_error_body(status, &body);
            if matches!(err, StorageError::AuthRequired(_)) {
                self.store.invalidate().await;
            }
            return Err(err);
        }

        let exchanged: TokenExchangeResponse = response.json().await?;
        let refreshed = exchanged.into_record(record.refresh_token);
        let token = AccessToken::new(refreshed.access_token.clone());
        self.store.persist(refreshed).await?;
        tracing::info!("refreshed OAuth access token");
        Ok(token)
    }

    /// Run a Drive call and fold an auth rejection into the state machine.
    async fn gate_auth<T>(&self, result: StorageResult<T>) -> StorageResult<T> {
        if let Err(StorageError::AuthRequired(_)) = &result {
            self.store.invalidate().await;
        }
        result
    }
}

fn load_secrets(path: &Path) -> StorageResult<ClientSecrets> {
    let contents = std::fs::read_to_string(path).map_err(|_| {
        StorageError::Config(format!(
            "credentials.json not found; create an OAuth 2.0 Client ID in the Google Cloud \
             Console and save it at {}",
            path.display()
        ))
    })?;
    let file: SecretsFile = serde_json::from_str(&contents).map_err(|e| {
        StorageError::Config(format!(
            "credentials file at {} is not valid: {}",
            path.display(),
            e
        ))
    })?;
    file.web.or(file.installed).ok_or_else(|| {
        StorageError::Config(format!(
            "credentials file at {} has neither a 'web' nor an 'installed' section",
            path.display()
        ))
    })
}

#[async_trait]
impl RemoteStorage for OAuthStorage {
    async fn is_authorized(&self) -> bool {
        self.store.is_authorized().await
    }

    async fn auth_url(&self) -> Option<StorageResult<String>> {
        let secrets = match self.secrets().await {
            Ok(secrets) => secrets,
            Err(err) => return Some(Err(err)),
        };

        let url = format!(
            "{}?response_type=code&access_type=offline&prompt=consent&client_id={}&redirect_uri={}&scope={}",
            secrets.auth_uri,
            urlencoding::encode(&secrets.client_id),
            urlencoding::encode(&self.redirect_uri(&secrets)),
            urlencoding::encode(DRIVE_FILE_SCOPE),
        );
        Some(Ok(url))
    }

    async fn complete_authorization(&self, code: &str) -> StorageResult<()> {
        let secrets = self.secrets().await?;
        let redirect_uri = self.redirect_uri(&secrets);
        let response = self
            .http
            .post(&secrets.token_uri)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::AuthRequired(format!(
                "authorization code exchange failed (HTTP {}): {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let exchanged: TokenExchangeResponse = response.json().await?;
        self.store.persist(exchanged.into_record(None)).await
    }

    async fn upload(&self, staged: &StagedFile) -> StorageResult<UploadedFile> {
        let token = self.access_token().await?;

        let resolved = self.resolver.resolve(self.api.as_ref(), &token).await;
        let folder = self.gate_auth(resolved).await?;

        let data = tokio::fs::read(staged.path()).await?;
        let uploaded = self
            .api
            .upload_object(
                &token,
                &folder,
                staged.original_name(),
                staged.content_type(),
                data,
            )
            .await;
        let file = self.gate_auth(uploaded).await?;

        tracing::info!(file = %staged.original_name(), id = %file.id, "uploaded to Drive");
        Ok(UploadedFile {
            name: staged.original_name().to_string(),
            id: file.id,
            web_view_link: file.web_view_link,
        })
    }
}
