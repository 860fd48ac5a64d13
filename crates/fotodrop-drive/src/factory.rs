//! Storage variant selection at startup.

use std::sync::Arc;

use fotodrop_core::{AuthVariant, Config};

use crate::api::DriveHttp;
use crate::oauth::OAuthStorage;
use crate::service_account::ServiceAccountStorage;
use crate::traits::RemoteStorage;

/// Build the configured `RemoteStorage` variant. Selection happens exactly
/// once; call sites never branch on the variant again.
pub fn create_storage(config: &Config) -> Arc<dyn RemoteStorage> {
    let http = reqwest::Client::new();
    let api = Arc::new(DriveHttp::new(http.clone()));

    match config.auth_variant() {
        AuthVariant::ServiceAccount => {
            tracing::info!(
                key_path = %config.service_account_key_path().display(),
                "using service-account Drive storage"
            );
            Arc::new(ServiceAccountStorage::new(
                config.service_account_key_path(),
                config.folder_name(),
                http,
                api,
            ))
        }
        AuthVariant::OAuth => {
            tracing::info!(
                credentials_path = %config.oauth_credentials_path().display(),
                token_path = %config.oauth_token_path().display(),
                "using OAuth Drive storage"
            );
            Arc::new(OAuthStorage::new(
                config.oauth_credentials_path(),
                config.oauth_token_path(),
                format!("http://localhost:{}/oauth2callback", config.server_port()),
                config.folder_name(),
                http,
                api,
            ))
        }
    }
}
