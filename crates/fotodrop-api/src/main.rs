use std::sync::Arc;

use fotodrop_api::{build_router, server, AppState};
use fotodrop_core::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    tokio::fs::create_dir_all(config.uploads_dir()).await?;

    let storage = fotodrop_drive::create_storage(&config);
    let state = Arc::new(AppState::new(config.clone(), storage));
    let router = build_router(state);

    server::start_server(&config, router).await
}
