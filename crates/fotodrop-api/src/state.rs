//! Application state shared by all handlers.

use std::sync::Arc;

use fotodrop_core::Config;
use fotodrop_drive::RemoteStorage;

use crate::stager::Stager;

/// Owned, injectable state: the storage adapter and the stager are built once
/// at startup and handed to the router, so tests can run against fresh,
/// independent instances instead of ambient process state.
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn RemoteStorage>,
    pub stager: Stager,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn RemoteStorage>) -> Self {
        let stager = Stager::from_config(&config);
        AppState {
            config,
            storage,
            stager,
        }
    }
}
