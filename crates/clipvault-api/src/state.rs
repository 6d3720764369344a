//! Application state shared by all handlers.
//!
//! Everything here is read-only after bootstrap; the remote store is the only source of
//! archive state.

use clipvault_core::{Config, NamingResolver};
use clipvault_processing::{MediaValidator, Transcoder};
use clipvault_storage::RemoteStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn RemoteStore>,
    pub transcoder: Arc<dyn Transcoder>,
    pub naming: NamingResolver,
    pub validator: MediaValidator,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn RemoteStore>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Result<Self, anyhow::Error> {
        let naming = NamingResolver::new(config.naming.policy.clone())
            .map_err(|e| anyhow::anyhow!("Invalid naming policy: {}", e))?;
        let validator = MediaValidator::new(
            config.processing.max_audio_size_bytes,
            config.processing.allowed_audio_types.clone(),
        );

        Ok(Self {
            config,
            store,
            transcoder,
            naming,
            validator,
        })
    }
}
