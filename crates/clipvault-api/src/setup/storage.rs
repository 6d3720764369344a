//! Remote store setup and initialization

use anyhow::Result;
use clipvault_core::Config;
use clipvault_storage::{create_store, RemoteStore};
use std::sync::Arc;

pub async fn setup_store(config: &Config) -> Result<Arc<dyn RemoteStore>> {
    tracing::info!("Initializing remote store...");
    let store = create_store(config).await?;
    tracing::info!(
        backend = %store.backend_type(),
        folder = %config.store.archive_folder,
        link_mode = ?config.store.link_mode,
        "Remote store initialized successfully"
    );
    Ok(store)
}
