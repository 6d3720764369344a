use crate::{DropboxStore, LocalStore, RemoteStore, StorageBackend, StoreError, StoreResult};
use clipvault_core::Config;
use std::sync::Arc;
use std::time::Duration;

/// Create a remote store based on configuration
pub async fn create_store(config: &Config) -> StoreResult<Arc<dyn RemoteStore>> {
    let store = &config.store;

    match store.backend {
        StorageBackend::Dropbox => {
            let token = store.dropbox_access_token.clone().ok_or_else(|| {
                StoreError::ConfigError("DROPBOX_ACCESS_TOKEN not configured".to_string())
            })?;

            let dropbox = DropboxStore::new(
                token,
                store.dropbox_api_url.clone(),
                store.dropbox_content_url.clone(),
                store.link_mode,
                Duration::from_secs(store.store_timeout_secs),
            )?;
            Ok(Arc::new(dropbox))
        }

        StorageBackend::Local => {
            let base_path = store.local_storage_path.clone().ok_or_else(|| {
                StoreError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = store.local_storage_base_url.clone().ok_or_else(|| {
                StoreError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;

            let local = LocalStore::new(base_path, base_url).await?;
            Ok(Arc::new(local))
        }
    }
}
