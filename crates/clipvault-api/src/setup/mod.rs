//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use clipvault_core::Config;
use clipvault_processing::FfmpegTranscoder;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(config = ?config, "Configuration loaded and validated successfully");

    tokio::fs::create_dir_all(&config.processing.upload_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create upload directory {}",
                config.processing.upload_dir.display()
            )
        })?;

    let store = storage::setup_store(&config).await?;

    let transcoder = Arc::new(FfmpegTranscoder::new(
        config.processing.ffmpeg_path.clone(),
        config.processing.upload_dir.clone(),
        config.processing.max_concurrent_transcodes,
    ));

    let state = Arc::new(AppState::new(config.clone(), store, transcoder)?);
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
