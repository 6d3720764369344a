//! Route configuration and setup

use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use clipvault_core::{Config, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

const API_ROUTES: [&str; 3] = ["/upload", "/archive", "/health"];

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;
    let body_limit = config
        .processing
        .max_audio_size_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let mut app = Router::new()
        .route("/upload", post(handlers::upload::upload_audio))
        .route("/archive", get(handlers::archive::list_archive))
        .route("/health", get(handlers::health::liveness_check))
        .with_state(state);

    if let Some((mount, root)) = local_mount(config) {
        if collides_with_api(&mount) {
            return Err(anyhow::anyhow!(
                "LOCAL_STORAGE_BASE_URL path {} collides with an API route",
                mount
            ));
        }
        tracing::info!(mount = %mount, root = %root.display(), "Serving local archive files");
        app = app.nest_service(&mount, ServeDir::new(root));
    }

    if let Some(static_dir) = &config.base.static_dir {
        tracing::info!(dir = %static_dir.display(), "Serving static assets");
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    let app = app
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

/// Path under which the local backend's files are reachable, from LOCAL_STORAGE_BASE_URL.
fn local_mount(config: &Config) -> Option<(String, PathBuf)> {
    if config.store.backend != StorageBackend::Local {
        return None;
    }
    let base_url = config.store.local_storage_base_url.as_deref()?;
    let root = config.store.local_storage_path.clone()?;

    let authority_and_path = base_url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(base_url);
    let path = authority_and_path
        .find('/')
        .map(|i| &authority_and_path[i..])
        .unwrap_or("")
        .trim_end_matches('/');

    if path.is_empty() {
        None
    } else {
        Some((path.to_string(), root))
    }
}

/// Whether the first segment of `mount` is one of the API routes.
fn collides_with_api(mount: &str) -> bool {
    let first = mount.trim_start_matches('/').split('/').next().unwrap_or("");
    API_ROUTES
        .iter()
        .any(|route| route.trim_start_matches('/') == first)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<HeaderValue>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true)
    };
    Ok(cors)
}
