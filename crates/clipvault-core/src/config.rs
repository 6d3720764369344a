//! Configuration module
//!
//! Configuration is read once at bootstrap and handed to the adapters when they are
//! constructed. Nothing below the setup layer reads the environment.

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::AudioFormat;
use crate::naming::NamingPolicy;
use crate::storage_types::{LinkMode, StorageBackend};

// Common constants
const SERVER_PORT: u16 = 3000;
const ARCHIVE_FOLDER: &str = "/audio";
const DROPBOX_API_URL: &str = "https://api.dropboxapi.com";
const DROPBOX_CONTENT_URL: &str = "https://content.dropboxapi.com";
const CLIP_NAME_PREFIX: &str = "Clip";
const ORDINAL_WIDTH: usize = 4;
const FIXED_CLIP_NAME: &str = "clip";
const MAX_AUDIO_SIZE_MB: usize = 100;
const MAX_CONCURRENT_TRANSCODES: usize = 2;
const TRANSCODE_TIMEOUT_SECS: u64 = 120;
const STORE_TIMEOUT_SECS: u64 = 30;
const LINK_TIMEOUT_SECS: u64 = 10;
const LINK_FANOUT_LIMIT: usize = 8;

/// Process-level settings.
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub static_dir: Option<PathBuf>,
}

/// Remote store identity and call limits.
#[derive(Clone)]
pub struct StoreConfig {
    pub backend: StorageBackend,
    pub dropbox_access_token: Option<String>,
    pub dropbox_api_url: String,
    pub dropbox_content_url: String,
    pub local_storage_path: Option<PathBuf>,
    pub local_storage_base_url: Option<String>,
    pub archive_folder: String,
    pub link_mode: LinkMode,
    pub store_timeout_secs: u64,
    pub link_timeout_secs: u64,
    pub link_fanout_limit: usize,
}

impl Debug for StoreConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field(
                "dropbox_access_token",
                &self.dropbox_access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("dropbox_api_url", &self.dropbox_api_url)
            .field("dropbox_content_url", &self.dropbox_content_url)
            .field("local_storage_path", &self.local_storage_path)
            .field("local_storage_base_url", &self.local_storage_base_url)
            .field("archive_folder", &self.archive_folder)
            .field("link_mode", &self.link_mode)
            .field("store_timeout_secs", &self.store_timeout_secs)
            .field("link_timeout_secs", &self.link_timeout_secs)
            .field("link_fanout_limit", &self.link_fanout_limit)
            .finish()
    }
}

/// Validation and transcoding settings.
#[derive(Clone, Debug)]
pub struct ProcessingConfig {
    pub target_format: AudioFormat,
    pub ffmpeg_path: String,
    pub max_concurrent_transcodes: usize,
    /// Exact MIME types or `audio/*`.
    pub allowed_audio_types: Vec<String>,
    pub max_audio_size_bytes: usize,
    pub upload_dir: PathBuf,
    pub transcode_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct NamingConfig {
    pub policy: NamingPolicy,
    pub display_label: Option<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub store: StoreConfig,
    pub processing: ProcessingConfig,
    pub naming: NamingConfig,
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn default_upload_dir() -> PathBuf {
    env::temp_dir().join("clipvault-uploads")
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            static_dir: non_empty("STATIC_DIR").map(PathBuf::from),
        };

        let backend = match non_empty("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::Dropbox,
        };
        let link_mode = match non_empty("LINK_MODE") {
            Some(raw) => raw.parse()?,
            None => LinkMode::Temporary,
        };

        let store = StoreConfig {
            backend,
            dropbox_access_token: non_empty("DROPBOX_ACCESS_TOKEN"),
            dropbox_api_url: non_empty("DROPBOX_API_URL")
                .unwrap_or_else(|| DROPBOX_API_URL.to_string()),
            dropbox_content_url: non_empty("DROPBOX_CONTENT_URL")
                .unwrap_or_else(|| DROPBOX_CONTENT_URL.to_string()),
            local_storage_path: non_empty("LOCAL_STORAGE_PATH").map(PathBuf::from),
            local_storage_base_url: non_empty("LOCAL_STORAGE_BASE_URL"),
            archive_folder: non_empty("ARCHIVE_FOLDER")
                .unwrap_or_else(|| ARCHIVE_FOLDER.to_string()),
            link_mode,
            store_timeout_secs: parse_or("STORE_TIMEOUT_SECS", STORE_TIMEOUT_SECS),
            link_timeout_secs: parse_or("LINK_TIMEOUT_SECS", LINK_TIMEOUT_SECS),
            link_fanout_limit: parse_or("LINK_FANOUT_LIMIT", LINK_FANOUT_LIMIT),
        };

        let target_format = match non_empty("TARGET_FORMAT") {
            Some(raw) => raw.parse()?,
            None => AudioFormat::Mp3,
        };

        let processing = ProcessingConfig {
            target_format,
            ffmpeg_path: non_empty("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            max_concurrent_transcodes: parse_or(
                "MAX_CONCURRENT_TRANSCODES",
                MAX_CONCURRENT_TRANSCODES,
            ),
            allowed_audio_types: split_list(
                &env::var("ALLOWED_AUDIO_TYPES").unwrap_or_else(|_| "audio/*".to_string()),
            ),
            max_audio_size_bytes: parse_or("MAX_AUDIO_SIZE_MB", MAX_AUDIO_SIZE_MB) * 1024 * 1024,
            upload_dir: non_empty("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_upload_dir),
            transcode_timeout_secs: parse_or("TRANSCODE_TIMEOUT_SECS", TRANSCODE_TIMEOUT_SECS),
        };

        let policy = match non_empty("NAMING_POLICY")
            .unwrap_or_else(|| "sequential".to_string())
            .to_lowercase()
            .as_str()
        {
            "sequential" => NamingPolicy::Sequential {
                prefix: non_empty("CLIP_NAME_PREFIX")
                    .unwrap_or_else(|| CLIP_NAME_PREFIX.to_string()),
                width: parse_or("ORDINAL_WIDTH", ORDINAL_WIDTH),
            },
            "fixed" => NamingPolicy::Fixed {
                name: non_empty("FIXED_CLIP_NAME").unwrap_or_else(|| FIXED_CLIP_NAME.to_string()),
            },
            other => return Err(anyhow::anyhow!("Invalid NAMING_POLICY: {}", other)),
        };

        let naming = NamingConfig {
            policy,
            display_label: non_empty("DISPLAY_LABEL"),
        };

        Ok(Config {
            base,
            store,
            processing,
            naming,
        })
    }

    /// Defaults for a local-filesystem store; used by development setups and tests.
    pub fn local(storage_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Config {
            base: BaseConfig {
                server_port: SERVER_PORT,
                cors_origins: vec!["*".to_string()],
                environment: "development".to_string(),
                static_dir: None,
            },
            store: StoreConfig {
                backend: StorageBackend::Local,
                dropbox_access_token: None,
                dropbox_api_url: DROPBOX_API_URL.to_string(),
                dropbox_content_url: DROPBOX_CONTENT_URL.to_string(),
                local_storage_path: Some(storage_path.into()),
                local_storage_base_url: Some(base_url.into()),
                archive_folder: ARCHIVE_FOLDER.to_string(),
                link_mode: LinkMode::Temporary,
                store_timeout_secs: STORE_TIMEOUT_SECS,
                link_timeout_secs: LINK_TIMEOUT_SECS,
                link_fanout_limit: LINK_FANOUT_LIMIT,
            },
            processing: ProcessingConfig {
                target_format: AudioFormat::Mp3,
                ffmpeg_path: "ffmpeg".to_string(),
                max_concurrent_transcodes: MAX_CONCURRENT_TRANSCODES,
                allowed_audio_types: vec!["audio/*".to_string()],
                max_audio_size_bytes: MAX_AUDIO_SIZE_MB * 1024 * 1024,
                upload_dir: default_upload_dir(),
                transcode_timeout_secs: TRANSCODE_TIMEOUT_SECS,
            },
            naming: NamingConfig {
                policy: NamingPolicy::Sequential {
                    prefix: CLIP_NAME_PREFIX.to_string(),
                    width: ORDINAL_WIDTH,
                },
                display_label: None,
            },
        }
    }

    /// Fail fast on misconfiguration.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        match self.store.backend {
            StorageBackend::Dropbox => {
                if self.store.dropbox_access_token.is_none() {
                    return Err(anyhow::anyhow!(
                        "DROPBOX_ACCESS_TOKEN must be set when using the dropbox backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.store.local_storage_path.is_none()
                    || self.store.local_storage_base_url.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when using the local backend"
                    ));
                }
            }
        }

        let folder = &self.store.archive_folder;
        if !folder.starts_with('/') || folder.len() < 2 || folder.ends_with('/') {
            return Err(anyhow::anyhow!(
                "ARCHIVE_FOLDER must be an absolute path like /audio (got '{}')",
                folder
            ));
        }
        if folder.split('/').any(|segment| segment == "..") {
            return Err(anyhow::anyhow!("ARCHIVE_FOLDER must not contain '..'"));
        }

        if self.processing.allowed_audio_types.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_AUDIO_TYPES must not be empty"));
        }
        if let Some(bad) = self
            .processing
            .allowed_audio_types
            .iter()
            .find(|t| !t.starts_with("audio/"))
        {
            return Err(anyhow::anyhow!(
                "ALLOWED_AUDIO_TYPES may only contain audio types (got '{}')",
                bad
            ));
        }
        if self.processing.target_format == AudioFormat::Unknown {
            return Err(anyhow::anyhow!("TARGET_FORMAT must be a concrete audio format"));
        }

        let limits = [
            ("MAX_AUDIO_SIZE_MB", self.processing.max_audio_size_bytes as u64),
            (
                "MAX_CONCURRENT_TRANSCODES",
                self.processing.max_concurrent_transcodes as u64,
            ),
            ("TRANSCODE_TIMEOUT_SECS", self.processing.transcode_timeout_secs),
            ("STORE_TIMEOUT_SECS", self.store.store_timeout_secs),
            ("LINK_TIMEOUT_SECS", self.store.link_timeout_secs),
            ("LINK_FANOUT_LIMIT", self.store.link_fanout_limit as u64),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, value)| *value == 0) {
            return Err(anyhow::anyhow!("{} must be greater than zero", name));
        }

        if let NamingPolicy::Sequential { prefix, width } = &self.naming.policy {
            if prefix.contains('/') || *width > 12 {
                return Err(anyhow::anyhow!(
                    "CLIP_NAME_PREFIX must not contain '/' and ORDINAL_WIDTH must be at most 12"
                ));
            }
        }
        if let NamingPolicy::Fixed { name } = &self.naming.policy {
            if name.contains('/') {
                return Err(anyhow::anyhow!("FIXED_CLIP_NAME must not contain '/'"));
            }
        }

        Ok(())
    }

    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.base.cors_origins
    }
}
