use crate::traits::{FolderStatus, RemoteStore, StoreError, StoreResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use clipvault_core::{CommitMetadata, LinkMode, RemoteEntry};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

const API_ARG_HEADER: &str = "Dropbox-API-Arg";

#[derive(Debug, Serialize)]
struct UploadArg<'a> {
    path: &'a str,
    mode: &'a str,
    autorename: bool,
    mute: bool,
}

#[derive(Debug, Deserialize)]
struct FileMetadata {
    name: String,
    path_display: Option<String>,
    path_lower: Option<String>,
    id: Option<String>,
    #[serde(default)]
    size: u64,
    rev: Option<String>,
    content_hash: Option<String>,
    server_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ListFolderResult {
    entries: Vec<ListedEntry>,
    cursor: String,
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct ListedEntry {
    #[serde(rename = ".tag")]
    tag: String,
    name: String,
    path_lower: Option<String>,
    path_display: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TemporaryLink {
    link: String,
}

#[derive(Debug, Deserialize)]
struct SharedLink {
    url: String,
}

#[derive(Debug, Deserialize)]
struct SharedLinkList {
    links: Vec<SharedLink>,
}

/// Dropbox storage implementation over the HTTP API v2.
#[derive(Clone)]
pub struct DropboxStore {
    client: Client,
    api_url: String,
    content_url: String,
    access_token: String,
    link_mode: LinkMode,
}

impl Debug for DropboxStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DropboxStore")
            .field("api_url", &self.api_url)
            .field("content_url", &self.content_url)
            .field("link_mode", &self.link_mode)
            .finish()
    }
}

impl DropboxStore {
    /// Create a new DropboxStore instance
    ///
    /// # Arguments
    /// * `access_token` - OAuth bearer token
    /// * `api_url` - RPC endpoint host (e.g., "https://api.dropboxapi.com")
    /// * `content_url` - Content endpoint host (e.g., "https://content.dropboxapi.com")
    /// * `link_mode` - Whether archive links are temporary or shared
    /// * `timeout` - Per-request HTTP timeout
    pub fn new(
        access_token: String,
        api_url: String,
        content_url: String,
        link_mode: LinkMode,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(DropboxStore {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            content_url: content_url.trim_end_matches('/').to_string(),
            access_token,
            link_mode,
        })
    }

    /// POST a JSON body to an RPC endpoint and return the decoded JSON result.
    async fn rpc(&self, endpoint: &str, body: &Value) -> StoreResult<Value> {
        let url = format!("{}/2/{}", self.api_url, endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;

        Self::decode(endpoint, response).await
    }

    async fn decode(endpoint: &str, response: reqwest::Response) -> StoreResult<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let payload = serde_json::from_str::<Value>(&text).ok();
            let summary = payload
                .as_ref()
                .and_then(|p| p.get("error_summary"))
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| text.trim().to_string());

            tracing::debug!(
                endpoint = %endpoint,
                status = status.as_u16(),
                error_summary = %summary,
                "Dropbox request rejected"
            );

            return Err(StoreError::Api {
                status: status.as_u16(),
                summary,
                payload,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            StoreError::InvalidResponse(format!("{} returned malformed JSON: {}", endpoint, e))
        })
    }

    fn parse<T: for<'de> Deserialize<'de>>(endpoint: &str, value: Value) -> StoreResult<T> {
        serde_json::from_value(value).map_err(|e| {
            StoreError::InvalidResponse(format!("{} returned an unexpected shape: {}", endpoint, e))
        })
    }

    async fn temporary_link(&self, path: &str) -> StoreResult<String> {
        let value = self
            .rpc("files/get_temporary_link", &json!({ "path": path }))
            .await?;
        let link: TemporaryLink = Self::parse("files/get_temporary_link", value)?;
        Ok(link.link)
    }

    async fn shared_link(&self, path: &str) -> StoreResult<String> {
        let created = self
            .rpc(
                "sharing/create_shared_link_with_settings",
                &json!({ "path": path }),
            )
            .await;

        match created {
            Ok(value) => {
                let link: SharedLink =
                    Self::parse("sharing/create_shared_link_with_settings", value)?;
                Ok(link.url)
            }
            Err(err) if has_error_tag(&err, "shared_link_already_exists") => {
                if let Some(url) = existing_shared_url(&err) {
                    return Ok(url);
                }

                tracing::debug!(path = %path, "Shared link exists, looking it up");
                let value = self
                    .rpc(
                        "sharing/list_shared_links",
                        &json!({ "path": path, "direct_only": true }),
                    )
                    .await?;
                let list: SharedLinkList = Self::parse("sharing/list_shared_links", value)?;
                list.links
                    .into_iter()
                    .next()
                    .map(|link| link.url)
                    .ok_or_else(|| {
                        StoreError::InvalidResponse(format!(
                            "shared link for {} reported as existing but none was listed",
                            path
                        ))
                    })
            }
            Err(err) => Err(err),
        }
    }
}

/// True when the service error summary starts with `tag`, e.g. `path/conflict`.
fn has_error_tag(err: &StoreError, tag: &str) -> bool {
    match err {
        StoreError::Api { summary, .. } => summary.starts_with(tag),
        _ => false,
    }
}

fn existing_shared_url(err: &StoreError) -> Option<String> {
    match err {
        StoreError::Api {
            payload: Some(payload),
            ..
        } => payload
            .pointer("/error/shared_link_already_exists/metadata/url")
            .and_then(Value::as_str)
            .map(String::from),
        _ => None,
    }
}

/// Dropbox-API-Arg travels in an HTTP header, which must stay ASCII.
fn header_safe_json(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

#[async_trait]
impl RemoteStore for DropboxStore {
    async fn ensure_folder(&self, path: &str) -> StoreResult<FolderStatus> {
        let result = self
            .rpc(
                "files/create_folder_v2",
                &json!({ "path": path, "autorename": false }),
            )
            .await;

        match result {
            Ok(_) => {
                tracing::info!(folder = %path, "Dropbox folder created");
                Ok(FolderStatus::Created)
            }
            Err(err) if has_error_tag(&err, "path/conflict") => {
                tracing::debug!(folder = %path, "Dropbox folder already exists");
                Ok(FolderStatus::AlreadyExists)
            }
            Err(err) => {
                tracing::error!(folder = %path, error = %err, "Dropbox folder creation failed");
                Err(err)
            }
        }
    }

    async fn commit(&self, path: &str, data: Bytes) -> StoreResult<CommitMetadata> {
        let arg = UploadArg {
            path,
            mode: "add",
            autorename: true,
            mute: false,
        };
        let arg = serde_json::to_string(&arg)
            .map_err(|e| StoreError::InvalidPath(format!("{}: {}", path, e)))?;
        let size = data.len();
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(format!("{}/2/files/upload", self.content_url))
            .bearer_auth(&self.access_token)
            .header(API_ARG_HEADER, header_safe_json(&arg))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await?;

        let value = Self::decode("files/upload", response).await.map_err(|e| {
            tracing::error!(
                error = %e,
                remote_path = %path,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Dropbox upload failed"
            );
            e
        })?;
        let meta: FileMetadata = Self::parse("files/upload", value)?;

        tracing::info!(
            remote_path = %path,
            stored_name = %meta.name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Dropbox upload successful"
        );

        let canonical = meta
            .path_display
            .or(meta.path_lower)
            .unwrap_or_else(|| path.to_string());

        Ok(CommitMetadata {
            name: meta.name,
            path: canonical,
            id: meta.id,
            size: meta.size,
            rev: meta.rev,
            content_hash: meta.content_hash,
            server_modified: meta.server_modified,
        })
    }

    async fn list(&self, folder: &str) -> StoreResult<Vec<RemoteEntry>> {
        let first = self
            .rpc(
                "files/list_folder",
                &json!({ "path": folder, "recursive": false }),
            )
            .await;

        let mut page: ListFolderResult = match first {
            Ok(value) => Self::parse("files/list_folder", value)?,
            Err(err) if has_error_tag(&err, "path/not_found") => {
                tracing::debug!(folder = %folder, "Dropbox folder missing, listing as empty");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        let mut entries = Vec::new();
        loop {
            entries.extend(
                page.entries
                    .into_iter()
                    .filter(|entry| entry.tag == "file")
                    .map(|entry| {
                        let path = entry
                            .path_lower
                            .or(entry.path_display)
                            .unwrap_or_else(|| format!("{}/{}", folder, entry.name));
                        RemoteEntry::new(entry.name, path)
                    }),
            );

            if !page.has_more {
                break;
            }

            let value = self
                .rpc(
                    "files/list_folder/continue",
                    &json!({ "cursor": page.cursor }),
                )
                .await?;
            page = Self::parse("files/list_folder/continue", value)?;
        }

        tracing::debug!(folder = %folder, count = entries.len(), "Dropbox folder listed");
        Ok(entries)
    }

    async fn resolve_link(&self, path: &str) -> StoreResult<String> {
        match self.link_mode {
            LinkMode::Temporary => self.temporary_link(path).await,
            LinkMode::Shared => self.shared_link(path).await,
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Dropbox
    }
}
