//! HTTP remote-file source.
//!
//! Downloads a URL once into a cache directory keyed by the URL digest, then
//! registers a `File` node describing the cached bytes. There is no retry:
//! any transport error or non-success status is returned to the caller.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use tokio::fs;
use tracing::{debug, info};

use super::{NodeStore, RemoteFileSource};
use crate::config::DownloadSettings;
use crate::core::digest::{content_digest, short_digest};
use crate::domain::{GraphNode, FILE_NODE_TYPE};

/// Remote-file source backed by reqwest
pub struct HttpFileSource {
    /// HTTP client
    client: reqwest::Client,
    /// Directory downloads are cached under
    cache_dir: PathBuf,
    /// Largest accepted body
    max_bytes: u64,
}

impl HttpFileSource {
    /// Create a source caching into `cache_dir`
    pub fn new(cache_dir: impl Into<PathBuf>, settings: &DownloadSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(settings.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            cache_dir: cache_dir.into(),
            max_bytes: settings.max_bytes,
        })
    }

    /// Create a source from the global configuration
    pub fn from_config() -> Result<Self> {
        let cfg = crate::config::config()?;
        Self::new(cfg.cache_dir.clone(), &cfg.download)
    }

    /// Where `url` is cached
    pub fn cache_path(&self, url: &Url) -> PathBuf {
        self.cache_dir
            .join(short_digest(url.as_str()))
            .join(file_name(url))
    }

    /// Fetch the body of `url`, enforcing the size limit while it streams in
    async fn download(&self, url: &Url) -> Result<(Vec<u8>, Option<String>)> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to request {}", url))?
            .error_for_status()
            .with_context(|| format!("Download of {} failed", url))?;

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                anyhow::bail!(
                    "Remote file {} is {} bytes, over the {} byte limit",
                    url,
                    len,
                    self.max_bytes
                );
            }
        }

        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?
        {
            // Bodies without a usable Content-Length are cut off here
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                anyhow::bail!(
                    "Remote file {} exceeds the {} byte limit",
                    url,
                    self.max_bytes
                );
            }
            body.extend_from_slice(&chunk);
        }

        Ok((body, mime))
    }
}

#[async_trait]
impl RemoteFileSource for HttpFileSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn materialize_remote_file(
        &self,
        url: &str,
        parent_id: &str,
        store: &dyn NodeStore,
    ) -> Result<GraphNode> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid remote file URL: '{}'", url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("Unsupported URL scheme '{}' in {}", parsed.scheme(), url);
        }

        let path = self.cache_path(&parsed);
        let (bytes, mime) = if fs::try_exists(&path).await.unwrap_or(false) {
            debug!(path = %path.display(), "Using cached download");
            let bytes = fs::read(&path)
                .await
                .with_context(|| format!("Failed to read cached file: {}", path.display()))?;
            (bytes, None)
        } else {
            let (bytes, mime) = self.download(&parsed).await?;
            write_atomic(&path, bytes.clone()).await?;
            info!(url = %parsed, size = bytes.len(), "Downloaded remote file");
            (bytes, mime)
        };

        let node = file_node(store, url, parent_id, &path, &bytes, mime);
        let id = store
            .register_node(node.clone())
            .await
            .with_context(|| format!("Failed to register file node for {}", url))?;

        Ok(GraphNode { id, ..node })
    }
}

/// Build the `File` node for cached bytes
fn file_node(
    store: &dyn NodeStore,
    url: &str,
    parent_id: &str,
    path: &Path,
    bytes: &[u8],
    mime: Option<String>,
) -> GraphNode {
    let id = store.create_node_id(&format!("{} >>> {} >>> {}", FILE_NODE_TYPE, parent_id, url));
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = path
        .file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let media_type = mime.unwrap_or_else(|| guess_media_type(&extension).to_string());

    GraphNode::new(id, FILE_NODE_TYPE)
        .with_parent(parent_id)
        .with_digest(content_digest(bytes))
        .with_field("url", url)
        .with_field("base", base)
        .with_field("name", name)
        .with_field("extension", extension)
        .with_field("size", bytes.len() as u64)
        .with_field("absolutePath", path.to_string_lossy().to_string())
        .with_field("mediaType", media_type)
}

/// Last path segment of a URL, or "file" when there is none
fn file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.last())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.chars()
                .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
                .collect()
        })
        .unwrap_or_else(|| "file".to_string())
}

fn guess_media_type(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Write through a temp file in the target directory, then rename
async fn write_atomic(path: &Path, bytes: Vec<u8>) -> Result<()> {
    let dir = path
        .parent()
        .context("Cache path has no parent directory")?
        .to_path_buf();
    fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        tmp.write_all(&bytes).context("Failed to write download")?;
        tmp.persist(&target)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to persist download: {}", target.display()))?;
        Ok(())
    })
    .await
    .context("Download writer task panicked")?
}
