// Fetch collaborator - pulls raw catalog text and manifests from wherever they live
// Local directories go through tokio::fs, http(s) roots through reqwest (`http` feature)

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// Source of raw catalog text, addressed by a path relative to some root
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    async fn fetch_text(&self, path: &str) -> Result<String>;
}

/// Reads catalog sources from a local directory
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Fetcher for FileFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        let full_path = self.root.join(path);
        tokio::fs::read_to_string(&full_path)
            .await
            .with_context(|| format!("failed to read {}", full_path.display()))
    }
}

/// Reads catalog sources relative to a base URL
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[cfg(feature = "http")]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("bad response from {}", url))?;

        response
            .text()
            .await
            .with_context(|| format!("failed to read body from {}", url))
    }
}

/// Serves sources from memory. Paths not in the map fail like a missing file.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    sources: HashMap<String, String>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, path: &str, text: &str) -> Self {
        self.sources.insert(path.to_string(), text.to_string());
        self
    }
}

impl Fetcher for MemoryFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        self.sources
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such source: {}", path))
    }
}

/// Any of the fetchers the binaries can pick at runtime from the config root
#[derive(Debug, Clone)]
pub enum SourceFetcher {
    File(FileFetcher),
    #[cfg(feature = "http")]
    Http(HttpFetcher),
}

impl SourceFetcher {
    /// `http://` and `https://` roots need the `http` feature, anything else is a directory
    pub fn for_root(root: &str) -> Result<Self> {
        let is_url = root.starts_with("http://") || root.starts_with("https://");

        #[cfg(feature = "http")]
        if is_url {
            return Ok(SourceFetcher::Http(HttpFetcher::new(root)));
        }

        if is_url {
            anyhow::bail!("catalog root {} is a URL but songbook was built without the `http` feature", root);
        }

        Ok(SourceFetcher::File(FileFetcher::new(root)))
    }
}

impl Fetcher for SourceFetcher {
    async fn fetch_text(&self, path: &str) -> Result<String> {
        match self {
            SourceFetcher::File(fetcher) => fetcher.fetch_text(path).await,
            #[cfg(feature = "http")]
            SourceFetcher::Http(fetcher) => fetcher.fetch_text(path).await,
        }
    }
}
