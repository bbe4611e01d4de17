//! Artifact sources.
//!
//! A [`DatasetSource`] turns a dataset key into raw response bytes. The loader
//! does not care where they come from:
//! - [`HttpSource`]: static file server or CDN (the normal deployment)
//! - [`LocalDirSource`]: an artifact directory on disk
//! - scripted sources in tests

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, instrument};

use atlas_common::{AtlasError, DatasetKey, FetchFailure};

/// Read-only access to the artifact routes.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetch the body stored under `key`.
    ///
    /// Fails with a [`FetchFailure`] carrying the status when the backend
    /// answered with a non-success code, or without one when the request
    /// could not be completed.
    async fn fetch(&self, key: &DatasetKey) -> Result<Vec<u8>, FetchFailure>;

    /// Human-readable location, for logs and the status endpoint.
    fn describe(&self) -> String;
}

// ── HTTP ─────────────────────────────────────────────────────────────────────

/// Fetches artifacts with HTTP GET against `base_url + key`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: Url,
}

impl HttpSource {
    pub fn new(base_url: &str) -> Result<Self, AtlasError> {
        let client = Client::builder()
            .user_agent(concat!("sae-atlas/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AtlasError::Other(e.into()))?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, AtlasError> {
        // Url::join replaces the last segment unless the base ends in '/'
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| AtlasError::Config(format!("invalid base URL {base_url:?}: {e}")))?;
        Ok(Self { client, base_url })
    }

    pub fn url_for(&self, key: &DatasetKey) -> Result<Url, FetchFailure> {
        self.base_url
            .join(key.as_str())
            .map_err(|e| FetchFailure::network(key.clone(), e.to_string()))
    }
}

#[async_trait]
impl DatasetSource for HttpSource {
    #[instrument(skip(self), fields(key = %key))]
    async fn fetch(&self, key: &DatasetKey) -> Result<Vec<u8>, FetchFailure> {
        let url = self.url_for(key)?;
        debug!(%url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchFailure::network(key.clone(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::status(key.clone(), status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchFailure::network(key.clone(), e.to_string()))?;
        debug!(bytes = body.len(), "Fetched");
        Ok(body.to_vec())
    }

    fn describe(&self) -> String {
        self.base_url.to_string()
    }
}

// ── Local directory ──────────────────────────────────────────────────────────

/// Reads artifacts from `<root>/<key>`. A missing file reports status 404 so
/// it behaves like the static server would.
#[derive(Debug, Clone)]
pub struct LocalDirSource {
    root: PathBuf,
}

impl LocalDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DatasetSource for LocalDirSource {
    async fn fetch(&self, key: &DatasetKey) -> Result<Vec<u8>, FetchFailure> {
        let path = self.root.join(key.as_str());
        debug!(path = %path.display(), "Reading artifact");
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FetchFailure::status(key.clone(), 404),
            _ => FetchFailure::network(key.clone(), e.to_string()),
        })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
