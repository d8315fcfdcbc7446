//! Image fetching for story illustrations.
//!
//! The pipeline reaches the network through the [`ImageFetcher`] trait so
//! exports can be driven by an in-memory fake in tests and offline tooling.
//! Fetches are issued one at a time, in story order; a fetch finishes
//! (successfully or not) before the next page is constructed.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// Errors that can occur while fetching an illustration.
#[derive(Debug)]
pub enum FetchError {
    /// The HTTP request failed or returned a non-success status.
    Http(reqwest::Error),
    /// The fetcher has no entry for the requested URL.
    NotFound(String),
    /// The fetcher could not serve the request for an internal reason.
    Failed {
        /// The requested URL.
        url: String,
        /// Description of what went wrong.
        reason: String,
    },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(err) => write!(f, "HTTP image fetch failed: {err}"),
            Self::NotFound(url) => write!(f, "No image available for {url}"),
            Self::Failed { url, reason } => write!(f, "Fetching {url} failed: {reason}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::NotFound(_) | Self::Failed { .. } => None,
        }
    }
}

/// Source of illustration bytes, keyed by URL.
///
/// Implementations must be usable behind a shared reference; the exporter
/// calls [`ImageFetcher::fetch`] once per cover and page image, sequentially.
pub trait ImageFetcher: fmt::Debug + Send + Sync {
    /// Fetches the raw, still-encoded image bytes for `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Short name used in log lines.
    fn name(&self) -> &'static str {
        "ImageFetcher"
    }
}

/// Fetcher that issues plain HTTP GET requests.
///
/// Illustrations are treated as public resources: no cookies or credentials
/// are attached.  Failed requests are not retried; the caller downgrades to
/// text rendering instead.  Timeouts are left to the client's defaults.
#[derive(Debug)]
pub struct HttpImageFetcher {
    client: reqwest::blocking::Client,
}

impl HttpImageFetcher {
    /// Creates a fetcher with a default client.
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send()?.error_for_status()?;
        let bytes = response.bytes()?;
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &'static str {
        "HttpImageFetcher"
    }
}

/// Fetcher backed by a pre-populated in-memory map.
#[derive(Debug, Default)]
pub struct InMemoryImageFetcher {
    images: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryImageFetcher {
    /// Creates an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers image bytes under a URL.
    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) -> Result<(), FetchError> {
        let url = url.into();
        let mut images = self.images.write().map_err(|_| FetchError::Failed {
            url: url.clone(),
            reason: "image store lock poisoned".to_string(),
        })?;
        images.insert(url, bytes);
        Ok(())
    }
}

impl ImageFetcher for InMemoryImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let images = self.images.read().map_err(|_| FetchError::Failed {
            url: url.to_string(),
            reason: "image store lock poisoned".to_string(),
        })?;
        images
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }

    fn name(&self) -> &'static str {
        "InMemoryImageFetcher"
    }
}
