//! Catalog feed loading.
//!
//! The feed is a JSON array of loosely-shaped record objects fetched over
//! HTTP or read from disk. Parsing is all-or-nothing: a malformed feed
//! yields an error rather than a partial catalog, and that error is the one
//! failure surfaced to the user.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, instrument};

use super::record::{CatalogRecord, RawRecord};

/// HTTP connect timeout for feed requests (10 seconds).
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP read timeout for feed requests (30 seconds).
const READ_TIMEOUT_SECS: u64 = 30;

/// Errors raised while fetching or parsing the catalog feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The HTTP request itself failed (DNS, connect, read).
    #[error("failed to fetch feed from '{url}': {source}")]
    Network {
        /// Feed URL that was requested.
        url: String,
        /// Underlying client error.
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("feed request to '{url}' returned status {status}")]
    HttpStatus {
        /// Feed URL that was requested.
        url: String,
        /// Status code received.
        status: u16,
    },

    /// Reading a local feed file failed.
    #[error("failed to read feed file '{path}': {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The feed body is not a JSON array of records.
    #[error("malformed feed: {reason}")]
    Malformed {
        /// Parser diagnostic.
        reason: String,
    },
}

impl FeedError {
    pub(crate) fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    pub(crate) fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// Fetches and parses the catalog feed.
#[derive(Debug, Clone)]
pub struct FeedLoader {
    client: Client,
}

impl Default for FeedLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedLoader {
    /// Creates a loader with its own HTTP client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .gzip(true)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Parses a feed body into normalized records.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Malformed`] if the body is not a JSON array of
    /// record objects. No partial result is produced.
    pub fn parse_records(&self, body: &str) -> Result<Vec<CatalogRecord>, FeedError> {
        let raw: Vec<RawRecord> =
            serde_json::from_str(body).map_err(|e| FeedError::malformed(e.to_string()))?;
        let records: Vec<CatalogRecord> = raw.into_iter().map(CatalogRecord::from_raw).collect();
        debug!(records = records.len(), "feed parsed");
        Ok(records)
    }

    /// Fetches the feed from `url` and parses it.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Network`] on transport failure,
    /// [`FeedError::HttpStatus`] on a non-success response, and
    /// [`FeedError::Malformed`] if the body does not parse.
    #[instrument(skip(self))]
    pub async fn load_url(&self, url: &str) -> Result<Vec<CatalogRecord>, FeedError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::http_status(url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::network(url, e))?;
        self.parse_records(&body)
    }

    /// Reads the feed from a local file and parses it.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Io`] if the file cannot be read and
    /// [`FeedError::Malformed`] if its contents do not parse.
    #[instrument(skip(self))]
    pub async fn load_file(&self, path: &Path) -> Result<Vec<CatalogRecord>, FeedError> {
        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FeedError::io(path, e))?;
        self.parse_records(&body)
    }
}
