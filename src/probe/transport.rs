//! HTTP transport seam for availability checks.
//!
//! The prober never talks to `reqwest` directly; it goes through the
//! [`Transport`] trait so tests can substitute a counting mock and assert on
//! exactly how many network calls a probe issued. The production
//! implementation is [`HttpTransport`], a thin wrapper over one shared
//! `reqwest::Client`.
//!
//! Probe requests carry no bodies and no authentication headers. A check
//! answers one question only: did the HTTP layer return a success-class
//! response?

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

/// Default HTTP connect timeout for probe requests (10 seconds).
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default HTTP read timeout for probe requests (30 seconds).
///
/// The per-attempt probe timeout is tighter; this is a backstop on the
/// shared client itself.
const READ_TIMEOUT_SECS: u64 = 30;

/// Errors from a single transport-level check.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Network-level error (DNS resolution, connection refused, TLS, etc.)
    #[error("network error probing {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before a response arrived.
    #[error("timeout probing {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The candidate could not be turned into a dispatchable URL.
    #[error("invalid probe URL: {url}")]
    InvalidUrl {
        /// The candidate string that could not be resolved.
        url: String,
    },
}

impl TransportError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

/// Reachability checks issued by the prober.
///
/// `Ok(true)` means the HTTP layer returned a success-class status for the
/// candidate. `Ok(false)` means it answered with a non-success status.
/// Errors cover everything below the status line.
///
/// # Object Safety
///
/// Uses `async_trait` to support `Arc<dyn Transport>` dispatch; the prober
/// and its tests share the same seam.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Lightweight existence check (HEAD).
    async fn head(&self, url: &str) -> Result<bool, TransportError>;

    /// Full retrieval check (GET), used when HEAD is not answered reliably.
    async fn get(&self, url: &str) -> Result<bool, TransportError>;
}

/// Production transport over a shared `reqwest::Client`.
///
/// Candidate strings may be relative (the catalog's own origin); those are
/// resolved against the configured base URL at dispatch time. The candidate
/// string itself is what ends up in the verdict, so resolution here never
/// leaks into cached results.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base: Option<Url>,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    /// Creates a transport with default timeouts and no base URL.
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
            .user_agent(default_probe_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client, base: None }
    }

    /// Sets the base URL against which relative candidates are resolved.
    #[must_use]
    pub fn with_base(mut self, base: Url) -> Self {
        self.base = Some(base);
        self
    }

    /// Resolves a candidate string to a dispatchable URL.
    ///
    /// Absolute candidates parse directly; relative ones (including
    /// protocol-relative `//` forms) are joined against the base URL.
    fn resolve(&self, candidate: &str) -> Result<Url, TransportError> {
        if let Ok(url) = Url::parse(candidate) {
            return Ok(url);
        }
        match &self.base {
            Some(base) => base
                .join(candidate)
                .map_err(|_| TransportError::invalid_url(candidate)),
            None => Err(TransportError::invalid_url(candidate)),
        }
    }

    async fn send(&self, method: reqwest::Method, candidate: &str) -> Result<bool, TransportError> {
        let url = self.resolve(candidate)?;
        let response = self
            .client
            .request(method.clone(), url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::timeout(candidate)
                } else {
                    TransportError::network(candidate, e)
                }
            })?;

        let success = response.status().is_success();
        debug!(
            candidate,
            method = %method,
            status = response.status().as_u16(),
            success,
            "probe request answered"
        );
        Ok(success)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn head(&self, url: &str) -> Result<bool, TransportError> {
        self.send(reqwest::Method::HEAD, url).await
    }

    async fn get(&self, url: &str) -> Result<bool, TransportError> {
        self.send(reqwest::Method::GET, url).await
    }
}

/// User-Agent identifying probe traffic (good citizenship; RFC 9308).
fn default_probe_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("paperstack/{version} (archive-availability-check)")
}
