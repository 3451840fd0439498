//! Availability probing for catalog records.
//!
//! The prober answers "is this record's file currently reachable?" at most
//! once per session per distinct logical path, with bounded total network
//! concurrency. It never errors: every probe resolves to a [`Verdict`], and
//! every transport failure is absorbed as a failed attempt.
//!
//! # Resolution order
//!
//! 1. `known_available` supplied by the feed short-circuits probing entirely.
//! 2. A cached verdict for the path is returned without network access.
//! 3. Otherwise candidates from the [`CandidateResolver`](crate::resolver)
//!    are tried in order through the [`Limiter`](crate::limiter): a HEAD
//!    check first, then a GET fallback when HEAD does not indicate success
//!    (some hosts do not answer HEAD reliably). The first success wins; each
//!    network call is bounded by a per-attempt timeout.
//! 4. The verdict is cached against the *original* path, not the resolved
//!    candidate, so repeated lookups skip resolution entirely.
//!
//! A probe success means only that an HTTP layer returned a success-class
//! response — not that the resource is byte-valid.

pub mod cache;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

pub use cache::{Selection, SessionCache};
pub use transport::{HttpTransport, Transport, TransportError};

use crate::catalog::record::CatalogRecord;
use crate::limiter::Limiter;
use crate::resolver::CandidateResolver;

/// Default per-attempt probe timeout (6 seconds).
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(6000);

/// The cached availability result for one logical path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether any candidate answered with a success-class response.
    pub available: bool,
    /// The candidate URL that answered, when one did.
    pub resolved_candidate: Option<String>,
}

impl Verdict {
    /// Verdict for a reachable resource, recording which candidate answered.
    #[must_use]
    pub fn found(candidate: impl Into<String>) -> Self {
        Self {
            available: true,
            resolved_candidate: Some(candidate.into()),
        }
    }

    /// Verdict for an unreachable resource.
    #[must_use]
    pub fn missing() -> Self {
        Self {
            available: false,
            resolved_candidate: None,
        }
    }
}

/// Availability prober with session-scoped caching and bounded concurrency.
///
/// Probing never mutates the record; verdicts are attached by the caller
/// (see [`BrowseSession`](crate::view::BrowseSession)).
#[derive(Clone)]
pub struct Prober {
    transport: Arc<dyn Transport>,
    resolver: CandidateResolver,
    limiter: Limiter,
    cache: Arc<SessionCache>,
    attempt_timeout: Duration,
}

impl std::fmt::Debug for Prober {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prober")
            .field("resolver", &self.resolver)
            .field("limiter", &self.limiter)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish_non_exhaustive()
    }
}

impl Prober {
    /// Creates a prober with the default per-attempt timeout.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        resolver: CandidateResolver,
        limiter: Limiter,
        cache: Arc<SessionCache>,
    ) -> Self {
        Self {
            transport,
            resolver,
            limiter,
            cache,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// Overrides the per-attempt timeout.
    #[must_use]
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Returns the session cache this prober writes verdicts into.
    #[must_use]
    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    /// Determines reachability for `record`.
    ///
    /// Infallible by contract: transport errors, timeouts and non-success
    /// statuses all collapse into the verdict. Concurrent probes of the same
    /// uncached path may both run; their cache writes converge to the same
    /// value.
    #[instrument(level = "debug", skip(self, record), fields(path = %record.path))]
    pub async fn probe(&self, record: &CatalogRecord) -> Verdict {
        // Feed-supplied availability takes precedence over probing.
        if let Some(known) = record.known_available {
            let verdict = if known && !record.path.is_empty() {
                Verdict::found(record.path.clone())
            } else if known {
                // Known-available but pathless: nothing to link to.
                Verdict {
                    available: true,
                    resolved_candidate: None,
                }
            } else {
                Verdict::missing()
            };
            // Pathless records share the empty-string key; never cache them.
            if !record.path.is_empty() {
                self.cache.store_verdict(&record.path, verdict.clone());
            }
            debug!(known, "verdict from feed, no network access");
            return verdict;
        }

        // A pathless record is never probeable.
        if record.path.is_empty() {
            return Verdict::missing();
        }

        if let Some(cached) = self.cache.verdict(&record.path) {
            debug!("verdict from cache, no network access");
            return cached;
        }

        for candidate in self.resolver.candidates(&record.path) {
            if self.check_candidate(&candidate).await {
                let verdict = Verdict::found(candidate);
                self.cache.store_verdict(&record.path, verdict.clone());
                return verdict;
            }
        }

        // All candidates exhausted: a definitive answer, not an error.
        let verdict = Verdict::missing();
        self.cache.store_verdict(&record.path, verdict.clone());
        verdict
    }

    /// Runs one bounded candidate check: HEAD, then GET fallback.
    async fn check_candidate(&self, candidate: &str) -> bool {
        let attempt = self.limiter.run(self.attempt(candidate)).await;
        match attempt {
            Ok(reachable) => reachable,
            Err(error) => {
                warn!(candidate, error = %error, "limiter rejected probe task");
                false
            }
        }
    }

    async fn attempt(&self, candidate: &str) -> bool {
        match timeout(self.attempt_timeout, self.transport.head(candidate)).await {
            Ok(Ok(true)) => return true,
            Ok(Ok(false)) => {
                debug!(candidate, "HEAD not successful, falling back to GET");
            }
            Ok(Err(error)) => {
                debug!(candidate, error = %error, "HEAD failed, falling back to GET");
            }
            Err(_) => {
                debug!(candidate, "HEAD timed out, falling back to GET");
            }
        }

        match timeout(self.attempt_timeout, self.transport.get(candidate)).await {
            Ok(Ok(reachable)) => reachable,
            Ok(Err(error)) => {
                debug!(candidate, error = %error, "GET failed");
                false
            }
            Err(_) => {
                debug!(candidate, "GET timed out");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// Transport mock with per-URL scripted responses and call counters.
    #[derive(Debug, Default)]
    struct ScriptedTransport {
        /// URL → (HEAD outcome, GET outcome); missing URLs answer false.
        responses: HashMap<String, (bool, bool)>,
        head_calls: AtomicUsize,
        get_calls: AtomicUsize,
        /// URLs whose HEAD errors instead of answering.
        head_errors: Vec<String>,
    }

    impl ScriptedTransport {
        fn respond(mut self, url: &str, head: bool, get: bool) -> Self {
            self.responses.insert(url.to_string(), (head, get));
            self
        }

        fn head_error(mut self, url: &str) -> Self {
            self.head_errors.push(url.to_string());
            self
        }

        fn total_calls(&self) -> usize {
            self.head_calls.load(Ordering::SeqCst) + self.get_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn head(&self, url: &str) -> Result<bool, TransportError> {
            self.head_calls.fetch_add(1, Ordering::SeqCst);
            if self.head_errors.iter().any(|u| u == url) {
                return Err(TransportError::invalid_url(url));
            }
            Ok(self.responses.get(url).is_some_and(|(head, _)| *head))
        }

        async fn get(&self, url: &str) -> Result<bool, TransportError> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.responses.get(url).is_some_and(|(_, get)| *get))
        }
    }

    fn prober_with(transport: ScriptedTransport) -> (Prober, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let prober = Prober::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            CandidateResolver::with_mirror_base("https://mirror.example/"),
            Limiter::new(6).unwrap(),
            Arc::new(SessionCache::new()),
        );
        (prober, transport)
    }

    fn record(path: &str) -> CatalogRecord {
        CatalogRecord::for_tests(path, None)
    }

    #[tokio::test]
    async fn test_known_available_short_circuits_without_network() {
        let (prober, transport) = prober_with(ScriptedTransport::default());
        let rec = CatalogRecord::for_tests("papers/a.pdf", Some(true));

        let verdict = prober.probe(&rec).await;

        assert!(verdict.available);
        assert_eq!(verdict.resolved_candidate.as_deref(), Some("papers/a.pdf"));
        assert_eq!(transport.total_calls(), 0);
        // And it is cached for later lookups.
        assert!(prober.cache().verdict("papers/a.pdf").is_some());
    }

    #[tokio::test]
    async fn test_known_unavailable_short_circuits_without_network() {
        let (prober, transport) = prober_with(ScriptedTransport::default());
        let rec = CatalogRecord::for_tests("papers/a.pdf", Some(false));

        let verdict = prober.probe(&rec).await;

        assert_eq!(verdict, Verdict::missing());
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_pathless_known_available_record_is_not_cached() {
        let (prober, transport) = prober_with(ScriptedTransport::default());
        let known = CatalogRecord::for_tests("", Some(true));

        let verdict = prober.probe(&known).await;

        assert!(verdict.available);
        assert_eq!(transport.total_calls(), 0);
        // The empty string is not a usable cache key: a later pathless
        // record with unknown availability must not inherit this verdict.
        assert!(prober.cache().verdict("").is_none());
        let unknown = prober.probe(&record("")).await;
        assert_eq!(unknown, Verdict::missing());
    }

    #[tokio::test]
    async fn test_empty_path_unavailable_with_zero_calls() {
        let (prober, transport) = prober_with(ScriptedTransport::default());

        let verdict = prober.probe(&record("")).await;

        assert_eq!(verdict, Verdict::missing());
        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_first_candidate_success_stops_resolution() {
        let transport = ScriptedTransport::default().respond("papers/a.pdf", true, true);
        let (prober, transport) = prober_with(transport);

        let verdict = prober.probe(&record("papers/a.pdf")).await;

        assert!(verdict.available);
        assert_eq!(verdict.resolved_candidate.as_deref(), Some("papers/a.pdf"));
        // One HEAD, no GET, mirror never tried.
        assert_eq!(transport.head_calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.get_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mirror_candidate_wins_when_relative_fails() {
        let transport = ScriptedTransport::default().respond(
            "https://mirror.example/papers/b.pdf",
            true,
            true,
        );
        let (prober, _) = prober_with(transport);

        let verdict = prober.probe(&record("papers/b.pdf")).await;

        assert!(verdict.available);
        assert_eq!(
            verdict.resolved_candidate.as_deref(),
            Some("https://mirror.example/papers/b.pdf")
        );
    }

    #[tokio::test]
    async fn test_head_failure_falls_back_to_get() {
        let transport = ScriptedTransport::default().respond("papers/c.pdf", false, true);
        let (prober, transport) = prober_with(transport);

        let verdict = prober.probe(&record("papers/c.pdf")).await;

        assert!(verdict.available);
        assert_eq!(transport.head_calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.get_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_head_error_falls_back_to_get() {
        let transport = ScriptedTransport::default()
            .respond("papers/d.pdf", false, true)
            .head_error("papers/d.pdf");
        let (prober, _) = prober_with(transport);

        let verdict = prober.probe(&record("papers/d.pdf")).await;
        assert!(verdict.available, "transport error must not sink the probe");
    }

    #[tokio::test]
    async fn test_all_candidates_exhausted_is_definitive_missing() {
        let (prober, transport) = prober_with(ScriptedTransport::default());

        let verdict = prober.probe(&record("papers/e.pdf")).await;

        assert_eq!(verdict, Verdict::missing());
        // Both candidates tried, HEAD and GET each: 4 calls.
        assert_eq!(transport.total_calls(), 4);
    }

    #[tokio::test]
    async fn test_second_probe_hits_cache_with_no_extra_calls() {
        let transport = ScriptedTransport::default().respond("papers/a.pdf", true, true);
        let (prober, transport) = prober_with(transport);
        let rec = record("papers/a.pdf");

        let first = prober.probe(&rec).await;
        let calls_after_first = transport.total_calls();
        let second = prober.probe(&rec).await;

        assert_eq!(first, second);
        assert_eq!(transport.total_calls(), calls_after_first);
    }

    #[tokio::test]
    async fn test_concurrent_probes_of_same_path_converge() {
        let transport = ScriptedTransport::default().respond("papers/a.pdf", true, true);
        let (prober, _) = prober_with(transport);

        let rec = record("papers/a.pdf");
        let (a, b) = tokio::join!(prober.probe(&rec), prober.probe(&rec));

        assert_eq!(a, b);
        assert_eq!(prober.cache().verdict_count(), 1);
    }

    #[tokio::test]
    async fn test_attempt_timeout_counts_as_candidate_failure() {
        /// Transport whose HEAD never answers and whose GET answers slowly.
        #[derive(Debug)]
        struct StalledTransport;

        #[async_trait]
        impl Transport for StalledTransport {
            async fn head(&self, _url: &str) -> Result<bool, TransportError> {
                std::future::pending().await
            }

            async fn get(&self, _url: &str) -> Result<bool, TransportError> {
                std::future::pending().await
            }
        }

        let prober = Prober::new(
            Arc::new(StalledTransport),
            CandidateResolver::new(),
            Limiter::new(6).unwrap(),
            Arc::new(SessionCache::new()),
        )
        .with_attempt_timeout(Duration::from_millis(20));

        let verdict = prober.probe(&record("papers/slow.pdf")).await;
        assert_eq!(verdict, Verdict::missing());
    }
}
