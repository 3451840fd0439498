//! Session-scoped cache for probe verdicts and browse selections.
//!
//! One [`SessionCache`] is created per browsing session and injected into the
//! prober and the catalog store — there is no ambient global state. Verdicts
//! are keyed by the record's original logical `path` and live for the whole
//! session; they are never invalidated short of [`clear`](SessionCache::clear).
//!
//! Verdict writes are idempotent: two concurrent probes of the same uncached
//! path may both complete and both write, but they follow the same
//! deterministic resolution and converge to the same value, so the race is
//! benign by construction.

use std::sync::Mutex;

use dashmap::DashMap;
use tracing::debug;

use crate::catalog::store::{FilterState, SortKey};
use crate::probe::Verdict;

/// The last filter/sort selection used in this session, for restore-on-reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Active filter criteria.
    pub filter: FilterState,
    /// Active sort key.
    pub sort: SortKey,
}

/// Session-lifetime store shared between the prober and the catalog store.
#[derive(Debug, Default)]
pub struct SessionCache {
    /// Availability verdicts keyed by logical path.
    verdicts: DashMap<String, Verdict>,
    /// Last-used browse selection.
    selection: Mutex<Option<Selection>>,
}

impl SessionCache {
    /// Creates an empty session cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached verdict for `path`, if one exists.
    #[must_use]
    pub fn verdict(&self, path: &str) -> Option<Verdict> {
        self.verdicts.get(path).map(|entry| entry.clone())
    }

    /// Stores a verdict for `path`.
    ///
    /// Last write wins; concurrent probes of the same path converge to the
    /// same value, so this is safe to call from racing tasks.
    pub fn store_verdict(&self, path: &str, verdict: Verdict) {
        debug!(path, available = verdict.available, "caching verdict");
        self.verdicts.insert(path.to_string(), verdict);
    }

    /// Number of distinct paths with a cached verdict.
    #[must_use]
    pub fn verdict_count(&self) -> usize {
        self.verdicts.len()
    }

    /// Remembers the filter/sort selection for session restore.
    pub fn save_selection(&self, filter: FilterState, sort: SortKey) {
        let mut slot = self
            .selection
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *slot = Some(Selection { filter, sort });
    }

    /// Returns the last-saved selection, if any.
    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        self.selection
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Drops all verdicts and the saved selection (session end).
    pub fn clear(&self) {
        debug!(verdicts = self.verdicts.len(), "clearing session cache");
        self.verdicts.clear();
        let mut slot = self
            .selection
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *slot = None;
    }
}
