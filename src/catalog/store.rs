//! In-memory catalog store: filter, sort, paginate.
//!
//! The store holds the full normalized record set and answers queries
//! without touching the network. `query` is pure and synchronous: filtering
//! is conjunctive, sorting is stable, pagination partitions the filtered
//! sequence.
//!
//! Availability filtering reads the session cache. A record with no verdict
//! yet counts as *not available* for filtering purposes (an explicit policy
//! choice — the view layer still distinguishes "checking" from "missing").

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::probe::SessionCache;

use super::record::CatalogRecord;

/// Default number of records per page.
pub const PAGE_SIZE: usize = 12;

/// Availability filter criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AvailabilityFilter {
    /// No availability constraint.
    #[default]
    All,
    /// Only records with a positive verdict or feed-supplied availability.
    Available,
    /// Records known or assumed unavailable (including not-yet-probed ones).
    NotAvailable,
}

impl FromStr for AvailabilityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "available" => Ok(Self::Available),
            "not-available" => Ok(Self::NotAvailable),
            _ => Err(format!("invalid availability filter: {s}")),
        }
    }
}

/// Sort keys understood by [`CatalogStore::query`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Newest first; records with an unknown year last.
    #[default]
    YearDesc,
    /// Oldest first; records with an unknown year first.
    YearAsc,
    /// Title ascending (case-insensitive), path fallback.
    NameAsc,
    /// Title descending.
    NameDesc,
    /// Available records before unavailable/unknown ones, otherwise stable.
    AvailabilityFirst,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year-desc" => Ok(Self::YearDesc),
            "year-asc" => Ok(Self::YearAsc),
            "name-asc" => Ok(Self::NameAsc),
            "name-desc" => Ok(Self::NameDesc),
            "availability-first" => Ok(Self::AvailabilityFirst),
            _ => Err(format!("invalid sort key: {s}")),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::YearDesc => "year-desc",
            Self::YearAsc => "year-asc",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
            Self::AvailabilityFirst => "availability-first",
        };
        write!(f, "{name}")
    }
}

/// Active filter criteria; all active criteria must hold (conjunctive).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Case-insensitive substring over title/path/id/year/tags.
    pub search: Option<String>,
    /// Exact publication year.
    pub year: Option<u16>,
    /// Vocabulary tag membership.
    pub tag: Option<String>,
    /// Availability constraint.
    pub availability: AvailabilityFilter,
}

/// One page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Zero-based page index.
    pub index: usize,
    /// Records per page (≥ 1).
    pub size: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            index: 0,
            size: PAGE_SIZE,
        }
    }
}

impl Page {
    /// Creates a page request; a zero size is bumped to 1.
    #[must_use]
    pub fn new(index: usize, size: usize) -> Self {
        Self {
            index,
            size: size.max(1),
        }
    }
}

/// Holds the loaded record set and answers filter/sort/paginate queries.
#[derive(Debug)]
pub struct CatalogStore {
    records: Vec<CatalogRecord>,
    /// Distinct known years, newest first (filter option population).
    years: Vec<u16>,
    /// Distinct derived tags, sorted.
    tags: Vec<String>,
    cache: Arc<SessionCache>,
}

impl CatalogStore {
    /// Creates an empty store reading verdicts from `cache`.
    #[must_use]
    pub fn new(cache: Arc<SessionCache>) -> Self {
        Self {
            records: Vec::new(),
            years: Vec::new(),
            tags: Vec::new(),
            cache,
        }
    }

    /// Replaces the held record set with a defensive copy and rebuilds the
    /// year/tag indexes.
    pub fn load(&mut self, records: &[CatalogRecord]) {
        self.records = records.to_vec();

        let mut years: Vec<u16> = self.records.iter().filter_map(|r| r.year).collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        self.years = years;

        let mut tags: Vec<String> = self
            .records
            .iter()
            .flat_map(|r| r.tags.iter().cloned())
            .collect();
        tags.sort_unstable();
        tags.dedup();
        self.tags = tags;

        debug!(
            records = self.records.len(),
            years = self.years.len(),
            tags = self.tags.len(),
            "catalog loaded"
        );
    }

    /// Number of loaded records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct known years, newest first.
    #[must_use]
    pub fn years(&self) -> &[u16] {
        &self.years
    }

    /// Distinct derived tags, sorted.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Effective availability: feed-supplied value, else the cached verdict.
    ///
    /// `None` means no verdict yet (still unknown). Pathless records are
    /// never probeable, so the cache is not consulted for them — the empty
    /// string is not a usable verdict key.
    #[must_use]
    pub fn availability(&self, record: &CatalogRecord) -> Option<bool> {
        if record.path.is_empty() {
            return record.known_available;
        }
        record
            .known_available
            .or_else(|| self.cache.verdict(&record.path).map(|v| v.available))
    }

    /// The full filtered and sorted sequence (no pagination).
    #[must_use]
    pub fn query_all(&self, filter: &FilterState, sort: SortKey) -> Vec<CatalogRecord> {
        let mut matched: Vec<CatalogRecord> = self
            .records
            .iter()
            .filter(|record| self.matches(record, filter))
            .cloned()
            .collect();
        self.sort(&mut matched, sort);
        matched
    }

    /// One page of the filtered and sorted sequence.
    ///
    /// Page `k` holds the records at offset `k*size..k*size+size`; the final
    /// page may be shorter, and a page past the end is empty — never an
    /// error. Concatenating all pages in order reproduces `query_all`.
    #[must_use]
    pub fn query(&self, filter: &FilterState, sort: SortKey, page: Page) -> Vec<CatalogRecord> {
        let matched = self.query_all(filter, sort);
        matched
            .into_iter()
            .skip(page.index.saturating_mul(page.size))
            .take(page.size)
            .collect()
    }

    /// Conjunctive filter: every active criterion must hold.
    fn matches(&self, record: &CatalogRecord, filter: &FilterState) -> bool {
        if let Some(year) = filter.year {
            if record.year != Some(year) {
                return false;
            }
        }

        if let Some(tag) = &filter.tag {
            if !record.tags.contains(tag) {
                return false;
            }
        }

        match filter.availability {
            AvailabilityFilter::All => {}
            AvailabilityFilter::Available => {
                if self.availability(record) != Some(true) {
                    return false;
                }
            }
            // Unknown counts as not available for filtering.
            AvailabilityFilter::NotAvailable => {
                if self.availability(record) == Some(true) {
                    return false;
                }
            }
        }

        if let Some(search) = &filter.search {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty() && !record.haystack().contains(&needle) {
                return false;
            }
        }

        true
    }

    /// Stable sort by the requested key.
    fn sort(&self, records: &mut [CatalogRecord], sort: SortKey) {
        match sort {
            SortKey::YearDesc => records.sort_by(|a, b| match (a.year, b.year) {
                (Some(a), Some(b)) => b.cmp(&a),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }),
            SortKey::YearAsc => records.sort_by(|a, b| match (a.year, b.year) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => std::cmp::Ordering::Greater,
                (None, Some(_)) => std::cmp::Ordering::Less,
                (None, None) => std::cmp::Ordering::Equal,
            }),
            SortKey::NameAsc => records.sort_by_key(CatalogRecord::sort_name),
            SortKey::NameDesc => {
                records.sort_by(|a, b| b.sort_name().cmp(&a.sort_name()));
            }
            SortKey::AvailabilityFirst => {
                records.sort_by_key(|r| usize::from(self.availability(r) != Some(true)));
            }
        }
    }
}
