//! Browse session: the glue between catalog queries, probing, and a display.
//!
//! [`BrowseSession`] turns a filter/sort/page request into rows, hands them
//! to a [`ViewDriver`] immediately (rows with no verdict yet show as
//! *checking*), and spawns one probe per unresolved row. Each probe reports
//! back through the driver as it lands, so a slow host delays only its own
//! row. The display side implements [`ViewDriver`]; the binary ships a
//! console driver, tests use a recording one.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::catalog::feed::FeedError;
use crate::catalog::record::CatalogRecord;
use crate::catalog::store::{CatalogStore, FilterState, Page, SortKey};
use crate::probe::{Prober, Selection, SessionCache, Verdict};

/// Display state of one row's availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAvailability {
    /// A candidate answered, or the feed marked the record available.
    Available,
    /// All candidates failed, or the feed marked the record unavailable.
    Missing,
    /// No verdict yet; a probe may be in flight.
    Checking,
}

/// One displayable row: the record plus what we currently know about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowState {
    /// The catalog record backing this row.
    pub record: CatalogRecord,
    /// Availability as of page render time.
    pub availability: RowAvailability,
}

/// Callbacks a display implements to receive session events.
///
/// Methods are called from async tasks; implementations must be cheap and
/// non-blocking.
pub trait ViewDriver: Send + Sync {
    /// A page of rows is ready to render.
    fn on_records_ready(&self, rows: &[RowState]);

    /// A probe for `path` resolved after the page was rendered.
    fn on_verdict_resolved(&self, path: &str, verdict: &Verdict);

    /// The feed could not be loaded; nothing will be rendered.
    fn on_load_failed(&self, error: &FeedError);
}

/// Drives one browsing session over a loaded catalog.
pub struct BrowseSession {
    store: CatalogStore,
    prober: Prober,
    cache: Arc<SessionCache>,
    view: Arc<dyn ViewDriver>,
}

impl std::fmt::Debug for BrowseSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowseSession")
            .field("store", &self.store)
            .field("prober", &self.prober)
            .finish_non_exhaustive()
    }
}

impl BrowseSession {
    /// Creates a session over an empty catalog.
    ///
    /// `prober` and `store` are expected to share `cache` so that verdicts
    /// written by probes are visible to availability filtering.
    #[must_use]
    pub fn new(
        store: CatalogStore,
        prober: Prober,
        cache: Arc<SessionCache>,
        view: Arc<dyn ViewDriver>,
    ) -> Self {
        Self {
            store,
            prober,
            cache,
            view,
        }
    }

    /// Loads the record set into the catalog store.
    pub fn load(&mut self, records: &[CatalogRecord]) {
        self.store.load(records);
    }

    /// Reports a feed-load failure to the display.
    pub fn load_failed(&self, error: &FeedError) {
        warn!(error = %error, "feed load failed");
        self.view.on_load_failed(error);
    }

    /// The underlying catalog store.
    #[must_use]
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// The filter/sort selection saved by the last rendered page, if any.
    #[must_use]
    pub fn restore_selection(&self) -> Option<Selection> {
        self.cache.selection()
    }

    /// Renders one page: saves the selection, queries the store, notifies
    /// the display, and spawns probes for rows without a verdict.
    ///
    /// Returns only after every spawned probe has reported its verdict, so
    /// callers observe a fully resolved page. Each verdict is still pushed
    /// to the display the moment it lands.
    #[instrument(level = "debug", skip(self, filter))]
    pub async fn show_page(
        &self,
        filter: &FilterState,
        sort: SortKey,
        page: Page,
    ) -> Vec<RowState> {
        self.cache.save_selection(filter.clone(), sort);

        let records = self.store.query(filter, sort, page);
        let rows: Vec<RowState> = records
            .iter()
            .map(|record| RowState {
                record: record.clone(),
                availability: self.row_availability(record),
            })
            .collect();
        self.view.on_records_ready(&rows);

        let mut handles: Vec<JoinHandle<()>> = Vec::new();
        for row in &rows {
            if row.availability != RowAvailability::Checking {
                continue;
            }
            let prober = self.prober.clone();
            let view = Arc::clone(&self.view);
            let record = row.record.clone();
            handles.push(tokio::spawn(async move {
                let verdict = prober.probe(&record).await;
                view.on_verdict_resolved(&record.path, &verdict);
            }));
        }

        debug!(rows = rows.len(), probes = handles.len(), "page rendered");

        for handle in handles {
            if let Err(error) = handle.await {
                warn!(error = %error, "probe task panicked");
            }
        }

        rows
    }

    fn row_availability(&self, record: &CatalogRecord) -> RowAvailability {
        match self.store.availability(record) {
            Some(true) => RowAvailability::Available,
            Some(false) => RowAvailability::Missing,
            None => RowAvailability::Checking,
        }
    }
}
