//! Catalog domain: record normalization, tag derivation, feed loading, and
//! the filter/sort/paginate store.

pub mod feed;
pub mod record;
pub mod store;
pub mod tags;

pub use feed::{FeedError, FeedLoader};
pub use record::{CatalogRecord, RawRecord};
pub use store::{AvailabilityFilter, CatalogStore, FilterState, Page, SortKey, PAGE_SIZE};
pub use tags::{derive_tags, vocabulary};
