//! Paperstack Core Library
//!
//! This library provides the core functionality for the paperstack tool,
//! which turns a JSON feed of archived documents into a browsable,
//! availability-checked catalog.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`catalog`] - Record normalization, feed loading, filter/sort/paginate
//! - [`resolver`] - Candidate URL resolution for a record's path
//! - [`probe`] - Availability probing with session caching
//! - [`limiter`] - Bounded-concurrency task gate for probe traffic
//! - [`view`] - Browse session wiring catalog, prober and a display driver

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod limiter;
pub mod probe;
pub mod resolver;
pub mod view;

// Re-export commonly used types
pub use catalog::{
    AvailabilityFilter, CatalogRecord, CatalogStore, FeedError, FeedLoader, FilterState, Page,
    PAGE_SIZE, SortKey,
};
pub use limiter::{DEFAULT_PROBE_CONCURRENCY, Limiter, LimiterError};
pub use probe::{
    DEFAULT_ATTEMPT_TIMEOUT, HttpTransport, Prober, Selection, SessionCache, Transport,
    TransportError, Verdict,
};
pub use resolver::CandidateResolver;
pub use view::{BrowseSession, RowAvailability, RowState, ViewDriver};
