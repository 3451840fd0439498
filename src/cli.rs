//! CLI argument definitions using clap derive macros.

use clap::Parser;

use paperstack::{DEFAULT_PROBE_CONCURRENCY, PAGE_SIZE};

/// Browse an archive of documents with live availability checks.
///
/// Paperstack loads a JSON catalog feed, filters and sorts it, and probes
/// each listed document's URL candidates to report what is actually
/// reachable right now.
#[derive(Parser, Debug)]
#[command(name = "paperstack")]
#[command(author, version, about)]
pub struct Args {
    /// Catalog feed: an http(s) URL or a local file path
    #[arg(short, long)]
    pub feed: String,

    /// Base URL that relative record paths are probed against
    #[arg(long)]
    pub base_url: Option<String>,

    /// Mirror base URL tried as a fallback candidate for relative paths
    #[arg(long)]
    pub mirror_base: Option<String>,

    /// Case-insensitive search over title, path, id, year and tags
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only records from this exact year
    #[arg(short, long)]
    pub year: Option<u16>,

    /// Only records carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Availability filter: all, available, not-available
    #[arg(long, default_value = "all")]
    pub availability: String,

    /// Sort order: year-desc, year-asc, name-asc, name-desc, availability-first
    #[arg(long, default_value = "year-desc")]
    pub sort: String,

    /// Zero-based page index
    #[arg(short, long, default_value_t = 0)]
    pub page: usize,

    /// Records per page (1-100)
    #[arg(long, default_value_t = PAGE_SIZE as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub page_size: u8,

    /// Maximum concurrent probe requests (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_PROBE_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Per-attempt probe timeout in milliseconds (100-60000)
    #[arg(long, default_value_t = 6000, value_parser = clap::value_parser!(u64).range(100..=60000))]
    pub timeout_ms: u64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
