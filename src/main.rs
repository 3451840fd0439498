//! CLI entry point for the paperstack catalog browser.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use paperstack::{
    BrowseSession, CandidateResolver, CatalogStore, FeedError, FeedLoader, FilterState,
    HttpTransport, Limiter, Page, Prober, RowAvailability, RowState, SessionCache, SortKey,
    Verdict, ViewDriver,
};
use tracing::{debug, info};
use url::Url;

mod cli;

use cli::Args;

/// Display driver that prints rows and late verdicts to stdout.
struct ConsoleView;

impl ConsoleView {
    fn status(availability: RowAvailability) -> &'static str {
        match availability {
            RowAvailability::Available => "available",
            RowAvailability::Missing => "missing",
            RowAvailability::Checking => "checking...",
        }
    }
}

impl ViewDriver for ConsoleView {
    fn on_records_ready(&self, rows: &[RowState]) {
        if rows.is_empty() {
            println!("No records match the current filters.");
            return;
        }
        for row in rows {
            let year = row
                .record
                .year
                .map_or_else(|| "----".to_string(), |y| y.to_string());
            println!(
                "{year}  {title}  [{status}]",
                title = row.record.title,
                status = Self::status(row.availability)
            );
        }
    }

    fn on_verdict_resolved(&self, path: &str, verdict: &Verdict) {
        if let Verdict {
            available: true,
            resolved_candidate: Some(candidate),
        } = verdict
        {
            println!("  {path}: available at {}", display_link(candidate));
        } else if verdict.available {
            println!("  {path}: available");
        } else {
            println!("  {path}: missing");
        }
    }

    fn on_load_failed(&self, error: &FeedError) {
        eprintln!("Could not load the catalog feed: {error}");
    }
}

/// Percent-encodes the final path segment so the link survives spaces and
/// unicode in file names.
fn display_link(candidate: &str) -> String {
    match candidate.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/{}", urlencoding::encode(file)),
        None => urlencoding::encode(candidate).into_owned(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let sort: SortKey = args.sort.parse().map_err(|e: String| anyhow!(e))?;
    let filter_state = FilterState {
        search: args.search.clone(),
        year: args.year,
        tag: args.tag.clone(),
        availability: args.availability.parse().map_err(|e: String| anyhow!(e))?,
    };

    let cache = Arc::new(SessionCache::new());
    let limiter = Limiter::new(usize::from(args.concurrency))?;
    let resolver = match &args.mirror_base {
        Some(base) => CandidateResolver::with_mirror_base(base),
        None => CandidateResolver::new(),
    };
    let transport = match &args.base_url {
        Some(base) => {
            let base = Url::parse(base).with_context(|| format!("invalid base URL '{base}'"))?;
            HttpTransport::new().with_base(base)
        }
        None => HttpTransport::new(),
    };
    let prober = Prober::new(
        Arc::new(transport),
        resolver,
        limiter,
        Arc::clone(&cache),
    )
    .with_attempt_timeout(Duration::from_millis(args.timeout_ms));

    let view = Arc::new(ConsoleView);
    let mut session = BrowseSession::new(
        CatalogStore::new(Arc::clone(&cache)),
        prober,
        cache,
        view,
    );

    // Feed-load failure is the one error surfaced to the user.
    let loader = FeedLoader::new();
    let records = if args.feed.starts_with("http://") || args.feed.starts_with("https://") {
        loader.load_url(&args.feed).await
    } else {
        loader.load_file(Path::new(&args.feed)).await
    };
    let records = match records {
        Ok(records) => records,
        Err(error) => {
            // The view driver already reported the failure; exit non-zero
            // without printing it a second time.
            session.load_failed(&error);
            std::process::exit(1);
        }
    };

    session.load(&records);
    info!(
        records = session.store().len(),
        years = session.store().years().len(),
        tags = session.store().tags().len(),
        "catalog loaded"
    );

    let rows = session
        .show_page(
            &filter_state,
            sort,
            Page::new(args.page, usize::from(args.page_size)),
        )
        .await;

    debug!(rows = rows.len(), "page complete");
    Ok(())
}
