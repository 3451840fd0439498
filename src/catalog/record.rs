//! Record types and tolerant feed ingestion.
//!
//! Archive feeds are hand-maintained JSON and spell their fields many ways
//! (`file` vs `filename` vs `path`, `title` vs `name`, year as number or
//! string). [`RawRecord`] accepts all recognized spellings without failing on
//! absent fields; [`CatalogRecord`] is the normalized, immutable form the
//! rest of the crate works with.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tags::derive_tags;

/// Plausible publication year range for coercion and extraction.
const YEAR_MIN: u16 = 1900;
const YEAR_MAX: u16 = 2100;

/// Year field as it appears in the wild: a number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum YearField {
    /// `"year": 2021`
    Number(i64),
    /// `"year": "2021"`
    Text(String),
}

/// One feed entry, exactly as the data source spells it.
///
/// Every field is optional; absent fields never fail ingestion. Unknown
/// fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    /// Stable identifier, when the feed provides one.
    pub id: Option<String>,
    /// Course/paper code, used as the identifier when `id` is absent.
    pub code: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    /// Logical file location, under any of its spellings.
    pub path: Option<String>,
    pub file: Option<String>,
    pub filename: Option<String>,
    pub src: Option<String>,
    pub url: Option<String>,
    pub year: Option<YearField>,
    /// Free-text fields scanned for tag keywords.
    pub program: Option<String>,
    pub category: Option<String>,
    pub subject: Option<String>,
    pub university: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Availability supplied by the source; takes precedence over probing.
    pub available: Option<bool>,
    #[serde(rename = "availableText", alias = "available_text")]
    pub available_text: Option<String>,
    pub status: Option<String>,
}

/// One archived document, normalized at load time.
///
/// Immutable after construction; the availability verdict is derived state
/// attached by the caller, never written back into the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRecord {
    /// Identifier: provided id/code, else the path's file stem.
    pub id: String,
    /// Display title, falling back to the file name.
    pub title: String,
    /// Publication year, when known or extractable.
    pub year: Option<u16>,
    /// Tags from the fixed vocabulary, derived from free text.
    pub tags: BTreeSet<String>,
    /// Logical location: empty (never probeable), a URL, or a relative path.
    pub path: String,
    /// Feed-supplied availability; `None` triggers probing.
    pub known_available: Option<bool>,
}

impl CatalogRecord {
    /// Constructs a record directly (feeds go through [`from_raw`](Self::from_raw)).
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            year: None,
            tags: BTreeSet::new(),
            path: path.into(),
            known_available: None,
        }
    }

    /// Sets the publication year.
    #[must_use]
    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    /// Sets the feed-supplied availability.
    #[must_use]
    pub fn with_known_available(mut self, known: bool) -> Self {
        self.known_available = Some(known);
        self
    }

    /// Normalizes one raw feed entry.
    #[must_use]
    pub fn from_raw(raw: RawRecord) -> Self {
        let path = first_nonempty([raw.path, raw.file, raw.filename, raw.src, raw.url])
            .unwrap_or_default();

        let id = first_nonempty([raw.id, raw.code])
            .or_else(|| file_stem(&path).map(str::to_string))
            .unwrap_or_default();

        let title = first_nonempty([raw.title, raw.name])
            .or_else(|| file_name(&path).map(str::to_string))
            .unwrap_or_else(|| id.clone());

        let year = raw
            .year
            .and_then(coerce_year)
            .or_else(|| extract_year(&title))
            .or_else(|| extract_year(&path));

        let known_available = raw.available.or_else(|| {
            raw.available_text
                .as_deref()
                .or(raw.status.as_deref())
                .and_then(parse_availability_text)
        });

        let mut texts: Vec<&str> = vec![&title, &path];
        for field in [&raw.program, &raw.category, &raw.subject, &raw.university] {
            if let Some(text) = field {
                texts.push(text);
            }
        }
        if let Some(free_tags) = &raw.tags {
            texts.extend(free_tags.iter().map(String::as_str));
        }
        let tags = derive_tags(texts);

        debug!(id, path, ?year, ?known_available, "normalized feed record");

        Self {
            id,
            title,
            year,
            tags,
            path,
            known_available,
        }
    }

    /// Search haystack: title, path, id, year and tags, lowercased.
    #[must_use]
    pub fn haystack(&self) -> String {
        let mut haystack = format!("{} {} {}", self.title, self.path, self.id);
        if let Some(year) = self.year {
            haystack.push(' ');
            haystack.push_str(&year.to_string());
        }
        for tag in &self.tags {
            haystack.push(' ');
            haystack.push_str(tag);
        }
        haystack.to_lowercase()
    }

    /// Name used for name sorting: title, falling back to path.
    #[must_use]
    pub fn sort_name(&self) -> String {
        if self.title.is_empty() {
            self.path.to_lowercase()
        } else {
            self.title.to_lowercase()
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests(path: &str, known_available: Option<bool>) -> Self {
        let mut record = Self::new("test", "Test record", path);
        record.known_available = known_available;
        record
    }
}

/// First value that is non-empty after trimming.
fn first_nonempty<const N: usize>(values: [Option<String>; N]) -> Option<String> {
    values
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Last path segment, if any.
fn file_name(path: &str) -> Option<&str> {
    path.rsplit('/').next().filter(|s| !s.is_empty())
}

/// Last path segment without its extension.
fn file_stem(path: &str) -> Option<&str> {
    let name = file_name(path)?;
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => Some(stem),
        _ => Some(name),
    }
}

/// Coerces a raw year value into the plausible range.
fn coerce_year(year: YearField) -> Option<u16> {
    let value = match year {
        YearField::Number(n) => u16::try_from(n).ok()?,
        YearField::Text(s) => s.trim().parse::<u16>().ok()?,
    };
    (YEAR_MIN..=YEAR_MAX).contains(&value).then_some(value)
}

/// Pulls the first plausible four-digit year out of free text.
fn extract_year(text: &str) -> Option<u16> {
    year_pattern()
        .find(text)
        .and_then(|m| m.as_str().parse::<u16>().ok())
        .filter(|y| (YEAR_MIN..=YEAR_MAX).contains(y))
}

fn year_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    PATTERN.get_or_init(|| Regex::new(r"\b(19|20)\d{2}\b").expect("static year pattern is valid"))
}

/// Maps free-text availability markers onto a boolean.
///
/// Unrecognized text returns `None`, which triggers probing.
fn parse_availability_text(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "available" | "yes" | "true" | "uploaded" => Some(true),
        "not available" | "not-available" | "not uploaded" | "missing" | "no" | "false" => {
            Some(false)
        }
        _ => None,
    }
}
