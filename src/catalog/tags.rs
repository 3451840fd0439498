//! Table-driven tag derivation from free text.
//!
//! Feeds carry no structured category field worth trusting; tags are derived
//! by scanning free-text fields (title, path, program, explicit tag strings)
//! for known keyword fragments and mapping them onto a small fixed
//! vocabulary. New categories are new table rows, not new code paths.
//!
//! Derivation is pure and deterministic: the same texts always yield the
//! same tag set.

use std::collections::BTreeSet;

/// Keyword fragment → vocabulary tag.
///
/// Fragments are matched case-insensitively as substrings, so spellings like
/// "CBCS scheme", "(cbcs)" or "cbcs-2021" all hit.
const TAG_RULES: &[(&str, &str)] = &[
    ("cbcs", "CBCS"),
    ("nep", "NEP"),
    ("supplementary", "Supplementary"),
    ("backlog", "Backlog"),
];

/// Derives the vocabulary tags present in any of the given texts.
///
/// A record may carry zero, one, or multiple tags.
pub fn derive_tags<'a, I>(texts: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tags = BTreeSet::new();
    for text in texts {
        let lowered = text.to_lowercase();
        for (fragment, tag) in TAG_RULES {
            if lowered.contains(fragment) {
                tags.insert((*tag).to_string());
            }
        }
    }
    tags
}

/// The full tag vocabulary, in table order.
#[must_use]
pub fn vocabulary() -> Vec<&'static str> {
    TAG_RULES.iter().map(|(_, tag)| *tag).collect()
}
