//! Candidate URL resolution for logical record paths.
//!
//! A record's `path` is a logical location: it may be an absolute URL, a
//! source-hosting "blob" view URL, or a path relative to the catalog's own
//! origin. The [`CandidateResolver`] expands one logical path into an ordered
//! list of concrete URLs worth trying, most-likely-correct first. The prober
//! tries them in order and stops at the first success.
//!
//! Resolution is pure string work — no I/O, fully deterministic.

use tracing::debug;

/// Host segment of GitHub's HTML "blob" view URLs.
const BLOB_HOST: &str = "github.com";

/// Host segment serving raw file content for the same repositories.
const RAW_HOST: &str = "raw.githubusercontent.com";

/// Expands one logical path into an ordered list of candidate URLs.
///
/// An optional raw-content mirror base (e.g. a `raw.githubusercontent.com`
/// prefix for the repository that hosts the archive) is appended as a second
/// candidate for relative paths. Without one, relative paths produce a single
/// candidate.
#[derive(Debug, Clone, Default)]
pub struct CandidateResolver {
    /// Raw-content base URL for the mirror candidate, if configured.
    mirror_base: Option<String>,
}

impl CandidateResolver {
    /// Creates a resolver without a mirror base.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver with a raw-content mirror base URL.
    ///
    /// A missing trailing slash is added so that concatenation with a
    /// stripped relative path always forms a well-shaped URL.
    #[must_use]
    pub fn with_mirror_base(mirror_base: impl Into<String>) -> Self {
        let mut mirror_base = mirror_base.into();
        if !mirror_base.ends_with('/') {
            mirror_base.push('/');
        }
        Self {
            mirror_base: Some(mirror_base),
        }
    }

    /// Returns the configured mirror base, if any.
    #[must_use]
    pub fn mirror_base(&self) -> Option<&str> {
        self.mirror_base.as_deref()
    }

    /// Produces the ordered candidate list for `path`.
    ///
    /// - Absolute URLs are tried as-is first; a GitHub blob view URL
    ///   additionally yields its raw-content rewrite as a second candidate.
    /// - Relative paths are tried as-is first, then against the mirror base
    ///   (leading slash stripped) when one is configured.
    /// - An empty path yields no candidates.
    #[must_use]
    pub fn candidates(&self, path: &str) -> Vec<String> {
        if path.is_empty() {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        if is_absolute_url(path) {
            candidates.push(path.to_string());
            if let Some(raw) = blob_to_raw(path) {
                candidates.push(raw);
            }
        } else {
            candidates.push(path.to_string());
            if let Some(base) = &self.mirror_base {
                candidates.push(format!("{base}{}", path.trim_start_matches('/')));
            }
        }

        debug!(path, count = candidates.len(), "resolved candidates");
        candidates
    }
}

/// Returns true for `http://`, `https://` and protocol-relative `//` paths.
fn is_absolute_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//")
}

/// Rewrites a GitHub blob view URL to its raw-content equivalent.
///
/// `https://github.com/o/r/blob/main/f.pdf` becomes
/// `https://raw.githubusercontent.com/o/r/main/f.pdf`. Returns `None` when
/// the URL is not a blob view URL.
fn blob_to_raw(url: &str) -> Option<String> {
    if url.contains(BLOB_HOST) && url.contains("/blob/") {
        Some(url.replace(BLOB_HOST, RAW_HOST).replacen("/blob/", "/", 1))
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_yields_no_candidates() {
        let resolver = CandidateResolver::with_mirror_base("https://mirror.example/files/");
        assert!(resolver.candidates("").is_empty());
    }

    #[test]
    fn test_absolute_url_tried_as_is() {
        let resolver = CandidateResolver::with_mirror_base("https://mirror.example/files/");
        let candidates = resolver.candidates("https://example.com/paper.pdf");
        assert_eq!(candidates, vec!["https://example.com/paper.pdf"]);
    }

    #[test]
    fn test_protocol_relative_url_counts_as_absolute() {
        let resolver = CandidateResolver::with_mirror_base("https://mirror.example/files/");
        let candidates = resolver.candidates("//example.com/paper.pdf");
        assert_eq!(candidates, vec!["//example.com/paper.pdf"]);
    }

    #[test]
    fn test_blob_url_gets_raw_rewrite_as_second_candidate() {
        let resolver = CandidateResolver::new();
        let candidates =
            resolver.candidates("https://github.com/owner/repo/blob/main/papers/p.pdf");
        assert_eq!(
            candidates,
            vec![
                "https://github.com/owner/repo/blob/main/papers/p.pdf",
                "https://raw.githubusercontent.com/owner/repo/main/papers/p.pdf",
            ]
        );
    }

    #[test]
    fn test_non_blob_github_url_gets_no_rewrite() {
        let resolver = CandidateResolver::new();
        let candidates = resolver.candidates("https://github.com/owner/repo/releases/p.pdf");
        assert_eq!(
            candidates,
            vec!["https://github.com/owner/repo/releases/p.pdf"]
        );
    }

    #[test]
    fn test_relative_path_then_mirror() {
        let resolver = CandidateResolver::with_mirror_base("https://mirror.example/files/");
        let candidates = resolver.candidates("papers/a.pdf");
        assert_eq!(
            candidates,
            vec![
                "papers/a.pdf",
                "https://mirror.example/files/papers/a.pdf",
            ]
        );
    }

    #[test]
    fn test_relative_path_leading_slash_stripped_for_mirror() {
        let resolver = CandidateResolver::with_mirror_base("https://mirror.example/files");
        let candidates = resolver.candidates("/papers/a.pdf");
        assert_eq!(
            candidates,
            vec![
                "/papers/a.pdf",
                "https://mirror.example/files/papers/a.pdf",
            ]
        );
    }

    #[test]
    fn test_relative_path_without_mirror_base_single_candidate() {
        let resolver = CandidateResolver::new();
        assert_eq!(resolver.candidates("papers/a.pdf"), vec!["papers/a.pdf"]);
    }

    #[test]
    fn test_candidates_deterministic() {
        let resolver = CandidateResolver::with_mirror_base("https://mirror.example/");
        assert_eq!(
            resolver.candidates("papers/a.pdf"),
            resolver.candidates("papers/a.pdf")
        );
    }
}
