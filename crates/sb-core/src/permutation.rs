//! Host/path permutations of a canonical URL
//!
//! A URL is checked as a set of `host ++ path` expressions: up to 5 host
//! suffixes times up to 6 path variants, deduplicated, in a fixed order.
//!
//! # Examples
//!
//! ```
//! use sb_core::canonical::canonicalize;
//! use sb_core::permutation::permutations;
//!
//! let url = canonicalize("http://a.b.c/1/2.html?param=1").unwrap();
//! assert_eq!(
//!     permutations(&url),
//!     [
//!         "a.b.c/1/2.html?param=1", "a.b.c/1/2.html", "a.b.c/", "a.b.c/1/",
//!         "b.c/1/2.html?param=1", "b.c/1/2.html", "b.c/", "b.c/1/",
//!     ]
//! );
//! ```

use std::collections::HashSet;

use crate::canonical::CanonicalUrl;
use crate::url::split_host_path;

/// Most host labels considered when building suffixes.
pub const MAX_HOST_LABELS: usize = 5;

/// Most path prefixes (ending in `/`) generated per URL.
pub const MAX_PATH_PREFIXES: usize = 4;

// =============================================================================
// Host
// =============================================================================

/// Check whether a host starts with four dot-separated digit runs.
fn is_dotted_quad(host: &str) -> bool {
    let bytes = host.as_bytes();
    let mut pos = 0;
    for group in 0..4 {
        let start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == start {
            return false;
        }
        if group < 3 {
            if bytes.get(pos) != Some(&b'.') {
                return false;
            }
            pos += 1;
        }
    }
    true
}

/// Host suffixes to check, most specific first.
///
/// IP hosts yield only themselves. Other hosts yield the full host when it
/// has more than 4 labels, then the last 5..=2 labels (bounded by the label
/// count). The bare top-level label is never yielded on its own.
pub fn host_permutations(host: &str) -> Vec<&str> {
    if is_dotted_quad(host) {
        return vec![host];
    }

    // Byte offset where each label starts.
    let mut starts = vec![0];
    starts.extend(host.match_indices('.').map(|(idx, _)| idx + 1));
    let label_count = starts.len();

    if label_count == 1 {
        return vec![host];
    }

    let considered = label_count.min(MAX_HOST_LABELS);
    let mut hosts = Vec::with_capacity(considered);
    if considered > 4 {
        hosts.push(host);
    }
    for keep in (2..=considered).rev() {
        let suffix = &host[starts[label_count - keep]..];
        if hosts.last() != Some(&suffix) {
            hosts.push(suffix);
        }
    }
    hosts
}

// =============================================================================
// Path
// =============================================================================

/// Path variants to check: the full path (with query), the path without
/// its query, then up to 4 leading directory prefixes starting at `/`.
pub fn path_permutations(path: &str) -> Vec<String> {
    let path = if path.is_empty() { "/" } else { path };
    let mut paths = vec![path.to_string()];

    let base = match path.split_once('?') {
        Some((base, _)) => {
            paths.push(base.to_string());
            base
        }
        None => path,
    };

    let mut segments: Vec<&str> = base.split('/').collect();
    segments.pop();

    let mut current = String::with_capacity(base.len());
    for segment in segments.into_iter().take(MAX_PATH_PREFIXES) {
        current.push_str(segment);
        current.push('/');
        paths.push(current.clone());
    }
    paths
}

// =============================================================================
// Combined
// =============================================================================

/// All unique `host ++ path` permutations of a canonical URL, host-major.
///
/// The result always contains the full host followed by the full path.
pub fn permutations(url: &CanonicalUrl) -> Vec<String> {
    permutations_of(url.as_str())
}

/// Like [`permutations`] for a string already in canonical form.
/// Returns an empty list if the string has no `://`.
pub fn permutations_of(url: &str) -> Vec<String> {
    let (host, path) = match split_host_path(url) {
        Some(parts) => parts,
        None => return Vec::new(),
    };

    let paths = path_permutations(path);
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for host in host_permutations(host) {
        for path in &paths {
            let expression = format!("{}{}", host, path);
            if seen.insert(expression.clone()) {
                out.push(expression);
            }
        }
    }
    out
}
