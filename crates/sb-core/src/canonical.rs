//! URL canonicalization for hash-prefix lookups
//!
//! Turns arbitrary user-supplied text into the `scheme://host[:port]path[?query]`
//! form that gets expanded into permutations and hashed. The transform is
//! idempotent: canonicalizing a canonical URL returns it unchanged.
//!
//! # Examples
//!
//! ```
//! use sb_core::canonical::canonicalize;
//!
//! let url = canonicalize("  HTTP://www.GOOgle.com/a/../b/./c?x#frag").unwrap();
//! assert_eq!(url.as_str(), "http://www.google.com/b/c?x");
//! ```

use std::fmt;
use std::net::Ipv4Addr;

use log::debug;

use crate::escape::{full_unescape, percent_encode};
use crate::url::{parse_port, split_netloc, split_scheme, split_url};

/// Error type for canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanonicalizeError {
    #[error("no host could be recovered from {0:?}")]
    MissingHost(String),
}

/// A URL in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Canonicalize
// =============================================================================

/// Canonicalize a raw URL.
///
/// Malformed-but-parseable input degrades to `http` and `/`. The only
/// failure is a URL with no recoverable host.
pub fn canonicalize(raw: &str) -> Result<CanonicalUrl, CanonicalizeError> {
    let mut url: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '\t' | '\r' | '\n'))
        .collect();

    if let Some(hash) = url.find('#') {
        url.truncate(hash);
    }
    if url.starts_with("//") {
        url.insert_str(0, "http:");
    }
    if !url.contains("://") {
        url.insert_str(0, "http://");
    }

    let escaped = percent_encode(&full_unescape(url.as_bytes()));
    let url = if split_scheme(&escaped).is_some() {
        escaped
    } else {
        format!("http://{}", escaped)
    };
    let parts = split_url(&url);

    let authority = split_netloc(parts.netloc);
    let host = canonical_host(authority.host);
    if host.is_empty() {
        return Err(CanonicalizeError::MissingHost(raw.to_string()));
    }

    let mut quoted_host = percent_encode(&host);
    if authority.bracketed {
        quoted_host = format!("[{}]", quoted_host);
    }
    if let Some(port) = authority.port {
        match parse_port(port) {
            Some(port) => {
                quoted_host.push(':');
                quoted_host.push_str(&port.to_string());
            }
            None => debug!("dropping unparseable port {:?} in {:?}", port, raw),
        }
    }

    let path = canonical_path(parts.path.as_bytes());

    let mut canonical = format!(
        "{}://{}{}",
        parts.scheme.to_ascii_lowercase(),
        quoted_host,
        percent_encode(&path)
    );
    if let Some(query) = parts.query {
        canonical.push('?');
        canonical.push_str(query);
    }

    Ok(CanonicalUrl(canonical))
}

// =============================================================================
// Host
// =============================================================================

/// Decode, trim dots, collapse dot runs, lower-case, and rewrite numeric hosts.
fn canonical_host(host: &str) -> Vec<u8> {
    let decoded = full_unescape(host.to_ascii_lowercase().as_bytes());

    let mut collapsed = Vec::with_capacity(decoded.len());
    for &b in decoded.iter() {
        if b == b'.' && (collapsed.is_empty() || collapsed.last() == Some(&b'.')) {
            continue;
        }
        collapsed.push(b);
    }
    while collapsed.last() == Some(&b'.') {
        collapsed.pop();
    }

    match String::from_utf8(collapsed) {
        Ok(host) => {
            let host = host.to_lowercase();
            numeric_host(&host).unwrap_or(host).into_bytes()
        }
        // Raw bytes that are not text: only ASCII letters can be folded.
        Err(err) => {
            let mut bytes = err.into_bytes();
            bytes.make_ascii_lowercase();
            bytes
        }
    }
}

/// Convert an all-digit or `0x`-prefixed host to dotted-quad form.
///
/// Returns `None` when the host is not numeric or does not fit in 32 bits;
/// the caller keeps the original string in that case.
pub fn numeric_host(host: &str) -> Option<String> {
    if !host.is_empty() && host.bytes().all(|b| b.is_ascii_digit()) {
        return match host.parse::<u32>() {
            Ok(value) => Some(Ipv4Addr::from(value).to_string()),
            Err(_) => {
                debug!("decimal host {:?} does not fit in 32 bits, keeping it", host);
                None
            }
        };
    }

    if let Some(hex) = host.strip_prefix("0x") {
        if host.contains('.') {
            return None;
        }
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            debug!("hex host {:?} is not a valid number, keeping it", host);
            return None;
        }
        return match u32::from_str_radix(hex, 16) {
            Ok(value) => Some(Ipv4Addr::from(value).to_string()),
            Err(_) => {
                debug!("hex host {:?} does not fit in 32 bits, keeping it", host);
                None
            }
        };
    }

    None
}

// =============================================================================
// Path
// =============================================================================

/// Decode and POSIX-normalize a path, keeping its trailing slash.
fn canonical_path(path: &[u8]) -> Vec<u8> {
    let decoded = full_unescape(path);
    if decoded.is_empty() {
        return b"/".to_vec();
    }
    let trailing_slash = decoded.last() == Some(&b'/');

    let mut segments: Vec<&[u8]> = Vec::new();
    for segment in decoded.split(|&b| b == b'/') {
        match segment {
            b"" | b"." => {}
            b".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    let mut normalized = Vec::with_capacity(decoded.len() + 1);
    for segment in &segments {
        normalized.push(b'/');
        normalized.extend_from_slice(segment);
    }
    if normalized.is_empty() || trailing_slash {
        normalized.push(b'/');
    }
    normalized
}
