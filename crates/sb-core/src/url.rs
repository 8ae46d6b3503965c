//! Structural URL splitting
//!
//! These functions cut a URL into scheme / netloc / path / query slices
//! without validating or rewriting anything. They return views into the
//! input string.

// =============================================================================
// Scheme
// =============================================================================

/// Split a leading `scheme:` off a URL.
///
/// A scheme starts with an ASCII letter and contains only letters, digits,
/// `+`, `-` and `.`. Returns `(scheme, rest_after_colon)`.
#[inline]
pub fn split_scheme(url: &str) -> Option<(&str, &str)> {
    let colon = url.find(':')?;
    if colon == 0 {
        return None;
    }
    let scheme = &url[..colon];
    let bytes = scheme.as_bytes();
    if !bytes[0].is_ascii_alphabetic() {
        return None;
    }
    if !bytes
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
    {
        return None;
    }
    Some((scheme, &url[colon + 1..]))
}

/// Get the position after "://".
#[inline]
pub fn get_scheme_end(url: &str) -> Option<usize> {
    url.find("://").map(|pos| pos + 3)
}

// =============================================================================
// Full Split
// =============================================================================

/// Structural pieces of a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UrlParts<'a> {
    /// Scheme as written (empty when none was detected)
    pub scheme: &'a str,
    /// Everything between `//` and the path
    pub netloc: &'a str,
    /// Path, starting with `/` or empty
    pub path: &'a str,
    /// Query without the `?`; `Some("")` for a bare `?`
    pub query: Option<&'a str>,
}

/// Split a URL into scheme, netloc, path and query.
/// Anything after `#` is discarded.
pub fn split_url(url: &str) -> UrlParts<'_> {
    let (scheme, mut rest) = split_scheme(url).unwrap_or(("", url));

    let mut netloc = "";
    if let Some(after) = rest.strip_prefix("//") {
        let end = after
            .find(|c: char| c == '/' || c == '?' || c == '#')
            .unwrap_or(after.len());
        netloc = &after[..end];
        rest = &after[end..];
    }

    if let Some(hash) = rest.find('#') {
        rest = &rest[..hash];
    }

    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    UrlParts {
        scheme,
        netloc,
        path,
        query,
    }
}

// =============================================================================
// Netloc
// =============================================================================

/// Host and port pieces of a netloc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authority<'a> {
    pub host: &'a str,
    pub port: Option<&'a str>,
    /// Host was written inside `[...]`
    pub bracketed: bool,
}

/// Split a netloc into host and port, dropping any userinfo.
pub fn split_netloc(netloc: &str) -> Authority<'_> {
    let hostinfo = match netloc.rfind('@') {
        Some(at) => &netloc[at + 1..],
        None => netloc,
    };

    if let Some(open) = hostinfo.find('[') {
        let bracketed = &hostinfo[open + 1..];
        let (host, after) = bracketed.split_once(']').unwrap_or((bracketed, ""));
        let port = after.split_once(':').map(|(_, port)| port);
        return Authority {
            host,
            port: port.filter(|p| !p.is_empty()),
            bracketed: true,
        };
    }

    let (host, port) = match hostinfo.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (hostinfo, None),
    };
    Authority {
        host,
        port: port.filter(|p| !p.is_empty()),
        bracketed: false,
    }
}

/// Parse a port string. Only plain ASCII digits within `u16` are accepted.
#[inline]
pub fn parse_port(port: &str) -> Option<u16> {
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    port.parse().ok()
}

// =============================================================================
// Canonical Host / Path
// =============================================================================

/// Split a canonical-form URL into the bare host and the path (query kept).
///
/// Userinfo and a trailing `:digits` port are removed from the host.
pub fn split_host_path(url: &str) -> Option<(&str, &str)> {
    let scheme_end = get_scheme_end(url)?;
    let rest = &url[scheme_end..];

    let host_end = rest
        .find(|c: char| c == '/' || c == '?' || c == '#')
        .unwrap_or(rest.len());
    let mut host = &rest[..host_end];
    let path = &rest[host_end..];

    if let Some(at) = host.rfind('@') {
        host = &host[at + 1..];
    }
    if let Some(colon) = host.rfind(':') {
        if host[colon + 1..].bytes().all(|b| b.is_ascii_digit()) {
            host = &host[..colon];
        }
    }

    Some((host.trim_matches('/'), path))
}
