//! URI prefixes a receiver listens on.
//!
//! # Responsibilities
//! - Parse `http://host:port/path/` prefixes into bind address and path
//! - Derive a prefix from a single templated URL
//! - Test whether a request path falls under a prefix
//!
//! # Design Decisions
//! - `+` and `*` hosts are wildcards and bind all interfaces
//! - Prefix paths always end with `/` and compare case-insensitively
//! - A derived prefix must end on a path-segment boundary; a token in the
//!   middle of a segment or in the authority is rejected up front

use crate::error::{Error, Result};

/// A parsed listening prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriPrefix {
    raw: String,
    host: String,
    port: u16,
    path: String,
}

impl UriPrefix {
    pub fn parse(prefix: &str) -> Result<Self> {
        let raw = prefix.trim();
        let invalid = |reason: &str| Error::Config(format!("invalid prefix '{}': {}", raw, reason));

        let (scheme, rest) = raw.split_once("://").ok_or_else(|| invalid("missing scheme"))?;
        if scheme.eq_ignore_ascii_case("https") {
            return Err(invalid("https prefixes are not supported"));
        }
        if !scheme.eq_ignore_ascii_case("http") {
            return Err(invalid("scheme must be http"));
        }

        let (authority, path) = match rest.find('/') {
            Some(index) => (&rest[..index], &rest[index..]),
            None => (rest, "/"),
        };
        if authority.is_empty() {
            return Err(invalid("missing host"));
        }
        if path.contains(['{', '}', '?', '#']) {
            return Err(invalid("path must not contain tokens, a query or a fragment"));
        }

        let (host, port) = split_host_port(authority).ok_or_else(|| invalid("bad host or port"))?;

        let mut path = path.to_string();
        if !path.ends_with('/') {
            path.push('/');
        }

        Ok(Self {
            raw: raw.to_string(),
            host,
            port,
            path,
        })
    }

    /// Host to bind. Wildcards map to all IPv4 interfaces.
    pub fn bind_host(&self) -> &str {
        match self.host.as_str() {
            "+" | "*" => "0.0.0.0",
            host => host,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` suitable for binding, with IPv6 hosts bracketed.
    pub fn bind_address(&self) -> String {
        let host = self.bind_host();
        if host.contains(':') {
            format!("[{}]:{}", host, self.port)
        } else {
            format!("{}:{}", host, self.port)
        }
    }

    /// Path component, always ending with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// True if `request_path` lies under this prefix.
    pub fn contains_path(&self, request_path: &str) -> bool {
        let candidate = if request_path.ends_with('/') {
            request_path.to_string()
        } else {
            format!("{}/", request_path)
        };
        candidate.len() >= self.path.len()
            && candidate.as_bytes()[..self.path.len()].eq_ignore_ascii_case(self.path.as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn split_host_port(authority: &str) -> Option<(String, u16)> {
    if let Some(rest) = authority.strip_prefix('[') {
        let (host, after) = rest.split_once(']')?;
        let port = match after.strip_prefix(':') {
            Some(port) => port.parse().ok()?,
            None if after.is_empty() => 80,
            None => return None,
        };
        return Some((host.to_string(), port));
    }

    match authority.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => Some((host.to_string(), port.parse().ok()?)),
        Some(_) => None,
        None => Some((authority.to_string(), 80)),
    }
}

/// Path portion of a URL, without query or fragment. `/` if absent.
pub fn url_path(url: &str) -> &str {
    let after_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = match after_scheme.find('/') {
        Some(index) => &after_scheme[index..],
        None => "/",
    };
    path.split(['?', '#']).next().unwrap_or(path)
}

/// Derive the listening prefix for a templated URL.
///
/// The prefix is everything before the first token; without tokens it is
/// the whole URL. Either way it ends with `/`.
pub fn derive_prefix(url: &str) -> Result<String> {
    let url = url.trim();
    let Some(index) = url.find('{') else {
        return Ok(format!("{}/", url.trim_end_matches('/')));
    };

    let head = &url[..index];
    let authority_end = head
        .split_once("://")
        .map(|(scheme, rest)| (scheme.len() + 3, rest))
        .ok_or_else(|| Error::Config(format!("URL '{}' has no scheme", url)))?;
    if !authority_end.1.contains('/') {
        return Err(Error::Config(format!(
            "URL '{}' has a token in its authority; supply prefixes explicitly",
            url
        )));
    }
    if !head.ends_with('/') {
        return Err(Error::Config(format!(
            "URL '{}' has a token that does not start a path segment; supply prefixes explicitly",
            url
        )));
    }
    Ok(head.to_string())
}
