//! Outbound header serialization.
//!
//! # Responsibilities
//! - Split delimited header values into repeated header occurrences
//! - Parse and validate media types for `Content-Type`
//! - Merge sender defaults with per-message headers
//!
//! # Design Decisions
//! - `,` and `;` both delimit; segments are trimmed and empty ones dropped
//! - `Content-Type` is never split or repeated
//! - A message header replaces every default occurrence of the same name
//! - Connection-managed headers (`Host`, `Content-Length`, ...) are left to
//!   the client, so a relayed message never carries the inbound hop's values

use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST, TE,
    TRANSFER_ENCODING, UPGRADE,
};

use crate::error::{Error, Result};
use crate::message::{render_header_value, Headers};

/// Split a header value into its occurrences.
///
/// A value without delimiters yields one trimmed occurrence, even if empty.
pub fn split_header_values(value: &str) -> Vec<&str> {
    if !value.contains([',', ';']) {
        return vec![value.trim()];
    }
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// Parse `type/subtype[; param=value]*` into a header value.
pub fn parse_media_type(value: &str) -> Result<HeaderValue> {
    let invalid = || Error::InvalidMediaType(value.to_string());
    let trimmed = value.trim();

    let mut parts = trimmed.split(';');
    let essence = parts.next().unwrap_or_default().trim();
    let (kind, subtype) = essence.split_once('/').ok_or_else(invalid)?;
    if !is_token(kind) || !is_token(subtype) {
        return Err(invalid());
    }

    for param in parts {
        let param = param.trim();
        if param.is_empty() {
            continue;
        }
        let (name, val) = param.split_once('=').ok_or_else(invalid)?;
        let val = val.trim();
        let quoted = val.len() >= 2 && val.starts_with('"') && val.ends_with('"');
        if !is_token(name.trim()) || (!quoted && !is_token(val)) {
            return Err(invalid());
        }
    }

    HeaderValue::from_str(trimmed).map_err(|_| invalid())
}

/// Headers the HTTP client derives per connection and request.
fn is_connection_managed(name: &HeaderName) -> bool {
    [HOST, CONTENT_LENGTH, TRANSFER_ENCODING, CONNECTION, TE, UPGRADE].contains(name)
        || name.as_str() == "keep-alive"
}

fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Append every occurrence of `value` under `name`.
pub(crate) fn append_split(map: &mut HeaderMap, name: HeaderName, value: &str) -> Result<()> {
    for part in split_header_values(value) {
        let header_value = HeaderValue::from_str(part).map_err(|e| Error::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        map.append(name.clone(), header_value);
    }
    Ok(())
}

/// Default headers configured on a sender.
#[derive(Debug, Clone, Default)]
pub struct DefaultHeaders {
    headers: HeaderMap,
    content_type: Option<HeaderValue>,
}

impl DefaultHeaders {
    /// Validate defaults. A `Content-Type` entry becomes the default content type.
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut defaults = Self::default();
        for (name, value) in entries {
            let name = header_name(name)?;
            if name == CONTENT_TYPE {
                defaults.content_type = Some(parse_media_type(value)?);
            } else {
                append_split(&mut defaults.headers, name, value)?;
            }
        }
        Ok(defaults)
    }

    pub fn content_type(&self) -> Option<&HeaderValue> {
        self.content_type.as_ref()
    }

    /// Replace the default content type.
    pub fn set_content_type(&mut self, value: HeaderValue) {
        self.content_type = Some(value);
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Build the outbound header map for one request.
    ///
    /// `working` must already have URL tokens removed. Its `Content-Type`
    /// wins over the default; `fallback` applies when neither is set.
    pub fn apply(&self, mut working: Headers, fallback: HeaderValue) -> Result<HeaderMap> {
        let content_type = match working.remove(CONTENT_TYPE.as_str()) {
            Some(value) => parse_media_type(&render_header_value(&value))?,
            None => self.content_type.clone().unwrap_or(fallback),
        };

        let mut map = self.headers.clone();
        for (name, value) in working.iter() {
            let name = header_name(name)?;
            if is_connection_managed(&name) {
                continue;
            }
            map.remove(&name);
            append_split(&mut map, name, &render_header_value(value))?;
        }
        map.insert(CONTENT_TYPE, content_type);
        Ok(map)
    }
}
