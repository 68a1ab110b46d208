//! Outbound URL templates.
//!
//! Tokens in the URL are filled from message headers at send time. A header
//! used for substitution is removed from the outbound header set.
//!
//! # Design Decisions
//! - Substitution is a single pass; a value is never scanned for tokens
//! - Path, query and fragment values are percent-encoded and cannot add
//!   segments, a query or a fragment of their own
//! - Authority values (host, port) are inserted as-is but may not carry
//!   URL delimiters

use url::{form_urlencoded, Url};

use crate::error::{Error, Result};
use crate::message::{render_header_value, Headers};
use crate::routing::template::{parse_segments, Segment};

/// URL component a token is substituted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
    Authority,
    Path,
    Query,
    Fragment,
}

impl Component {
    /// Component that text appended after `preceding` lands in.
    fn after(preceding: &str) -> Self {
        let Some((_, rest)) = preceding.split_once("://") else {
            return Component::Authority;
        };
        if rest.contains('#') {
            Component::Fragment
        } else if rest.contains('?') {
            Component::Query
        } else if rest.contains('/') {
            Component::Path
        } else {
            Component::Authority
        }
    }
}

#[derive(Debug, Clone)]
enum Part {
    Literal(String),
    Token { name: String, component: Component },
}

/// A URL with `{token}` placeholders.
#[derive(Debug, Clone)]
pub struct UrlTemplate {
    source: String,
    parts: Vec<Part>,
    tokens: Vec<String>,
}

impl UrlTemplate {
    /// Parse and validate `url`, e.g. `http://host/orders/{id}`.
    ///
    /// The URL must be an absolute `http` or `https` URL once its tokens are filled.
    pub fn parse(url: &str) -> Result<Self> {
        let source = url.trim().to_string();
        let segments = parse_segments(&source)?;

        let mut parts = Vec::with_capacity(segments.len());
        let mut tokens: Vec<String> = Vec::new();
        let mut sample = String::with_capacity(source.len());
        for segment in &segments {
            match segment {
                Segment::Literal(text) => {
                    sample.push_str(text);
                    parts.push(Part::Literal(text.to_string()));
                }
                Segment::Token(name) => {
                    let component = Component::after(&sample);
                    // A token right after `host:` stands for a port.
                    if component == Component::Authority && sample.ends_with(':') {
                        sample.push('1');
                    } else {
                        sample.push('x');
                    }
                    if !tokens.iter().any(|t| t.eq_ignore_ascii_case(name)) {
                        tokens.push(name.to_string());
                    }
                    parts.push(Part::Token {
                        name: name.to_string(),
                        component,
                    });
                }
            }
        }

        let parsed = Url::parse(&sample)
            .map_err(|e| Error::Config(format!("invalid URL '{}': {}", source, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::Config(format!(
                "URL '{}' must use http or https",
                source
            )));
        }

        Ok(Self {
            source,
            parts,
            tokens,
        })
    }

    /// Substitute every token from `headers`, removing the headers used.
    ///
    /// Fails without consuming any header if a token has no header or its
    /// value cannot be placed in the URL.
    pub fn resolve(&self, headers: &mut Headers) -> Result<Url> {
        let mut values: Vec<(&str, String)> = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            match headers.get(token) {
                Some(value) => values.push((token.as_str(), render_header_value(value))),
                None => {
                    return Err(Error::MissingUrlToken {
                        token: token.clone(),
                    })
                }
            }
        }

        let mut resolved = String::with_capacity(self.source.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => resolved.push_str(text),
                Part::Token { name, component } => {
                    let value = values
                        .iter()
                        .find(|(token, _)| token.eq_ignore_ascii_case(name))
                        .map(|(_, value)| value.as_str())
                        .unwrap_or_default();
                    resolved.push_str(&encode_value(name, value, *component)?);
                }
            }
        }

        let url = Url::parse(&resolved)
            .map_err(|e| Error::Config(format!("resolved URL '{}' is invalid: {}", resolved, e)))?;
        for token in &self.tokens {
            headers.remove(token);
        }
        Ok(url)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Render `value` for its place in the URL.
fn encode_value(token: &str, value: &str, component: Component) -> Result<String> {
    match component {
        Component::Authority => {
            if value.chars().any(|c| {
                matches!(c, '/' | '\\' | '?' | '#' | '@') || c.is_whitespace() || c.is_control()
            }) {
                return Err(Error::InvalidUrlToken {
                    token: token.to_string(),
                    value: value.to_string(),
                });
            }
            Ok(value.to_string())
        }
        Component::Path | Component::Fragment => {
            // Encoded dots still count as dot segments when the URL is parsed.
            if component == Component::Path && (value == "." || value == "..") {
                return Err(Error::InvalidUrlToken {
                    token: token.to_string(),
                    value: value.to_string(),
                });
            }
            Ok(form_urlencoded::byte_serialize(value.as_bytes())
                .collect::<String>()
                .replace('+', "%20"))
        }
        Component::Query => Ok(form_urlencoded::byte_serialize(value.as_bytes()).collect()),
    }
}
