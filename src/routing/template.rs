//! Path templates with named `{token}` placeholders.
//!
//! # Responsibilities
//! - Parse templates into literal and token segments
//! - Compile a path template into an anchored, case-insensitive regex
//! - Extract token values from concrete request paths
//!
//! # Design Decisions
//! - Leading and trailing slashes are optional on both sides
//! - Tokens match non-greedily, so a trailing slash is never captured
//! - Token names are unique ignoring case, since they become header names

use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while parsing a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template '{template}' has an empty token")]
    EmptyToken { template: String },

    #[error("template '{template}' has invalid token name '{token}'")]
    InvalidToken { template: String, token: String },

    #[error("template '{template}' repeats token '{token}'")]
    DuplicateToken { template: String, token: String },

    #[error("template '{template}' has an unbalanced brace")]
    UnbalancedBrace { template: String },

    #[error("template '{template}' did not compile: {source}")]
    Regex {
        template: String,
        #[source]
        source: regex::Error,
    },
}

/// A piece of a parsed template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Literal(&'a str),
    Token(&'a str),
}

fn is_valid_token_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split a template into literal text and token names.
pub(crate) fn parse_segments(template: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let mut segments = Vec::new();
    let mut rest = template;

    while !rest.is_empty() {
        let open = rest.find('{');
        let close = rest.find('}');
        match (open, close) {
            (None, None) => {
                segments.push(Segment::Literal(rest));
                break;
            }
            (Some(open), Some(close)) if open < close => {
                if open > 0 {
                    segments.push(Segment::Literal(&rest[..open]));
                }
                let name = &rest[open + 1..close];
                if name.is_empty() {
                    return Err(TemplateError::EmptyToken {
                        template: template.to_string(),
                    });
                }
                if !is_valid_token_name(name) {
                    return Err(TemplateError::InvalidToken {
                        template: template.to_string(),
                        token: name.to_string(),
                    });
                }
                segments.push(Segment::Token(name));
                rest = &rest[close + 1..];
            }
            _ => {
                return Err(TemplateError::UnbalancedBrace {
                    template: template.to_string(),
                })
            }
        }
    }

    Ok(segments)
}

/// Token names of a template, rejecting case-insensitive duplicates.
pub(crate) fn unique_tokens(template: &str, segments: &[Segment<'_>]) -> Result<Vec<String>, TemplateError> {
    let mut tokens: Vec<String> = Vec::new();
    for segment in segments {
        if let Segment::Token(name) = segment {
            if tokens.iter().any(|t| t.eq_ignore_ascii_case(name)) {
                return Err(TemplateError::DuplicateToken {
                    template: template.to_string(),
                    token: name.to_string(),
                });
            }
            tokens.push(name.to_string());
        }
    }
    Ok(tokens)
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    source: String,
    pattern: Regex,
    tokens: Vec<String>,
}

impl PathTemplate {
    /// Compile `template`, e.g. `orders/{orderId}/items/{itemId}`.
    pub fn compile(template: &str) -> Result<Self, TemplateError> {
        let trimmed = template.trim_matches('/');
        let segments = parse_segments(trimmed)?;
        let tokens = unique_tokens(template, &segments)?;

        let mut pattern = String::from("^/?");
        for segment in &segments {
            match segment {
                Segment::Literal(text) => pattern.push_str(&regex::escape(text)),
                Segment::Token(name) => {
                    pattern.push_str("(?P<");
                    pattern.push_str(name);
                    pattern.push_str(">.*?)");
                }
            }
        }
        pattern.push_str("/?$");

        let compiled = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| TemplateError::Regex {
                template: template.to_string(),
                source,
            })?;

        Ok(Self {
            source: template.to_string(),
            pattern: compiled,
            tokens,
        })
    }

    /// Match a request path, returning token values keyed by token name.
    pub fn match_path(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let captures = self.pattern.captures(path)?;
        Some(
            self.tokens
                .iter()
                .map(|name| {
                    let value = captures
                        .name(name)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default();
                    (name.clone(), value)
                })
                .collect(),
        )
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// Token names in template order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}
