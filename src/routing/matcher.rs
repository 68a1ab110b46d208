//! Inbound request filtering.
//!
//! # Responsibilities
//! - Match the request path against the receiver's prefixes and template
//! - Match the request method
//! - Report which check failed so the caller can answer 404 or 405
//!
//! # Design Decisions
//! - Path is checked before method: an unknown path is always 404
//! - Prefix and template matching are case-insensitive
//! - Immutable after construction, shared across request handlers

use axum::http::{Method, Request};
use std::collections::BTreeMap;

use crate::routing::prefix::UriPrefix;
use crate::routing::template::PathTemplate;

/// Result of evaluating a request against a [`RequestFilter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// Path and method matched; carries the extracted token values.
    Matched(BTreeMap<String, String>),
    /// Path is outside every prefix or does not fit the template.
    NotFound,
    /// Path matched but the method did not.
    MethodNotAllowed,
}

/// Path and method filter for one receiver.
#[derive(Debug, Clone)]
pub struct RequestFilter {
    prefixes: Vec<UriPrefix>,
    template: PathTemplate,
    method: Method,
}

impl RequestFilter {
    pub fn new(prefixes: Vec<UriPrefix>, template: PathTemplate, method: Method) -> Self {
        Self {
            prefixes,
            template,
            method,
        }
    }

    /// Evaluate a method and path.
    pub fn evaluate(&self, method: &Method, path: &str) -> MatchResult {
        let in_prefix = self.prefixes.is_empty() || self.prefixes.iter().any(|p| p.contains_path(path));
        let tokens = match in_prefix.then(|| self.template.match_path(path)).flatten() {
            Some(tokens) => tokens,
            None => return MatchResult::NotFound,
        };

        if *method != self.method {
            return MatchResult::MethodNotAllowed;
        }

        MatchResult::Matched(tokens)
    }

    /// Evaluate a request.
    pub fn matches<B>(&self, req: &Request<B>) -> MatchResult {
        self.evaluate(req.method(), req.uri().path())
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn prefixes(&self) -> &[UriPrefix] {
        &self.prefixes
    }
}
