//! Outcome-to-response mapping.
//!
//! # Responsibilities
//! - Hold the status code and description for each outcome
//! - Build the HTTP response written when a message is resolved
//! - Build the fixed responses for protocol mismatches
//!
//! # Design Decisions
//! - Every outcome always has an entry; lookups cannot fail
//! - The description is sent as the HTTP/1.1 reason phrase and as the body,
//!   so it survives HTTP/2 where reason phrases do not exist
//! - Codes and descriptions are validated at construction

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use hyper::ext::ReasonPhrase;

use crate::error::{Error, Result};
use crate::message::{Outcome, OutcomeTable};

/// A status code with its description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseStatus {
    code: StatusCode,
    description: String,
}

impl ResponseStatus {
    /// Validate and build a status. The description must be a legal reason phrase.
    pub fn new(code: u16, description: impl Into<String>) -> Result<Self> {
        let code = StatusCode::from_u16(code)
            .map_err(|_| Error::Config(format!("invalid status code {}", code)))?;
        let description = description.into();
        ReasonPhrase::try_from(description.clone().into_bytes()).map_err(|_| {
            Error::Config(format!("invalid status description '{}'", description))
        })?;
        Ok(Self { code, description })
    }

    /// Status with the standard reason for `code`.
    pub fn canonical(code: StatusCode) -> Self {
        Self {
            code,
            description: code.canonical_reason().unwrap_or_default().to_string(),
        }
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Build the response for this status.
    pub fn to_response(&self) -> Response {
        let mut response = Response::new(Body::from(self.description.clone()));
        *response.status_mut() = self.code;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        if let Ok(reason) = ReasonPhrase::try_from(self.description.clone().into_bytes()) {
            response.extensions_mut().insert(reason);
        }
        response
    }
}

/// Outcome → response table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMapping {
    table: OutcomeTable<ResponseStatus>,
}

impl ResponseMapping {
    /// Override the status for one outcome.
    pub fn with_status(mut self, outcome: Outcome, status: ResponseStatus) -> Self {
        self.table.set(outcome, status);
        self
    }

    /// Status written when a message is resolved with `outcome`.
    pub fn response_for(&self, outcome: Outcome) -> &ResponseStatus {
        self.table.get(outcome)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Outcome, &ResponseStatus)> {
        self.table.iter()
    }
}

impl Default for ResponseMapping {
    fn default() -> Self {
        Self {
            table: OutcomeTable::new(
                ResponseStatus::canonical(StatusCode::OK),
                ResponseStatus::canonical(StatusCode::INTERNAL_SERVER_ERROR),
                ResponseStatus::canonical(StatusCode::BAD_REQUEST),
            ),
        }
    }
}

/// Fixed responses that never reach a handler.
pub(crate) fn not_found() -> Response {
    ResponseStatus::canonical(StatusCode::NOT_FOUND).to_response()
}

pub(crate) fn method_not_allowed(allowed: &axum::http::Method) -> Response {
    let mut response = ResponseStatus::canonical(StatusCode::METHOD_NOT_ALLOWED).to_response();
    if let Ok(value) = HeaderValue::from_str(allowed.as_str()) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

pub(crate) fn payload_too_large() -> Response {
    ResponseStatus::canonical(StatusCode::PAYLOAD_TOO_LARGE).to_response()
}

pub(crate) fn unavailable() -> Response {
    ResponseStatus::canonical(StatusCode::SERVICE_UNAVAILABLE).to_response()
}
