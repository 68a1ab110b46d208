//! Crate-wide error type.
//!
//! # Taxonomy
//! - Configuration: bad templates, prefixes, media types, header names,
//!   or a URL token with no header or an unusable value at send time.
//!   Surfaced to the caller.
//! - Lifecycle: starting a receiver twice or after it stopped.
//! - Transport: non-success responses, connection failures, cancellation.
//!
//! Protocol mismatches on the inbound side (wrong path or method) are not
//! errors; they are answered with a fixed status and never reach a handler.

use thiserror::Error;

use crate::routing::TemplateError;

/// Errors produced by senders, receivers and received messages.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid construction argument.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Path or URL template could not be compiled.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// A URL token had no header to substitute from.
    #[error("URL token '{token}' has no matching message header")]
    MissingUrlToken { token: String },

    /// A URL token value cannot be placed where its token sits.
    #[error("value '{value}' of URL token '{token}' is not allowed at its position")]
    InvalidUrlToken { token: String, value: String },

    /// Content-Type value is not a media type.
    #[error("invalid media type '{0}'")]
    InvalidMediaType(String),

    /// Header name or value cannot be sent over HTTP.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    /// Receiver was already started.
    #[error("receiver '{0}' is already started")]
    AlreadyStarted(String),

    /// Receiver was stopped and cannot be restarted.
    #[error("receiver '{0}' has been stopped")]
    Stopped(String),

    /// Listener could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Outbound request completed with a non-success status.
    #[error("HTTP {status} {reason}")]
    Status { status: u16, reason: String },

    /// Outbound request failed before a response was received.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Outbound request was cancelled by the caller.
    #[error("send cancelled")]
    Cancelled,

    /// The inbound response can no longer be written (client gone or timed out).
    #[error("response for message '{0}' is already closed")]
    ResponseClosed(String),
}

impl Error {
    /// Status code of a non-success outbound response, if that is what failed.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for failures of the outbound transport rather than of configuration.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Status { .. } | Error::Request(_) | Error::Cancelled
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
