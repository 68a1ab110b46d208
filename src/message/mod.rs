//! Transport-agnostic messaging abstraction.
//!
//! # Data Flow
//! ```text
//! Sending:
//!     Message (payload + headers)
//!     → Sender::send (transport-specific, e.g. http::HttpSender)
//!
//! Receiving:
//!     transport accepts input (e.g. http::HttpReceiver)
//!     → Box<dyn ReceivedMessage>
//!     → MessageHandler::on_message
//!     → ReceivedMessage::resolve(Outcome)   (exactly once, consumes the message)
//! ```
//!
//! # Design Decisions
//! - Outcomes are a tagged variant with a single `resolve` entry point
//! - Resolving takes `Box<Self>`: a message cannot be disposed of twice
//! - Header values are JSON values so structured metadata survives a hop

pub mod outcome;
pub mod payload;
pub mod transport;

pub use outcome::{Outcome, OutcomeTable};
pub use payload::{render_header_value, Headers, Message, Payload};
pub use transport::{handler_fn, MessageHandler, ReceivedMessage, Receiver, Sender};

/// Originating-system tag applied by the HTTP binding.
pub const HTTP_TRANSPORT: &str = "HTTP";

/// Header that carries the originating system across an HTTP hop.
pub const ORIGINATING_SYSTEM_HEADER: &str = "originating-system";
