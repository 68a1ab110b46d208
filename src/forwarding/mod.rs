//! Forwarding subsystem: re-route dispositions to other senders.
//!
//! # Data Flow
//! ```text
//! caller → ForwardingMessage::resolve(O)
//!     no route for O  → inner.resolve(O)
//!     route for O     → route.sender.send(copy of inner message)
//!                     → inner.resolve(route.outcome or O)
//!
//! ForwardingReceiver::start(handler)
//!     → inner receiver delivers message
//!     → wrapped in ForwardingMessage
//!     → handler.on_message(forwarding receiver name, wrapped)
//! ```
//!
//! # Design Decisions
//! - Forward first, then dispose; a failed forward leaves the inner message
//!   unresolved and returns the error to the caller
//! - Each outcome is configured independently

pub mod config;
pub mod message;
pub mod receiver;

pub use config::{Forward, ForwardingConfig};
pub use message::ForwardingMessage;
pub use receiver::ForwardingReceiver;
