//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Receiver prefixes
//!     → listener.rs (group by host:port, bind)
//!     → one axum server per bound listener
//! ```
//!
//! # Design Decisions
//! - Several prefixes on one authority share a socket
//! - Binding is all-or-nothing for a receiver start

pub mod listener;

pub use listener::{bind_prefixes, BoundListener};
