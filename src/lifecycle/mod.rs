//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Receiver (state.rs):
//!     Created → start() → Started → stop() → Stopped
//!     late request callbacks check the state before dispatching
//!
//! Shutdown (shutdown.rs):
//!     stop() → trigger → every served listener drains and exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → binary stops its receiver
//! ```
//!
//! # Design Decisions
//! - Stop is idempotent and terminal
//! - Listeners stop accepting first, then in-flight requests drain

pub mod shutdown;
pub mod signals;
pub mod state;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use state::{Lifecycle, LifecycleState};
