//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Receivers, senders and forwarders produce:
//!     → tracing events (structured, with receiver/sender names and message ids)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers (installed by the binary):
//!     → logging.rs (fmt subscriber with env filter)
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Message id flows through every log event for a message
//! - Metrics are cheap (no-op without a recorder)

pub mod logging;
pub mod metrics;
