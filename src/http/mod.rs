//! HTTP transport binding.
//!
//! # Data Flow
//! ```text
//! Inbound:
//!     TCP connection (net::listener)
//!     → receiver.rs (axum router, request id, timeout, trace)
//!     → routing::RequestFilter (404 / 405)
//!     → request.rs (headers + path tokens → Message)
//!     → received.rs (HttpReceivedMessage → MessageHandler)
//!     → resolve(Outcome) → response.rs (mapped status) → client
//!
//! Outbound:
//!     Message
//!     → sender.rs (URL tokens, payload)
//!     → headers.rs (defaults, splitting, Content-Type)
//!     → reqwest → success or Error::Status
//! ```

pub mod headers;
pub mod received;
pub mod receiver;
pub mod request;
pub mod response;
pub mod sender;

pub use headers::{parse_media_type, split_header_values, DefaultHeaders};
pub use received::HttpReceivedMessage;
pub use receiver::{HttpReceiver, ReceiverSettings};
pub use request::X_REQUEST_ID;
pub use response::{ResponseMapping, ResponseStatus};
pub use sender::{HttpSender, SenderSettings};
