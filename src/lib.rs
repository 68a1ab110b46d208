//! HTTP messaging binding.
//!
//! Carries transport-agnostic messages over HTTP: an [`http::HttpReceiver`]
//! turns inbound requests into messages and answers each request with the
//! status mapped from the message's outcome, an [`http::HttpSender`] turns
//! messages into outbound requests, and [`forwarding`] re-routes outcomes
//! to other senders.

pub mod config;
pub mod error;
pub mod forwarding;
pub mod http;
pub mod lifecycle;
pub mod message;
pub mod net;
pub mod observability;
pub mod relay;
pub mod routing;

pub use config::RelayConfig;
pub use error::{Error, Result};
pub use forwarding::{Forward, ForwardingConfig, ForwardingReceiver};
pub use http::{HttpReceiver, HttpSender, ReceiverSettings, ResponseMapping, ResponseStatus, SenderSettings};
pub use lifecycle::Shutdown;
pub use message::{Headers, Message, MessageHandler, Outcome, Payload, ReceivedMessage, Receiver, Sender};
pub use relay::Relay;
