//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that relay targets and forwarding rules name existing senders
//! - Build every receiver and sender setting once, so bad URLs, templates,
//!   media types and statuses are reported before anything binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: RelayConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::http::{HttpReceiver, HttpSender};

/// A single semantic problem in a configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("receiver: {0}")]
    Receiver(String),

    #[error("sender '{name}': {reason}")]
    Sender { name: String, reason: String },

    #[error("{context} references unknown sender '{sender}'")]
    UnknownSender { context: String, sender: String },

    #[error("metrics address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.receiver.to_settings() {
        Ok(settings) => {
            if let Err(e) = HttpReceiver::new(config.receiver.name.clone(), settings) {
                errors.push(ValidationError::Receiver(e.to_string()));
            }
        }
        Err(e) => errors.push(ValidationError::Receiver(e.to_string())),
    }

    for (name, sender) in &config.senders {
        let built = sender
            .to_settings()
            .and_then(|settings| HttpSender::new(name.clone(), settings));
        if let Err(e) = built {
            errors.push(ValidationError::Sender {
                name: name.clone(),
                reason: e.to_string(),
            });
        }
    }

    if let Some(target) = &config.relay.target {
        if !config.senders.contains_key(target) {
            errors.push(ValidationError::UnknownSender {
                context: "relay.target".to_string(),
                sender: target.clone(),
            });
        }
    }

    for (outcome, rule) in config.forwarding.rules() {
        if !config.senders.contains_key(&rule.sender) {
            errors.push(ValidationError::UnknownSender {
                context: format!("forwarding.{}", outcome),
                sender: rule.sender.clone(),
            });
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
