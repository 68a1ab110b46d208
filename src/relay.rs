//! Relay: one HTTP receiver feeding one optional target sender.
//!
//! # Data Flow
//! ```text
//! RelayConfig
//!     → HttpReceiver (+ ForwardingReceiver when forwarding rules exist)
//!     → RelayHandler
//!         target send ok         → Acknowledge
//!         target answered 4xx    → Reject
//!         any other failure      → Rollback
//!         no target configured   → Acknowledge
//! ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::error::{Error, Result};
use crate::forwarding::{Forward, ForwardingConfig, ForwardingReceiver};
use crate::http::{HttpReceiver, HttpSender};
use crate::message::{MessageHandler, Outcome, ReceivedMessage, Receiver, Sender};

/// Receiver, senders and handler wired from one configuration.
pub struct Relay {
    http: Arc<HttpReceiver>,
    receiver: Arc<dyn Receiver>,
    senders: BTreeMap<String, Arc<HttpSender>>,
    target: Option<Arc<dyn Sender>>,
    cancel: CancellationToken,
}

impl Relay {
    /// Build every component. Nothing is bound until [`Relay::start`].
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let mut senders = BTreeMap::new();
        for (name, sender) in &config.senders {
            let built = HttpSender::new(name.clone(), sender.to_settings()?)?;
            senders.insert(name.clone(), Arc::new(built));
        }
        let lookup = |name: &str| -> Result<Arc<dyn Sender>> {
            senders
                .get(name)
                .map(|s| s.clone() as Arc<dyn Sender>)
                .ok_or_else(|| Error::Config(format!("unknown sender '{}'", name)))
        };

        let target = config.relay.target.as_deref().map(lookup).transpose()?;

        let http = Arc::new(HttpReceiver::new(
            config.receiver.name.clone(),
            config.receiver.to_settings()?,
        )?);

        let receiver: Arc<dyn Receiver> = if config.forwarding.is_empty() {
            http.clone()
        } else {
            let mut forwarding = ForwardingConfig::new();
            for (outcome, rule) in config.forwarding.rules() {
                let mut forward = Forward::to(lookup(&rule.sender)?);
                if let Some(then) = rule.outcome {
                    forward = forward.then(then);
                }
                forwarding = forwarding.on(outcome, forward);
            }
            let name = config
                .forwarding
                .name
                .clone()
                .unwrap_or_else(|| config.receiver.name.clone());
            Arc::new(ForwardingReceiver::new(name, http.clone(), forwarding))
        };

        Ok(Self {
            http,
            receiver,
            senders,
            target,
            cancel: CancellationToken::new(),
        })
    }

    /// Bind the receiver and begin relaying.
    pub async fn start(&self) -> Result<()> {
        let handler = RelayHandler {
            target: self.target.clone(),
            cancel: self.cancel.clone(),
        };
        self.receiver.start(Arc::new(handler)).await?;
        tracing::info!(
            receiver = %self.receiver.name(),
            target = self.target.as_ref().map(|t| t.name()).unwrap_or("none"),
            "Relay started"
        );
        Ok(())
    }

    /// Cancel in-flight sends and stop the receiver. Idempotent.
    pub async fn stop(&self) -> Result<()> {
        self.cancel.cancel();
        self.receiver.stop().await
    }

    /// The outermost receiver, forwarding-aware when rules are configured.
    pub fn receiver(&self) -> &Arc<dyn Receiver> {
        &self.receiver
    }

    /// The underlying HTTP receiver, e.g. for its bound addresses.
    pub fn http_receiver(&self) -> &Arc<HttpReceiver> {
        &self.http
    }

    pub fn sender(&self, name: &str) -> Option<&Arc<HttpSender>> {
        self.senders.get(name)
    }
}

/// Outcome for the result of relaying to the target.
pub fn outcome_for(result: &Result<()>) -> Outcome {
    match result {
        Ok(()) => Outcome::Acknowledge,
        Err(e) if e.status().is_some_and(|s| (400..500).contains(&s)) => Outcome::Reject,
        Err(_) => Outcome::Rollback,
    }
}

struct RelayHandler {
    target: Option<Arc<dyn Sender>>,
    cancel: CancellationToken,
}

#[async_trait]
impl MessageHandler for RelayHandler {
    async fn on_message(&self, receiver: &str, message: Box<dyn ReceivedMessage>) {
        let message_id = message.message().id().to_string();

        let outcome = match &self.target {
            None => Outcome::Acknowledge,
            Some(target) => {
                let result = target.send(message.message().clone(), &self.cancel).await;
                if let Err(e) = &result {
                    tracing::warn!(
                        receiver = %receiver,
                        target = %target.name(),
                        message_id = %message_id,
                        error = %e,
                        "Relay send failed"
                    );
                }
                outcome_for(&result)
            }
        };

        if let Err(e) = message.resolve(outcome).await {
            tracing::warn!(
                receiver = %receiver,
                message_id = %message_id,
                outcome = %outcome,
                error = %e,
                "Failed to resolve message"
            );
        }
    }
}
