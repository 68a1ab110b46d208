//! Received-message decorator that forwards dispositions.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::forwarding::config::ForwardingConfig;
use crate::message::{Message, Outcome, ReceivedMessage};
use crate::observability::metrics;

/// Wraps a received message and applies [`ForwardingConfig`] when resolved.
pub struct ForwardingMessage {
    inner: Box<dyn ReceivedMessage>,
    receiver: Arc<str>,
    config: Arc<ForwardingConfig>,
    cancel: CancellationToken,
}

impl ForwardingMessage {
    pub fn new(
        inner: Box<dyn ReceivedMessage>,
        receiver: impl Into<Arc<str>>,
        config: Arc<ForwardingConfig>,
    ) -> Self {
        Self {
            inner,
            receiver: receiver.into(),
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight forwards when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Name of the logical receiver this message is presented under.
    pub fn receiver(&self) -> &str {
        &self.receiver
    }
}

#[async_trait]
impl ReceivedMessage for ForwardingMessage {
    fn message(&self) -> &Message {
        self.inner.message()
    }

    async fn resolve(self: Box<Self>, outcome: Outcome) -> Result<()> {
        let ForwardingMessage {
            inner,
            receiver,
            config,
            cancel,
        } = *self;

        let Some(route) = config.route(outcome) else {
            return inner.resolve(outcome).await;
        };

        let forwarded = inner.message().clone();
        let resolved = route.outcome_for(outcome);

        tracing::debug!(
            receiver = %receiver,
            message_id = %forwarded.id(),
            outcome = %outcome,
            sender = %route.sender().name(),
            then = %resolved,
            "Forwarding message"
        );

        route.sender().send(forwarded, &cancel).await?;
        metrics::record_forwarded(&receiver, outcome);

        inner.resolve(resolved).await
    }
}
