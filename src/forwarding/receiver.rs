//! Receiver decorator that wraps every delivered message for forwarding.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::forwarding::config::ForwardingConfig;
use crate::forwarding::message::ForwardingMessage;
use crate::message::{MessageHandler, ReceivedMessage, Receiver};

/// Presents an inner receiver under its own name, with forwarding applied.
pub struct ForwardingReceiver {
    name: Arc<str>,
    inner: Arc<dyn Receiver>,
    config: Arc<ForwardingConfig>,
    cancel: CancellationToken,
}

impl ForwardingReceiver {
    pub fn new(name: impl Into<Arc<str>>, inner: Arc<dyn Receiver>, config: ForwardingConfig) -> Self {
        Self {
            name: name.into(),
            inner,
            config: Arc::new(config),
            cancel: CancellationToken::new(),
        }
    }

    pub fn inner(&self) -> &Arc<dyn Receiver> {
        &self.inner
    }

    pub fn config(&self) -> &ForwardingConfig {
        &self.config
    }
}

struct ForwardingHandler {
    name: Arc<str>,
    config: Arc<ForwardingConfig>,
    cancel: CancellationToken,
    handler: Arc<dyn MessageHandler>,
}

#[async_trait]
impl MessageHandler for ForwardingHandler {
    async fn on_message(&self, _receiver: &str, message: Box<dyn ReceivedMessage>) {
        let wrapped = ForwardingMessage::new(message, self.name.clone(), self.config.clone())
            .with_cancellation(self.cancel.child_token());
        self.handler.on_message(&self.name, Box::new(wrapped)).await;
    }
}

#[async_trait]
impl Receiver for ForwardingReceiver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, handler: Arc<dyn MessageHandler>) -> Result<()> {
        let wrapping = ForwardingHandler {
            name: self.name.clone(),
            config: self.config.clone(),
            cancel: self.cancel.clone(),
            handler,
        };
        self.inner.start(Arc::new(wrapping)).await?;
        tracing::info!(
            receiver = %self.name,
            inner = %self.inner.name(),
            "Forwarding receiver started"
        );
        Ok(())
    }

    /// Cancels in-flight forwards, then stops the inner receiver.
    async fn stop(&self) -> Result<()> {
        self.cancel.cancel();
        self.inner.stop().await
    }
}
