//! Sender, receiver and handler contracts shared by every transport.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::message::{Message, Outcome};

/// Sends messages to a destination.
#[async_trait]
pub trait Sender: Send + Sync {
    /// Logical name used in logs and metrics.
    fn name(&self) -> &str;

    /// Send `message`. Triggering `cancel` aborts an in-flight send with
    /// [`crate::Error::Cancelled`].
    async fn send(&self, message: Message, cancel: &CancellationToken) -> Result<()>;
}

/// A message delivered by a receiver, awaiting its outcome.
#[async_trait]
pub trait ReceivedMessage: Send + Sync {
    fn message(&self) -> &Message;

    /// Dispose of the message. Consumes it: an outcome is terminal.
    async fn resolve(self: Box<Self>, outcome: Outcome) -> Result<()>;
}

/// Application callback for received messages.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn on_message(&self, receiver: &str, message: Box<dyn ReceivedMessage>);
}

/// Produces messages and hands them to a handler.
#[async_trait]
pub trait Receiver: Send + Sync {
    fn name(&self) -> &str;

    /// Begin delivering messages to `handler`. A receiver starts at most once.
    async fn start(&self, handler: Arc<dyn MessageHandler>) -> Result<()>;

    /// Stop delivering messages and release resources. Idempotent.
    async fn stop(&self) -> Result<()>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(Box<dyn ReceivedMessage>) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    async fn on_message(&self, _receiver: &str, message: Box<dyn ReceivedMessage>) {
        (self.0)(message).await
    }
}

/// Adapt an async closure into a [`MessageHandler`].
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn MessageHandler>
where
    F: Fn(Box<dyn ReceivedMessage>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(FnHandler(f))
}
