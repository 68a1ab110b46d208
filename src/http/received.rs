//! Messages received over HTTP.
//!
//! Each message owns the response handle of the request that carried it.
//! Resolving writes the mapped status for the outcome and closes the
//! exchange; the request task is waiting on the other end.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::http::response::{ResponseMapping, ResponseStatus};
use crate::message::{Message, Outcome, ReceivedMessage};
use crate::observability::metrics;

/// A message delivered by [`crate::http::HttpReceiver`].
pub struct HttpReceivedMessage {
    message: Message,
    receiver: Arc<str>,
    responses: Arc<ResponseMapping>,
    responder: oneshot::Sender<ResponseStatus>,
}

impl HttpReceivedMessage {
    pub(crate) fn new(
        message: Message,
        receiver: Arc<str>,
        responses: Arc<ResponseMapping>,
        responder: oneshot::Sender<ResponseStatus>,
    ) -> Self {
        Self {
            message,
            receiver,
            responses,
            responder,
        }
    }
}

#[async_trait]
impl ReceivedMessage for HttpReceivedMessage {
    fn message(&self) -> &Message {
        &self.message
    }

    async fn resolve(self: Box<Self>, outcome: Outcome) -> Result<()> {
        let this = *self;
        let status = this.responses.response_for(outcome);

        tracing::debug!(
            receiver = %this.receiver,
            message_id = %this.message.id(),
            outcome = %outcome,
            status = status.code().as_u16(),
            "Resolving message"
        );

        this.responder
            .send(status.clone())
            .map_err(|_| Error::ResponseClosed(this.message.id().to_string()))?;

        metrics::record_resolved(&this.receiver, outcome);
        Ok(())
    }
}
