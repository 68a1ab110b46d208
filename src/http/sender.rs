//! HTTP sender.
//!
//! # Responsibilities
//! - Resolve the destination URL from message headers
//! - Serialize payload and headers into one outbound request
//! - Fail on any non-success response; no retries
//!
//! # Design Decisions
//! - URL tokens consume their headers; a missing one fails before any I/O
//! - Content type: message header, else sender default, else by payload kind
//! - Cancellation races the request; the client drops the connection on abort

use async_trait::async_trait;
use axum::http::{HeaderValue, Method};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::http::headers::{parse_media_type, DefaultHeaders};
use crate::message::{Message, Payload, Sender, HTTP_TRANSPORT, ORIGINATING_SYSTEM_HEADER};
use crate::observability::metrics;
use crate::routing::UrlTemplate;

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Construction settings for [`HttpSender`].
#[derive(Debug, Clone)]
pub struct SenderSettings {
    url: String,
    method: Method,
    headers: Vec<(String, String)>,
    content_type: Option<String>,
    timeout: Option<Duration>,
}

impl SenderSettings {
    /// Send to `url`, which may contain `{token}` placeholders.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::POST,
            headers: Vec::new(),
            content_type: None,
            timeout: None,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Header attached to every request unless the message overrides it.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Content type used when the message has none.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Total timeout per request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Sends messages as outbound HTTP requests.
#[derive(Debug, Clone)]
pub struct HttpSender {
    name: String,
    url: UrlTemplate,
    method: Method,
    defaults: DefaultHeaders,
    client: reqwest::Client,
}

impl HttpSender {
    /// Validate `settings` and build a sender with its own client.
    pub fn new(name: impl Into<String>, settings: SenderSettings) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Self::with_client(name, settings, client)
    }

    /// Build a sender on an existing client. The settings' timeout is ignored.
    pub fn with_client(
        name: impl Into<String>,
        settings: SenderSettings,
        client: reqwest::Client,
    ) -> Result<Self> {
        let name: String = name.into();
        if name.trim().is_empty() {
            return Err(Error::Config("sender name must not be empty".into()));
        }

        let url = UrlTemplate::parse(&settings.url)?;
        let mut defaults = DefaultHeaders::new(
            settings
                .headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        )?;
        if let Some(content_type) = &settings.content_type {
            defaults.set_content_type(parse_media_type(content_type)?);
        }

        Ok(Self {
            name,
            url,
            method: settings.method,
            defaults,
            client,
        })
    }

    pub fn url(&self) -> &UrlTemplate {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    async fn execute(&self, message: Message, cancel: &CancellationToken) -> Result<()> {
        let message = match message.originating_system() {
            Some(_) => message,
            None => message.with_originating_system(HTTP_TRANSPORT),
        };

        let mut working = message.headers().clone();
        let url = self.url.resolve(&mut working)?;
        if let Some(system) = message.originating_system() {
            working.insert(ORIGINATING_SYSTEM_HEADER, system);
        }

        let (body, fallback) = match message.payload() {
            Payload::Binary(bytes) => (
                reqwest::Body::from(bytes.clone()),
                HeaderValue::from_static(BINARY_CONTENT_TYPE),
            ),
            Payload::Text(text) => (
                reqwest::Body::from(text.clone()),
                HeaderValue::from_static(TEXT_CONTENT_TYPE),
            ),
        };
        let headers = self.defaults.apply(working, fallback)?;

        tracing::debug!(
            sender = %self.name,
            message_id = %message.id(),
            method = %self.method,
            url = %url,
            "Sending message"
        );

        let request = self
            .client
            .request(self.method.clone(), url)
            .headers(headers)
            .body(body);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(sender = %self.name, message_id = %message.id(), "Send cancelled");
                return Err(Error::Cancelled);
            }
            response = request.send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            let reason = response
                .extensions()
                .get::<hyper::ext::ReasonPhrase>()
                .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned())
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                reason,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Sender for HttpSender {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, message: Message, cancel: &CancellationToken) -> Result<()> {
        let start = Instant::now();
        let result = self.execute(message, cancel).await;
        metrics::record_send(&self.name, result.is_ok(), start);
        result
    }
}
