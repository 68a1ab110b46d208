//! HTTP receiver.
//!
//! # Responsibilities
//! - Bind the configured prefixes and serve them with axum
//! - Filter requests by path template and method (404 / 405)
//! - Turn accepted requests into received messages for the handler
//! - Hold each request open until its message is resolved
//!
//! # Design Decisions
//! - Every connection and request runs on its own task; a slow handler
//!   never delays accepting the next request
//! - The handler runs on a separate task from the request, so it may keep
//!   the message and resolve it later
//! - Lifecycle state is checked before dispatch; requests arriving after
//!   `stop` are answered 503 and never reach the handler

use async_trait::async_trait;
use futures_util::future::join_all;
use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    response::Response,
    Router,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::error::{Error, Result};
use crate::http::received::HttpReceivedMessage;
use crate::http::request::message_from_request;
use crate::http::response::{self, ResponseMapping};
use crate::lifecycle::{Lifecycle, LifecycleState, Shutdown};
use crate::message::{MessageHandler, Outcome, Receiver};
use crate::net::bind_prefixes;
use crate::observability::metrics;
use crate::routing::{derive_prefix, url_path, MatchResult, PathTemplate, RequestFilter, UriPrefix};

/// Default request body limit (4 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Construction settings for [`HttpReceiver`].
#[derive(Debug, Clone)]
pub struct ReceiverSettings {
    prefixes: Vec<String>,
    path: String,
    method: Method,
    responses: ResponseMapping,
    max_body_bytes: usize,
    request_timeout: Duration,
    shutdown_timeout: Duration,
}

impl ReceiverSettings {
    /// Listen on explicit `prefixes`, matching request paths against `path`.
    pub fn new(prefixes: Vec<String>, path: impl Into<String>) -> Self {
        Self {
            prefixes,
            path: path.into(),
            method: Method::POST,
            responses: ResponseMapping::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(10),
        }
    }

    /// Derive the prefix and path template from one URL,
    /// e.g. `http://localhost:5000/api/{version}/orders`.
    pub fn from_url(url: &str) -> Result<Self> {
        let prefix = derive_prefix(url)?;
        Ok(Self::new(vec![prefix], url_path(url.trim())))
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_responses(mut self, responses: ResponseMapping) -> Self {
        self.responses = responses;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// How long `stop` waits for in-flight requests before aborting them.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// State shared by every request handler of one started receiver.
#[derive(Clone)]
struct Inbound {
    name: Arc<str>,
    filter: Arc<RequestFilter>,
    responses: Arc<ResponseMapping>,
    handler: Arc<dyn MessageHandler>,
    lifecycle: Arc<Lifecycle>,
    max_body_bytes: usize,
}

/// Receives messages as inbound HTTP requests.
pub struct HttpReceiver {
    name: Arc<str>,
    filter: Arc<RequestFilter>,
    responses: Arc<ResponseMapping>,
    max_body_bytes: usize,
    request_timeout: Duration,
    shutdown_timeout: Duration,
    lifecycle: Arc<Lifecycle>,
    shutdown: Shutdown,
    local_addrs: Mutex<Vec<SocketAddr>>,
    servers: Mutex<Vec<JoinHandle<std::io::Result<()>>>>,
}

impl HttpReceiver {
    /// Validate `settings` and build a receiver. Nothing is bound until `start`.
    pub fn new(name: impl Into<String>, settings: ReceiverSettings) -> Result<Self> {
        let name: String = name.into();
        if name.trim().is_empty() {
            return Err(Error::Config("receiver name must not be empty".into()));
        }
        if settings.prefixes.is_empty() {
            return Err(Error::Config(format!("receiver '{}' has no prefixes", name)));
        }

        let prefixes = settings
            .prefixes
            .iter()
            .map(|p| UriPrefix::parse(p))
            .collect::<Result<Vec<_>>>()?;
        let template = PathTemplate::compile(&settings.path)?;

        Ok(Self {
            name: name.into(),
            filter: Arc::new(RequestFilter::new(prefixes, template, settings.method)),
            responses: Arc::new(settings.responses),
            max_body_bytes: settings.max_body_bytes,
            request_timeout: settings.request_timeout,
            shutdown_timeout: settings.shutdown_timeout,
            lifecycle: Arc::new(Lifecycle::new()),
            shutdown: Shutdown::new(),
            local_addrs: Mutex::new(Vec::new()),
            servers: Mutex::new(Vec::new()),
        })
    }

    /// Convenience for [`ReceiverSettings::from_url`] with defaults.
    pub fn from_url(name: impl Into<String>, url: &str) -> Result<Self> {
        Self::new(name, ReceiverSettings::from_url(url)?)
    }

    /// Addresses bound by `start`. Empty before start.
    pub fn local_addrs(&self) -> Vec<SocketAddr> {
        self.local_addrs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.current()
    }

    pub fn filter(&self) -> &RequestFilter {
        &self.filter
    }

    pub fn responses(&self) -> &ResponseMapping {
        &self.responses
    }

    /// Wait for one server task to finish draining, aborting it after the shutdown timeout.
    async fn drain(&self, mut server: JoinHandle<std::io::Result<()>>) {
        match tokio::time::timeout(self.shutdown_timeout, &mut server).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => {
                tracing::warn!(receiver = %self.name, error = %e, "Server exited with error")
            }
            Ok(Err(e)) => tracing::warn!(receiver = %self.name, error = %e, "Server task failed"),
            Err(_) => {
                tracing::warn!(receiver = %self.name, "Server did not drain in time, aborting");
                server.abort();
            }
        }
    }

    /// Build the axum router with all middleware layers.
    fn build_router(&self, handler: Arc<dyn MessageHandler>) -> Router {
        let inbound = Inbound {
            name: self.name.clone(),
            filter: self.filter.clone(),
            responses: self.responses.clone(),
            handler,
            lifecycle: self.lifecycle.clone(),
            max_body_bytes: self.max_body_bytes,
        };

        Router::new()
            .fallback(handle_request)
            .with_state(inbound)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.request_timeout,
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }
}

#[async_trait]
impl Receiver for HttpReceiver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, handler: Arc<dyn MessageHandler>) -> Result<()> {
        self.lifecycle.try_start().map_err(|state| match state {
            LifecycleState::Started => Error::AlreadyStarted(self.name.to_string()),
            _ => Error::Stopped(self.name.to_string()),
        })?;

        let listeners = match bind_prefixes(self.filter.prefixes()).await {
            Ok(listeners) => listeners,
            Err(e) => {
                self.lifecycle.stop();
                return Err(e);
            }
        };

        let app = self.build_router(handler);
        let mut addrs = Vec::with_capacity(listeners.len());
        let mut servers = Vec::with_capacity(listeners.len());

        for bound in listeners {
            addrs.push(bound.local_addr);
            let service = app.clone().into_make_service_with_connect_info::<SocketAddr>();
            let shutdown = self.shutdown.subscribe();
            servers.push(tokio::spawn(async move {
                axum::serve(bound.listener, service)
                    .with_graceful_shutdown(shutdown)
                    .await
            }));
        }

        tracing::info!(
            receiver = %self.name,
            addresses = ?addrs,
            template = %self.filter.template().as_str(),
            method = %self.filter.method(),
            "Receiver started"
        );

        *self.local_addrs.lock().unwrap_or_else(|e| e.into_inner()) = addrs;
        *self.servers.lock().unwrap_or_else(|e| e.into_inner()) = servers;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if self.lifecycle.stop() != LifecycleState::Started {
            return Ok(());
        }

        self.shutdown.trigger();
        let servers = std::mem::take(&mut *self.servers.lock().unwrap_or_else(|e| e.into_inner()));
        join_all(servers.into_iter().map(|server| self.drain(server))).await;

        self.local_addrs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        tracing::info!(receiver = %self.name, "Receiver stopped");
        Ok(())
    }
}

impl Drop for HttpReceiver {
    fn drop(&mut self) {
        if self.lifecycle.stop() == LifecycleState::Started {
            self.shutdown.trigger();
        }
    }
}

/// Entry point for every request on every bound listener.
async fn handle_request(State(inbound): State<Inbound>, request: Request) -> Response {
    let response = dispatch(&inbound, request).await;
    metrics::record_request(&inbound.name, response.status().as_u16());
    response
}

async fn dispatch(inbound: &Inbound, request: Request) -> Response {
    if !inbound.lifecycle.is_started() {
        tracing::debug!(receiver = %inbound.name, "Request after stop, not dispatching");
        return response::unavailable();
    }

    let path = request.uri().path().to_string();
    let tokens = match inbound.filter.matches(&request) {
        MatchResult::Matched(tokens) => tokens,
        MatchResult::NotFound => {
            tracing::warn!(receiver = %inbound.name, path = %path, "No template match");
            return response::not_found();
        }
        MatchResult::MethodNotAllowed => {
            tracing::warn!(
                receiver = %inbound.name,
                path = %path,
                method = %request.method(),
                "Method not allowed"
            );
            return response::method_not_allowed(inbound.filter.method());
        }
    };

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, inbound.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(receiver = %inbound.name, path = %path, error = %e, "Request body rejected");
            return response::payload_too_large();
        }
    };

    let message = message_from_request(&parts, body, tokens);
    let message_id = message.id().to_string();

    tracing::debug!(
        receiver = %inbound.name,
        message_id = %message_id,
        path = %path,
        "Dispatching message"
    );

    let (tx, rx) = oneshot::channel();
    let received = HttpReceivedMessage::new(message, inbound.name.clone(), inbound.responses.clone(), tx);
    let handler = inbound.handler.clone();
    let name = inbound.name.clone();
    tokio::spawn(async move {
        handler.on_message(&name, Box::new(received)).await;
    });

    match rx.await {
        Ok(status) => status.to_response(),
        Err(_) => {
            tracing::warn!(
                receiver = %inbound.name,
                message_id = %message_id,
                "Message dropped without an outcome, answering as rollback"
            );
            inbound.responses.response_for(Outcome::Rollback).to_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::ResponseStatus;
    use crate::message::{handler_fn, ReceivedMessage};
    use axum::body::Body;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn receiver(settings: ReceiverSettings) -> HttpReceiver {
        let receiver = HttpReceiver::new("test", settings).unwrap();
        receiver.lifecycle.try_start().unwrap();
        receiver
    }

    fn orders() -> ReceiverSettings {
        ReceiverSettings::from_url("http://127.0.0.1:0/orders/{id}").unwrap()
    }

    fn resolve_with(outcome: Outcome) -> Arc<dyn MessageHandler> {
        handler_fn(move |message: Box<dyn ReceivedMessage>| async move {
            let _ = message.resolve(outcome).await;
        })
    }

    fn request(method: Method, uri: &str, body: Body) -> Request {
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(body)
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn rejects_invalid_settings() {
        assert!(HttpReceiver::new("", orders()).is_err());
        assert!(HttpReceiver::new("r", ReceiverSettings::new(vec![], "/x")).is_err());
        assert!(HttpReceiver::new("r", ReceiverSettings::new(vec!["ftp://host/".into()], "/x")).is_err());
        assert!(HttpReceiver::new("r", ReceiverSettings::new(vec!["http://localhost:1/".into()], "/{a")).is_err());
    }

    #[tokio::test]
    async fn acknowledged_request_gets_mapped_status() {
        let receiver = receiver(orders());
        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(Mutex::new(Some(tx)));
        let handler = handler_fn(move |message: Box<dyn ReceivedMessage>| {
            let tx = tx.clone();
            async move {
                let headers = message.message().headers().clone();
                if let Some(tx) = tx.lock().unwrap().take() {
                    let _ = tx.send(headers);
                }
                message.resolve(Outcome::Acknowledge).await.unwrap();
            }
        });

        let response = receiver
            .build_router(handler)
            .oneshot(
                axum::http::Request::builder()
                    .method(Method::POST)
                    .uri("/orders/42")
                    .header("X-Tenant", "acme")
                    .body(Body::from("hello"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let headers = rx.await.unwrap();
        assert_eq!(headers.get_str("id").as_deref(), Some("42"));
        assert_eq!(headers.get_str("x-tenant").as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn overridden_reject_status_and_description() {
        let responses = ResponseMapping::default()
            .with_status(Outcome::Reject, ResponseStatus::new(422, "Bad Order").unwrap());
        let receiver = receiver(orders().with_responses(responses));

        let response = receiver
            .build_router(resolve_with(Outcome::Reject))
            .oneshot(request(Method::POST, "/orders/1", Body::empty()))
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 422);
        assert_eq!(body_text(response).await, "Bad Order");
    }

    #[tokio::test]
    async fn unmatched_path_and_method() {
        let receiver = receiver(orders());
        let app = receiver.build_router(resolve_with(Outcome::Acknowledge));

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/customers/1", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(request(Method::GET, "/orders/1", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["allow"], "POST");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let receiver = receiver(orders().with_max_body_bytes(4));
        let response = receiver
            .build_router(resolve_with(Outcome::Acknowledge))
            .oneshot(request(Method::POST, "/orders/1", Body::from("too large")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn dropped_message_answers_rollback() {
        let receiver = receiver(orders());
        let handler = handler_fn(|message: Box<dyn ReceivedMessage>| async move {
            drop(message);
        });
        let response = receiver
            .build_router(handler)
            .oneshot(request(Method::POST, "/orders/1", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn requests_before_start_are_unavailable() {
        let receiver = HttpReceiver::new("idle", orders()).unwrap();
        let response = receiver
            .build_router(resolve_with(Outcome::Acknowledge))
            .oneshot(request(Method::POST, "/orders/1", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn requests_after_stop_never_reach_handler() {
        let receiver = receiver(orders());
        let handled = Arc::new(AtomicUsize::new(0));
        let counter = handled.clone();
        let handler = handler_fn(move |message: Box<dyn ReceivedMessage>| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = message.resolve(Outcome::Acknowledge).await;
            }
        });
        let app = receiver.build_router(handler);

        let response = app
            .clone()
            .oneshot(request(Method::POST, "/orders/1", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        receiver.lifecycle.stop();
        let response = app
            .oneshot(request(Method::POST, "/orders/2", Body::from("late")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unresolved_request_times_out() {
        let receiver = receiver(orders().with_request_timeout(Duration::from_millis(100)));
        let handler = handler_fn(|message: Box<dyn ReceivedMessage>| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(message);
        });
        let response = receiver
            .build_router(handler)
            .oneshot(request(Method::POST, "/orders/1", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test]
    async fn start_binds_and_stop_is_idempotent() {
        let receiver = HttpReceiver::new("life", orders()).unwrap();
        receiver.start(resolve_with(Outcome::Acknowledge)).await.unwrap();
        assert_eq!(receiver.state(), LifecycleState::Started);
        assert_eq!(receiver.local_addrs().len(), 1);
        assert_ne!(receiver.local_addrs()[0].port(), 0);

        assert!(matches!(
            receiver.start(resolve_with(Outcome::Acknowledge)).await,
            Err(Error::AlreadyStarted(_))
        ));

        receiver.stop().await.unwrap();
        receiver.stop().await.unwrap();
        assert_eq!(receiver.state(), LifecycleState::Stopped);
        assert!(receiver.local_addrs().is_empty());
        assert!(matches!(
            receiver.start(resolve_with(Outcome::Acknowledge)).await,
            Err(Error::Stopped(_))
        ));
    }
}
