//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use http_messaging::message::{handler_fn, MessageHandler, Outcome, ReceivedMessage};
use http_messaging::{HttpReceiver, Message, Receiver};

/// A request captured by a recording backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }
}

/// Requests seen by a recording backend, in arrival order.
#[derive(Clone, Default)]
pub struct Recorded(Arc<Mutex<Vec<RecordedRequest>>>);

impl Recorded {
    pub fn all(&self) -> Vec<RecordedRequest> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    /// Wait until at least `count` requests arrived.
    pub async fn wait_for(&self, count: usize) -> Vec<RecordedRequest> {
        for _ in 0..200 {
            if self.len() >= count {
                return self.all();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} requests, saw {}", count, self.len());
    }
}

#[derive(Clone)]
struct Backend {
    recorded: Recorded,
    status: StatusCode,
}

async fn record(State(backend): State<Backend>, request: Request) -> impl IntoResponse {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    backend.recorded.0.lock().unwrap().push(RecordedRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        headers: parts.headers,
        body,
    });
    backend.status
}

/// Start a backend on an ephemeral port that records every request and
/// answers with `status`.
pub async fn start_recording_backend(status: StatusCode) -> (SocketAddr, Recorded) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded = Recorded::default();
    let app = Router::new().fallback(record).with_state(Backend {
        recorded: recorded.clone(),
        status,
    });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, recorded)
}

/// Start a raw backend that answers every request with `status_line`,
/// e.g. `"418 Custom Teapot"`, so non-standard reason phrases survive.
pub async fn start_status_line_backend(status_line: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                read_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status_line
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// Start a backend that accepts connections but answers only after `delay`.
pub async fn start_slow_backend(delay: Duration) -> SocketAddr {
    start_programmable_backend(move || async move {
        tokio::time::sleep(delay).await;
        (200, "OK".to_string())
    })
    .await
}

/// Start a programmable mock backend with async support.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                read_request(&mut socket).await;
                let (status, body) = f().await;
                let reason = StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown");
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

/// Read one request head and its `Content-Length` body.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + length {
            return;
        }
    }
}

/// HTTP client that never goes through a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Start `receiver` and return its first bound address.
pub async fn start(receiver: &HttpReceiver, handler: Arc<dyn MessageHandler>) -> SocketAddr {
    receiver.start(handler).await.unwrap();
    receiver.local_addrs()[0]
}

/// Handler that records each message and resolves it with `outcome`.
pub fn resolving(outcome: Outcome) -> (Arc<dyn MessageHandler>, Arc<Mutex<Vec<Message>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler = handler_fn(move |message: Box<dyn ReceivedMessage>| {
        let sink = sink.clone();
        async move {
            sink.lock().unwrap().push(message.message().clone());
            message.resolve(outcome).await.unwrap();
        }
    });
    (handler, seen)
}
