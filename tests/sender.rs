//! End-to-end tests for the HTTP sender against mock backends.

use axum::http::{Method, StatusCode};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use http_messaging::{Error, HttpSender, Message, Sender, SenderSettings};

mod common;

fn sender(settings: SenderSettings) -> HttpSender {
    HttpSender::with_client("test", settings, common::client()).unwrap()
}

#[tokio::test]
async fn test_url_tokens_are_substituted_and_consumed() {
    let (addr, recorded) = common::start_recording_backend(StatusCode::OK).await;
    let sender = sender(SenderSettings::new(format!("http://{}/orders/{{id}}/lines", addr)));

    let message = Message::text("payload")
        .with_header("id", "42")
        .with_header("X-Tenant", "acme");
    sender.send(message, &CancellationToken::new()).await.unwrap();

    let requests = recorded.wait_for(1).await;
    let request = &requests[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "/orders/42/lines");
    assert!(request.headers.get("id").is_none());
    assert_eq!(request.header_values("x-tenant"), ["acme"]);
    assert_eq!(request.header_values("originating-system"), ["HTTP"]);
    assert_eq!(request.body.as_ref(), b"payload");
}

#[tokio::test]
async fn test_missing_token_fails_without_request() {
    let (addr, recorded) = common::start_recording_backend(StatusCode::OK).await;
    let sender = sender(SenderSettings::new(format!("http://{}/orders/{{id}}", addr)));

    let err = sender
        .send(Message::text("x").with_header("other", "1"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingUrlToken { ref token } if token == "id"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(recorded.len(), 0);
}

#[tokio::test]
async fn test_delimited_headers_become_repeated_occurrences() {
    let (addr, recorded) = common::start_recording_backend(StatusCode::OK).await;
    let sender = sender(
        SenderSettings::new(format!("http://{}/in", addr))
            .with_header("X-Default", "one")
            .with_header("X-Overridden", "default"),
    );

    let message = Message::text("x")
        .with_header("X-Multi", "a, b;c ,, ")
        .with_header("X-Single", "  padded  ")
        .with_header("X-Overridden", "mine");
    sender.send(message, &CancellationToken::new()).await.unwrap();

    let request = &recorded.wait_for(1).await[0];
    assert_eq!(request.header_values("x-multi"), ["a", "b", "c"]);
    assert_eq!(request.header_values("x-single"), ["padded"]);
    assert_eq!(request.header_values("x-default"), ["one"]);
    assert_eq!(request.header_values("x-overridden"), ["mine"]);
}

#[tokio::test]
async fn test_content_type_precedence() {
    let (addr, recorded) = common::start_recording_backend(StatusCode::OK).await;
    let url = format!("http://{}/in", addr);
    let cancel = CancellationToken::new();

    // Payload kind decides when nothing is configured.
    let plain = sender(SenderSettings::new(url.clone()));
    plain.send(Message::text("t"), &cancel).await.unwrap();
    plain.send(Message::binary(vec![1u8, 2, 3]), &cancel).await.unwrap();

    // Sender default beats payload kind.
    let json = sender(SenderSettings::new(url.clone()).with_content_type("application/json"));
    json.send(Message::text("{}"), &cancel).await.unwrap();

    // Message header beats sender default and is never split.
    let message = Message::text("<a/>").with_header("Content-Type", "application/xml; charset=utf-8");
    json.send(message, &cancel).await.unwrap();

    let requests = recorded.wait_for(4).await;
    let content_types: Vec<_> = requests.iter().map(|r| r.header_values("content-type")).collect();
    assert_eq!(
        content_types,
        [
            vec!["text/plain; charset=utf-8".to_string()],
            vec!["application/octet-stream".to_string()],
            vec!["application/json".to_string()],
            vec!["application/xml; charset=utf-8".to_string()],
        ]
    );
    assert_eq!(requests[1].body.as_ref(), [1u8, 2, 3]);
}

#[tokio::test]
async fn test_invalid_message_content_type_fails() {
    let (addr, _) = common::start_recording_backend(StatusCode::OK).await;
    let sender = sender(SenderSettings::new(format!("http://{}/in", addr)));
    let err = sender
        .send(Message::text("x").with_header("content-type", "garbage"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidMediaType(_)));
}

#[tokio::test]
async fn test_configured_method_is_used() {
    let (addr, recorded) = common::start_recording_backend(StatusCode::NO_CONTENT).await;
    let sender = sender(SenderSettings::new(format!("http://{}/in", addr)).with_method(Method::PUT));
    sender.send(Message::text("x"), &CancellationToken::new()).await.unwrap();
    assert_eq!(recorded.wait_for(1).await[0].method, Method::PUT);
}

#[tokio::test]
async fn test_originating_system_is_preserved() {
    let (addr, recorded) = common::start_recording_backend(StatusCode::OK).await;
    let sender = sender(SenderSettings::new(format!("http://{}/in", addr)));
    let message = Message::text("x").with_originating_system("Kafka");
    sender.send(message, &CancellationToken::new()).await.unwrap();
    assert_eq!(recorded.wait_for(1).await[0].header_values("originating-system"), ["Kafka"]);
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let addr = common::start_programmable_backend(|| async { (503, "busy".to_string()) }).await;
    let sender = sender(SenderSettings::new(format!("http://{}/in", addr)));

    let err = sender.send(Message::text("x"), &CancellationToken::new()).await.unwrap_err();
    match err {
        Error::Status { status, reason } => {
            assert_eq!(status, 503);
            assert_eq!(reason, "Service Unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_custom_reason_phrase_is_reported() {
    let addr = common::start_status_line_backend("418 Custom Teapot").await;
    let sender = sender(SenderSettings::new(format!("http://{}/in", addr)));

    let err = sender.send(Message::text("x"), &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err.status(), Some(418));
    assert!(err.to_string().contains("Custom Teapot"), "{err}");
}

#[tokio::test]
async fn test_connection_failure_is_a_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let sender = sender(SenderSettings::new(format!("http://127.0.0.1:{}/in", port)));
    let err = sender.send(Message::text("x"), &CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, Error::Request(_)));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_cancellation_aborts_in_flight_send() {
    let addr = common::start_slow_backend(Duration::from_secs(5)).await;
    let sender = sender(SenderSettings::new(format!("http://{}/in", addr)));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let err = sender.send(Message::text("x"), &cancel).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_sender_timeout() {
    let addr = common::start_slow_backend(Duration::from_secs(5)).await;
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let sender = HttpSender::with_client("timeout", SenderSettings::new(format!("http://{}/in", addr)), client).unwrap();

    let err = sender.send(Message::text("x"), &CancellationToken::new()).await.unwrap_err();
    match err {
        Error::Request(e) => assert!(e.is_timeout()),
        other => panic!("unexpected error: {other}"),
    }
}
