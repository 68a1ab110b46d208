//! Inbound request conversion.
//!
//! # Responsibilities
//! - Turn request headers into message headers (repeated headers joined)
//! - Merge extracted path tokens into the header namespace
//! - Carry the request id and originating system onto the message
//!
//! # Design Decisions
//! - Path tokens replace request headers of the same name
//! - Body is kept as raw bytes; text views decode on demand
//! - Header values are decoded as UTF-8, lossily, so none is dropped

use axum::http::request::Parts;
use axum::http::HeaderMap;
use bytes::Bytes;
use std::collections::BTreeMap;

use crate::message::{Headers, Message, HTTP_TRANSPORT, ORIGINATING_SYSTEM_HEADER};

/// Header set on every inbound request by the request-id layer.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Message headers from request headers. Repeated headers are joined with `, `.
pub fn headers_from_request(headers: &HeaderMap) -> Headers {
    let mut out = Headers::new();
    for name in headers.keys() {
        let values: Vec<String> = headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect();
        if !values.is_empty() {
            out.insert(name.as_str(), values.join(", "));
        }
    }
    out
}

/// Build the message delivered for an accepted request.
pub fn message_from_request(parts: &Parts, body: Bytes, tokens: BTreeMap<String, String>) -> Message {
    let mut headers = headers_from_request(&parts.headers);
    for (name, value) in tokens {
        headers.insert(name, value);
    }

    let originating_system = headers
        .get_str(ORIGINATING_SYSTEM_HEADER)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| HTTP_TRANSPORT.to_string());

    let mut message = Message::binary(body);
    if let Some(id) = parts.headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok()) {
        message = message.with_id(id);
    }
    message
        .with_headers(headers)
        .with_originating_system(originating_system)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn repeated_headers_are_joined() {
        let parts = parts(
            Request::builder()
                .header("Accept", "text/plain")
                .header("Accept", "application/json"),
        );
        let headers = headers_from_request(&parts.headers);
        assert_eq!(headers.get_str("accept").as_deref(), Some("text/plain, application/json"));
    }

    #[test]
    fn non_ascii_values_are_kept() {
        let mut map = HeaderMap::new();
        map.insert("x-customer", axum::http::HeaderValue::from_bytes("José".as_bytes()).unwrap());
        map.insert("x-legacy", axum::http::HeaderValue::from_bytes(b"caf\xe9").unwrap());

        let headers = headers_from_request(&map);
        assert_eq!(headers.get_str("x-customer").as_deref(), Some("José"));
        assert_eq!(headers.get_str("x-legacy").as_deref(), Some("caf\u{fffd}"));
    }

    #[test]
    fn tokens_take_the_header_namespace() {
        let parts = parts(
            Request::builder()
                .header("orderId", "from-header")
                .header(X_REQUEST_ID, "req-1"),
        );
        let tokens = BTreeMap::from([("orderId".to_string(), "from-path".to_string())]);

        let message = message_from_request(&parts, Bytes::from_static(b"{}"), tokens);
        assert_eq!(message.headers().get_str("orderid").as_deref(), Some("from-path"));
        assert_eq!(message.id(), "req-1");
        assert_eq!(message.originating_system(), Some(HTTP_TRANSPORT));
        assert_eq!(message.payload().as_text(), Some("{}"));
    }

    #[test]
    fn originating_system_header_is_honoured() {
        let parts = parts(Request::builder().header(ORIGINATING_SYSTEM_HEADER, "billing"));
        let message = message_from_request(&parts, Bytes::new(), BTreeMap::new());
        assert_eq!(message.originating_system(), Some("billing"));
    }
}
