//! Message payloads and header maps.

use bytes::Bytes;
use serde_json::Value;
use std::collections::BTreeMap;

/// Message body. The representation is fixed when the message is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Bytes),
}

impl Payload {
    /// Raw bytes of the payload.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Binary(bytes) => bytes,
        }
    }

    /// Payload as text, if it is text or valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Binary(bytes) => std::str::from_utf8(bytes).ok(),
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Payload::Binary(_))
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Render a header value the way it goes on the wire.
pub fn render_header_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Header map with ASCII case-insensitive names.
///
/// The first spelling of a name is kept; later inserts under an equal name
/// replace the value only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers {
    entries: BTreeMap<String, Value>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_for(&self, name: &str) -> Option<&String> {
        self.entries.keys().find(|k| k.eq_ignore_ascii_case(name))
    }

    /// Insert or replace a header, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.key_for(&name).cloned() {
            Some(existing) => self.entries.insert(existing, value),
            None => self.entries.insert(name, value),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.key_for(name).and_then(|k| self.entries.get(k))
    }

    /// Header value rendered as a string.
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.get(name).map(render_header_value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let key = self.key_for(name)?.clone();
        self.entries.remove(&key)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.key_for(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

/// A logical message: payload, headers and originating system.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    id: String,
    payload: Payload,
    headers: Headers,
    originating_system: Option<String>,
}

impl Message {
    /// Build a message around `payload` with a fresh id.
    pub fn new(payload: Payload) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            payload,
            headers: Headers::new(),
            originating_system: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Payload::Text(text.into()))
    }

    pub fn binary(bytes: impl Into<Bytes>) -> Self {
        Self::new(Payload::Binary(bytes.into()))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_originating_system(mut self, system: impl Into<String>) -> Self {
        self.originating_system = Some(system.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn originating_system(&self) -> Option<&str> {
        self.originating_system.as_deref()
    }
}
