//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the relay binary.
//! All types derive Serde traits for deserialization from TOML files and
//! convert into the library's validated settings types.

use axum::http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::http::{ReceiverSettings, ResponseMapping, ResponseStatus, SenderSettings};
use crate::message::Outcome;

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Inbound HTTP receiver.
    pub receiver: ReceiverConfig,

    /// Named outbound senders.
    pub senders: BTreeMap<String, SenderConfig>,

    /// What the relay does with each received message.
    pub relay: RelaySection,

    /// Per-outcome forwarding rules.
    pub forwarding: ForwardingSettings,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Receiver configuration. Give either `url`, or `prefixes` plus `path`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Logical receiver name for logs and metrics.
    pub name: String,

    /// Single URL with inline path template, e.g. `http://+:8080/orders/{id}`.
    pub url: Option<String>,

    /// Explicit listening prefixes.
    pub prefixes: Vec<String>,

    /// Path template used with explicit prefixes.
    pub path: Option<String>,

    /// Accepted HTTP method.
    pub method: String,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Time a request may wait for its outcome.
    pub request_timeout_secs: u64,

    /// Time `stop` waits for in-flight requests.
    pub shutdown_timeout_secs: u64,

    /// Status overrides per outcome.
    pub responses: ResponsesConfig,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            name: "http".to_string(),
            url: None,
            prefixes: Vec::new(),
            path: None,
            method: "POST".to_string(),
            max_body_bytes: crate::http::receiver::DEFAULT_MAX_BODY_BYTES,
            request_timeout_secs: 30,
            shutdown_timeout_secs: 10,
            responses: ResponsesConfig::default(),
        }
    }
}

/// Optional status overrides.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResponsesConfig {
    pub acknowledge: Option<StatusConfig>,
    pub rollback: Option<StatusConfig>,
    pub reject: Option<StatusConfig>,
}

/// A status code with an optional description (defaults to the standard reason).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusConfig {
    pub status: u16,
    pub description: Option<String>,
}

/// Outbound sender configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SenderConfig {
    /// Destination URL, may contain `{token}` placeholders.
    pub url: String,

    /// HTTP method.
    #[serde(default = "default_method")]
    pub method: String,

    /// Headers added to every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Default content type.
    pub content_type: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

fn default_method() -> String {
    "POST".to_string()
}

/// Relay behaviour.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelaySection {
    /// Sender every received message is relayed to. Without one, messages
    /// are acknowledged as soon as they arrive.
    pub target: Option<String>,
}

/// Forwarding rules per outcome.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ForwardingSettings {
    /// Name the forwarding receiver presents; defaults to the receiver name.
    pub name: Option<String>,
    pub acknowledge: Option<ForwardSettings>,
    pub rollback: Option<ForwardSettings>,
    pub reject: Option<ForwardSettings>,
}

impl ForwardingSettings {
    /// Configured rules with their outcome.
    pub fn rules(&self) -> impl Iterator<Item = (Outcome, &ForwardSettings)> {
        [
            (Outcome::Acknowledge, self.acknowledge.as_ref()),
            (Outcome::Rollback, self.rollback.as_ref()),
            (Outcome::Reject, self.reject.as_ref()),
        ]
        .into_iter()
        .filter_map(|(outcome, rule)| rule.map(|r| (outcome, r)))
    }

    pub fn is_empty(&self) -> bool {
        self.rules().next().is_none()
    }
}

/// One forwarding rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForwardSettings {
    /// Name of the sender in `[senders]`.
    pub sender: String,

    /// Outcome applied to the original after forwarding; defaults to the same.
    pub outcome: Option<Outcome>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

pub(crate) fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| Error::Config(format!("invalid HTTP method '{}'", method)))
}

impl StatusConfig {
    fn to_status(&self) -> Result<ResponseStatus> {
        let description = match &self.description {
            Some(description) => description.clone(),
            None => axum::http::StatusCode::from_u16(self.status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or_default()
                .to_string(),
        };
        ResponseStatus::new(self.status, description)
    }
}

impl ResponsesConfig {
    pub fn to_mapping(&self) -> Result<ResponseMapping> {
        let mut mapping = ResponseMapping::default();
        let overrides = [
            (Outcome::Acknowledge, &self.acknowledge),
            (Outcome::Rollback, &self.rollback),
            (Outcome::Reject, &self.reject),
        ];
        for (outcome, status) in overrides {
            if let Some(status) = status {
                mapping = mapping.with_status(outcome, status.to_status()?);
            }
        }
        Ok(mapping)
    }
}

impl ReceiverConfig {
    /// Convert into validated receiver settings.
    pub fn to_settings(&self) -> Result<ReceiverSettings> {
        let settings = match (&self.url, self.prefixes.is_empty()) {
            (Some(_), false) => {
                return Err(Error::Config(
                    "receiver takes either `url` or `prefixes`, not both".into(),
                ))
            }
            (Some(url), true) => ReceiverSettings::from_url(url)?,
            (None, false) => ReceiverSettings::new(
                self.prefixes.clone(),
                self.path.clone().unwrap_or_default(),
            ),
            (None, true) => {
                return Err(Error::Config("receiver needs `url` or `prefixes`".into()))
            }
        };

        Ok(settings
            .with_method(parse_method(&self.method)?)
            .with_responses(self.responses.to_mapping()?)
            .with_max_body_bytes(self.max_body_bytes)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_shutdown_timeout(Duration::from_secs(self.shutdown_timeout_secs)))
    }
}

impl SenderConfig {
    /// Convert into sender settings. Validation happens when the sender is built.
    pub fn to_settings(&self) -> Result<SenderSettings> {
        let mut settings = SenderSettings::new(self.url.clone()).with_method(parse_method(&self.method)?);
        for (name, value) in &self.headers {
            settings = settings.with_header(name.clone(), value.clone());
        }
        if let Some(content_type) = &self.content_type {
            settings = settings.with_content_type(content_type.clone());
        }
        if let Some(secs) = self.timeout_secs {
            settings = settings.with_timeout(Duration::from_secs(secs));
        }
        Ok(settings)
    }
}
