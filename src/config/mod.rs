//! Relay configuration.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → Relay::from_config builds receiver, senders and forwarding rules
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ForwardSettings, ForwardingSettings, ObservabilityConfig, ReceiverConfig, RelayConfig,
    RelaySection, ResponsesConfig, SenderConfig, StatusConfig,
};
pub use validation::{validate_config, ValidationError};
