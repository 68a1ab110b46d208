//! Routing subsystem: templates and prefixes.
//!
//! # Data Flow
//! ```text
//! Inbound (per request):
//!     method + path
//!     → matcher.rs (prefix containment, then template, then method)
//!     → template.rs (token extraction)
//!     → Matched(tokens) | NotFound | MethodNotAllowed
//!
//! Outbound (per send):
//!     URL template + message headers
//!     → url_template.rs (substitute tokens, consume headers)
//!     → concrete URL
//!
//! Configuration (at construction):
//!     single URL → prefix.rs (derive prefix, path) → compiled filter
//! ```
//!
//! # Design Decisions
//! - Templates compiled once, immutable at runtime
//! - Invalid templates and prefixes fail at construction, not per request

pub mod matcher;
pub mod prefix;
pub mod template;
pub mod url_template;

pub use matcher::{MatchResult, RequestFilter};
pub use prefix::{derive_prefix, url_path, UriPrefix};
pub use template::{PathTemplate, TemplateError};
pub use url_template::UrlTemplate;
