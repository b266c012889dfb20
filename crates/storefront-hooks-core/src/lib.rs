//! # Storefront Hooks Core
//!
//! Domain logic for authenticating inbound commerce-platform webhooks.
//!
//! The platform signs every delivery with an HMAC-SHA256 digest of the raw
//! request body, keyed by a secret shared with this service. This crate owns:
//! - the request and header types that carry the raw body untouched
//! - signature computation and constant-time comparison
//! - the [`WebhookVerifier`](webhook::WebhookVerifier) that turns a raw
//!   request into a trusted, parsed [`VerifiedWebhook`](webhook::VerifiedWebhook)
//! - the [`WebhookHandler`](webhook::WebhookHandler) extension point for
//!   downstream business logic
//!
//! HTTP concerns (status codes, body collection, routing) live in the API crate.
//!
//! ## Usage
//!
//! ```rust
//! use storefront_hooks_core::{webhook::compute_signature, WebhookSecret};
//!
//! let secret = WebhookSecret::new("testsecret").expect("non-empty secret");
//! let signature = compute_signature(&secret, br#"{"a":1}"#).expect("HMAC accepts any key");
//! assert_eq!(signature.len(), 44);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod secret;
pub mod webhook;

pub use secret::WebhookSecret;
pub use webhook::{
    VerifiedWebhook, WebhookError, WebhookHandler, WebhookHeaders, WebhookRequest,
    WebhookVerifier,
};

// ============================================================================
// Common Types
// ============================================================================

/// UTC timestamp attached to requests as they are received
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current moment
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Convert to RFC3339 string
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Get underlying DateTime
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

/// High-level error categorization used in structured logs and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Operator-caused failures; the process is missing required configuration
    Configuration,
    /// Authentication failures; the sender could not prove knowledge of the secret
    Security,
    /// An authenticated sender delivered a body that could not be processed
    Payload,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Security => "security",
            Self::Payload => "payload",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
