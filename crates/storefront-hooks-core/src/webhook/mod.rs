//! # Webhook Authentication Module
//!
//! Carries inbound commerce-platform webhooks from raw bytes to a trusted,
//! parsed payload.
//!
//! Processing order for every request is fixed:
//! 1. the secret must be configured
//! 2. the HMAC-SHA256 of the exact raw body must match the signature header
//! 3. only then is the body parsed as JSON
//!
//! The body is held as [`Bytes`] from receipt to signature computation and is
//! never decoded or re-encoded before the signature check.

use crate::{ErrorCategory, Timestamp};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;

pub mod signature;
pub mod verifier;

pub use signature::{compute_signature, signatures_match, verify_signature};
pub use verifier::WebhookVerifier;

// ============================================================================
// Header Names
// ============================================================================

/// Base64-encoded HMAC-SHA256 digest of the raw body.
pub const HEADER_HMAC: &str = "x-shopify-hmac-sha256";

/// Event category, e.g. `orders/create`.
pub const HEADER_TOPIC: &str = "x-shopify-topic";

/// `*.myshopify.com` domain of the shop that produced the event.
pub const HEADER_SHOP_DOMAIN: &str = "x-shopify-shop-domain";

/// Unique identifier of this delivery.
pub const HEADER_WEBHOOK_ID: &str = "x-shopify-webhook-id";

/// Payload format version.
pub const HEADER_API_VERSION: &str = "x-shopify-api-version";

// ============================================================================
// Core Types
// ============================================================================

/// Headers consumed from an inbound webhook delivery.
///
/// All fields are optional at parse time. A missing signature is rejected by
/// the verifier as a mismatch; the remaining headers are informational and
/// never take part in authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookHeaders {
    pub signature: Option<String>,   // X-Shopify-Hmac-Sha256
    pub topic: Option<String>,       // X-Shopify-Topic
    pub shop_domain: Option<String>, // X-Shopify-Shop-Domain
    pub webhook_id: Option<String>,  // X-Shopify-Webhook-Id
    pub api_version: Option<String>, // X-Shopify-API-Version
}

impl WebhookHeaders {
    /// Parse headers from an HTTP header map with lower-cased keys.
    ///
    /// Keys are expected lower-cased, as produced by the HTTP layer; the
    /// mixed-case spelling used in platform documentation is accepted as a
    /// fallback for callers that build the map by hand.
    pub fn from_http_headers(headers: &HashMap<String, String>) -> Self {
        let lookup = |name: &str| -> Option<String> {
            headers
                .get(name)
                .or_else(|| {
                    headers
                        .iter()
                        .find(|(key, _)| key.eq_ignore_ascii_case(name))
                        .map(|(_, value)| value)
                })
                .cloned()
        };

        Self {
            signature: lookup(HEADER_HMAC),
            topic: lookup(HEADER_TOPIC).filter(|topic| !topic.is_empty()),
            shop_domain: lookup(HEADER_SHOP_DOMAIN),
            webhook_id: lookup(HEADER_WEBHOOK_ID),
            api_version: lookup(HEADER_API_VERSION),
        }
    }
}

/// Raw, unauthenticated webhook delivery.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub headers: WebhookHeaders,
    pub body: Bytes,
    pub received_at: Timestamp,
}

impl WebhookRequest {
    /// Create new webhook request
    pub fn new(headers: WebhookHeaders, body: Bytes) -> Self {
        Self {
            headers,
            body,
            received_at: Timestamp::now(),
        }
    }

    /// Get topic from headers if present
    pub fn topic(&self) -> Option<&str> {
        self.headers.topic.as_deref()
    }

    /// Get signature from headers if present
    pub fn signature(&self) -> Option<&str> {
        self.headers.signature.as_deref()
    }

    /// Raw body bytes exactly as received
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// A webhook whose signature has been verified and whose body parsed as JSON.
///
/// This is what downstream handlers receive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedWebhook {
    pub topic: Option<String>,
    pub payload: serde_json::Value,
    pub shop_domain: Option<String>,
    pub webhook_id: Option<String>,
    pub api_version: Option<String>,
    pub received_at: Timestamp,
}

impl VerifiedWebhook {
    /// Topic for log lines; `unknown` when the header was absent
    pub fn topic_or_unknown(&self) -> &str {
        self.topic.as_deref().unwrap_or("unknown")
    }
}

// ============================================================================
// Extension Point
// ============================================================================

/// Downstream business logic invoked once per accepted webhook.
///
/// The verifier's obligation ends at handing over a trusted, parsed payload.
/// What happens next (order processing, inventory sync) is up to the
/// implementation. Errors are logged by the caller and do not change the
/// response sent to the platform.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use storefront_hooks_core::webhook::{VerifiedWebhook, WebhookHandler};
///
/// struct OrderHandler;
///
/// #[async_trait]
/// impl WebhookHandler for OrderHandler {
///     async fn handle_webhook(
///         &self,
///         webhook: &VerifiedWebhook,
///     ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///         if webhook.topic.as_deref() == Some("orders/create") {
///             // create the order
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Handle a verified webhook.
    async fn handle_webhook(
        &self,
        webhook: &VerifiedWebhook,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

// ============================================================================
// Error Types
// ============================================================================

/// Verification failures, in the order the verifier can produce them
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Webhook secret is not configured")]
    SecretNotConfigured,

    #[error("Webhook secret cannot be used as an HMAC key: {message}")]
    InvalidSecret { message: String },

    #[error("Signature validation failed: {0}")]
    InvalidSignature(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

impl WebhookError {
    /// Get error category for monitoring
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            Self::SecretNotConfigured => ErrorCategory::Configuration,
            Self::InvalidSecret { .. } => ErrorCategory::Configuration,
            Self::InvalidSignature(_) => ErrorCategory::Security,
            Self::MalformedPayload(_) => ErrorCategory::Payload,
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
