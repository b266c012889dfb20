//! The webhook verifier: secret check, signature check, JSON parse.

use super::{signature::verify_signature, VerifiedWebhook, WebhookError, WebhookHandler, WebhookRequest};
use crate::WebhookSecret;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Authenticates inbound webhooks against a shared secret and hands accepted
/// payloads to a downstream [`WebhookHandler`].
///
/// The secret is injected once at construction and never re-read. `None`
/// means the process was started without a secret; every verification then
/// fails with [`WebhookError::SecretNotConfigured`] instead of skipping the
/// signature check.
///
/// Verification holds no mutable state, so a single verifier is shared by
/// all requests behind an `Arc`.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use bytes::Bytes;
/// use std::sync::Arc;
/// use storefront_hooks_core::webhook::{
///     compute_signature, VerifiedWebhook, WebhookHandler, WebhookHeaders, WebhookRequest,
///     WebhookVerifier,
/// };
/// use storefront_hooks_core::WebhookSecret;
///
/// struct Ignore;
///
/// #[async_trait]
/// impl WebhookHandler for Ignore {
///     async fn handle_webhook(
///         &self,
///         _webhook: &VerifiedWebhook,
///     ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///         Ok(())
///     }
/// }
///
/// let secret = WebhookSecret::new("abc123").unwrap();
/// let body = Bytes::from_static(br#"{"order_id":42}"#);
/// let headers = WebhookHeaders {
///     signature: Some(compute_signature(&secret, &body).unwrap()),
///     topic: Some("orders/create".to_string()),
///     ..Default::default()
/// };
///
/// let verifier = WebhookVerifier::new(Some(secret), Arc::new(Ignore));
/// let verified = verifier.verify(&WebhookRequest::new(headers, body)).unwrap();
/// assert_eq!(verified.payload["order_id"], 42);
/// ```
pub struct WebhookVerifier {
    secret: Option<WebhookSecret>,
    handler: Arc<dyn WebhookHandler>,
}

impl WebhookVerifier {
    /// Create a verifier with an optional secret and the downstream handler.
    pub fn new(secret: Option<WebhookSecret>, handler: Arc<dyn WebhookHandler>) -> Self {
        if secret.is_none() {
            warn!("Webhook verifier created without a secret; all deliveries will be rejected");
        }

        Self { secret, handler }
    }

    /// Returns `true` when a secret is available for signature checks.
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Authenticate and parse a webhook request.
    ///
    /// Steps run in a fixed order and stop at the first failure:
    /// 1. secret configured, else [`WebhookError::SecretNotConfigured`]
    /// 2. signature over the raw body matches, else [`WebhookError::InvalidSignature`]
    /// 3. body parses as JSON, else [`WebhookError::MalformedPayload`]
    ///
    /// The result depends only on the request and the configured secret, so
    /// repeating a request always produces the same verdict.
    #[instrument(skip(self, request), fields(
        topic = request.topic().unwrap_or("unknown"),
        body_len = request.body.len()
    ))]
    pub fn verify(&self, request: &WebhookRequest) -> Result<VerifiedWebhook, WebhookError> {
        let secret = self.secret.as_ref().ok_or(WebhookError::SecretNotConfigured)?;

        verify_signature(secret, request.body(), request.signature())?;

        let payload: serde_json::Value = serde_json::from_slice(request.body())?;

        let headers = &request.headers;
        Ok(VerifiedWebhook {
            topic: headers.topic.clone(),
            payload,
            shop_domain: headers.shop_domain.clone(),
            webhook_id: headers.webhook_id.clone(),
            api_version: headers.api_version.clone(),
            received_at: request.received_at,
        })
    }

    /// Hand a verified webhook to the downstream handler.
    ///
    /// Handler failures are logged and swallowed; the delivery has already
    /// been accepted.
    #[instrument(skip(self, webhook), fields(topic = webhook.topic_or_unknown()))]
    pub async fn dispatch(&self, webhook: &VerifiedWebhook) {
        match self.handler.handle_webhook(webhook).await {
            Ok(()) => {
                info!(
                    topic = webhook.topic_or_unknown(),
                    webhook_id = ?webhook.webhook_id,
                    "Webhook handler completed"
                );
            }
            Err(e) => {
                error!(
                    topic = webhook.topic_or_unknown(),
                    webhook_id = ?webhook.webhook_id,
                    error = %e,
                    "Webhook handler failed"
                );
            }
        }
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret_configured", &self.is_configured())
            .finish()
    }
}

#[cfg(test)]
#[path = "verifier_tests.rs"]
mod tests;
