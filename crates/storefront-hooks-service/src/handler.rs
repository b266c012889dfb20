//! Default downstream handler for the service binary.
//!
//! The service ships without business logic of its own. Accepted webhooks
//! are logged with their metadata so that operators can confirm deliveries
//! end to end before wiring a real [`WebhookHandler`].

use async_trait::async_trait;
use storefront_hooks_core::{VerifiedWebhook, WebhookHandler};
use tracing::{debug, info, instrument};

/// A [`WebhookHandler`] that records each verified webhook in the log.
#[derive(Debug, Default, Clone)]
pub struct LoggingWebhookHandler;

impl LoggingWebhookHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WebhookHandler for LoggingWebhookHandler {
    #[instrument(skip(self, webhook), fields(topic = webhook.topic_or_unknown()))]
    async fn handle_webhook(
        &self,
        webhook: &VerifiedWebhook,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(
            topic = webhook.topic_or_unknown(),
            shop_domain = ?webhook.shop_domain,
            webhook_id = ?webhook.webhook_id,
            api_version = ?webhook.api_version,
            received_at = %webhook.received_at,
            payload_fields = payload_field_count(&webhook.payload),
            "Webhook verified"
        );

        debug!(payload = %webhook.payload, "Webhook payload");

        Ok(())
    }
}

/// Number of top-level fields for objects, elements for arrays, else zero.
fn payload_field_count(payload: &serde_json::Value) -> usize {
    match payload {
        serde_json::Value::Object(map) => map.len(),
        serde_json::Value::Array(items) => items.len(),
        _ => 0,
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
