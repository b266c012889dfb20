//! Common test utilities for storefront-hooks integration tests
//!
//! This module provides:
//! - A recording [`WebhookHandler`] test double
//! - Builders for signed and unsigned webhook requests
//! - App state and router construction helpers

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use std::sync::{Arc, Mutex};
use storefront_hooks_api::{create_router, AppState, ServiceConfig};
use storefront_hooks_core::{
    webhook::{compute_signature, HEADER_HMAC, HEADER_SHOP_DOMAIN, HEADER_TOPIC, HEADER_WEBHOOK_ID},
    VerifiedWebhook, WebhookHandler, WebhookSecret, WebhookVerifier,
};

pub const ENDPOINT: &str = "/api/shopify_webhook";

// ============================================================================
// Recording Handler
// ============================================================================

/// Downstream handler that records every webhook it receives
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<VerifiedWebhook>>>,
    fail: bool,
}

impl RecordingHandler {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that records the call and then reports a failure
    #[allow(dead_code)]
    pub fn failing() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<VerifiedWebhook> {
        self.calls.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl WebhookHandler for RecordingHandler {
    async fn handle_webhook(
        &self,
        webhook: &VerifiedWebhook,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.calls.lock().unwrap().push(webhook.clone());
        if self.fail {
            return Err("downstream rejected webhook".into());
        }
        Ok(())
    }
}

// ============================================================================
// State and Router Helpers
// ============================================================================

/// Build app state with the given secret and handler
#[allow(dead_code)]
pub fn create_test_app_state(secret: Option<&str>, handler: RecordingHandler) -> AppState {
    create_test_app_state_with_config(secret, handler, ServiceConfig::default())
}

#[allow(dead_code)]
pub fn create_test_app_state_with_config(
    secret: Option<&str>,
    handler: RecordingHandler,
    config: ServiceConfig,
) -> AppState {
    let secret = secret.and_then(WebhookSecret::new);
    let verifier = Arc::new(WebhookVerifier::new(secret, Arc::new(handler)));
    AppState::new(config, verifier)
}

/// Build a router with the given secret and handler
#[allow(dead_code)]
pub fn create_test_router(secret: Option<&str>, handler: RecordingHandler) -> Router {
    create_router(create_test_app_state(secret, handler))
}

// ============================================================================
// Request Builders
// ============================================================================

/// Base64 HMAC-SHA256 of `body` under `secret`
#[allow(dead_code)]
pub fn sign(secret: &str, body: &[u8]) -> String {
    compute_signature(&WebhookSecret::new(secret).unwrap(), body).unwrap()
}

/// A webhook request carrying the given signature header, if any
#[allow(dead_code)]
pub fn webhook_request(
    method: Method,
    topic: &str,
    signature: Option<&str>,
    body: impl Into<Body>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(ENDPOINT)
        .header(HEADER_TOPIC, topic)
        .header(HEADER_SHOP_DOMAIN, "example.myshopify.com")
        .header(HEADER_WEBHOOK_ID, "b54557e4-bdd9-4b37-8a5f-bf7d70bcd043");
    if let Some(signature) = signature {
        builder = builder.header(HEADER_HMAC, signature);
    }
    builder.body(body.into()).unwrap()
}

/// A POST request signed with `secret` over the exact bytes of `body`
#[allow(dead_code)]
pub fn signed_request(secret: &str, topic: &str, body: &'static str) -> Request<Body> {
    let signature = sign(secret, body.as_bytes());
    webhook_request(Method::POST, topic, Some(&signature), body)
}

/// Response body as a string
#[allow(dead_code)]
pub async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
