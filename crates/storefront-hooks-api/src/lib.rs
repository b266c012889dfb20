//! # Storefront Hooks HTTP Service
//!
//! HTTP endpoint that authenticates inbound commerce-platform webhooks before
//! handing them to business logic.
//!
//! This crate provides:
//! - the webhook route, which runs the request state machine
//!   (method, secret, raw body, signature, JSON) and maps each outcome to a
//!   fixed status code
//! - a health endpoint
//! - service configuration types and layered loading
//! - server start-up with graceful shutdown

pub mod config;
pub mod errors;

pub use config::{LoggingConfig, SecretSource, ServerConfig, ServiceConfig, WebhookConfig};
pub use errors::{ConfigError, ServiceError, WebhookHandlerError};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use storefront_hooks_core::{
    webhook::{HEADER_HMAC, HEADER_TOPIC},
    Timestamp, WebhookError, WebhookHeaders, WebhookRequest, WebhookVerifier,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

/// Path of the liveness endpoint
pub const HEALTH_PATH: &str = "/health";

/// Request and response header carrying the correlation id
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Longest caller-supplied correlation id that is reused and echoed
pub const MAX_CORRELATION_ID_LEN: usize = 128;

// ============================================================================
// Application State
// ============================================================================

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: ServiceConfig,

    /// Verifier holding the webhook secret and the downstream handler
    pub verifier: Arc<WebhookVerifier>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ServiceConfig, verifier: Arc<WebhookVerifier>) -> Self {
        Self { config, verifier }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
///
/// The webhook route accepts every method so that the handler itself answers
/// non-`POST` requests with the webhook-specific `405` body.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(&state.config.webhooks.endpoint_path, any(handle_webhook))
        .route(HEALTH_PATH, get(handle_health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
///
/// Runs until SIGINT or SIGTERM, then lets in-flight requests finish.
pub async fn start_server(
    config: ServiceConfig,
    verifier: Arc<WebhookVerifier>,
) -> Result<(), ServiceError> {
    let addr = config.server.socket_addr()?;

    let state = AppState::new(config, verifier);
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.to_string(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

// ============================================================================
// Webhook Handler
// ============================================================================

/// Handle inbound webhook requests
///
/// Runs the checks in a fixed order and stops at the first failure:
/// 1. method is `POST`, else `405`
/// 2. a secret is configured, else `500`
/// 3. the raw body is read in full under the size limit, else `413`/`400`
/// 4. exactly one signature header is present and it matches the raw body,
///    else `403`
/// 5. the body parses as JSON, else `500`
///
/// On success the downstream handler is awaited and `200` is returned. A
/// failing downstream handler does not change the response.
#[instrument(skip(state, method, headers, body), fields(method = %method))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, WebhookHandlerError> {
    if method != Method::POST {
        return Err(WebhookHandlerError::MethodNotAllowed {
            method: method.to_string(),
        });
    }

    if !state.verifier.is_configured() {
        return Err(WebhookError::SecretNotConfigured.into());
    }

    let raw_body = read_raw_body(body, state.config.server.max_body_size).await?;

    let signature_count = headers.get_all(HEADER_HMAC).iter().count();
    if signature_count > 1 {
        return Err(WebhookError::InvalidSignature(format!(
            "{signature_count} {HEADER_HMAC} headers present, expected one"
        ))
        .into());
    }

    // HeaderName is already lower-case
    let header_map: HashMap<String, String> = headers
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or("").to_string()))
        .collect();

    let webhook_request =
        WebhookRequest::new(WebhookHeaders::from_http_headers(&header_map), raw_body);

    let verified = state.verifier.verify(&webhook_request)?;

    info!(
        topic = verified.topic_or_unknown(),
        shop_domain = ?verified.shop_domain,
        webhook_id = ?verified.webhook_id,
        "Webhook accepted"
    );

    state.verifier.dispatch(&verified).await;

    Ok(plain_text(StatusCode::OK, "200: OK"))
}

/// Collect the request body byte-for-byte, failing once it passes `max_size`.
async fn read_raw_body(body: Body, max_size: usize) -> Result<Bytes, WebhookHandlerError> {
    let mut stream = body.into_data_stream();
    let mut buffer = BytesMut::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| WebhookHandlerError::BodyRead {
            message: e.to_string(),
        })?;

        if buffer.len() + chunk.len() > max_size {
            return Err(WebhookHandlerError::PayloadTooLarge { max_size });
        }

        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer.freeze())
}

fn plain_text(status: StatusCode, body: &'static str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

// ============================================================================
// Health Check Handler
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub secret_configured: bool,
    pub timestamp: Timestamp,
}

/// Liveness endpoint. Reports whether a secret is loaded but stays `200`
/// either way; webhook deliveries surface the missing secret themselves.
#[instrument(skip(state))]
async fn handle_health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let secret_configured = state.verifier.is_configured();
    if !secret_configured {
        warn!("Health check: webhook secret is not configured");
    }

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        secret_configured,
        timestamp: Timestamp::now(),
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware
///
/// Reuses the caller's `x-correlation-id` when it is non-empty and no longer
/// than [`MAX_CORRELATION_ID_LEN`], otherwise generates one. The id is echoed
/// on the response. Webhook deliveries also carry their topic in the span.
#[instrument(skip(request, next), fields(
    method = %request.method(),
    path = %request.uri().path(),
    correlation_id,
    topic,
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let start = std::time::Instant::now();
    let span = tracing::Span::current();

    let correlation_id = caller_correlation_id(request.headers())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    span.record("correlation_id", correlation_id.as_str());

    if let Some(topic) = request
        .headers()
        .get(HEADER_TOPIC)
        .and_then(|v| v.to_str().ok())
    {
        span.record("topic", topic);
    }

    request.extensions_mut().insert(correlation_id.clone());

    let mut response = next.run(request).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, header_value);
    }

    let status = response.status().as_u16();
    match status {
        500..=599 => error!(status, duration_ms, "Request failed"),
        400..=499 => warn!(status, duration_ms, "Request rejected"),
        _ => info!(status, duration_ms, "Request completed"),
    }

    response
}

fn caller_correlation_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= MAX_CORRELATION_ID_LEN)
        .map(str::to_string)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
