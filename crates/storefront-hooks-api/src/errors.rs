//! Error types for the HTTP service

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use storefront_hooks_core::WebhookError;
use tracing::{error, warn};

/// Webhook handler errors with HTTP status code mapping
///
/// Every failure of the request state machine maps to a fixed status code and
/// a fixed plain-text body:
///
/// - `405`: the request method is not `POST`
/// - `500 Key Missing`: no webhook secret is configured
/// - `500 Processing Error`: the configured secret cannot key the MAC
/// - `413`: the body exceeds `server.max_body_size`
/// - `400`: the body stream failed before it was fully read
/// - `403`: the signature header is missing, repeated or does not match
/// - `500 Processing Error`: the signature matched but the body is not JSON
///
/// # Security Considerations
///
/// Response bodies never carry error detail. The full error is logged
/// server-side with its category.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    /// Request used a method other than `POST`
    #[error("Method not allowed: {method}")]
    MethodNotAllowed { method: String },

    /// Verification pipeline failure
    ///
    /// Maps to:
    /// - `500` for [`WebhookError::SecretNotConfigured`],
    ///   [`WebhookError::InvalidSecret`] and [`WebhookError::MalformedPayload`]
    /// - `403` for [`WebhookError::InvalidSignature`]
    #[error("Verification failed: {0}")]
    Verification(#[from] WebhookError),

    /// Payload too large
    ///
    /// Raised as soon as the accumulated body passes the limit, before any
    /// signature work.
    #[error("Payload too large (max: {max_size} bytes)")]
    PayloadTooLarge { max_size: usize },

    /// Body stream failed mid-read, usually a client disconnect
    #[error("Failed to read request body: {message}")]
    BodyRead { message: String },
}

impl WebhookHandlerError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Verification(e) => match e {
                WebhookError::InvalidSignature(_) => StatusCode::FORBIDDEN,
                WebhookError::SecretNotConfigured
                | WebhookError::InvalidSecret { .. }
                | WebhookError::MalformedPayload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::BodyRead { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Fixed plain-text body returned to the caller
    pub fn response_body(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed { .. } => "405",
            Self::Verification(e) => match e {
                WebhookError::SecretNotConfigured => "500: Key Missing",
                WebhookError::InvalidSignature(_) => "403: Validation Failed",
                WebhookError::InvalidSecret { .. } | WebhookError::MalformedPayload(_) => {
                    "500: Processing Error"
                }
            },
            Self::PayloadTooLarge { .. } => "413: Payload Too Large",
            Self::BodyRead { .. } => "400: Unreadable Body",
        }
    }
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::MethodNotAllowed { method } => {
                warn!(method = %method, "Rejected webhook with unsupported method");
            }
            Self::Verification(e) => {
                if status.is_server_error() {
                    error!(
                        error = %e,
                        category = %e.error_category(),
                        "Webhook verification failed"
                    );
                } else {
                    warn!(
                        error = %e,
                        category = %e.error_category(),
                        "Webhook verification failed"
                    );
                }
            }
            Self::PayloadTooLarge { max_size } => {
                warn!(max_size = max_size, "Payload too large");
            }
            Self::BodyRead { message } => {
                warn!(error = %message, "Failed to read webhook body");
            }
        }

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.response_body(),
        )
            .into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration loading failed: {message}")]
    Load { message: String },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
