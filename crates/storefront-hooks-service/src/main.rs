//! # Storefront Hooks Service
//!
//! Binary entry point for the storefront webhook receiver.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes logging
//! - Resolves the webhook secret once
//! - Starts the HTTP server from storefront-hooks-api

mod handler;

use handler::LoggingWebhookHandler;
use std::sync::Arc;
use storefront_hooks_api::{start_server, LoggingConfig, ServiceConfig, ServiceError};
use storefront_hooks_core::WebhookVerifier;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (applied in order, later sources override earlier ones):
    //  1. /etc/storefront-hooks/service.yaml
    //  2. ./config/service.yaml
    //  3. Path given by SH_CONFIG_FILE
    //  4. Environment variables prefixed SH__ (double-underscore separator)
    //     e.g. SH__SERVER__PORT=9090 sets server.port = 9090
    //
    // Logging is configured from the loaded file, so a load failure falls back
    // to default logging before reporting and exiting.
    // -------------------------------------------------------------------------
    let service_config = match ServiceConfig::load() {
        Ok(config) => config,
        Err(e) => {
            init_logging(&LoggingConfig::default());
            error!(error = %e, "Failed to load service configuration; aborting");
            std::process::exit(3);
        }
    };

    init_logging(&service_config.logging);

    info!("Starting Storefront Hooks Service");

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(3);
    }

    // -------------------------------------------------------------------------
    // Resolve the webhook secret
    //
    // Read exactly once. A missing secret does not stop the service: every
    // POST is answered with 500 until the process is restarted with one.
    // -------------------------------------------------------------------------
    let secret = service_config.webhooks.secret.resolve();
    if secret.is_none() {
        error!(
            source = ?service_config.webhooks.secret,
            "Webhook secret is not configured; every webhook delivery will be rejected"
        );
    }

    let verifier = Arc::new(WebhookVerifier::new(
        secret,
        Arc::new(LoggingWebhookHandler::new()),
    ));

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        endpoint = %service_config.webhooks.endpoint_path,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(service_config, verifier).await {
        error!("Server stopped with error: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
        };

        std::process::exit(exit_code);
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `logging.level`.
fn init_logging(logging: &LoggingConfig) {
    let level = logging.level.to_ascii_lowercase();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "storefront_hooks_service={level},storefront_hooks_api={level},\
             storefront_hooks_core={level},tower_http={level}"
        )
        .into()
    });

    let (json_layer, text_layer) = if logging.json_format {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
