//! # Storefront Hooks CLI
//!
//! Operator tooling for the webhook receiver.
//!
//! This module provides CLI commands for:
//! - Signing a payload the way the commerce platform does
//! - Checking a payload against a signature header value
//! - Validating a service configuration file

use clap::{Parser, Subcommand};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use storefront_hooks_api::{ConfigError, ServiceConfig};
use storefront_hooks_core::{
    webhook::{compute_signature, verify_signature},
    WebhookError, WebhookSecret,
};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable the `--secret` flag falls back to.
pub const SECRET_ENV_VAR: &str = "SHOPIFY_WEBHOOK_SECRET";

// ============================================================================
// CLI Structure
// ============================================================================

/// Storefront Hooks CLI - tools for authenticated commerce webhooks
#[derive(Parser, Debug)]
#[command(name = "storefront-hooks")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sign and verify storefront webhook payloads")]
pub struct Cli {
    /// Logging level
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the base64 HMAC-SHA256 signature of a payload
    Sign {
        /// Shared webhook secret
        #[arg(long, env = "SHOPIFY_WEBHOOK_SECRET", hide_env_values = true)]
        secret: String,

        /// Payload file; stdin when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Check a payload against an X-Shopify-Hmac-Sha256 value
    Verify {
        /// Shared webhook secret
        #[arg(long, env = "SHOPIFY_WEBHOOK_SECRET", hide_env_values = true)]
        secret: String,

        /// Signature to check
        #[arg(long)]
        signature: String,

        /// Payload file; stdin when omitted
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Validate a service configuration file
    Config {
        /// Configuration file to validate
        #[arg(short, long)]
        file: PathBuf,

        /// Show resolved configuration
        #[arg(short, long)]
        show: bool,
    },
}

// ============================================================================
// Errors
// ============================================================================

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Signature does not match payload")]
    SignatureMismatch,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Webhook error: {0}")]
    Webhook(WebhookError),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } => 2,
            Self::Configuration(_) => 3,
            Self::SignatureMismatch => 4,
            Self::Io(_) => 5,
            Self::Webhook(_) => 6,
        }
    }
}

impl From<WebhookError> for CliError {
    fn from(error: WebhookError) -> Self {
        match error {
            WebhookError::InvalidSignature(_) => Self::SignatureMismatch,
            other => Self::Webhook(other),
        }
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Parse arguments, initialise logging and run the selected command
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &mut out)
}

/// Run a command, writing its result to `out`
pub fn execute(command: &Commands, out: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Commands::Sign { secret, file } => execute_sign_command(secret, file.as_deref(), out),
        Commands::Verify {
            secret,
            signature,
            file,
        } => execute_verify_command(secret, signature, file.as_deref(), out),
        Commands::Config { file, show } => execute_config_command(file, *show, out),
    }
}

fn execute_sign_command(
    secret: &str,
    file: Option<&Path>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let secret = parse_secret(secret)?;
    let payload = read_payload(file)?;

    debug!(payload_len = payload.len(), "Signing payload");

    let signature = compute_signature(&secret, &payload)?;
    writeln!(out, "{}", signature)?;
    Ok(())
}

fn execute_verify_command(
    secret: &str,
    signature: &str,
    file: Option<&Path>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let secret = parse_secret(secret)?;
    let payload = read_payload(file)?;

    debug!(payload_len = payload.len(), "Verifying payload");

    match verify_signature(&secret, &payload, Some(signature)) {
        Ok(()) => {
            writeln!(out, "valid")?;
            Ok(())
        }
        Err(e) => {
            writeln!(out, "invalid")?;
            Err(e.into())
        }
    }
}

fn execute_config_command(file: &Path, show: bool, out: &mut dyn Write) -> Result<(), CliError> {
    info!(file = %file.display(), "Validating configuration");

    let config = ServiceConfig::load_file(file)?;
    config.validate()?;

    writeln!(out, "Configuration is valid: {}", file.display())?;
    if show {
        writeln!(out, "{:#?}", config)?;
    }

    Ok(())
}

fn parse_secret(value: &str) -> Result<WebhookSecret, CliError> {
    WebhookSecret::new(value).ok_or_else(|| CliError::InvalidArgument {
        message: "secret must not be empty".to_string(),
    })
}

/// Payload bytes exactly as stored; no trimming or newline handling.
fn read_payload(file: Option<&Path>) -> Result<Vec<u8>, CliError> {
    match file {
        Some(path) => Ok(std::fs::read(path)?),
        None => {
            let mut buffer = Vec::new();
            std::io::stdin().lock().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Logs go to stderr so stdout carries only command output.
fn initialize_logging(cli: &Cli) -> Result<(), CliError> {
    let filter = tracing_subscriber::EnvFilter::try_new(&cli.log_level).map_err(|e| {
        CliError::InvalidArgument {
            message: format!("invalid log level '{}': {}", cli.log_level, e),
        }
    })?;

    let (json_layer, text_layer) = if cli.json_logs {
        (
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
            None,
        )
    } else {
        (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    Ok(())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
