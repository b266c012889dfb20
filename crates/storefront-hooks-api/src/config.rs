//! Configuration types for the HTTP service

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use storefront_hooks_core::WebhookSecret;
use tracing::{info, warn};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_FILE_ENV: &str = "SH_CONFIG_FILE";

/// Prefix for environment overrides, e.g. `SH__SERVER__PORT=9090`.
pub const ENV_PREFIX: &str = "SH";

/// Default environment variable holding the webhook secret.
pub const DEFAULT_SECRET_ENV_VAR: &str = "SHOPIFY_WEBHOOK_SECRET";

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Webhook endpoint settings
    pub webhooks: WebhookConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from the standard sources.
    ///
    /// Sources, later overriding earlier:
    ///  1. `/etc/storefront-hooks/service.yaml` (optional)
    ///  2. `./config/service.yaml` (optional)
    ///  3. the file named by `SH_CONFIG_FILE` (required when set)
    ///  4. environment variables prefixed `SH` with `__` separators
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var(CONFIG_FILE_ENV)
            .ok()
            .filter(|path| !path.is_empty());

        Self::load_from(explicit.as_deref().map(Path::new))
    }

    /// Load configuration, using `explicit_path` in place of `SH_CONFIG_FILE`.
    pub fn load_from(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(
                config::File::with_name("/etc/storefront-hooks/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            )
            .add_source(
                config::File::with_name("config/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            );

        if let Some(path) = explicit_path {
            info!(path = %path.display(), "Loading configuration from explicit path");
            builder = builder.add_source(
                config::File::from(path)
                    .required(true)
                    .format(config::FileFormat::Yaml),
            );
        }

        let loaded = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(|e| ConfigError::Load {
                message: e.to_string(),
            })?;

        loaded.try_deserialize().map_err(|e| ConfigError::Load {
            message: e.to_string(),
        })
    }

    /// Load configuration from `path` alone, on top of the defaults.
    ///
    /// Neither the standard file locations nor `SH__` environment overrides
    /// are consulted, so the result depends only on the named file.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        config::Config::builder()
            .add_source(
                config::File::from(path)
                    .required(true)
                    .format(config::FileFormat::Yaml),
            )
            .build()
            .and_then(|loaded| loaded.try_deserialize())
            .map_err(|e| ConfigError::Load {
                message: e.to_string(),
            })
    }

    /// Validate configuration values that serde cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.webhooks.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl ServerConfig {
    /// Socket address built from `host` and `port`
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|_| ConfigError::Invalid {
            message: format!("server.host '{}' is not an IP address", self.host),
        })?;

        Ok(SocketAddr::new(ip, self.port))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Missing {
                key: "server.host".to_string(),
            });
        }

        self.socket_addr()?;

        if self.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Webhook endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WebhookConfig {
    /// Webhook endpoint path
    pub endpoint_path: String,

    /// Where the shared HMAC secret comes from
    pub secret: SecretSource,
}

impl WebhookConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                message: format!(
                    "webhooks.endpoint_path '{}' must start with '/'",
                    self.endpoint_path
                ),
            });
        }

        if self.endpoint_path == crate::HEALTH_PATH {
            return Err(ConfigError::Invalid {
                message: format!(
                    "webhooks.endpoint_path must not shadow {}",
                    crate::HEALTH_PATH
                ),
            });
        }

        self.secret.validate()
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            endpoint_path: "/api/shopify_webhook".to_string(),
            secret: SecretSource::default(),
        }
    }
}

/// Source of the webhook secret.
///
/// The secret is resolved exactly once, at start-up. A source that yields no
/// value is not a configuration error: the service still starts and rejects
/// every delivery with a 500 until restarted with a secret.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SecretSource {
    /// Read from the named environment variable
    Env { var: String },

    /// Secret embedded in configuration. Development only.
    Literal { value: String },
}

impl SecretSource {
    /// Resolve the secret. Returns `None` when the source holds no value.
    pub fn resolve(&self) -> Option<WebhookSecret> {
        match self {
            Self::Env { var } => {
                let secret = WebhookSecret::from_env(var);
                if secret.is_none() {
                    warn!(var = %var, "Webhook secret environment variable is unset or empty");
                }
                secret
            }
            Self::Literal { value } => {
                warn!(
                    "Literal webhook secret in configuration is active; \
                     literal secrets are not safe for production"
                );
                WebhookSecret::new(value.clone())
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Env { var } if var.is_empty() => Err(ConfigError::Missing {
                key: "webhooks.secret.var".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

impl Default for SecretSource {
    fn default() -> Self {
        Self::Env {
            var: DEFAULT_SECRET_ENV_VAR.to_string(),
        }
    }
}

impl std::fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Env { var } => f.debug_struct("Env").field("var", var).finish(),
            Self::Literal { .. } => f
                .debug_struct("Literal")
                .field("value", &"<REDACTED>")
                .finish(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

        if !LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "logging.level '{}' must be one of {}",
                    self.level,
                    LEVELS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
