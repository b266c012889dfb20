//! Tests for service configuration defaults, loading and validation.

use super::*;
use serial_test::serial;
use std::io::Write;

fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ============================================================================
// Defaults
// ============================================================================

mod default_tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let server = ServerConfig::default();

        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8080);
        assert_eq!(server.max_body_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_webhook_defaults() {
        let webhooks = WebhookConfig::default();

        assert_eq!(webhooks.endpoint_path, "/api/shopify_webhook");
        assert_eq!(
            webhooks.secret,
            SecretSource::Env {
                var: "SHOPIFY_WEBHOOK_SECRET".to_string()
            }
        );
    }

    #[test]
    fn test_logging_defaults() {
        let logging = LoggingConfig::default();

        assert_eq!(logging.level, "info");
        assert!(!logging.json_format);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ServiceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_socket_addr_from_defaults() {
        let addr = ServerConfig::default().socket_addr().unwrap();

        assert_eq!(addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_socket_addr_accepts_ipv6_host() {
        let server = ServerConfig {
            host: "::".to_string(),
            port: 9000,
            ..Default::default()
        };

        assert_eq!(server.socket_addr().unwrap().to_string(), "[::]:9000");
    }
}

// ============================================================================
// Loading
// ============================================================================

mod load_tests {
    use super::*;

    #[test]
    #[serial]
    fn test_load_without_sources_yields_defaults() {
        let config = ServiceConfig::load_from(None).unwrap();

        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_partial_yaml_keeps_other_defaults() {
        let file = write_yaml(
            r#"
server:
  port: 9443
webhooks:
  endpoint_path: /hooks/shopify
"#,
        );

        let config = ServiceConfig::load_from(Some(file.path())).unwrap();

        assert_eq!(config.server.port, 9443);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.webhooks.endpoint_path, "/hooks/shopify");
        assert_eq!(config.webhooks.secret, SecretSource::default());
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    #[serial]
    fn test_load_literal_secret_source() {
        let file = write_yaml(
            r#"
webhooks:
  secret:
    source: literal
    value: dev-only-secret
"#,
        );

        let config = ServiceConfig::load_from(Some(file.path())).unwrap();

        assert_eq!(
            config.webhooks.secret,
            SecretSource::Literal {
                value: "dev-only-secret".to_string()
            }
        );
    }

    #[test]
    #[serial]
    fn test_load_env_secret_source_with_custom_var() {
        let file = write_yaml(
            r#"
webhooks:
  secret:
    source: env
    var: STORE_HMAC_KEY
"#,
        );

        let config = ServiceConfig::load_from(Some(file.path())).unwrap();

        assert_eq!(
            config.webhooks.secret,
            SecretSource::Env {
                var: "STORE_HMAC_KEY".to_string()
            }
        );
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_an_error() {
        let result = ServiceConfig::load_from(Some(Path::new(
            "/nonexistent/storefront-hooks/service.yaml",
        )));

        assert!(matches!(result, Err(ConfigError::Load { .. })));
    }

    #[test]
    #[serial]
    fn test_malformed_yaml_is_an_error() {
        let file = write_yaml("server: [unclosed");

        let result = ServiceConfig::load_from(Some(file.path()));

        assert!(matches!(result, Err(ConfigError::Load { .. })));
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let file = write_yaml(
            r#"
server:
  port: 9443
logging:
  level: debug
"#,
        );
        std::env::set_var("SH__SERVER__PORT", "9090");
        std::env::set_var("SH__LOGGING__JSON_FORMAT", "true");

        let result = ServiceConfig::load_from(Some(file.path()));

        std::env::remove_var("SH__SERVER__PORT");
        std::env::remove_var("SH__LOGGING__JSON_FORMAT");

        let config = result.unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }

    #[test]
    #[serial]
    fn test_load_file_ignores_environment_overrides() {
        let file = write_yaml("server:\n  port: 9000\n");
        std::env::set_var("SH__SERVER__MAX_BODY_SIZE", "0");
        std::env::set_var("SH__SERVER__PORT", "1234");

        let result = ServiceConfig::load_file(file.path());

        std::env::remove_var("SH__SERVER__MAX_BODY_SIZE");
        std::env::remove_var("SH__SERVER__PORT");

        let config = result.unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.max_body_size, ServerConfig::default().max_body_size);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_file_requires_file() {
        let result =
            ServiceConfig::load_file(Path::new("/nonexistent/storefront-hooks/service.yaml"));

        assert!(matches!(result, Err(ConfigError::Load { .. })));
    }

    #[test]
    #[serial]
    fn test_load_reads_config_file_env_var() {
        let file = write_yaml("server:\n  port: 7070\n");
        std::env::set_var(CONFIG_FILE_ENV, file.path());

        let result = ServiceConfig::load();

        std::env::remove_var(CONFIG_FILE_ENV);

        assert_eq!(result.unwrap().server.port, 7070);
    }
}

// ============================================================================
// Validation
// ============================================================================

mod validation_tests {
    use super::*;

    #[test]
    fn test_empty_host_is_missing() {
        let mut config = ServiceConfig::default();
        config.server.host = String::new();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing { ref key }) if key == "server.host"
        ));
    }

    #[test]
    fn test_hostname_is_rejected() {
        let mut config = ServiceConfig::default();
        config.server.host = "localhost".to_string();

        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_zero_body_limit_is_rejected() {
        let mut config = ServiceConfig::default();
        config.server.max_body_size = 0;

        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_endpoint_path_must_be_absolute() {
        let mut config = ServiceConfig::default();
        config.webhooks.endpoint_path = "api/shopify_webhook".to_string();

        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_endpoint_path_cannot_shadow_health() {
        let mut config = ServiceConfig::default();
        config.webhooks.endpoint_path = "/health".to_string();

        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_empty_secret_var_is_missing() {
        let mut config = ServiceConfig::default();
        config.webhooks.secret = SecretSource::Env { var: String::new() };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing { ref key }) if key == "webhooks.secret.var"
        ));
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let mut config = ServiceConfig::default();
        config.logging.level = "verbose".to_string();

        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_log_level_is_case_insensitive() {
        let mut config = ServiceConfig::default();
        config.logging.level = "WARN".to_string();

        assert!(config.validate().is_ok());
    }
}

// ============================================================================
// Secret source
// ============================================================================

mod secret_source_tests {
    use super::*;

    #[test]
    #[serial]
    fn test_env_source_resolves_value() {
        std::env::set_var("SH_TEST_SECRET_SOURCE_SET", "from-env");

        let secret = SecretSource::Env {
            var: "SH_TEST_SECRET_SOURCE_SET".to_string(),
        }
        .resolve();

        std::env::remove_var("SH_TEST_SECRET_SOURCE_SET");

        assert_eq!(secret.unwrap().expose_secret(), "from-env");
    }

    #[test]
    #[serial]
    fn test_env_source_unset_resolves_none() {
        std::env::remove_var("SH_TEST_SECRET_SOURCE_UNSET");

        let secret = SecretSource::Env {
            var: "SH_TEST_SECRET_SOURCE_UNSET".to_string(),
        }
        .resolve();

        assert!(secret.is_none());
    }

    #[test]
    fn test_literal_source_resolves_value() {
        let secret = SecretSource::Literal {
            value: "abc123".to_string(),
        }
        .resolve();

        assert_eq!(secret.unwrap().expose_secret(), "abc123");
    }

    #[test]
    fn test_empty_literal_resolves_none() {
        let secret = SecretSource::Literal {
            value: String::new(),
        }
        .resolve();

        assert!(secret.is_none());
    }

    #[test]
    fn test_debug_redacts_literal_value() {
        let source = SecretSource::Literal {
            value: "super-secret-value".to_string(),
        };

        let debug_str = format!("{:?}", source);

        assert!(!debug_str.contains("super-secret-value"));
        assert!(debug_str.contains("<REDACTED>"));
    }

    #[test]
    fn test_debug_redacts_through_service_config() {
        let mut config = ServiceConfig::default();
        config.webhooks.secret = SecretSource::Literal {
            value: "super-secret-value".to_string(),
        };

        let debug_str = format!("{:#?}", config);

        assert!(!debug_str.contains("super-secret-value"));
    }

    #[test]
    fn test_debug_shows_env_var_name() {
        let debug_str = format!("{:?}", SecretSource::default());

        assert!(debug_str.contains("SHOPIFY_WEBHOOK_SECRET"));
    }
}
