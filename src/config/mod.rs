//! Configuration module for Karo
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`KARO_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use karo::config::KaroConfig;
//!
//! let config = KaroConfig::default();
//! assert_eq!(config.server.port, 9090);
//!
//! let toml = r#"
//! [engine]
//! default_namespace = "monitoring"
//!
//! [[rules]]
//! name = "restart-web"
//! alertName = "PodCrashLooping"
//!
//! [[rules.actions]]
//! name = "bounce"
//! image = "bitnami/kubectl:latest"
//! "#;
//! let config: KaroConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.rules.len(), 1);
//! assert!(config.validate().is_ok());
//! ```

pub mod engine;
pub mod error;
pub mod logging;
pub mod server;
pub mod sink;
pub mod store;

pub use engine::EngineConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use server::ServerConfig;
pub use sink::{SinkConfig, SinkKind};
pub use store::{build_store, StoreConfig};

use crate::rules::{validate_rule, ReactionRule, RuleStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Unified configuration for the Karo service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KaroConfig {
    /// Webhook listener
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// Synthesis defaults
    pub engine: EngineConfig,
    /// Job submission target
    pub sink: SinkConfig,
    /// Config/secret objects available to env references
    pub stores: Vec<StoreConfig>,
    /// Reaction rules
    pub rules: Vec<ReactionRule>,
}

impl KaroConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports KARO_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("KARO_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("KARO_HOST") {
            self.server.host = host;
        }

        if let Ok(level) = std::env::var("KARO_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("KARO_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(namespace) = std::env::var("KARO_NAMESPACE") {
            if !namespace.is_empty() {
                self.engine.default_namespace = namespace;
            }
        }

        self
    }

    /// Validate configuration, including admission checks for every rule
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation {
                field: "server.port".to_string(),
                message: "port must be non-zero".to_string(),
            });
        }

        if self.engine.default_namespace.is_empty() {
            return Err(ConfigError::Validation {
                field: "engine.default_namespace".to_string(),
                message: "namespace cannot be empty".to_string(),
            });
        }
        if self.engine.lookup_timeout_ms == 0 {
            return Err(ConfigError::Validation {
                field: "engine.lookup_timeout_ms".to_string(),
                message: "timeout must be non-zero".to_string(),
            });
        }

        if self.sink.kind == SinkKind::Webhook
            && self.sink.url.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConfigError::Validation {
                field: "sink.url".to_string(),
                message: "webhook sink requires a URL".to_string(),
            });
        }

        for (i, store) in self.stores.iter().enumerate() {
            if store.name.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("stores[{}].name", i),
                    message: "name cannot be empty".to_string(),
                });
            }
        }

        let mut seen = HashSet::new();
        for (index, rule) in self.rules.iter().enumerate() {
            validate_rule(rule).map_err(|source| ConfigError::Rule {
                index,
                rule: rule.name.clone(),
                source,
            })?;

            let key = rule.key(&self.engine.default_namespace);
            if !seen.insert(key.clone()) {
                return Err(ConfigError::Validation {
                    field: format!("rules[{}].name", index),
                    message: format!("duplicate rule '{}'", key),
                });
            }
        }

        Ok(())
    }

    /// Build the rule store from the configured rules.
    pub fn rule_store(&self) -> Result<RuleStore, ConfigError> {
        let store = RuleStore::new(self.engine.default_namespace.clone());
        for (index, rule) in self.rules.iter().enumerate() {
            store
                .upsert(rule.clone())
                .map_err(|source| ConfigError::Rule {
                    index,
                    rule: rule.name.clone(),
                    source,
                })?;
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Action, RuleError};
    use std::path::Path;

    fn rule(name: &str) -> ReactionRule {
        ReactionRule {
            name: name.to_string(),
            namespace: None,
            uid: None,
            alert_name: "DiskFull".to_string(),
            matchers: vec![],
            actions: vec![Action::new("cleanup", "busybox")],
            volumes: vec![],
        }
    }

    #[test]
    fn test_karo_config_defaults() {
        let config = KaroConfig::default();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.engine.default_namespace, "default");
        assert_eq!(config.sink.kind, SinkKind::Log);
        assert!(config.rules.is_empty());
        assert!(config.stores.is_empty());
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let toml = r#"
        [server]
        port = 9100
        "#;

        let config: KaroConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_config_parse_full_toml() {
        let toml = include_str!("../../karo.example.toml");
        let config: KaroConfig = toml::from_str(toml).unwrap();
        assert!(config.server.port > 0);
        assert!(!config.rules.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_config_parse_rule_with_matchers_and_env() {
        let toml = r#"
        [[rules]]
        name = "high-cpu"
        namespace = "ops"
        alertName = "HighCPU"

        [[rules.matchers]]
        attributePath = "labels.severity"
        operator = "In"
        values = ["critical", "page"]

        [[rules.actions]]
        name = "profile"
        image = "busybox"
        command = ["sh", "-c"]
        args = ["echo $INSTANCE"]

        [[rules.actions.env]]
        name = "INSTANCE"
        valueFrom = { alertRef = { fieldPath = "labels.instance" } }
        "#;

        let config: KaroConfig = toml::from_str(toml).unwrap();
        let rule = &config.rules[0];
        assert_eq!(rule.namespace.as_deref(), Some("ops"));
        assert_eq!(rule.matchers[0].values, vec!["critical", "page"]);
        assert!(rule.actions[0].env[0].value_from.is_some());
        config.validate().unwrap();
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[server]\nport = 8080").unwrap();

        let config = KaroConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = KaroConfig::load(Some(Path::new("/nonexistent/karo.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[server\nport = ").unwrap();

        let result = KaroConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_env_override_port() {
        std::env::set_var("KARO_PORT", "9999");
        let config = KaroConfig::default().with_env_overrides();
        std::env::remove_var("KARO_PORT");

        assert_eq!(config.server.port, 9999);
    }

    #[test]
    fn test_config_env_override_host() {
        std::env::set_var("KARO_HOST", "127.0.0.1");
        let config = KaroConfig::default().with_env_overrides();
        std::env::remove_var("KARO_HOST");

        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_config_env_override_log_level() {
        std::env::set_var("KARO_LOG_LEVEL", "debug");
        let config = KaroConfig::default().with_env_overrides();
        std::env::remove_var("KARO_LOG_LEVEL");

        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_env_override_namespace() {
        std::env::set_var("KARO_NAMESPACE", "monitoring");
        let config = KaroConfig::default().with_env_overrides();
        std::env::remove_var("KARO_NAMESPACE");

        assert_eq!(config.engine.default_namespace, "monitoring");
    }

    #[test]
    fn test_config_env_override_log_format() {
        std::env::set_var("KARO_LOG_FORMAT", "json");
        let config = KaroConfig::default().with_env_overrides();
        assert_eq!(config.logging.format, LogFormat::Json);

        std::env::set_var("KARO_LOG_FORMAT", "xml");
        let config = KaroConfig::default().with_env_overrides();
        std::env::remove_var("KARO_LOG_FORMAT");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_config_validation_zero_port() {
        let mut config = KaroConfig::default();
        config.server.port = 0;

        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::Validation { ref field, .. }) if field == "server.port"
        ));
    }

    #[test]
    fn test_config_validation_zero_lookup_timeout() {
        let mut config = KaroConfig::default();
        config.engine.lookup_timeout_ms = 0;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "engine.lookup_timeout_ms"
        ));
    }

    #[test]
    fn test_config_validation_webhook_requires_url() {
        let mut config = KaroConfig::default();
        config.sink.kind = SinkKind::Webhook;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "sink.url"
        ));

        config.sink.url = Some("http://localhost:8081/jobs".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_invalid_rule() {
        let mut config = KaroConfig::default();
        let mut bad = rule("no-actions");
        bad.actions.clear();
        config.rules = vec![rule("ok"), bad];

        match config.validate() {
            Err(ConfigError::Rule { index, rule, source }) => {
                assert_eq!(index, 1);
                assert_eq!(rule, "no-actions");
                assert!(matches!(source, RuleError::NoActions { .. }));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_config_validation_duplicate_rule() {
        let mut config = KaroConfig::default();
        config.rules = vec![rule("same"), rule("same")];

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { ref message, .. }) if message.contains("default/same")
        ));
    }

    #[test]
    fn test_rule_store_assigns_namespace() {
        let mut config = KaroConfig::default();
        config.engine.default_namespace = "monitoring".to_string();
        config.rules = vec![rule("cleanup")];

        let store = config.rule_store().unwrap();
        let stored = store.get("monitoring/cleanup").unwrap();
        assert_eq!(stored.rule.namespace.as_deref(), Some("monitoring"));
        assert!(stored.rule.uid.is_some());
    }

    #[test]
    fn test_config_load_none_returns_defaults() {
        let config = KaroConfig::load(None).unwrap();
        assert_eq!(config.server.port, 9090);
    }
}
