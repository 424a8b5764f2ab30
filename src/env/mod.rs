//! Environment resolution for actions.
//!
//! Each declared [`EnvVar`] resolves to a literal, an alert field, or a key of
//! an external config/secret object. Resolution is all-or-nothing: the first
//! unresolved required reference fails the whole action.

mod store;

pub use store::{KeyValueLookup, LookupError, MemoryStore, StoreKind};

use crate::alert::{self, AlertPayload};
use crate::rules::{EnvVar, EnvVarSource, KeySelector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A fully resolved environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEnv {
    pub name: String,
    pub value: String,
}

/// Environment resolution errors. All abort the action's synthesis.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("env var '{name}': alert field '{path}' not found")]
    AlertFieldNotFound { name: String, path: String },

    #[error("env var '{name}': key '{key}' not found in {kind} '{object}' (namespace '{namespace}')")]
    NotFound {
        name: String,
        namespace: String,
        kind: StoreKind,
        object: String,
        key: String,
    },

    #[error("env var '{name}': {kind} lookup timed out after {timeout:?}")]
    Timeout {
        name: String,
        kind: StoreKind,
        timeout: Duration,
    },

    #[error("env var '{name}': {source}")]
    Lookup {
        name: String,
        #[source]
        source: LookupError,
    },
}

impl EnvError {
    /// Whether the error is a missing alert field or store key.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EnvError::AlertFieldNotFound { .. } | EnvError::NotFound { .. }
        )
    }
}

/// Resolves action environments against an alert and a key/value lookup.
#[derive(Clone)]
pub struct EnvResolver {
    lookup: Arc<dyn KeyValueLookup>,
    timeout: Duration,
}

impl EnvResolver {
    /// `timeout` bounds every external lookup.
    pub fn new(lookup: Arc<dyn KeyValueLookup>, timeout: Duration) -> Self {
        Self { lookup, timeout }
    }

    /// Resolve `env_vars` in declaration order.
    ///
    /// A literal `value` wins over `valueFrom`; a variable with neither
    /// resolves to the empty string.
    pub async fn resolve(
        &self,
        namespace: &str,
        env_vars: &[EnvVar],
        payload: &AlertPayload,
    ) -> Result<Vec<ResolvedEnv>, EnvError> {
        let mut resolved = Vec::with_capacity(env_vars.len());

        for var in env_vars {
            let value = match (&var.value, &var.value_from) {
                (Some(literal), _) => literal.clone(),
                (None, Some(source)) => self.resolve_source(namespace, var, source, payload).await?,
                (None, None) => String::new(),
            };
            resolved.push(ResolvedEnv {
                name: var.name.clone(),
                value,
            });
        }

        Ok(resolved)
    }

    async fn resolve_source(
        &self,
        namespace: &str,
        var: &EnvVar,
        source: &EnvVarSource,
        payload: &AlertPayload,
    ) -> Result<String, EnvError> {
        match source {
            EnvVarSource::AlertRef(selector) => alert::resolve(payload, &selector.field_path)
                .ok_or_else(|| EnvError::AlertFieldNotFound {
                    name: var.name.clone(),
                    path: selector.field_path.clone(),
                }),
            EnvVarSource::ConfigRef(selector) => {
                self.lookup_key(namespace, StoreKind::Config, var, selector)
                    .await
            }
            EnvVarSource::SecretRef(selector) => {
                self.lookup_key(namespace, StoreKind::Secret, var, selector)
                    .await
            }
        }
    }

    async fn lookup_key(
        &self,
        namespace: &str,
        kind: StoreKind,
        var: &EnvVar,
        selector: &KeySelector,
    ) -> Result<String, EnvError> {
        let lookup = self
            .lookup
            .get_value(namespace, kind, &selector.name, &selector.key);

        let found = match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(found)) => found,
            Ok(Err(source)) => {
                return Err(EnvError::Lookup {
                    name: var.name.clone(),
                    source,
                })
            }
            Err(_) => {
                return Err(EnvError::Timeout {
                    name: var.name.clone(),
                    kind,
                    timeout: self.timeout,
                })
            }
        };

        match found {
            Some(value) => Ok(value),
            None if selector.optional => {
                tracing::debug!(
                    env = %var.name,
                    kind = %kind,
                    object = %selector.name,
                    key = %selector.key,
                    "Optional reference missing, using empty value"
                );
                Ok(String::new())
            }
            None => Err(EnvError::NotFound {
                name: var.name.clone(),
                namespace: namespace.to_string(),
                kind,
                object: selector.name.clone(),
                key: selector.key.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::AlertFieldSelector;
    use async_trait::async_trait;

    fn resolver(store: MemoryStore) -> EnvResolver {
        EnvResolver::new(Arc::new(store), Duration::from_secs(1))
    }

    fn key_ref(name: &str, key: &str, optional: bool) -> KeySelector {
        KeySelector {
            name: name.to_string(),
            key: key.to_string(),
            optional,
        }
    }

    fn alert_ref(path: &str) -> EnvVarSource {
        EnvVarSource::AlertRef(AlertFieldSelector {
            field_path: path.to_string(),
        })
    }

    struct SlowLookup;

    #[async_trait]
    impl KeyValueLookup for SlowLookup {
        async fn get_value(
            &self,
            _namespace: &str,
            _kind: StoreKind,
            _object: &str,
            _key: &str,
        ) -> Result<Option<String>, LookupError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Some("late".to_string()))
        }
    }

    struct BrokenLookup;

    #[async_trait]
    impl KeyValueLookup for BrokenLookup {
        async fn get_value(
            &self,
            _namespace: &str,
            _kind: StoreKind,
            _object: &str,
            _key: &str,
        ) -> Result<Option<String>, LookupError> {
            Err(LookupError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_resolves_in_declaration_order() {
        let store = MemoryStore::new();
        store.insert("default", StoreKind::Config, "app", [("mode", "fast")]);
        store.insert("default", StoreKind::Secret, "db", [("password", "hunter2")]);
        let payload = AlertPayload::new().with_label("instance", "host1");

        let env = vec![
            EnvVar::literal("LITERAL", "x"),
            EnvVar::from_source("INSTANCE", alert_ref("labels.instance")),
            EnvVar::from_source("MODE", EnvVarSource::ConfigRef(key_ref("app", "mode", false))),
            EnvVar::from_source("PASS", EnvVarSource::SecretRef(key_ref("db", "password", false))),
        ];

        let resolved = resolver(store)
            .resolve("default", &env, &payload)
            .await
            .unwrap();
        let pairs: Vec<(&str, &str)> = resolved
            .iter()
            .map(|e| (e.name.as_str(), e.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("LITERAL", "x"),
                ("INSTANCE", "host1"),
                ("MODE", "fast"),
                ("PASS", "hunter2"),
            ]
        );
    }

    #[tokio::test]
    async fn test_literal_wins_over_source() {
        let mut var = EnvVar::literal("X", "literal");
        var.value_from = Some(alert_ref("labels.instance"));
        let payload = AlertPayload::new().with_label("instance", "host1");

        let resolved = resolver(MemoryStore::new())
            .resolve("default", &[var], &payload)
            .await
            .unwrap();
        assert_eq!(resolved[0].value, "literal");
    }

    #[tokio::test]
    async fn test_unresolved_alert_field_aborts() {
        let env = vec![
            EnvVar::literal("A", "1"),
            EnvVar::from_source("B", alert_ref("labels.missing")),
        ];
        let err = resolver(MemoryStore::new())
            .resolve("default", &env, &AlertPayload::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EnvError::AlertFieldNotFound { ref path, .. } if path == "labels.missing"));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_missing_required_secret_is_not_found() {
        let env = vec![EnvVar::from_source(
            "PASS",
            EnvVarSource::SecretRef(key_ref("db", "password", false)),
        )];
        let err = resolver(MemoryStore::new())
            .resolve("default", &env, &AlertPayload::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EnvError::NotFound { kind: StoreKind::Secret, .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_optional_missing_resolves_empty() {
        let store = MemoryStore::new();
        store.insert("default", StoreKind::Config, "app", [("other", "x")]);
        let env = vec![
            EnvVar::from_source("MISSING_OBJECT", EnvVarSource::ConfigRef(key_ref("nope", "k", true))),
            EnvVar::from_source("MISSING_KEY", EnvVarSource::ConfigRef(key_ref("app", "k", true))),
        ];

        let resolved = resolver(store)
            .resolve("default", &env, &AlertPayload::new())
            .await
            .unwrap();
        assert!(resolved.iter().all(|e| e.value.is_empty()));
    }

    #[tokio::test]
    async fn test_lookup_timeout_aborts_even_when_optional() {
        let resolver = EnvResolver::new(Arc::new(SlowLookup), Duration::from_millis(20));
        let env = vec![EnvVar::from_source(
            "X",
            EnvVarSource::ConfigRef(key_ref("app", "k", true)),
        )];

        let err = resolver
            .resolve("default", &env, &AlertPayload::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EnvError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_lookup_failure_propagates() {
        let resolver = EnvResolver::new(Arc::new(BrokenLookup), Duration::from_secs(1));
        let env = vec![EnvVar::from_source(
            "X",
            EnvVarSource::SecretRef(key_ref("db", "k", false)),
        )];

        let err = resolver
            .resolve("default", &env, &AlertPayload::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EnvError::Lookup { .. }));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_no_value_and_no_source_is_empty() {
        let var = EnvVar {
            name: "EMPTY".to_string(),
            value: None,
            value_from: None,
        };
        let resolved = resolver(MemoryStore::new())
            .resolve("default", &[var], &AlertPayload::new())
            .await
            .unwrap();
        assert_eq!(resolved[0].value, "");
    }
}
