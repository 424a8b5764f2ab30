//! External key/value stores referenced by environment variables.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Kind of external key/value object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Config,
    Secret,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Config => f.write_str("config"),
            StoreKind::Secret => f.write_str("secret"),
        }
    }
}

/// Failure of the lookup backend itself (not a missing key).
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup backend unavailable: {0}")]
    Unavailable(String),
}

/// Read access to config and secret objects.
///
/// `Ok(None)` means the object or the key does not exist.
#[async_trait]
pub trait KeyValueLookup: Send + Sync {
    async fn get_value(
        &self,
        namespace: &str,
        kind: StoreKind,
        object: &str,
        key: &str,
    ) -> Result<Option<String>, LookupError>;
}

/// In-memory store of config and secret objects.
///
/// # Example
///
/// ```
/// use karo::env::{MemoryStore, StoreKind};
///
/// let store = MemoryStore::new();
/// store.insert("default", StoreKind::Secret, "db", [("password", "hunter2")]);
/// assert_eq!(store.object_count(), 1);
/// ```
#[derive(Default)]
pub struct MemoryStore {
    objects: DashMap<(String, StoreKind, String), BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object.
    pub fn insert<K, V>(
        &self,
        namespace: &str,
        kind: StoreKind,
        name: &str,
        data: impl IntoIterator<Item = (K, V)>,
    ) where
        K: Into<String>,
        V: Into<String>,
    {
        let data = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.objects
            .insert((namespace.to_string(), kind, name.to_string()), data);
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

#[async_trait]
impl KeyValueLookup for MemoryStore {
    async fn get_value(
        &self,
        namespace: &str,
        kind: StoreKind,
        object: &str,
        key: &str,
    ) -> Result<Option<String>, LookupError> {
        let id = (namespace.to_string(), kind, object.to_string());
        Ok(self
            .objects
            .get(&id)
            .and_then(|data| data.get(key).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_lookup() {
        let store = MemoryStore::new();
        store.insert("default", StoreKind::Config, "app", [("mode", "fast")]);

        let hit = store
            .get_value("default", StoreKind::Config, "app", "mode")
            .await
            .unwrap();
        assert_eq!(hit.as_deref(), Some("fast"));
    }

    #[tokio::test]
    async fn test_memory_store_is_scoped_by_namespace_and_kind() {
        let store = MemoryStore::new();
        store.insert("default", StoreKind::Config, "app", [("mode", "fast")]);

        let other_ns = store
            .get_value("other", StoreKind::Config, "app", "mode")
            .await
            .unwrap();
        let other_kind = store
            .get_value("default", StoreKind::Secret, "app", "mode")
            .await
            .unwrap();
        assert!(other_ns.is_none());
        assert!(other_kind.is_none());
    }

    #[tokio::test]
    async fn test_memory_store_missing_key() {
        let store = MemoryStore::new();
        store.insert("default", StoreKind::Secret, "db", [("user", "admin")]);

        let missing = store
            .get_value("default", StoreKind::Secret, "db", "password")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_store_kind_display() {
        assert_eq!(StoreKind::Config.to_string(), "config");
        assert_eq!(StoreKind::Secret.to_string(), "secret");
    }
}
