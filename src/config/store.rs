//! Static config/secret objects referenced by action environments

use crate::env::{MemoryStore, StoreKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Falls back to `engine.default_namespace` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub kind: StoreKind,
    pub name: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// Load every configured object into a lookup store.
pub fn build_store(stores: &[StoreConfig], default_namespace: &str) -> MemoryStore {
    let store = MemoryStore::new();
    for object in stores {
        store.insert(
            object.namespace.as_deref().unwrap_or(default_namespace),
            object.kind,
            &object.name,
            object.data.clone(),
        );
    }
    store
}
