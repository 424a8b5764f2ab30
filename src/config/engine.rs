//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Job synthesis defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Namespace for rules that do not declare one
    pub default_namespace: String,
    /// Retention of finished jobs before the platform reclaims them
    pub ttl_seconds_after_finished: u32,
    /// Upper bound for each config/secret lookup
    pub lookup_timeout_ms: u64,
}

impl EngineConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_namespace: "default".to_string(),
            ttl_seconds_after_finished: crate::job::DEFAULT_TTL_SECONDS,
            lookup_timeout_ms: 5000,
        }
    }
}
