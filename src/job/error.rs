//! Job synthesis errors.

use super::QuantityError;
use crate::env::EnvError;
use thiserror::Error;

/// Why a single action could not be turned into a job.
///
/// Every variant is scoped to one action; other actions of the same alert
/// are unaffected.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("job name for rule '{rule}' and action '{action}' is empty after sanitization")]
    EmptyName { rule: String, action: String },

    #[error("failed to resolve environment: {0}")]
    Environment(#[from] EnvError),

    #[error("invalid {kind} for resource '{resource}': {source}")]
    Quantity {
        kind: &'static str,
        resource: String,
        #[source]
        source: QuantityError,
    },

    #[error("volume '{volume}' must have exactly one source, found {count}")]
    Volume { volume: String, count: usize },

    #[error("volume '{volume}' has invalid size limit: {source}")]
    SizeLimit {
        volume: String,
        #[source]
        source: QuantityError,
    },
}

impl SynthesisError {
    /// Synthesis step that failed, for logs and metric labels.
    pub fn step(&self) -> &'static str {
        match self {
            SynthesisError::EmptyName { .. } => "identity",
            SynthesisError::Environment(_) => "environment",
            SynthesisError::Quantity { .. } => "resources",
            SynthesisError::Volume { .. } | SynthesisError::SizeLimit { .. } => "volumes",
        }
    }
}
