//! Configuration errors

use crate::rules::RuleError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file {} does not exist", .0.display())]
    NotFound(PathBuf),

    /// TOML syntax or type mismatch; the message carries the location.
    #[error("malformed config: {0}")]
    Parse(String),

    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// A rule failed admission. `index` is its position under `[[rules]]`.
    #[error("rules[{index}] ('{rule}') rejected: {source}")]
    Rule {
        index: usize,
        rule: String,
        #[source]
        source: RuleError,
    },
}
