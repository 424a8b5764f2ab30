//! Logging helpers
//!
//! Filter construction for `tracing-subscriber` and correlation IDs for
//! webhook deliveries.

use uuid::Uuid;

/// Filter directives for `tracing-subscriber`: the base level followed by
/// one `karo::<component>=<level>` entry per override, in component order.
///
/// # Examples
///
/// ```
/// use karo::config::logging::{LogFormat, LoggingConfig};
/// use karo::logging::build_filter_directives;
/// use std::collections::BTreeMap;
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Json,
///     component_levels: BTreeMap::from([("engine".to_string(), "debug".to_string())]),
/// };
///
/// assert_eq!(build_filter_directives(&config), "info,karo::engine=debug");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    std::iter::once(config.level.clone())
        .chain(
            config
                .component_levels
                .iter()
                .map(|(component, level)| format!("karo::{}={}", component, level)),
        )
        .collect::<Vec<_>>()
        .join(",")
}

/// Correlation ID for one webhook delivery.
pub fn generate_delivery_id() -> String {
    Uuid::new_v4().to_string()
}
