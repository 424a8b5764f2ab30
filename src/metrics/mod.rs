//! # Metrics
//!
//! Prometheus export of alert processing counters.
//!
//! **Counters:**
//! - `karo_alerts_received_total{status}` - Alerts received per webhook status
//!   (`firing`, `resolved`, `skipped`)
//! - `karo_rules_matched_total{rule}` - Rules matched by an alert
//! - `karo_jobs_created_total{rule, action}` - Jobs submitted
//! - `karo_job_failures_total{rule, stage}` - Actions that failed at
//!   `synthesis` or `submission`
//!
//! **Histograms:**
//! - `karo_alert_processing_seconds` - Time to process one alert
//!
//! **Gauges:**
//! - `karo_rules_total` - Rules currently loaded

pub mod handler;

pub use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::rules::RuleStore;
use std::sync::Arc;
use std::time::Instant;

/// Renders metrics and tracks uptime for the HTTP endpoints.
pub struct MetricsCollector {
    rules: Arc<RuleStore>,
    start_time: Instant,
    prometheus_handle: PrometheusHandle,
}

impl MetricsCollector {
    pub fn new(rules: Arc<RuleStore>, start_time: Instant, prometheus_handle: PrometheusHandle) -> Self {
        Self {
            rules,
            start_time,
            prometheus_handle,
        }
    }

    pub fn update_rule_gauges(&self) {
        metrics::gauge!("karo_rules_total").set(self.rules.len() as f64);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Render Prometheus metrics in text format.
    pub fn render_metrics(&self) -> String {
        self.prometheus_handle.render()
    }
}

/// Install the Prometheus recorder.
///
/// Processing time buckets span 1ms to 30s; most alerts finish well under a
/// second unless a lookup times out.
pub fn setup_metrics() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::Matcher;

    let duration_buckets = &[
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
    ];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("karo_alert_processing_seconds".to_string()),
            duration_buckets,
        )?
        .install_recorder()?;

    Ok(handle)
}

/// Install the recorder, or build a detached handle if one is already set.
pub fn setup_or_reuse_metrics() -> PrometheusHandle {
    setup_metrics().unwrap_or_else(|e| {
        tracing::debug!("Metrics already initialized, creating new handle: {}", e);
        PrometheusBuilder::new().build_recorder().handle()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, Once};

    static INIT: Once = Once::new();
    static TEST_HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

    fn get_test_handle() -> PrometheusHandle {
        INIT.call_once(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            *TEST_HANDLE.lock().unwrap() = Some(handle);
            metrics::set_global_recorder(Box::new(recorder)).ok();
        });

        TEST_HANDLE.lock().unwrap().as_ref().unwrap().clone()
    }

    #[test]
    fn test_metrics_collector_uptime() {
        let collector = MetricsCollector::new(
            Arc::new(RuleStore::new("default")),
            Instant::now(),
            get_test_handle(),
        );
        assert!(collector.uptime_seconds() < 1);
    }

    #[test]
    fn test_counters_rendered() {
        let collector = MetricsCollector::new(
            Arc::new(RuleStore::new("default")),
            Instant::now(),
            get_test_handle(),
        );
        metrics::counter!("karo_alerts_received_total", "status" => "firing").increment(1);
        collector.update_rule_gauges();

        let rendered = collector.render_metrics();
        assert!(rendered.contains("karo_alerts_received_total"));
        assert!(rendered.contains("karo_rules_total"));
    }
}
