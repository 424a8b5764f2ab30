//! Caller layer around the engine.
//!
//! For each alert the reactor lists the current rules, runs the engine,
//! submits every synthesized job and records trigger status for the rules
//! that produced at least one submitted job.

mod sink;

pub use sink::{JobSink, LogSink, MemorySink, SinkError, WebhookSink};

use crate::alert::AlertPayload;
use crate::config::{KaroConfig, SinkConfig, SinkKind};
use crate::engine::Engine;
use crate::rules::{JobReference, RuleSource, RuleStore, StatusSink};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Failure of one action, at synthesis or submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionFailure {
    pub rule: String,
    pub action: String,
    pub stage: FailureStage,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Synthesis,
    Submission,
}

impl FailureStage {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureStage::Synthesis => "synthesis",
            FailureStage::Submission => "submission",
        }
    }
}

/// What happened to one alert.
#[derive(Debug, Default, Clone, Serialize)]
pub struct AlertReport {
    pub alert_name: String,
    pub rules_matched: usize,
    pub jobs_created: Vec<JobReference>,
    pub failures: Vec<ActionFailure>,
}

pub struct Reactor {
    rules: Arc<dyn RuleSource>,
    engine: Engine,
    sink: Arc<dyn JobSink>,
    status: Arc<dyn StatusSink>,
}

impl Reactor {
    pub fn new(
        rules: Arc<dyn RuleSource>,
        engine: Engine,
        sink: Arc<dyn JobSink>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            rules,
            engine,
            sink,
            status,
        }
    }

    /// Reactor over a rule store that doubles as status sink.
    pub fn from_config(config: &KaroConfig, rules: Arc<RuleStore>) -> Result<Self, SinkError> {
        Ok(Self::new(
            rules.clone(),
            Engine::from_config(config),
            build_sink(&config.sink)?,
            rules,
        ))
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink.name()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Process one alert end to end.
    ///
    /// Failures are collected per action and never abort the batch.
    pub async fn handle_alert(&self, alert_name: &str, payload: &AlertPayload) -> AlertReport {
        let start = Instant::now();
        let rules = self.rules.list_rules();
        let outcome = self.engine.process_alert(&rules, alert_name, payload).await;

        let mut report = AlertReport {
            alert_name: alert_name.to_string(),
            rules_matched: outcome.rules.len(),
            ..Default::default()
        };

        if outcome.is_unmatched() {
            info!(alert_name = %alert_name, "No reaction rule matched alert");
        }

        for rule in outcome.rules {
            metrics::counter!("karo_rules_matched_total", "rule" => rule.rule_key.clone())
                .increment(1);

            let mut submitted = Vec::new();
            for action in rule.actions {
                let job = match action.result {
                    Ok(job) => job,
                    Err(e) => {
                        warn!(
                            alert_name = %alert_name,
                            rule = %rule.rule_key,
                            action = %action.action,
                            step = e.step(),
                            error = %e,
                            "Failed to synthesize job"
                        );
                        self.record_failure(
                            &mut report,
                            &rule.rule_key,
                            action.action,
                            FailureStage::Synthesis,
                            e.to_string(),
                        );
                        continue;
                    }
                };

                match self.sink.submit(&job).await {
                    Ok(()) => {
                        info!(
                            alert_name = %alert_name,
                            rule = %rule.rule_key,
                            action = %action.action,
                            job_name = %job.name(),
                            sink = self.sink.name(),
                            "Created job"
                        );
                        metrics::counter!(
                            "karo_jobs_created_total",
                            "rule" => rule.rule_key.clone(),
                            "action" => action.action.clone()
                        )
                        .increment(1);
                        submitted.push(JobReference {
                            name: job.metadata.name,
                            namespace: job.metadata.namespace,
                            action_name: action.action,
                            created_at: Utc::now(),
                        });
                    }
                    Err(e) => {
                        warn!(
                            alert_name = %alert_name,
                            rule = %rule.rule_key,
                            action = %action.action,
                            job_name = %job.name(),
                            error = %e,
                            "Failed to submit job"
                        );
                        self.record_failure(
                            &mut report,
                            &rule.rule_key,
                            action.action,
                            FailureStage::Submission,
                            e.to_string(),
                        );
                    }
                }
            }

            if !submitted.is_empty() {
                self.status
                    .record_trigger(&rule.rule_key, submitted.clone(), Utc::now());
                report.jobs_created.extend(submitted);
            }
        }

        if report.rules_matched > 0 && report.jobs_created.is_empty() {
            warn!(
                alert_name = %alert_name,
                rules_matched = report.rules_matched,
                failures = report.failures.len(),
                "Alert matched rules but produced no jobs"
            );
        }

        metrics::histogram!("karo_alert_processing_seconds")
            .record(start.elapsed().as_secs_f64());

        report
    }

    fn record_failure(
        &self,
        report: &mut AlertReport,
        rule: &str,
        action: String,
        stage: FailureStage,
        message: String,
    ) {
        metrics::counter!(
            "karo_job_failures_total",
            "rule" => rule.to_string(),
            "stage" => stage.as_str()
        )
        .increment(1);
        report.failures.push(ActionFailure {
            rule: rule.to_string(),
            action,
            stage,
            message,
        });
    }
}

/// Sink selected by `[sink]`.
pub fn build_sink(config: &SinkConfig) -> Result<Arc<dyn JobSink>, SinkError> {
    match config.kind {
        SinkKind::Log => Ok(Arc::new(LogSink)),
        SinkKind::Webhook => {
            let url = config.url.clone().unwrap_or_default();
            Ok(Arc::new(WebhookSink::new(url, config.timeout())?))
        }
    }
}
