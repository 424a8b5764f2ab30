//! Simulate command: dry-run an alert through the engine

use crate::alert::AlertPayload;
use crate::cli::SimulateArgs;
use crate::config::KaroConfig;
use crate::engine::{Engine, ProcessOutcome};
use crate::job::SynthesizedJob;
use crate::rules::RuleSource;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub alert_name: String,
    pub matched_rules: Vec<String>,
    pub jobs: Vec<SynthesizedJob>,
    pub errors: Vec<SimulationError>,
}

#[derive(Debug, Serialize)]
pub struct SimulationError {
    pub rule: String,
    pub action: String,
    pub step: &'static str,
    pub message: String,
}

impl From<ProcessOutcome> for SimulationReport {
    fn from(outcome: ProcessOutcome) -> Self {
        let mut report = SimulationReport {
            alert_name: outcome.alert_name,
            matched_rules: Vec::new(),
            jobs: Vec::new(),
            errors: Vec::new(),
        };
        for rule in outcome.rules {
            report.matched_rules.push(rule.rule_key.clone());
            for action in rule.actions {
                match action.result {
                    Ok(job) => report.jobs.push(job),
                    Err(e) => report.errors.push(SimulationError {
                        rule: rule.rule_key.clone(),
                        action: action.action,
                        step: e.step(),
                        message: e.to_string(),
                    }),
                }
            }
        }
        report
    }
}

/// Build the firing alert described on the command line.
pub fn build_payload(args: &SimulateArgs) -> AlertPayload {
    let mut payload = AlertPayload::new()
        .with_field("status", "firing")
        .with_label("alertname", args.alert.as_str());
    for (k, v) in &args.labels {
        payload = payload.with_label(k.as_str(), v.as_str());
    }
    for (k, v) in &args.annotations {
        payload = payload.with_annotation(k.as_str(), v.as_str());
    }
    payload.flatten()
}

/// Handle `karo simulate`. Nothing is submitted.
pub async fn handle_simulate(args: &SimulateArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = if args.config.exists() {
        KaroConfig::load(Some(&args.config))?
    } else {
        KaroConfig::default()
    };
    let config = config.with_env_overrides();

    let rules = config.rule_store()?.list_rules();
    let engine = Engine::from_config(&config);
    let outcome = engine
        .process_alert(&rules, &args.alert, &build_payload(args))
        .await;

    let report = SimulationReport::from(outcome);
    Ok(serde_json::to_string_pretty(&report)?)
}
