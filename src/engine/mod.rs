//! Alert processing: rule matching plus per-action job synthesis.
//!
//! The engine is side-effect free. It returns one outcome per action of
//! every matched rule and leaves submission and status bookkeeping to the
//! caller (see [`crate::reactor`]).

use crate::alert::AlertPayload;
use crate::config::{build_store, KaroConfig};
use crate::env::EnvResolver;
use crate::job::{JobSynthesizer, SynthesisError, SynthesizedJob};
use crate::rules::{self, Action, ReactionRule};
use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

/// Result of synthesizing one action.
#[derive(Debug)]
pub struct ActionOutcome {
    pub action: String,
    pub result: Result<SynthesizedJob, SynthesisError>,
}

/// All action outcomes of one matched rule, in declaration order.
#[derive(Debug)]
pub struct RuleOutcome {
    /// `namespace/name` key of the rule.
    pub rule_key: String,
    pub rule_name: String,
    pub actions: Vec<ActionOutcome>,
}

impl RuleOutcome {
    pub fn jobs(&self) -> impl Iterator<Item = &SynthesizedJob> {
        self.actions.iter().filter_map(|a| a.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &SynthesisError)> {
        self.actions
            .iter()
            .filter_map(|a| a.result.as_ref().err().map(|e| (a.action.as_str(), e)))
    }
}

/// Outcome of processing one alert.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub alert_name: String,
    pub rules: Vec<RuleOutcome>,
}

impl ProcessOutcome {
    /// No rule matched the alert.
    pub fn is_unmatched(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn jobs(&self) -> impl Iterator<Item = &SynthesizedJob> {
        self.rules.iter().flat_map(RuleOutcome::jobs)
    }

    pub fn job_count(&self) -> usize {
        self.jobs().count()
    }

    pub fn error_count(&self) -> usize {
        self.rules.iter().map(|r| r.failures().count()).sum()
    }
}

/// Matches alerts against rules and synthesizes jobs for every action.
#[derive(Clone)]
pub struct Engine {
    synthesizer: JobSynthesizer,
}

impl Engine {
    pub fn new(synthesizer: JobSynthesizer) -> Self {
        Self { synthesizer }
    }

    /// Engine backed by the configured static stores.
    pub fn from_config(config: &KaroConfig) -> Self {
        let namespace = &config.engine.default_namespace;
        let lookup = Arc::new(build_store(&config.stores, namespace));
        let env = EnvResolver::new(lookup, config.engine.lookup_timeout());
        Self::new(
            JobSynthesizer::new(env, namespace.clone())
                .with_ttl(config.engine.ttl_seconds_after_finished),
        )
    }

    pub fn synthesizer(&self) -> &JobSynthesizer {
        &self.synthesizer
    }

    /// Rules whose alert name and matchers all accept the alert, in list order.
    pub fn matching_rules<'a>(
        &self,
        rules: &'a [ReactionRule],
        alert_name: &str,
        payload: &AlertPayload,
    ) -> Vec<&'a ReactionRule> {
        rules
            .iter()
            .filter(|rule| rules::matches(rule, alert_name, payload))
            .collect()
    }

    /// Process one alert against `rules`.
    ///
    /// Actions are synthesized concurrently; a failing action never affects
    /// its siblings. Outcomes keep rule and action declaration order.
    pub async fn process_alert(
        &self,
        rules: &[ReactionRule],
        alert_name: &str,
        payload: &AlertPayload,
    ) -> ProcessOutcome {
        let matched = self.matching_rules(rules, alert_name, payload);
        debug!(
            alert_name = %alert_name,
            candidates = rules.len(),
            matched = matched.len(),
            "Evaluated reaction rules"
        );

        let outcomes = join_all(
            matched
                .into_iter()
                .map(|rule| self.process_rule(rule, payload)),
        )
        .await;

        ProcessOutcome {
            alert_name: alert_name.to_string(),
            rules: outcomes,
        }
    }

    async fn process_rule(&self, rule: &ReactionRule, payload: &AlertPayload) -> RuleOutcome {
        let actions = join_all(
            rule.actions
                .iter()
                .map(|action| self.process_action(rule, action, payload)),
        )
        .await;

        RuleOutcome {
            rule_key: rule.key(self.synthesizer.default_namespace()),
            rule_name: rule.name.clone(),
            actions,
        }
    }

    async fn process_action(
        &self,
        rule: &ReactionRule,
        action: &Action,
        payload: &AlertPayload,
    ) -> ActionOutcome {
        let result = self.synthesizer.synthesize(rule, action, payload).await;
        if let Ok(job) = &result {
            debug!(
                rule = %rule.name,
                action = %action.name,
                job_name = %job.name(),
                "Synthesized job"
            );
        }
        ActionOutcome {
            action: action.name.clone(),
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MemoryStore;
    use crate::rules::{MatchOperator, Matcher};
    use std::time::Duration;

    fn engine() -> Engine {
        let env = EnvResolver::new(Arc::new(MemoryStore::new()), Duration::from_secs(1));
        Engine::new(JobSynthesizer::new(env, "default"))
    }

    fn rule(name: &str, alert: &str, actions: &[&str]) -> ReactionRule {
        ReactionRule {
            name: name.to_string(),
            namespace: None,
            uid: None,
            alert_name: alert.to_string(),
            matchers: vec![],
            actions: actions.iter().map(|a| Action::new(*a, "busybox")).collect(),
            volumes: vec![],
        }
    }

    #[tokio::test]
    async fn test_outcomes_keep_declaration_order() {
        let rules = vec![
            rule("first", "Disk", &["a", "b", "c"]),
            rule("other", "Cpu", &["x"]),
            rule("second", "Disk", &["d"]),
        ];
        let payload = AlertPayload::new().with_label("alertname", "Disk");

        let outcome = engine().process_alert(&rules, "Disk", &payload).await;

        let keys: Vec<_> = outcome.rules.iter().map(|r| r.rule_key.as_str()).collect();
        assert_eq!(keys, vec!["default/first", "default/second"]);
        let actions: Vec<_> = outcome.rules[0]
            .actions
            .iter()
            .map(|a| a.action.as_str())
            .collect();
        assert_eq!(actions, vec!["a", "b", "c"]);
        assert_eq!(outcome.job_count(), 4);
        assert_eq!(outcome.error_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_action_does_not_affect_siblings() {
        let mut r = rule("mixed", "Disk", &["good", "bad"]);
        r.actions[1].resources = Some(crate::rules::ResourceRequirements {
            limits: [("cpu".to_string(), "lots".to_string())].into(),
            requests: Default::default(),
        });

        let outcome = engine()
            .process_alert(&[r], "Disk", &AlertPayload::new())
            .await;

        assert_eq!(outcome.job_count(), 1);
        let failures: Vec<_> = outcome.rules[0].failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "bad");
    }

    #[tokio::test]
    async fn test_matchers_filter_rules() {
        let mut critical = rule("critical", "Disk", &["page"]);
        critical.matchers.push(Matcher::new(
            "labels.severity",
            MatchOperator::Equal,
            &["critical"],
        ));
        let payload = AlertPayload::new().with_label("severity", "warning");

        let outcome = engine().process_alert(&[critical], "Disk", &payload).await;
        assert!(outcome.is_unmatched());
        assert_eq!(outcome.job_count(), 0);
    }

    #[tokio::test]
    async fn test_job_names_unique_within_batch() {
        let rules = vec![rule("same", "Disk", &["run"]), rule("same", "Disk", &["run"])];
        let outcome = engine()
            .process_alert(&rules, "Disk", &AlertPayload::new())
            .await;

        let names: Vec<_> = outcome.jobs().map(|j| j.name().to_string()).collect();
        assert_eq!(names.len(), 2);
        assert_ne!(names[0], names[1]);
    }
}
