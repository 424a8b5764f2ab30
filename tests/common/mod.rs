//! Shared test utilities for Karo integration tests.
//!
//! Builders for rules, payloads and a fully wired router backed by an
//! in-memory sink.

#![allow(dead_code)]

use axum::body::Body;
use futures::StreamExt;
use karo::alert::AlertPayload;
use karo::api::{create_router, AppState};
use karo::config::KaroConfig;
use karo::engine::Engine;
use karo::env::{EnvResolver, MemoryStore};
use karo::job::JobSynthesizer;
use karo::reactor::{MemorySink, Reactor};
use karo::rules::{Action, ReactionRule, RuleStore};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Rule Builders
// =============================================================================

/// Rule with no matchers and one busybox action per name.
pub fn make_rule(name: &str, alert_name: &str, actions: &[&str]) -> ReactionRule {
    ReactionRule {
        name: name.to_string(),
        namespace: None,
        uid: None,
        alert_name: alert_name.to_string(),
        matchers: vec![],
        actions: actions.iter().map(|a| Action::new(*a, "busybox")).collect(),
        volumes: vec![],
    }
}

/// Firing payload for `alert_name` with the given labels, pre-flattened.
pub fn make_payload(alert_name: &str, labels: &[(&str, &str)]) -> AlertPayload {
    let mut payload = AlertPayload::new()
        .with_field("status", "firing")
        .with_label("alertname", alert_name);
    for (k, v) in labels {
        payload = payload.with_label(*k, *v);
    }
    payload.flatten()
}

// =============================================================================
// Engine / App Builders
// =============================================================================

pub fn make_engine(store: MemoryStore) -> Engine {
    let env = EnvResolver::new(Arc::new(store), Duration::from_secs(1));
    Engine::new(JobSynthesizer::new(env, "default"))
}

pub struct TestApp {
    pub router: axum::Router,
    pub rules: Arc<RuleStore>,
    pub sink: Arc<MemorySink>,
}

/// Router over `config` with jobs captured in memory.
pub fn make_app(config: KaroConfig) -> TestApp {
    make_app_with_sink(config, MemorySink::new())
}

pub fn make_app_with_sink(config: KaroConfig, sink: MemorySink) -> TestApp {
    let rules = Arc::new(config.rule_store().unwrap());
    let sink = Arc::new(sink);
    let reactor = Arc::new(Reactor::new(
        rules.clone(),
        Engine::from_config(&config),
        sink.clone(),
        rules.clone(),
    ));
    let state = Arc::new(AppState::new(Arc::new(config), Arc::clone(&rules), reactor));
    TestApp {
        router: create_router(state),
        rules,
        sink,
    }
}

pub fn config_with_rules(rules: Vec<ReactionRule>) -> KaroConfig {
    KaroConfig {
        rules,
        ..Default::default()
    }
}

// =============================================================================
// HTTP Helpers
// =============================================================================

pub async fn body_json(body: Body) -> serde_json::Value {
    let bytes: Vec<u8> = body
        .into_data_stream()
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .filter_map(|chunk| chunk.ok())
        .flat_map(|chunk| chunk.to_vec())
        .collect();
    serde_json::from_slice(&bytes).unwrap()
}

/// Alertmanager webhook body with one alert per `(status, labels)` entry.
pub fn webhook_body(alerts: &[(&str, &[(&str, &str)])]) -> String {
    let alerts: Vec<serde_json::Value> = alerts
        .iter()
        .enumerate()
        .map(|(i, (status, labels))| {
            let labels: serde_json::Map<String, serde_json::Value> = labels
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                .collect();
            serde_json::json!({
                "status": status,
                "labels": labels,
                "annotations": {"summary": "test alert"},
                "startsAt": "2024-05-01T10:00:00Z",
                "endsAt": "0001-01-01T00:00:00Z",
                "generatorURL": "http://prometheus:9090/graph",
                "fingerprint": format!("fp{}", i)
            })
        })
        .collect();

    serde_json::json!({
        "version": "4",
        "groupKey": "{}:{}",
        "status": "firing",
        "receiver": "karo",
        "groupLabels": {},
        "commonLabels": {},
        "commonAnnotations": {},
        "externalURL": "http://alertmanager:9093",
        "alerts": alerts
    })
    .to_string()
}
