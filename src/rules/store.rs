//! In-memory rule source and status bookkeeping.

use super::{validate_rule, ReactionRule, RuleError};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Read access to the currently defined rules.
///
/// Called once per inbound alert; implementations must not assume the
/// engine caches the result.
pub trait RuleSource: Send + Sync {
    fn list_rules(&self) -> Vec<ReactionRule>;
}

/// Per-rule trigger bookkeeping, updated by the caller after each batch.
pub trait StatusSink: Send + Sync {
    fn record_trigger(&self, rule_key: &str, jobs: Vec<JobReference>, at: DateTime<Utc>);
}

/// A job created on behalf of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub name: String,
    pub namespace: String,
    pub action_name: String,
    pub created_at: DateTime<Utc>,
}

/// Observed state of a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_triggered: Option<DateTime<Utc>>,
    pub trigger_count: u64,
    #[serde(default)]
    pub last_jobs_created: Vec<JobReference>,
}

/// A rule together with its status.
#[derive(Debug, Clone, Serialize)]
pub struct StoredRule {
    pub rule: ReactionRule,
    pub status: RuleStatus,
    #[serde(skip)]
    seq: u64,
}

/// Thread-safe rule store keyed by `namespace/name`.
///
/// Listing preserves insertion order so batch reports are deterministic.
pub struct RuleStore {
    rules: DashMap<String, StoredRule>,
    default_namespace: String,
    next_seq: AtomicU64,
}

impl RuleStore {
    pub fn new(default_namespace: impl Into<String>) -> Self {
        Self {
            rules: DashMap::new(),
            default_namespace: default_namespace.into(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Build a store from a rule list, rejecting the first invalid rule.
    pub fn from_rules(
        rules: impl IntoIterator<Item = ReactionRule>,
        default_namespace: impl Into<String>,
    ) -> Result<Self, RuleError> {
        let store = Self::new(default_namespace);
        for rule in rules {
            store.upsert(rule)?;
        }
        Ok(store)
    }

    /// Admit a rule, replacing any rule with the same key.
    ///
    /// Fills in the namespace and a UUID when absent. A replaced rule keeps
    /// its status and position.
    pub fn upsert(&self, mut rule: ReactionRule) -> Result<String, RuleError> {
        validate_rule(&rule)?;

        if rule.namespace.is_none() {
            rule.namespace = Some(self.default_namespace.clone());
        }
        if rule.uid.is_none() {
            rule.uid = Some(uuid::Uuid::new_v4().to_string());
        }

        let key = rule.key(&self.default_namespace);
        match self.rules.entry(key.clone()) {
            Entry::Occupied(mut existing) => existing.get_mut().rule = rule,
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                slot.insert(StoredRule {
                    rule,
                    status: RuleStatus::default(),
                    seq,
                });
            }
        }
        Ok(key)
    }

    pub fn remove(&self, key: &str) -> Option<StoredRule> {
        self.rules.remove(key).map(|(_, stored)| stored)
    }

    pub fn get(&self, key: &str) -> Option<StoredRule> {
        self.rules.get(key).map(|entry| entry.value().clone())
    }

    pub fn status(&self, key: &str) -> Option<RuleStatus> {
        self.rules.get(key).map(|entry| entry.status.clone())
    }

    /// All rules with status, in insertion order.
    pub fn list_stored(&self) -> Vec<StoredRule> {
        let mut all: Vec<StoredRule> = self.rules.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|s| s.seq);
        all
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }
}

impl RuleSource for RuleStore {
    fn list_rules(&self) -> Vec<ReactionRule> {
        self.list_stored().into_iter().map(|s| s.rule).collect()
    }
}

impl StatusSink for RuleStore {
    fn record_trigger(&self, rule_key: &str, jobs: Vec<JobReference>, at: DateTime<Utc>) {
        match self.rules.get_mut(rule_key) {
            Some(mut stored) => {
                stored.status.last_triggered = Some(at);
                stored.status.trigger_count += 1;
                stored.status.last_jobs_created = jobs;
            }
            None => tracing::warn!(rule = %rule_key, "Trigger recorded for unknown rule"),
        }
    }
}
