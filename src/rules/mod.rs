//! Reaction rules.
//!
//! A [`ReactionRule`] binds an alert name plus a list of attribute
//! [`Matcher`]s to one or more [`Action`]s. Rules are read-only input to the
//! engine; they are owned by a [`RuleSource`] which also records per-rule
//! trigger status after each batch.
//!
//! # Example
//!
//! ```
//! use karo::alert::AlertPayload;
//! use karo::rules::{matches, ReactionRule};
//!
//! let rule: ReactionRule = serde_json::from_str(r#"{
//!     "name": "restart-api",
//!     "alertName": "ApiDown",
//!     "matchers": [{"attributePath": "labels.env", "operator": "Equal", "values": ["prod"]}],
//!     "actions": [{"name": "restart", "image": "bitnami/kubectl", "command": ["kubectl", "rollout", "restart"]}]
//! }"#).unwrap();
//!
//! let payload = AlertPayload::new().with_label("env", "prod");
//! assert!(matches(&rule, "ApiDown", &payload));
//! assert!(!matches(&rule, "ApiSlow", &payload));
//! ```

mod matcher;
mod store;
mod validate;

pub use matcher::{evaluate, matches};
pub use store::{JobReference, RuleSource, RuleStatus, RuleStore, StatusSink, StoredRule};
pub use validate::{validate_rule, RuleError};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// API group/version recorded in the ownership link of every job.
pub const RULE_API_VERSION: &str = "alertreaction.io/v1alpha1";
/// Kind recorded in the ownership link of every job.
pub const RULE_KIND: &str = "AlertReaction";

/// Declarative binding of an alert name and conditions to actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRule {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Stable identity of the rule; assigned on load when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub alert_name: String,
    /// All matchers must hold. Empty means the alert name alone decides.
    #[serde(default)]
    pub matchers: Vec<Matcher>,
    pub actions: Vec<Action>,
    /// Volumes shared by every action of the rule.
    #[serde(default)]
    pub volumes: Vec<Volume>,
}

impl ReactionRule {
    /// Namespace the rule's jobs are created in.
    pub fn namespace_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(default)
    }

    /// `namespace/name` key, unique within a rule source.
    pub fn key(&self, default_namespace: &str) -> String {
        format!("{}/{}", self.namespace_or(default_namespace), self.name)
    }
}

/// Single attribute condition within a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    #[serde(alias = "name")]
    pub attribute_path: String,
    pub operator: MatchOperator,
    #[serde(default)]
    pub values: Vec<String>,
}

impl Matcher {
    pub fn new(attribute_path: impl Into<String>, operator: MatchOperator, values: &[&str]) -> Self {
        Self {
            attribute_path: attribute_path.into(),
            operator,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Comparison applied by a [`Matcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOperator {
    #[serde(alias = "=")]
    Equal,
    #[serde(alias = "!=")]
    NotEqual,
    In,
    NotIn,
    Exists,
    DoesNotExist,
    GreaterThan,
    LessThan,
    #[serde(alias = "=~")]
    Regex,
    #[serde(alias = "!~")]
    NotRegex,
}

impl MatchOperator {
    /// Operators that compare against `values[0]` only.
    pub fn uses_single_value(self) -> bool {
        matches!(
            self,
            MatchOperator::Equal
                | MatchOperator::NotEqual
                | MatchOperator::GreaterThan
                | MatchOperator::LessThan
                | MatchOperator::Regex
                | MatchOperator::NotRegex
        )
    }
}

/// Template for one execution unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
    #[serde(default)]
    pub volume_mounts: Vec<VolumeMount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
}

impl Action {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            command: Vec::new(),
            args: Vec::new(),
            env: Vec::new(),
            resources: None,
            volume_mounts: Vec::new(),
            service_account: None,
        }
    }
}

/// Environment variable declared by an action.
///
/// A literal `value` takes precedence over `valueFrom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,
}

impl EnvVar {
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            value_from: None,
        }
    }

    pub fn from_source(name: impl Into<String>, source: EnvVarSource) -> Self {
        Self {
            name: name.into(),
            value: None,
            value_from: Some(source),
        }
    }
}

/// Where a non-literal environment value comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnvVarSource {
    /// A field of the alert, addressed by dotted path.
    AlertRef(AlertFieldSelector),
    /// A key of a named config object in the rule's namespace.
    #[serde(alias = "configMapKeyRef")]
    ConfigRef(KeySelector),
    /// A key of a named secret object in the rule's namespace.
    #[serde(alias = "secretKeyRef")]
    SecretRef(KeySelector),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertFieldSelector {
    #[serde(alias = "path")]
    pub field_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySelector {
    pub name: String,
    pub key: String,
    /// Resolve to an empty string when the object or key is missing.
    #[serde(default)]
    pub optional: bool,
}

/// Resource limits and requests as quantity strings (`"500m"`, `"256Mi"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    #[serde(default)]
    pub limits: BTreeMap<String, String>,
    #[serde(default)]
    pub requests: BTreeMap<String, String>,
}

/// Named volume scoped to a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,
    #[serde(flatten)]
    pub source: VolumeSource,
}

/// Volume sources. Exactly one must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map: Option<ConfigMapVolumeSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretVolumeSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirVolumeSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volume_claim: Option<PersistentVolumeClaimVolumeSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<HostPathVolumeSource>,
}

impl VolumeSource {
    /// Number of sources set; valid volumes have exactly one.
    pub fn source_count(&self) -> usize {
        [
            self.config_map.is_some(),
            self.secret.is_some(),
            self.empty_dir.is_some(),
            self.persistent_volume_claim.is_some(),
            self.host_path.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMapVolumeSource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretVolumeSource {
    pub secret_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyDirVolumeSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_limit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaimVolumeSource {
    pub claim_name: String,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostPathVolumeSource {
    pub path: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub path_type: Option<String>,
}

/// Mount of a rule volume into an action's container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    /// Must name a volume declared on the owning rule.
    pub name: String,
    pub mount_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
    #[serde(default)]
    pub read_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_symbolic_aliases() {
        let ops: Vec<MatchOperator> =
            serde_json::from_str(r#"["=", "!=", "=~", "!~", "In"]"#).unwrap();
        assert_eq!(
            ops,
            vec![
                MatchOperator::Equal,
                MatchOperator::NotEqual,
                MatchOperator::Regex,
                MatchOperator::NotRegex,
                MatchOperator::In,
            ]
        );
    }

    #[test]
    fn test_operator_unknown_rejected() {
        assert!(serde_json::from_str::<MatchOperator>(r#""Contains""#).is_err());
    }

    #[test]
    fn test_matcher_accepts_name_alias() {
        let m: Matcher =
            serde_json::from_str(r#"{"name": "labels.env", "operator": "Exists"}"#).unwrap();
        assert_eq!(m.attribute_path, "labels.env");
        assert!(m.values.is_empty());
    }

    #[test]
    fn test_env_source_variants() {
        let env: Vec<EnvVar> = serde_json::from_str(
            r#"[
                {"name": "A", "valueFrom": {"alertRef": {"fieldPath": "labels.instance"}}},
                {"name": "B", "valueFrom": {"configMapKeyRef": {"name": "cm", "key": "k"}}},
                {"name": "C", "valueFrom": {"secretRef": {"name": "s", "key": "k", "optional": true}}}
            ]"#,
        )
        .unwrap();

        assert!(matches!(env[0].value_from, Some(EnvVarSource::AlertRef(_))));
        assert!(matches!(env[1].value_from, Some(EnvVarSource::ConfigRef(_))));
        match &env[2].value_from {
            Some(EnvVarSource::SecretRef(sel)) => assert!(sel.optional),
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[test]
    fn test_volume_source_count() {
        let v: Volume = serde_json::from_str(
            r#"{"name": "scratch", "emptyDir": {}, "hostPath": {"path": "/tmp"}}"#,
        )
        .unwrap();
        assert_eq!(v.source.source_count(), 2);
    }

    #[test]
    fn test_rule_namespace_default() {
        let rule = ReactionRule {
            name: "r".to_string(),
            namespace: None,
            uid: None,
            alert_name: "A".to_string(),
            matchers: vec![],
            actions: vec![Action::new("a", "busybox")],
            volumes: vec![],
        };
        assert_eq!(rule.namespace_or("default"), "default");
        assert_eq!(rule.key("monitoring"), "monitoring/r");
    }
}
