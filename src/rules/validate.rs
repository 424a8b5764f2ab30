//! Rule admission checks.
//!
//! Synthesis trusts its input: it does not check that a mount names a declared
//! volume. These checks run when rules are loaded instead, and from
//! `karo rules check`.

use super::{MatchOperator, ReactionRule};
use crate::job::Quantity;
use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;

/// Reasons a rule is rejected at admission time.
#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    #[error("rule name cannot be empty")]
    EmptyName,

    #[error("rule '{rule}': alertName cannot be empty")]
    EmptyAlertName { rule: String },

    #[error("rule '{rule}': at least one action is required")]
    NoActions { rule: String },

    #[error("rule '{rule}': duplicate action name '{action}'")]
    DuplicateAction { rule: String, action: String },

    #[error("rule '{rule}': action '{action}' has an empty {field}")]
    EmptyActionField {
        rule: String,
        action: String,
        field: &'static str,
    },

    #[error("rule '{rule}': volume '{volume}' must have exactly one source, found {count}")]
    VolumeSource {
        rule: String,
        volume: String,
        count: usize,
    },

    #[error("rule '{rule}': action '{action}' mounts undeclared volume '{volume}'")]
    UnknownVolume {
        rule: String,
        action: String,
        volume: String,
    },

    #[error("rule '{rule}': action '{action}' has invalid quantity '{value}' for '{resource}'")]
    InvalidQuantity {
        rule: String,
        action: String,
        resource: String,
        value: String,
    },

    #[error("rule '{rule}': matcher on '{path}' needs at least one value for {operator:?}")]
    MissingMatcherValue {
        rule: String,
        path: String,
        operator: MatchOperator,
    },

    #[error("rule '{rule}': matcher on '{path}' has invalid pattern: {message}")]
    InvalidPattern {
        rule: String,
        path: String,
        message: String,
    },
}

/// Check a rule before it is admitted to a rule source.
pub fn validate_rule(rule: &ReactionRule) -> Result<(), RuleError> {
    let name = rule.name.clone();

    if rule.name.trim().is_empty() {
        return Err(RuleError::EmptyName);
    }
    if rule.alert_name.is_empty() {
        return Err(RuleError::EmptyAlertName { rule: name });
    }
    if rule.actions.is_empty() {
        return Err(RuleError::NoActions { rule: name });
    }

    for matcher in &rule.matchers {
        let needs_value = matcher.operator.uses_single_value()
            || matches!(matcher.operator, MatchOperator::In | MatchOperator::NotIn);
        if needs_value && matcher.values.is_empty() {
            return Err(RuleError::MissingMatcherValue {
                rule: name,
                path: matcher.attribute_path.clone(),
                operator: matcher.operator,
            });
        }
        if matches!(matcher.operator, MatchOperator::Regex | MatchOperator::NotRegex) {
            if let Err(e) = Regex::new(&matcher.values[0]) {
                return Err(RuleError::InvalidPattern {
                    rule: name,
                    path: matcher.attribute_path.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    for volume in &rule.volumes {
        let count = volume.source.source_count();
        if count != 1 {
            return Err(RuleError::VolumeSource {
                rule: name,
                volume: volume.name.clone(),
                count,
            });
        }
    }

    let declared: HashSet<&str> = rule.volumes.iter().map(|v| v.name.as_str()).collect();
    let mut seen = HashSet::new();

    for action in &rule.actions {
        if !seen.insert(action.name.as_str()) {
            return Err(RuleError::DuplicateAction {
                rule: name,
                action: action.name.clone(),
            });
        }
        for (field, value) in [("name", &action.name), ("image", &action.image)] {
            if value.trim().is_empty() {
                return Err(RuleError::EmptyActionField {
                    rule: name,
                    action: action.name.clone(),
                    field,
                });
            }
        }
        for mount in &action.volume_mounts {
            if !declared.contains(mount.name.as_str()) {
                return Err(RuleError::UnknownVolume {
                    rule: name,
                    action: action.name.clone(),
                    volume: mount.name.clone(),
                });
            }
        }
        if let Some(resources) = &action.resources {
            for (resource, value) in resources.limits.iter().chain(resources.requests.iter()) {
                if value.parse::<Quantity>().is_err() {
                    return Err(RuleError::InvalidQuantity {
                        rule: name,
                        action: action.name.clone(),
                        resource: resource.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{
        Action, EmptyDirVolumeSource, Matcher, ResourceRequirements, Volume, VolumeMount,
        VolumeSource,
    };

    fn valid_rule() -> ReactionRule {
        let mut action = Action::new("collect", "busybox:latest");
        action.volume_mounts.push(VolumeMount {
            name: "scratch".to_string(),
            mount_path: "/scratch".to_string(),
            sub_path: None,
            read_only: false,
        });
        ReactionRule {
            name: "disk-full".to_string(),
            namespace: Some("default".to_string()),
            uid: None,
            alert_name: "DiskFull".to_string(),
            matchers: vec![Matcher::new("labels.env", MatchOperator::Equal, &["prod"])],
            actions: vec![action],
            volumes: vec![Volume {
                name: "scratch".to_string(),
                source: VolumeSource {
                    empty_dir: Some(EmptyDirVolumeSource::default()),
                    ..Default::default()
                },
            }],
        }
    }

    #[test]
    fn test_valid_rule_passes() {
        assert_eq!(validate_rule(&valid_rule()), Ok(()));
    }

    #[test]
    fn test_no_actions_rejected() {
        let mut rule = valid_rule();
        rule.actions.clear();
        assert!(matches!(validate_rule(&rule), Err(RuleError::NoActions { .. })));
    }

    #[test]
    fn test_unknown_mount_rejected() {
        let mut rule = valid_rule();
        rule.actions[0].volume_mounts[0].name = "missing".to_string();
        assert!(matches!(
            validate_rule(&rule),
            Err(RuleError::UnknownVolume { ref volume, .. }) if volume == "missing"
        ));
    }

    #[test]
    fn test_volume_without_source_rejected() {
        let mut rule = valid_rule();
        rule.volumes[0].source = VolumeSource::default();
        assert!(matches!(
            validate_rule(&rule),
            Err(RuleError::VolumeSource { count: 0, .. })
        ));
    }

    #[test]
    fn test_invalid_quantity_rejected() {
        let mut rule = valid_rule();
        let mut resources = ResourceRequirements::default();
        resources.limits.insert("memory".to_string(), "lots".to_string());
        rule.actions[0].resources = Some(resources);
        assert!(matches!(
            validate_rule(&rule),
            Err(RuleError::InvalidQuantity { ref resource, .. }) if resource == "memory"
        ));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut rule = valid_rule();
        rule.matchers = vec![Matcher::new("labels.instance", MatchOperator::Regex, &["("])];
        assert!(matches!(validate_rule(&rule), Err(RuleError::InvalidPattern { .. })));
    }

    #[test]
    fn test_in_without_values_rejected() {
        let mut rule = valid_rule();
        rule.matchers = vec![Matcher::new("labels.env", MatchOperator::In, &[])];
        assert!(matches!(
            validate_rule(&rule),
            Err(RuleError::MissingMatcherValue { .. })
        ));
    }

    #[test]
    fn test_exists_needs_no_values() {
        let mut rule = valid_rule();
        rule.matchers = vec![Matcher::new("labels.env", MatchOperator::Exists, &[])];
        assert_eq!(validate_rule(&rule), Ok(()));
    }

    #[test]
    fn test_duplicate_action_rejected() {
        let mut rule = valid_rule();
        let dup = rule.actions[0].clone();
        rule.actions.push(dup);
        assert!(matches!(validate_rule(&rule), Err(RuleError::DuplicateAction { .. })));
    }
}
