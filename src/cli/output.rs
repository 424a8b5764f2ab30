//! Output formatting helpers for CLI commands

use crate::rules::{validate_rule, ReactionRule, RuleError, StoredRule};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// View model for rule display
#[derive(Debug, Clone, serde::Serialize)]
pub struct RuleView {
    pub key: String,
    pub alert_name: String,
    pub matchers: Vec<String>,
    pub actions: Vec<String>,
    pub trigger_count: u64,
}

impl From<&StoredRule> for RuleView {
    fn from(stored: &StoredRule) -> Self {
        let rule = &stored.rule;
        Self {
            key: format!(
                "{}/{}",
                rule.namespace.as_deref().unwrap_or_default(),
                rule.name
            ),
            alert_name: rule.alert_name.clone(),
            matchers: rule
                .matchers
                .iter()
                .map(|m| {
                    format!(
                        "{} {:?} [{}]",
                        m.attribute_path,
                        m.operator,
                        m.values.join(", ")
                    )
                })
                .collect(),
            actions: rule
                .actions
                .iter()
                .map(|a| format!("{} ({})", a.name, a.image))
                .collect(),
            trigger_count: stored.status.trigger_count,
        }
    }
}

/// Format rules as a table
pub fn format_rules_table(rules: &[RuleView]) -> String {
    if rules.is_empty() {
        return "No reaction rules configured".yellow().to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Rule", "Alert", "Matchers", "Actions"]);

    for r in rules {
        let matchers = if r.matchers.is_empty() {
            "(any)".dimmed().to_string()
        } else {
            r.matchers.join("\n")
        };
        table.add_row(vec![
            Cell::new(&r.key),
            Cell::new(&r.alert_name),
            Cell::new(matchers),
            Cell::new(r.actions.join("\n")),
        ]);
    }

    table.to_string()
}

/// Format rules as JSON
pub fn format_rules_json(rules: &[StoredRule]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({ "rules": rules }))
}

/// Result of validating one rule
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub error: Option<RuleError>,
}

pub fn check_rules(rules: &[ReactionRule]) -> Vec<CheckResult> {
    rules
        .iter()
        .map(|rule| CheckResult {
            name: rule.name.clone(),
            error: validate_rule(rule).err(),
        })
        .collect()
}

/// One line per rule, a check mark or the error.
pub fn format_check_results(results: &[CheckResult]) -> String {
    results
        .iter()
        .map(|r| match &r.error {
            None => format!("{} {}", "✓".green(), r.name),
            Some(e) => format!("{} {}: {}", "✗".red(), r.name, e),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
