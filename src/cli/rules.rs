//! Rules command handlers

use crate::cli::output::{check_rules, format_check_results, format_rules_json, format_rules_table, RuleView};
use crate::cli::{RulesCheckArgs, RulesListArgs};
use crate::config::KaroConfig;

/// Handle `karo rules list`
pub fn handle_rules_list(args: &RulesListArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = KaroConfig::load(Some(&args.config))?.with_env_overrides();
    let store = config.rule_store()?;
    let stored = store.list_stored();

    if args.json {
        return Ok(format_rules_json(&stored)?);
    }

    let views: Vec<RuleView> = stored.iter().map(RuleView::from).collect();
    Ok(format_rules_table(&views))
}

/// Handle `karo rules check`
///
/// Prints one line per rule and fails when any rule is invalid.
pub fn handle_rules_check(args: &RulesCheckArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = KaroConfig::load(Some(&args.config))?;
    let results = check_rules(&config.rules);
    let report = format_check_results(&results);

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        return Err(format!(
            "{}\n{} of {} rules failed validation",
            report,
            failed,
            results.len()
        )
        .into());
    }

    // Per-rule checks passed; catch config-level problems such as duplicates.
    config.validate()?;

    Ok(format!("{}\n{} rules valid", report, results.len()))
}
