//! Config command handlers

use crate::cli::{ConfigAlertmanagerArgs, ConfigInitArgs};
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../karo.example.toml");

/// Handle `karo config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        )
        .into());
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    println!("✓ Configuration file created: {}", args.output.display());
    println!("  Add reaction rules under [[rules]] and run `karo rules check`.");

    Ok(())
}

/// Handle `karo config alertmanager` command
///
/// Renders a receiver block for `alertmanager.yml`.
pub fn handle_config_alertmanager(
    args: &ConfigAlertmanagerArgs,
) -> Result<String, Box<dyn std::error::Error>> {
    let base = reqwest::Url::parse(&args.url)
        .map_err(|e| format!("Invalid URL '{}': {}", args.url, e))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(format!("Unsupported URL scheme '{}': use http or https", base.scheme()).into());
    }

    let name = args.name.trim();
    if name.is_empty() {
        return Err("Receiver name must not be empty".into());
    }

    let mut target = base.as_str().trim_end_matches('/').to_string();
    target.push_str("/webhook");
    if args.tagged {
        if name.contains('/') {
            return Err(format!("Receiver name '{}' cannot contain '/'", name).into());
        }
        target.push('/');
        target.push_str(name);
    }

    Ok(format!(
        "receivers:\n  - name: {name}\n    webhook_configs:\n      - url: {target}\n        send_resolved: {resolved}\n",
        name = name,
        target = target,
        resolved = args.send_resolved,
    ))
}
