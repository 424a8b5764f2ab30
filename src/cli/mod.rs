//! CLI module for Karo
//!
//! # Commands
//!
//! - `serve` - Start the webhook receiver
//! - `rules` - Inspect and validate configured reaction rules
//! - `simulate` - Dry-run an alert against the rules
//! - `config` - Configuration utilities (init, alertmanager)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Start with default config
//! karo serve
//!
//! # Validate rules before deploying
//! karo rules check -c karo.toml
//!
//! # See which jobs an alert would create
//! karo simulate --alert HighCPU --label severity=critical
//! ```

pub mod completions;
pub mod config;
pub mod output;
pub mod rules;
pub mod serve;
pub mod simulate;

pub use completions::handle_completions;
pub use config::{handle_config_alertmanager, handle_config_init};

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Karo - alert reaction engine
#[derive(Parser, Debug)]
#[command(
    name = "karo",
    version,
    about = "Turns monitoring alerts into jobs according to declarative reaction rules"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the webhook receiver
    Serve(ServeArgs),
    /// Inspect reaction rules
    #[command(subcommand)]
    Rules(RulesCommands),
    /// Show the jobs an alert would create, without submitting them
    Simulate(SimulateArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "karo.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "KARO_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "KARO_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "KARO_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum RulesCommands {
    /// List configured rules
    List(RulesListArgs),
    /// Validate every configured rule
    Check(RulesCheckArgs),
}

#[derive(Args, Debug)]
pub struct RulesListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "karo.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct RulesCheckArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "karo.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Alert name (the `alertname` label)
    #[arg(short, long)]
    pub alert: String,

    /// Alert label as key=value (repeatable)
    #[arg(short, long = "label", value_parser = parse_key_value)]
    pub labels: Vec<(String, String)>,

    /// Alert annotation as key=value (repeatable)
    #[arg(long = "annotation", value_parser = parse_key_value)]
    pub annotations: Vec<(String, String)>,

    /// Path to configuration file
    #[arg(short, long, default_value = "karo.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
    /// Print an Alertmanager receiver that targets this server
    Alertmanager(ConfigAlertmanagerArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "karo.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ConfigAlertmanagerArgs {
    /// Base URL Alertmanager uses to reach Karo
    #[arg(short, long, default_value = "http://karo:9090")]
    pub url: String,

    /// Alertmanager receiver name
    #[arg(short = 'n', long, default_value = "karo")]
    pub name: String,

    /// Post to /webhook/<name> instead of /webhook
    #[arg(long)]
    pub tagged: bool,

    /// Also forward resolved notifications (Karo skips them)
    #[arg(long)]
    pub send_resolved: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}
