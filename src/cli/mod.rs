//! CLI module for the conformance harness
//!
//! # Commands
//!
//! - `run` - Run the conformance suite against a bridge
//! - `list` - List the scenario catalogue
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Run everything against a local bridge
//! conformance run --base-url http://localhost:3000/v1
//!
//! # Run two scenarios with a config file, JSON report on stdout
//! conformance run -c conformance.toml --scenario stream-text --scenario chat-tool-call --json
//! ```

pub mod completions;
pub mod config;
pub mod output;
pub mod run;

pub use completions::handle_completions;
pub use config::handle_config_init;
pub use run::{handle_list, handle_run};

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Conformance harness for OpenAI-compatible bridges
#[derive(Parser, Debug)]
#[command(
    name = "conformance",
    version,
    about = "Check an OpenAI-compatible bridge against the chat completions wire contract"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the conformance suite
    Run(RunArgs),
    /// List available scenarios
    List(ListArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the bridge base URL (including /v1)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Override the bearer token
    #[arg(long)]
    pub api_key: Option<String>,

    /// Override the chat model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Run only this scenario (repeatable)
    #[arg(short, long = "scenario", value_name = "NAME")]
    pub scenarios: Vec<String>,

    /// Scenarios run at the same time
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "conformance.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::try_parse_from(["conformance", "run"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert!(args.config.is_none());
                assert!(args.scenarios.is_empty());
                assert!(!args.json);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "conformance",
            "run",
            "-c",
            "custom.toml",
            "--base-url",
            "http://bridge:3001/v1",
            "--scenario",
            "stream-text",
            "-s",
            "chat-simple",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, Some(PathBuf::from("custom.toml")));
                assert_eq!(args.base_url.as_deref(), Some("http://bridge:3001/v1"));
                assert_eq!(args.scenarios, vec!["stream-text", "chat-simple"]);
                assert!(args.json);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_list_json() {
        let cli = Cli::try_parse_from(["conformance", "list", "--json"]).unwrap();
        match cli.command {
            Commands::List(args) => assert!(args.json),
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_cli_parse_config_init() {
        let cli = Cli::try_parse_from(["conformance", "config", "init", "--force"]).unwrap();
        match cli.command {
            Commands::Config(ConfigCommands::Init(args)) => {
                assert_eq!(args.output, PathBuf::from("conformance.toml"));
                assert!(args.force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
