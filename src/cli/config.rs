//! Config command handlers

use crate::cli::ConfigInitArgs;
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../conformance.example.toml");

/// Handle `conformance config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        );
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    println!("✓ Configuration file created: {}", args.output.display());
    println!("  Point [bridge].base_url at the bridge under test.");

    Ok(())
}
