//! Run and list command handlers

use crate::cli::output::{
    format_report_json, format_report_table, format_scenarios_json, format_scenarios_table,
};
use crate::cli::{ListArgs, RunArgs};
use crate::config::HarnessConfig;
use crate::scenario::{run_suite, Scenario};

/// Resolve the effective configuration: file, then environment, then flags.
pub fn resolve_config(args: &RunArgs) -> anyhow::Result<HarnessConfig> {
    let mut config = HarnessConfig::load(args.config.as_deref())?.with_env_overrides();

    if let Some(ref base_url) = args.base_url {
        config.bridge.base_url = base_url.clone();
    }
    if let Some(ref api_key) = args.api_key {
        config.bridge.api_key = api_key.clone();
    }
    if let Some(ref model) = args.model {
        config.bridge.model = model.clone();
    }
    if !args.scenarios.is_empty() {
        config.suite.scenarios = args.scenarios.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.suite.concurrency = concurrency;
    }

    config.validate()?;
    Ok(config)
}

/// Handle `conformance run`. Returns whether every scenario passed.
pub async fn handle_run(args: &RunArgs) -> anyhow::Result<bool> {
    let config = resolve_config(args)?;
    crate::logging::init_tracing(&config.logging)?;

    let report = run_suite(&config).await;

    if args.json {
        println!("{}", format_report_json(&report)?);
    } else {
        println!("{}", format_report_table(&report));
    }

    Ok(report.is_success())
}

/// Handle `conformance list`
pub fn handle_list(args: &ListArgs) -> anyhow::Result<String> {
    if args.json {
        Ok(format_scenarios_json(&Scenario::ALL)?)
    } else {
        Ok(format_scenarios_table(&Scenario::ALL))
    }
}
