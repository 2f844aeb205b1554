//! Output formatting helpers for CLI commands

use crate::scenario::{Scenario, SuiteReport, Verdict};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// View model for catalogue display
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScenarioView {
    pub name: &'static str,
    pub description: &'static str,
}

impl From<&Scenario> for ScenarioView {
    fn from(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name(),
            description: scenario.description(),
        }
    }
}

/// Format a suite report as a table followed by a summary line
pub fn format_report_table(report: &SuiteReport) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Scenario", "Result", "Duration", "Details"]);

    for r in &report.scenarios {
        let (result, details) = match r.verdict {
            Verdict::Pass if r.warnings.is_empty() => ("PASS".green().to_string(), String::new()),
            Verdict::Pass => (
                "WARN".yellow().to_string(),
                r.warnings
                    .iter()
                    .map(|w| w.to_string())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Verdict::Fail { ref reason, .. } => ("FAIL".red().to_string(), reason.clone()),
        };

        table.add_row(vec![
            Cell::new(r.name),
            Cell::new(result),
            Cell::new(format!("{}ms", r.duration.as_millis())),
            Cell::new(details),
        ]);
    }

    format!(
        "{}\n{}: {} passed, {} failed, {} warnings",
        table,
        report.base_url,
        report.passed(),
        report.failed(),
        report.warnings()
    )
}

/// Format a suite report as JSON
pub fn format_report_json(report: &SuiteReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({
        "base_url": report.base_url,
        "model": report.model,
        "passed": report.passed(),
        "failed": report.failed(),
        "scenarios": report.scenarios,
    }))
}

/// Format the scenario catalogue as a table
pub fn format_scenarios_table(scenarios: &[Scenario]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Scenario", "Checks"]);

    for s in scenarios {
        table.add_row(vec![Cell::new(s.name()), Cell::new(s.description())]);
    }

    table.to_string()
}

/// Format the scenario catalogue as JSON
pub fn format_scenarios_json(scenarios: &[Scenario]) -> serde_json::Result<String> {
    let views: Vec<ScenarioView> = scenarios.iter().map(ScenarioView::from).collect();
    serde_json::to_string_pretty(&json!({ "scenarios": views }))
}
