//! Suite execution and reporting.

use super::Scenario;
use crate::client::BridgeClient;
use crate::config::HarnessConfig;
use crate::error::ConformanceError;
use crate::validate::Violation;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

/// Outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail { kind: String, reason: String },
}

impl Verdict {
    fn from_error(err: &ConformanceError) -> Self {
        Verdict::Fail {
            kind: err.kind().to_string(),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: &'static str,
    /// Sent as `x-request-id` on every request of the scenario
    pub run_id: String,
    pub verdict: Verdict,
    pub warnings: Vec<Violation>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Reports in catalogue order.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub base_url: String,
    pub model: String,
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.scenarios.len() - self.passed()
    }

    pub fn warnings(&self) -> usize {
        self.scenarios.iter().map(|r| r.warnings.len()).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Scenarios selected by the config; the whole catalogue when none are named.
pub fn selected_scenarios(config: &HarnessConfig) -> Vec<Scenario> {
    if config.suite.scenarios.is_empty() {
        return Scenario::ALL.to_vec();
    }
    Scenario::ALL
        .iter()
        .copied()
        .filter(|s| config.suite.scenarios.iter().any(|n| n == s.name()))
        .collect()
}

/// Run one scenario with a fresh client and a new run id.
pub async fn run_scenario(scenario: Scenario, config: &HarnessConfig) -> ScenarioReport {
    let run_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("scenario", scenario = scenario.name(), run_id = %run_id);
    let start = Instant::now();

    let mut warnings = Vec::new();
    let result = async {
        let client = BridgeClient::new(&config.bridge)?.with_request_id(run_id.clone());
        scenario.run(&client, config, &mut warnings).await
    }
    .instrument(span.clone())
    .await;

    let duration = start.elapsed();
    let _entered = span.enter();
    let verdict = match result {
        Ok(()) => {
            tracing::info!(
                duration_ms = duration.as_millis() as u64,
                warnings = warnings.len(),
                "scenario passed"
            );
            Verdict::Pass
        }
        Err(e) => {
            tracing::error!(
                duration_ms = duration.as_millis() as u64,
                kind = e.kind(),
                error = %e,
                warnings = warnings.len(),
                "scenario failed"
            );
            Verdict::from_error(&e)
        }
    };

    ScenarioReport {
        name: scenario.name(),
        run_id,
        verdict,
        warnings,
        duration,
    }
}

/// Run the selected scenarios, up to `suite.concurrency` at a time.
pub async fn run_suite(config: &HarnessConfig) -> SuiteReport {
    let selected = selected_scenarios(config);
    tracing::info!(
        base_url = %config.bridge.base_url,
        model = %config.bridge.model,
        scenarios = selected.len(),
        concurrency = config.suite.concurrency,
        "conformance suite starting"
    );

    let scenarios: Vec<ScenarioReport> = stream::iter(selected)
        .map(|scenario| run_scenario(scenario, config))
        .buffered(config.suite.concurrency.max(1))
        .collect()
        .await;

    let report = SuiteReport {
        base_url: config.bridge.base_url.clone(),
        model: config.bridge.model.clone(),
        scenarios,
    };
    tracing::info!(
        passed = report.passed(),
        failed = report.failed(),
        warnings = report.warnings(),
        "conformance suite finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_scenarios_default_is_catalogue() {
        let config = HarnessConfig::default();
        assert_eq!(selected_scenarios(&config), Scenario::ALL.to_vec());
    }

    #[test]
    fn test_selected_scenarios_keep_catalogue_order() {
        let mut config = HarnessConfig::default();
        config.suite.scenarios = vec!["stream-text".to_string(), "list-models".to_string()];
        assert_eq!(
            selected_scenarios(&config),
            vec![Scenario::ListModels, Scenario::StreamText]
        );
    }

    #[test]
    fn test_suite_report_counts() {
        let report = SuiteReport {
            base_url: "http://localhost:3000/v1".to_string(),
            model: "m".to_string(),
            scenarios: vec![
                ScenarioReport {
                    name: "a",
                    run_id: "1".to_string(),
                    verdict: Verdict::Pass,
                    warnings: vec![Violation::missing_usage("x")],
                    duration: Duration::from_millis(5),
                },
                ScenarioReport {
                    name: "b",
                    run_id: "2".to_string(),
                    verdict: Verdict::Fail {
                        kind: "schema".to_string(),
                        reason: "bad".to_string(),
                    },
                    warnings: vec![],
                    duration: Duration::from_millis(7),
                },
            ],
        };
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.warnings(), 1);
        assert!(!report.is_success());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["scenarios"][0]["verdict"]["status"], "pass");
        assert_eq!(json["scenarios"][1]["verdict"]["kind"], "schema");
        assert_eq!(json["scenarios"][1]["duration_ms"], 7);
    }

    #[tokio::test]
    async fn test_unreachable_bridge_fails_with_transport() {
        let mut config = HarnessConfig::default();
        config.bridge.base_url = "http://127.0.0.1:1/v1".to_string();
        let report = run_scenario(Scenario::ListModels, &config).await;
        match report.verdict {
            Verdict::Fail { kind, .. } => assert_eq!(kind, "transport"),
            Verdict::Pass => panic!("Expected failure"),
        }
    }
}
