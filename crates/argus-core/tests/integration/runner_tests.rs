use std::path::PathBuf;

use argus_core::evidence::{RunReport, compute_hash};
use argus_core::runner::ScenarioRunner;
use argus_core::testutil::MockReporter;
use argus_core::{AppError, Scenario};

use crate::integration::common::{config, reader_app};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../scenarios")
        .join(name)
}

#[tokio::test(start_paused = true)]
async fn json_scenario_runs_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let scenario = Scenario::from_file(&fixture("clear_button.json")).unwrap();

    let reporter = MockReporter::new();
    let result = ScenarioRunner::from_config(reader_app(), &config)
        .run(&scenario, &reporter)
        .await
        .unwrap();

    assert!(result.passed, "{:?}", result.failure);
    assert_eq!(reporter.events().first().unwrap(), "Started");
    assert_eq!(reporter.events().last().unwrap(), "Finished:true");
    assert!(dir.path().join("clear_button_final.png").exists());
}

#[tokio::test(start_paused = true)]
async fn scoped_radios_from_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let scenario = Scenario::from_file(&fixture("settings_theme.json")).unwrap();

    let result = ScenarioRunner::from_config(reader_app(), &config)
        .run(&scenario, &MockReporter::new())
        .await
        .unwrap();

    assert!(result.passed, "{:?}", result.failure);
    assert!(dir.path().join("theme_defaults.png").exists());
}

#[tokio::test(start_paused = true)]
async fn run_report_lists_hashed_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let scenario = Scenario::from_file(&fixture("clear_button.json")).unwrap();

    let result = ScenarioRunner::from_config(reader_app(), &config)
        .run(&scenario, &MockReporter::new())
        .await
        .unwrap();

    let raw = std::fs::read_to_string(dir.path().join("clear-button-json-report.json")).unwrap();
    let report: RunReport = serde_json::from_str(&raw).unwrap();
    assert_eq!(report.scenario, "clear-button-json");
    assert_eq!(report.result, result);
    // debug_state, 1_with_text, 2_cleared, final
    assert_eq!(report.artifacts.len(), 4);
    for artifact in &report.artifacts {
        let content = std::fs::read(&artifact.path).unwrap();
        assert_eq!(artifact.sha256, compute_hash(&content));
    }
    assert!(report.finished_at >= report.started_at);
}

#[test]
fn json_clear_button_keeps_two_second_windows() {
    let scenario = Scenario::from_file(&fixture("clear_button.json")).unwrap();
    for index in [2, 4] {
        let policy = scenario.steps[index].policy.unwrap();
        assert_eq!(policy.timeout_ms(), 2000, "step {index}");
    }
}

#[tokio::test]
async fn invalid_scenario_is_rejected_before_running() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let page = reader_app();
    let scenario = Scenario::new("empty", "no steps");

    let err = ScenarioRunner::from_config(page.clone(), &config)
        .run(&scenario, &MockReporter::new())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ScenarioError(_)));
    assert!(page.actions().is_empty());
}

#[test]
fn missing_fixture_is_a_scenario_error() {
    let err = Scenario::from_file(&fixture("does_not_exist.json")).unwrap_err();
    assert!(matches!(err, AppError::ScenarioError(_)));
}
