use std::time::Duration;

use argus_core::catalog;
use argus_core::runner::{ScenarioRunner, run_isolated};
use argus_core::testutil::{MockReporter, MockSession};
use futures::future::join_all;

use crate::integration::common::{AppFlaws, config, default_config, reader_app, reader_app_with};

#[tokio::test(start_paused = true)]
async fn clear_button_passes_and_captures_each_transition() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let page = reader_app();

    let result = ScenarioRunner::from_config(page.clone(), &config)
        .run(&catalog::clear_button(&config).unwrap(), &MockReporter::new())
        .await
        .unwrap();

    assert!(result.passed, "{:?}", result.failure);
    for name in [
        "debug_state.png",
        "1_with_text.png",
        "2_cleared.png",
        "clear-button-final.png",
    ] {
        assert!(dir.path().join(name).exists(), "missing {name}");
    }
    assert_eq!(
        page.actions(),
        vec![
            "storage:hypersonic-tutorial-seen=true",
            "navigate:http://localhost:5173/",
            "fill:#input-text:Hello world, this is a test.",
            "click:button \"Clear input\"",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn zen_mode_passes() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let result = ScenarioRunner::from_config(reader_app(), &config)
        .run(&catalog::zen_mode(&config).unwrap(), &MockReporter::new())
        .await
        .unwrap();

    assert!(result.passed, "{:?}", result.failure);
    assert!(dir.path().join("zen_mode_active.png").exists());
}

#[tokio::test(start_paused = true)]
async fn settings_accessibility_passes() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let result = ScenarioRunner::from_config(reader_app(), &config)
        .run(&catalog::settings_accessibility(&config), &MockReporter::new())
        .await
        .unwrap();

    assert!(result.passed, "{:?}", result.failure);
}

#[tokio::test(start_paused = true)]
async fn character_count_passes() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());

    let result = ScenarioRunner::from_config(reader_app(), &config)
        .run(&catalog::character_count(&config), &MockReporter::new())
        .await
        .unwrap();

    assert!(result.passed, "{:?}", result.failure);
}

#[tokio::test(start_paused = true)]
async fn broken_clear_button_fails_at_value_step() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let page = reader_app_with(AppFlaws {
        clear_keeps_text: true,
        ..Default::default()
    });

    let result = ScenarioRunner::from_config(page.clone(), &config)
        .run(&catalog::clear_button(&config).unwrap(), &MockReporter::new())
        .await
        .unwrap();

    assert!(!result.passed);
    assert_eq!(result.failed_step_index, Some(4));
    let failure = result.failure.unwrap();
    assert_eq!(failure.last_observed["element"]["value"], "Hello world, this is a test.");
    assert!(dir.path().join("clear-button-failure.png").exists());
    assert!(dir.path().join("clear-button-failure.json").exists());
    // The click was the last thing dispatched.
    assert_eq!(page.actions().last().unwrap(), "click:button \"Clear input\"");
}

#[tokio::test(start_paused = true)]
async fn sluggish_clear_button_misses_its_two_second_window() {
    let dir = tempfile::tempdir().unwrap();
    // Default policy allows 5s; the scenario itself must still insist on 2s.
    let config = default_config(dir.path());
    assert_eq!(config.policy.timeout_ms(), 5000);
    let page = reader_app_with(AppFlaws {
        clear_button_lag: Some(Duration::from_millis(3500)),
        ..Default::default()
    });

    let result = ScenarioRunner::from_config(page.clone(), &config)
        .run(&catalog::clear_button(&config).unwrap(), &MockReporter::new())
        .await
        .unwrap();

    assert!(!result.passed);
    assert_eq!(result.failed_step_index, Some(2));
    let failure = result.failure.unwrap();
    assert!((2000..2100).contains(&failure.elapsed_ms), "elapsed {}", failure.elapsed_ms);
    assert_eq!(failure.last_observed["element"]["visible"], false);
    assert_eq!(
        page.actions().last().unwrap(),
        "fill:#input-text:Hello world, this is a test."
    );
}

#[tokio::test(start_paused = true)]
async fn clear_button_within_its_window_passes_under_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = default_config(dir.path());
    let page = reader_app_with(AppFlaws {
        clear_button_lag: Some(Duration::from_millis(1500)),
        ..Default::default()
    });

    let result = ScenarioRunner::from_config(page, &config)
        .run(&catalog::clear_button(&config).unwrap(), &MockReporter::new())
        .await
        .unwrap();

    assert!(result.passed, "{:?}", result.failure);
}

#[tokio::test(start_paused = true)]
async fn stuck_zen_toggle_fails_after_its_click() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let page = reader_app_with(AppFlaws {
        zen_ignores_clicks: true,
        ..Default::default()
    });
    let scenario = catalog::zen_mode(&config).unwrap();

    let result = ScenarioRunner::from_config(page.clone(), &config)
        .run(&scenario, &MockReporter::new())
        .await
        .unwrap();

    assert!(!result.passed);
    assert_eq!(result.failed_step_index, Some(6));
    assert_eq!(
        result.failure.unwrap().description,
        "button \"Toggle Zen Mode\" to have aria-pressed=\"true\""
    );
}

#[tokio::test(start_paused = true)]
async fn run_all_isolates_each_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let session = MockSession::new(reader_app);
    let scenarios = catalog::all(&config).unwrap();
    let reporter = MockReporter::new();

    let results = join_all(
        scenarios
            .iter()
            .map(|scenario| run_isolated(&session, scenario, &config, &reporter)),
    )
    .await;

    assert_eq!(session.contexts.lock().unwrap().len(), scenarios.len());
    for (scenario, result) in scenarios.iter().zip(results) {
        let result = result.unwrap();
        assert!(result.passed, "{} failed: {:?}", scenario.name, result.failure);
    }
}

#[tokio::test(start_paused = true)]
async fn repeated_runs_in_fresh_contexts_agree() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let session = MockSession::new(|| {
        reader_app_with(AppFlaws {
            clear_keeps_text: true,
            ..Default::default()
        })
    });
    let scenario = catalog::clear_button(&config).unwrap();
    let reporter = MockReporter::new();

    let first = run_isolated(&session, &scenario, &config, &reporter)
        .await
        .unwrap();
    let second = run_isolated(&session, &scenario, &config, &reporter)
        .await
        .unwrap();

    assert_eq!(first.passed, second.passed);
    assert_eq!(first.failed_step_index, second.failed_step_index);
    assert_eq!(first.failed_step_index, Some(4));
}
