//! Scenario runner: executes steps in order, fail-fast, and collects evidence.

use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::ArgusConfig;
use crate::error::AppError;
use crate::evaluator::satisfy;
use crate::evidence::{Artifact, EvidenceStore, RunReport};
use crate::facade::Ui;
use crate::policy::PollPolicy;
use crate::scenario::{FailureReport, Scenario, ScenarioResult, ScenarioStep};
use crate::traits::{Page, Session};

/// Events emitted by the runner during scenario execution.
#[derive(Debug)]
pub enum RunEvent<'a> {
    Started {
        run_id: Uuid,
        scenario: &'a str,
        steps: usize,
    },
    StepStarted {
        index: usize,
        description: &'a str,
    },
    ActionPerformed {
        index: usize,
        action: &'a str,
    },
    ExpectationMet {
        index: usize,
        attempts: u32,
        elapsed: Duration,
    },
    StepFailed {
        index: usize,
        error: &'a AppError,
    },
    EvidenceCaptured {
        artifact: &'a Artifact,
    },
    Finished {
        scenario: &'a str,
        passed: bool,
        duration: Duration,
    },
}

/// Trait for reporting runner events.
pub trait RunReporter: Send + Sync {
    fn report(&self, event: RunEvent<'_>) {
        let _ = event;
    }
}

/// Default reporter that logs events via `tracing`.
pub struct TracingRunReporter;

impl RunReporter for TracingRunReporter {
    fn report(&self, event: RunEvent<'_>) {
        match event {
            RunEvent::Started {
                run_id,
                scenario,
                steps,
            } => {
                tracing::info!(%run_id, %scenario, steps, "Scenario started");
            }
            RunEvent::StepStarted { index, description } => {
                tracing::info!(step = index, %description, "Step started");
            }
            RunEvent::ActionPerformed { index, action } => {
                tracing::debug!(step = index, %action, "Action performed");
            }
            RunEvent::ExpectationMet {
                index,
                attempts,
                elapsed,
            } => {
                tracing::info!(
                    step = index,
                    attempts,
                    elapsed_ms = %elapsed.as_millis(),
                    "Expectation met"
                );
            }
            RunEvent::StepFailed { index, error } => {
                tracing::warn!(step = index, %error, "Step failed");
            }
            RunEvent::EvidenceCaptured { artifact } => {
                tracing::info!(
                    name = %artifact.name,
                    path = %artifact.path.display(),
                    sha256 = %artifact.sha256,
                    "Evidence captured"
                );
            }
            RunEvent::Finished {
                scenario,
                passed,
                duration,
            } => {
                if passed {
                    tracing::info!(%scenario, duration_ms = %duration.as_millis(), "Scenario passed");
                } else {
                    tracing::error!(%scenario, duration_ms = %duration.as_millis(), "Scenario failed");
                }
            }
        }
    }
}

/// The step a run stopped at, and why.
#[derive(Debug)]
pub struct StepFailure {
    pub index: usize,
    pub error: AppError,
    /// Time spent in the step before it failed.
    pub elapsed: Duration,
}

/// Drives one page through scenarios. Holds no state between runs.
pub struct ScenarioRunner<P: Page> {
    ui: Ui<P>,
    evidence: EvidenceStore,
    default_policy: PollPolicy,
}

impl<P: Page> ScenarioRunner<P> {
    pub fn new(ui: Ui<P>, evidence: EvidenceStore, default_policy: PollPolicy) -> Self {
        Self {
            ui,
            evidence,
            default_policy,
        }
    }

    /// Runner for `page` with base URL, artifacts dir and pacing from `config`.
    pub fn from_config(page: P, config: &ArgusConfig) -> Self {
        Self::new(
            Ui::new(page).with_base_url(config.base_url.clone()),
            EvidenceStore::new(&config.artifacts_dir),
            config.policy,
        )
    }

    pub fn ui(&self) -> &Ui<P> {
        &self.ui
    }

    /// Run `scenario` to completion or first failure.
    ///
    /// Timeouts and failed user actions become a failed [`ScenarioResult`].
    /// Anything else (unreachable app, broken config, I/O) is returned as
    /// an error, since it says nothing about the UI under test.
    pub async fn run<R: RunReporter>(
        &self,
        scenario: &Scenario,
        reporter: &R,
    ) -> Result<ScenarioResult, AppError> {
        scenario.validate()?;
        self.evidence.ensure_dir()?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        reporter.report(RunEvent::Started {
            run_id,
            scenario: &scenario.name,
            steps: scenario.steps.len(),
        });

        let default_policy = scenario.default_policy.unwrap_or(self.default_policy);
        let mut artifacts = Vec::new();
        let outcome = self
            .run_steps(&scenario.steps, &default_policy, reporter, &mut artifacts)
            .await;

        let failure = match outcome {
            Ok(()) => {
                let name = scenario.final_evidence_name();
                if let Some(artifact) = self.capture(&name, reporter).await {
                    artifacts.push(artifact);
                }
                None
            }
            Err(StepFailure {
                index,
                error,
                elapsed,
            }) if error.is_scenario_failure() => {
                let report = failure_report(&scenario.steps[index], index, &error, elapsed);
                self.capture_failure(scenario, &report, reporter, &mut artifacts)
                    .await;
                Some(report)
            }
            Err(StepFailure { error, .. }) => return Err(error),
        };

        let paths: Vec<String> = artifacts
            .iter()
            .map(|a| a.path.display().to_string())
            .collect();
        let result = match failure {
            None => ScenarioResult::passed(paths),
            Some(report) => ScenarioResult::failed(report, paths),
        };

        let duration = clock.elapsed();
        reporter.report(RunEvent::Finished {
            scenario: &scenario.name,
            passed: result.passed,
            duration,
        });

        let report = RunReport {
            run_id,
            scenario: scenario.name.clone(),
            description: scenario.description.clone(),
            started_at,
            finished_at: Utc::now(),
            duration_ms: duration.as_millis() as u64,
            result: result.clone(),
            artifacts,
        };
        if let Err(e) = self.evidence.write_json(&report.file_name(), &report) {
            tracing::warn!(scenario = %scenario.name, error = %e, "Failed to write run report");
        }

        Ok(result)
    }

    /// Execute `steps` in order, stopping at the first one that fails.
    ///
    /// No action of step N+1 is dispatched before step N's expectation holds.
    pub async fn run_steps<R: RunReporter>(
        &self,
        steps: &[ScenarioStep],
        default_policy: &PollPolicy,
        reporter: &R,
        artifacts: &mut Vec<Artifact>,
    ) -> Result<(), StepFailure> {
        for (index, step) in steps.iter().enumerate() {
            let description = step.expectation.describe();
            reporter.report(RunEvent::StepStarted {
                index,
                description: &description,
            });

            let started = Instant::now();
            let result = self
                .run_step(index, step, default_policy, reporter, artifacts)
                .await;
            if let Err(error) = result {
                reporter.report(RunEvent::StepFailed {
                    index,
                    error: &error,
                });
                return Err(StepFailure {
                    index,
                    error,
                    elapsed: started.elapsed(),
                });
            }
        }
        Ok(())
    }

    async fn run_step<R: RunReporter>(
        &self,
        index: usize,
        step: &ScenarioStep,
        default_policy: &PollPolicy,
        reporter: &R,
        artifacts: &mut Vec<Artifact>,
    ) -> Result<(), AppError> {
        if let Some(action) = &step.action {
            self.ui.perform(action).await?;
            reporter.report(RunEvent::ActionPerformed {
                index,
                action: &action.label(),
            });
        }

        let policy = step.policy.as_ref().unwrap_or(default_policy);
        let met = satisfy(&self.ui, &step.expectation, policy).await?;
        reporter.report(RunEvent::ExpectationMet {
            index,
            attempts: met.attempts,
            elapsed: met.elapsed,
        });

        if let Some(name) = &step.evidence
            && let Some(artifact) = self.capture(name, reporter).await
        {
            artifacts.push(artifact);
        }
        Ok(())
    }

    /// Screenshot the page. A failed capture is logged and skipped.
    async fn capture<R: RunReporter>(&self, name: &str, reporter: &R) -> Option<Artifact> {
        let path = self.evidence.screenshot_path(name);
        let recorded = match self.ui.capture(&path).await {
            Ok(()) => self.evidence.record(name, &path),
            Err(e) => Err(e),
        };
        match recorded {
            Ok(artifact) => {
                reporter.report(RunEvent::EvidenceCaptured {
                    artifact: &artifact,
                });
                Some(artifact)
            }
            Err(e) => {
                tracing::warn!(%name, error = %e, "Failed to capture evidence");
                None
            }
        }
    }

    async fn capture_failure<R: RunReporter>(
        &self,
        scenario: &Scenario,
        report: &FailureReport,
        reporter: &R,
        artifacts: &mut Vec<Artifact>,
    ) {
        let name = scenario.failure_evidence_name();
        if let Some(artifact) = self.capture(&name, reporter).await {
            artifacts.push(artifact);
        }
        match self.evidence.write_json(&name, report) {
            Ok(artifact) => {
                reporter.report(RunEvent::EvidenceCaptured {
                    artifact: &artifact,
                });
                artifacts.push(artifact);
            }
            Err(e) => tracing::warn!(%name, error = %e, "Failed to write failure diagnostics"),
        }
    }
}

fn failure_report(
    step: &ScenarioStep,
    index: usize,
    error: &AppError,
    elapsed: Duration,
) -> FailureReport {
    let last_observed = match error {
        AppError::Timeout(timeout) => timeout.last_observed.clone(),
        _ => serde_json::Value::Null,
    };
    FailureReport {
        step_index: index,
        description: step.expectation.describe(),
        error: error.to_string(),
        elapsed_ms: elapsed.as_millis() as u64,
        last_observed,
    }
}

/// Run `scenario` on a fresh isolated page from `session`.
///
/// Each call gets its own browser context, so concurrent runs never share
/// storage or DOM state.
pub async fn run_isolated<S: Session, R: RunReporter>(
    session: &S,
    scenario: &Scenario,
    config: &ArgusConfig,
    reporter: &R,
) -> Result<ScenarioResult, AppError> {
    let page = session.isolated_page(&[]).await?;
    ScenarioRunner::from_config(page, config)
        .run(scenario, reporter)
        .await
}
