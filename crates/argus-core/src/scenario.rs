use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::ElementDescriptor;
use crate::error::{ActionKind, AppError};
use crate::expectation::Expectation;
use crate::policy::PollPolicy;

/// One user-observable action dispatched through the facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Absolute URL, or a path joined against the configured base URL.
    Navigate { url: String },
    /// Write a key into the page's local storage.
    SetStorageFlag { key: String, value: String },
    Fill {
        target: ElementDescriptor,
        text: String,
    },
    Click { target: ElementDescriptor },
    Reload,
    /// Run a script in the page for its side effect.
    Evaluate { script: String },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Navigate { .. } => ActionKind::Navigate,
            Action::SetStorageFlag { .. } => ActionKind::SetStorageFlag,
            Action::Fill { .. } => ActionKind::Fill,
            Action::Click { .. } => ActionKind::Click,
            Action::Reload => ActionKind::Reload,
            Action::Evaluate { .. } => ActionKind::Evaluate,
        }
    }

    /// Short label used in logs and the mock action log.
    pub fn label(&self) -> String {
        match self {
            Action::Navigate { url } => format!("navigate:{url}"),
            Action::SetStorageFlag { key, value } => format!("storage:{key}={value}"),
            Action::Fill { target, text } => format!("fill:{target}:{text}"),
            Action::Click { target } => format!("click:{target}"),
            Action::Reload => "reload".to_string(),
            Action::Evaluate { script } => {
                format!("evaluate:{}", script.chars().take(30).collect::<String>())
            }
        }
    }
}

/// An optional action followed by an expectation that must hold before
/// the next step starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    pub expectation: Expectation,
    /// Overrides the scenario-wide policy for this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PollPolicy>,
    /// Artifact name for a screenshot taken once the expectation holds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl ScenarioStep {
    /// A step that only waits for `expectation`.
    pub fn expect(expectation: Expectation) -> Self {
        Self {
            action: None,
            expectation,
            policy: None,
            evidence: None,
        }
    }

    /// A setup step: `action`, then wait for the page to be loaded.
    pub fn setup(action: Action) -> Self {
        Self::expect(Expectation::page_ready()).after(action)
    }

    pub fn after(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn within(mut self, policy: PollPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn capture(mut self, name: impl Into<String>) -> Self {
        self.evidence = Some(name.into());
        self
    }
}

/// A named, ordered sequence of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_policy: Option<PollPolicy>,
    pub steps: Vec<ScenarioStep>,
    /// Artifact name for the screenshot taken after the last step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_evidence: Option<String>,
    /// Artifact name for the screenshot taken on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_evidence: Option<String>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            default_policy: None,
            steps: Vec::new(),
            final_evidence: None,
            failure_evidence: None,
        }
    }

    pub fn step(mut self, step: ScenarioStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.default_policy = Some(policy);
        self
    }

    pub fn with_final_evidence(mut self, name: impl Into<String>) -> Self {
        self.final_evidence = Some(name.into());
        self
    }

    pub fn final_evidence_name(&self) -> String {
        self.final_evidence
            .clone()
            .unwrap_or_else(|| format!("{}-final", self.name))
    }

    pub fn failure_evidence_name(&self) -> String {
        self.failure_evidence
            .clone()
            .unwrap_or_else(|| format!("{}-failure", self.name))
    }

    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::ScenarioError(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Reject scenarios that cannot run as written.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::ScenarioError("scenario name must not be empty".into()));
        }
        if self.steps.is_empty() {
            return Err(AppError::ScenarioError(format!(
                "scenario '{}' has no steps",
                self.name
            )));
        }
        Ok(())
    }
}

/// A compact failure diagnostic attached to a failed result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub step_index: usize,
    pub description: String,
    pub error: String,
    /// Time spent in the failing step, action included.
    pub elapsed_ms: u64,
    #[serde(default)]
    pub last_observed: serde_json::Value,
}

/// The sole output of a scenario run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_step_index: Option<usize>,
    pub artifact_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReport>,
}

impl ScenarioResult {
    pub fn passed(artifact_paths: Vec<String>) -> Self {
        Self {
            passed: true,
            failed_step_index: None,
            artifact_paths,
            failure: None,
        }
    }

    pub fn failed(failure: FailureReport, artifact_paths: Vec<String>) -> Self {
        Self {
            passed: false,
            failed_step_index: Some(failure.step_index),
            artifact_paths,
            failure: Some(failure),
        }
    }
}
