use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Application-wide error types for Argus.
#[derive(Error, Debug)]
pub enum AppError {
    /// An expectation never held within its poll policy.
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// The automation transport rejected a user-facing action.
    #[error(transparent)]
    ActionError(#[from] ActionError),

    /// Environment setup (navigation, storage seeding, server reachability) failed.
    #[error("Precondition failed: {0}")]
    PreconditionError(String),

    /// The browser or automation channel itself misbehaved.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A poll policy that breaks `interval > 0, timeout >= interval`.
    #[error("Invalid poll policy: {0}")]
    PolicyError(String),

    /// A scenario definition that cannot be executed as written.
    #[error("Invalid scenario: {0}")]
    ScenarioError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Filesystem error while writing evidence or reading inputs.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error means the UI under test misbehaved.
    ///
    /// Such errors become a `passed: false` scenario result. Everything else
    /// means the harness or its environment broke and must propagate.
    pub fn is_scenario_failure(&self) -> bool {
        matches!(self, AppError::Timeout(_) | AppError::ActionError(_))
    }
}

/// An expectation predicate stayed false until its deadline.
#[derive(Error, Debug, Clone)]
#[error(
    "Timed out after {} ms ({attempts} polls) waiting for {description}",
    .elapsed.as_millis()
)]
pub struct TimeoutError {
    /// Human-readable description of the predicate.
    pub description: String,
    pub elapsed: Duration,
    pub attempts: u32,
    /// The state seen by the final poll, for diagnostics.
    pub last_observed: serde_json::Value,
}

/// Which kind of action a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Navigate,
    SetStorageFlag,
    Fill,
    Click,
    Reload,
    Evaluate,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Navigate => "navigate",
            ActionKind::SetStorageFlag => "set_storage_flag",
            ActionKind::Fill => "fill",
            ActionKind::Click => "click",
            ActionKind::Reload => "reload",
            ActionKind::Evaluate => "evaluate",
        }
    }

    /// Environment-shaping actions: their failure is a precondition failure.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            ActionKind::Navigate | ActionKind::SetStorageFlag | ActionKind::Reload
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The transport could not perform a requested action at all.
#[derive(Error, Debug, Clone)]
#[error("{kind} failed: {cause}")]
pub struct ActionError {
    pub kind: ActionKind,
    pub cause: String,
}

impl ActionError {
    pub fn new(kind: ActionKind, cause: impl Into<String>) -> Self {
        Self {
            kind,
            cause: cause.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_failures() {
        let timeout = TimeoutError {
            description: "button to be visible".into(),
            elapsed: Duration::from_millis(2000),
            attempts: 21,
            last_observed: serde_json::Value::Null,
        };
        assert!(AppError::from(timeout).is_scenario_failure());
        assert!(AppError::from(ActionError::new(ActionKind::Click, "detached")).is_scenario_failure());
        assert!(!AppError::PreconditionError("server down".into()).is_scenario_failure());
        assert!(!AppError::TransportError("socket closed".into()).is_scenario_failure());
    }

    #[test]
    fn test_timeout_message_carries_description_and_elapsed() {
        let err = TimeoutError {
            description: "text \"6 words\" to be visible".into(),
            elapsed: Duration::from_millis(2000),
            attempts: 21,
            last_observed: serde_json::Value::Null,
        };
        let msg = err.to_string();
        assert!(msg.contains("2000 ms"));
        assert!(msg.contains("6 words"));
    }

    #[test]
    fn test_setup_kinds() {
        assert!(ActionKind::Navigate.is_setup());
        assert!(ActionKind::SetStorageFlag.is_setup());
        assert!(ActionKind::Reload.is_setup());
        assert!(!ActionKind::Fill.is_setup());
        assert!(!ActionKind::Click.is_setup());
    }
}
