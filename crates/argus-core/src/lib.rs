pub mod audit;
pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod evaluator;
pub mod evidence;
pub mod expectation;
pub mod facade;
pub mod policy;
pub mod runner;
pub mod scenario;
pub mod traits;

#[doc(hidden)]
pub mod testutil;

pub use config::ArgusConfig;
pub use descriptor::{ElementDescriptor, ElementSnapshot};
pub use error::{ActionError, ActionKind, AppError, TimeoutError};
pub use evaluator::{Satisfied, poll_until, satisfy};
pub use evidence::{Artifact, EvidenceStore, RunReport, compute_hash};
pub use expectation::{Condition, Expectation, Observation};
pub use facade::{ElementHandle, Ui};
pub use policy::PollPolicy;
pub use runner::{RunEvent, RunReporter, ScenarioRunner, TracingRunReporter, run_isolated};
pub use scenario::{Action, FailureReport, Scenario, ScenarioResult, ScenarioStep};
pub use traits::{Page, Session};
