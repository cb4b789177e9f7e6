//! Bounded polling of expectation predicates.
//!
//! The first attempt happens immediately. Later attempts follow at the
//! policy's interval, and one final attempt is made right at the deadline.
//! Each attempt may run for at most the time left plus one interval; an
//! attempt still pending after that counts as "not yet". A timeout therefore
//! overshoots the deadline by at most one interval, however slow the
//! transport is. Between attempts the task sleeps on the tokio timer; it
//! never spins.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::error::TimeoutError;
use crate::expectation::{Expectation, Observation};
use crate::facade::Ui;
use crate::policy::PollPolicy;
use crate::traits::Page;

/// The observation that satisfied a predicate, with timing.
#[derive(Debug, Clone)]
pub struct Satisfied<T> {
    pub observed: T,
    /// 1-based index of the attempt that succeeded.
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Re-run `probe` until `check` accepts its result or the policy's deadline passes.
///
/// A false check mid-poll is expected and never an error; only the
/// cumulative deadline is. On timeout the last probed value is serialized
/// into the error for diagnostics.
pub async fn poll_until<T, F, Fut, C>(
    description: &str,
    policy: &PollPolicy,
    mut probe: F,
    check: C,
) -> Result<Satisfied<T>, TimeoutError>
where
    T: Serialize,
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
    C: Fn(&T) -> bool,
{
    let start = Instant::now();
    let deadline = start + policy.timeout();
    let mut attempts = 0u32;
    let mut last: Option<T> = None;

    loop {
        attempts += 1;
        let budget = deadline.saturating_duration_since(Instant::now()) + policy.interval();

        match tokio::time::timeout(budget, probe()).await {
            Ok(observed) if check(&observed) => {
                return Ok(Satisfied {
                    observed,
                    attempts,
                    elapsed: start.elapsed(),
                });
            }
            Ok(observed) => last = Some(observed),
            Err(_) => {
                tracing::debug!(%description, attempts, "Poll attempt stalled, abandoned");
            }
        }

        let now = Instant::now();
        if now >= deadline {
            let elapsed = now - start;
            tracing::debug!(
                %description,
                attempts,
                elapsed_ms = %elapsed.as_millis(),
                "Expectation timed out"
            );
            return Err(TimeoutError {
                description: description.to_string(),
                elapsed,
                attempts,
                last_observed: serde_json::to_value(&last).unwrap_or(serde_json::Value::Null),
            });
        }

        tokio::time::sleep(policy.interval().min(deadline - now)).await;
    }
}

/// Wait until `expectation` holds on the page behind `ui`.
pub async fn satisfy<P: Page>(
    ui: &Ui<P>,
    expectation: &Expectation,
    policy: &PollPolicy,
) -> Result<Satisfied<Observation>, TimeoutError> {
    let condition = &expectation.condition;
    poll_until(
        &expectation.describe(),
        policy,
        || ui.observe(condition),
        |observed| condition.holds(observed),
    )
    .await
}
