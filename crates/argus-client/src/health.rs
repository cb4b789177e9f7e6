use std::time::Duration;

use argus_core::error::AppError;
use argus_core::evaluator::poll_until;
use argus_core::policy::PollPolicy;
use reqwest::Client;
use url::Url;

/// Wait until the application under test answers HTTP at `base_url`.
///
/// Any response counts, whatever its status: the server is up. Failing to
/// get one before the policy's deadline is an environment problem, reported
/// as [`AppError::PreconditionError`].
pub async fn wait_for_server(base_url: &Url, policy: &PollPolicy) -> Result<(), AppError> {
    let client = Client::builder()
        .user_agent("Argus/0.1 (UI verification)")
        .timeout(policy.interval().max(Duration::from_millis(500)))
        .build()
        .map_err(|e| AppError::TransportError(e.to_string()))?;

    let probe = || async {
        match client.get(base_url.clone()).send().await {
            Ok(response) => Some(response.status().as_u16()),
            Err(e) => {
                tracing::debug!(url = %base_url, error = %e, "Server not reachable yet");
                None
            }
        }
    };

    let description = format!("server at {base_url} to respond");
    let ready = poll_until(&description, policy, probe, Option::is_some)
        .await
        .map_err(|e| AppError::PreconditionError(e.to_string()))?;

    tracing::info!(
        url = %base_url,
        status = ready.observed.unwrap_or_default(),
        attempts = ready.attempts,
        "Server is up"
    );
    Ok(())
}
