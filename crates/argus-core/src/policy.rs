use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Default cadence between polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default deadline for one expectation.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Retry cadence and deadline for one expectation.
///
/// Invariant: `interval_ms > 0` and `timeout_ms >= interval_ms`. Construction
/// and deserialization both enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPollPolicy")]
pub struct PollPolicy {
    interval_ms: u64,
    timeout_ms: u64,
}

#[derive(Deserialize)]
struct RawPollPolicy {
    interval_ms: u64,
    timeout_ms: u64,
}

impl TryFrom<RawPollPolicy> for PollPolicy {
    type Error = AppError;

    fn try_from(raw: RawPollPolicy) -> Result<Self, Self::Error> {
        PollPolicy::new(raw.interval_ms, raw.timeout_ms)
    }
}

impl PollPolicy {
    pub fn new(interval_ms: u64, timeout_ms: u64) -> Result<Self, AppError> {
        if interval_ms == 0 {
            return Err(AppError::PolicyError(
                "interval must be greater than zero".into(),
            ));
        }
        if timeout_ms < interval_ms {
            return Err(AppError::PolicyError(format!(
                "timeout ({timeout_ms} ms) must be at least the interval ({interval_ms} ms)"
            )));
        }
        Ok(Self {
            interval_ms,
            timeout_ms,
        })
    }

    /// Keep the interval, change the deadline.
    pub fn with_timeout_ms(self, timeout_ms: u64) -> Result<Self, AppError> {
        Self::new(self.interval_ms, timeout_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }
}

impl Default for PollPolicy {
    /// 100 ms polls, 5 s deadline.
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}
