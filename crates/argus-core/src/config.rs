use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::error::AppError;
use crate::policy::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS, PollPolicy};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5173";
pub const DEFAULT_INPUT_SELECTOR: &str = "#input-text";
pub const DEFAULT_ARTIFACTS_DIR: &str = "verification";

/// Browser window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl FromStr for Viewport {
    type Err = AppError;

    /// Parse `WIDTHxHEIGHT`, e.g. `1280x720`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::ConfigError(format!("Invalid viewport '{s}': expected WIDTHxHEIGHT"));
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Where the application under test lives and how runs are paced.
#[derive(Debug, Clone)]
pub struct ArgusConfig {
    pub base_url: Url,
    /// Selector of the main text input surface.
    pub input_selector: String,
    pub artifacts_dir: PathBuf,
    pub policy: PollPolicy,
    pub viewport: Viewport,
}

impl ArgusConfig {
    /// Read configuration from environment variables.
    ///
    /// - `ARGUS_BASE_URL` (defaults to `http://localhost:5173`)
    /// - `ARGUS_INPUT_SELECTOR` (defaults to `#input-text`)
    /// - `ARGUS_ARTIFACTS_DIR` (defaults to `verification`)
    /// - `ARGUS_POLL_INTERVAL_MS` / `ARGUS_TIMEOUT_MS` (default 100 / 5000)
    /// - `ARGUS_VIEWPORT` (defaults to `1280x720`)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let base_url = lookup("ARGUS_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid ARGUS_BASE_URL '{base_url}': {e}")))?;

        let input_selector = lookup("ARGUS_INPUT_SELECTOR")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_INPUT_SELECTOR.to_string());

        let artifacts_dir = lookup("ARGUS_ARTIFACTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR));

        let interval_ms = parse_ms(&lookup, "ARGUS_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?;
        let timeout_ms = parse_ms(&lookup, "ARGUS_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?;
        let policy = PollPolicy::new(interval_ms, timeout_ms)
            .map_err(|e| AppError::ConfigError(e.to_string()))?;

        let viewport = match lookup("ARGUS_VIEWPORT") {
            Some(raw) => raw.parse()?,
            None => Viewport::default(),
        };

        Ok(Self {
            base_url,
            input_selector,
            artifacts_dir,
            policy,
            viewport,
        })
    }
}

fn parse_ms(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, AppError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            AppError::ConfigError(format!(
                "Invalid {key} '{raw}': must be a non-negative integer of milliseconds"
            ))
        }),
    }
}
