//! Static checks that a UI source file carries expected accessibility markup.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::AppError;

/// One literal snippet a source file must contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub snippet: String,
    /// What the snippet proves, e.g. "aria-label on Reset button".
    pub purpose: String,
}

impl Marker {
    pub fn new(snippet: impl Into<String>, purpose: impl Into<String>) -> Self {
        Self {
            snippet: snippet.into(),
            purpose: purpose.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkerResult {
    #[serde(flatten)]
    pub marker: Marker,
    pub found: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub path: PathBuf,
    pub results: Vec<MarkerResult>,
}

impl AuditReport {
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.found)
    }

    pub fn missing(&self) -> impl Iterator<Item = &Marker> {
        self.results.iter().filter(|r| !r.found).map(|r| &r.marker)
    }
}

#[derive(Debug, Clone)]
pub struct SourceAudit {
    pub path: PathBuf,
    pub markers: Vec<Marker>,
}

impl SourceAudit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            markers: Vec::new(),
        }
    }

    pub fn marker(mut self, snippet: &str, purpose: &str) -> Self {
        self.markers.push(Marker::new(snippet, purpose));
        self
    }

    /// Accessibility markup of the reader's playback control panel.
    pub fn control_panel_accessibility(path: impl Into<PathBuf>) -> Self {
        Self::new(path)
            .marker(r#"aria-label="Reset to Start""#, "aria-label on Reset button")
            .marker(
                r#"aria-label={isPlaying ? "Pause" : "Play"}"#,
                "aria-label on Play/Pause button",
            )
            .marker(
                r#"aria-label="Decrease speed""#,
                "aria-label on Decrease speed button",
            )
            .marker(r#"aria-label="Words per minute""#, "aria-label on WPM input")
            .marker(r#"id="bg-color""#, "id on background color input")
            .marker(r#"htmlFor="bg-color""#, "htmlFor on background color label")
    }

    pub fn run(&self) -> Result<AuditReport, AppError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            AppError::PreconditionError(format!("Cannot read {}: {e}", self.path.display()))
        })?;
        Ok(self.check(&self.path, &content))
    }

    /// Check `content` as if it had been read from `path`.
    pub fn check(&self, path: &Path, content: &str) -> AuditReport {
        let results = self
            .markers
            .iter()
            .map(|marker| {
                let found = content.contains(&marker.snippet);
                if found {
                    tracing::info!(purpose = %marker.purpose, "Marker found");
                } else {
                    tracing::error!(purpose = %marker.purpose, snippet = %marker.snippet, "Marker missing");
                }
                MarkerResult {
                    marker: marker.clone(),
                    found,
                }
            })
            .collect();
        AuditReport {
            path: path.to_path_buf(),
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANEL: &str = r#"
        <button onClick={reset} aria-label="Reset to Start"><RotateCcw /></button>
        <button onClick={toggle} aria-label={isPlaying ? "Pause" : "Play"}>{icon}</button>
        <button aria-label="Decrease speed">-</button>
        <input type="number" aria-label="Words per minute" value={wpm} />
        <label htmlFor="bg-color">Background</label>
        <input id="bg-color" type="color" />
    "#;

    #[test]
    fn test_complete_panel_passes() {
        let audit = SourceAudit::control_panel_accessibility("ControlPanel.tsx");
        let report = audit.check(Path::new("ControlPanel.tsx"), PANEL);
        assert!(report.passed());
        assert_eq!(report.results.len(), 6);
    }

    #[test]
    fn test_missing_marker_fails() {
        let audit = SourceAudit::control_panel_accessibility("ControlPanel.tsx");
        let content = PANEL.replace(r#"aria-label="Decrease speed""#, "");
        let report = audit.check(Path::new("ControlPanel.tsx"), &content);
        assert!(!report.passed());
        let missing: Vec<_> = report.missing().map(|m| m.purpose.as_str()).collect();
        assert_eq!(missing, vec!["aria-label on Decrease speed button"]);
    }

    #[test]
    fn test_unreadable_file_is_precondition_error() {
        let audit = SourceAudit::control_panel_accessibility("/nonexistent/ControlPanel.tsx");
        assert!(matches!(audit.run(), Err(AppError::PreconditionError(_))));
    }
}
