use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AppError;
use crate::scenario::ScenarioResult;

/// Compute a SHA-256 hash of some bytes, returned as 64-char hex.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// A file written as evidence during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub path: PathBuf,
    /// SHA-256 of the file content
    pub sha256: String,
    pub bytes: u64,
}

/// Summary of one scenario run, written next to its artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub scenario: String,
    pub description: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub result: ScenarioResult,
    pub artifacts: Vec<Artifact>,
}

impl RunReport {
    pub fn file_name(&self) -> String {
        format!("{}-report", self.scenario)
    }
}

/// Maps artifact names to files under one directory.
#[derive(Debug, Clone)]
pub struct EvidenceStore {
    dir: PathBuf,
}

impl EvidenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn screenshot_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.png", sanitize(name)))
    }

    pub fn json_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(name)))
    }

    /// Hash a file that has already been written and describe it.
    pub fn record(&self, name: &str, path: &Path) -> Result<Artifact, AppError> {
        let content = std::fs::read(path)?;
        Ok(Artifact {
            name: name.to_string(),
            path: path.to_path_buf(),
            sha256: compute_hash(&content),
            bytes: content.len() as u64,
        })
    }

    /// Write `value` as pretty JSON to `<name>.json` and record it.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<Artifact, AppError> {
        let path = self.json_path(name);
        let json = serde_json::to_vec_pretty(value)?;
        std::fs::write(&path, &json)?;
        self.record(name, &path)
    }
}

/// Keep artifact names safe as file names.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_hash_consistency() {
        let h1 = compute_hash(b"hello world");
        let h2 = compute_hash(b"hello world");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert_ne!(h1, compute_hash(b"hello"));
    }

    #[test]
    fn test_paths_are_sanitized() {
        let store = EvidenceStore::new("verification");
        assert_eq!(
            store.screenshot_path("1_with_text"),
            PathBuf::from("verification/1_with_text.png")
        );
        assert_eq!(
            store.json_path("zen mode/active"),
            PathBuf::from("verification/zen_mode_active.json")
        );
    }

    #[test]
    fn test_write_json_records_digest() {
        let dir = tempfile::tempdir().unwrap();
        let store = EvidenceStore::new(dir.path().join("nested"));
        store.ensure_dir().unwrap();

        let artifact = store
            .write_json("diag", &serde_json::json!({"ok": true}))
            .unwrap();
        let written = std::fs::read(&artifact.path).unwrap();
        assert_eq!(artifact.sha256, compute_hash(&written));
        assert_eq!(artifact.bytes, written.len() as u64);
        assert_eq!(artifact.name, "diag");
    }
}
