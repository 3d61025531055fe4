//! Point-in-time side snapshots.
//!
//! # Storage layout
//!
//! ```text
//! ~/.sidesync/
//!   snapshots/
//!     low.yaml   (one file per side)
//!     high.yaml
//! ```
//!
//! # API pattern
//!
//! Every function touching the filesystem has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.
//!
//! Writes use an atomic `.tmp` + rename pattern so a crashed exchange never
//! leaves a half-written snapshot behind.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{io_err, SnapshotError};
use crate::types::{CodeSubmission, Job, LogEntry, Project, Request, SideLabel, SideView};

// ---------------------------------------------------------------------------
// Snapshot payload
// ---------------------------------------------------------------------------

/// Everything one side exposes for a reconciliation pass, captured at a
/// single point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideSnapshot {
    pub side: SideLabel,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub requests: Vec<Request>,
    #[serde(default)]
    pub code_submissions: Vec<CodeSubmission>,
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl SideSnapshot {
    /// An empty snapshot for `side`, captured now.
    pub fn empty(side: SideLabel) -> Self {
        Self {
            side,
            captured_at: Utc::now(),
            projects: Vec::new(),
            requests: Vec::new(),
            code_submissions: Vec::new(),
            jobs: Vec::new(),
            logs: Vec::new(),
        }
    }

    /// SHA-256 hex digest of the canonical YAML body.
    ///
    /// Two snapshots with identical content produce the same fingerprint, so
    /// callers can skip a reconciliation pass when neither side changed since
    /// the last exchange.
    pub fn fingerprint(&self) -> Result<String, SnapshotError> {
        let yaml = serde_yaml::to_string(self)?;
        let mut hasher = Sha256::new();
        hasher.update(yaml.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

impl SideView for SideSnapshot {
    fn projects(&self) -> Vec<Project> {
        self.projects.clone()
    }

    fn requests(&self) -> Vec<Request> {
        self.requests.clone()
    }

    fn code_submissions(&self) -> Vec<CodeSubmission> {
        self.code_submissions.clone()
    }

    fn jobs(&self) -> Vec<Job> {
        self.jobs.clone()
    }

    fn logs(&self) -> Vec<LogEntry> {
        self.logs.clone()
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.sidesync/snapshots/<side>.yaml` — pure, no I/O.
pub fn snapshot_path_at(home: &Path, side: SideLabel) -> PathBuf {
    home.join(".sidesync")
        .join("snapshots")
        .join(format!("{side}.yaml"))
}

/// `snapshot_path_at` convenience wrapper (uses `dirs::home_dir()`).
pub fn snapshot_path(side: SideLabel) -> Result<PathBuf, SnapshotError> {
    Ok(snapshot_path_at(&home()?, side))
}

fn home() -> Result<PathBuf, SnapshotError> {
    dirs::home_dir().ok_or(SnapshotError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load the snapshot for `side` from `<home>/.sidesync/snapshots/`.
///
/// Returns `SnapshotError::SnapshotNotFound` if absent,
/// `SnapshotError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(home: &Path, side: SideLabel) -> Result<SideSnapshot, SnapshotError> {
    let path = snapshot_path_at(home, side);
    if !path.exists() {
        return Err(SnapshotError::SnapshotNotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let snapshot =
        serde_yaml::from_str(&contents).map_err(|e| SnapshotError::Parse { path, source: e })?;
    Ok(snapshot)
}

/// `load_at` convenience wrapper.
pub fn load(side: SideLabel) -> Result<SideSnapshot, SnapshotError> {
    load_at(&home()?, side)
}

/// Save the snapshot for its side atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save_at(home: &Path, snapshot: &SideSnapshot) -> Result<(), SnapshotError> {
    let path = snapshot_path_at(home, snapshot.side);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid snapshot path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let yaml = serde_yaml::to_string(snapshot)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, &yaml).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }

    tracing::info!("saved {} snapshot: {}", snapshot.side, path.display());
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(snapshot: &SideSnapshot) -> Result<(), SnapshotError> {
    save_at(&home()?, snapshot)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordId;
    use tempfile::TempDir;

    fn sample(side: SideLabel) -> SideSnapshot {
        let mut snapshot = SideSnapshot::empty(side);
        snapshot.logs.push(LogEntry {
            id: RecordId::from("log-1"),
            job_id: None,
            stdout: "ok\n".to_string(),
            stderr: String::new(),
            fetched_at: None,
        });
        snapshot
    }

    #[test]
    fn missing_snapshot_is_an_error() {
        let tmp = TempDir::new().expect("tempdir");
        let err = load_at(tmp.path(), SideLabel::Low).expect_err("missing");
        assert!(matches!(err, SnapshotError::SnapshotNotFound { .. }));
    }

    #[test]
    fn roundtrip_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let snapshot = sample(SideLabel::High);
        save_at(tmp.path(), &snapshot).expect("save");
        let loaded = load_at(tmp.path(), SideLabel::High).expect("load");
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn sides_do_not_collide() {
        let tmp = TempDir::new().expect("tempdir");
        save_at(tmp.path(), &sample(SideLabel::Low)).expect("save low");
        save_at(tmp.path(), &sample(SideLabel::High)).expect("save high");
        assert_eq!(load_at(tmp.path(), SideLabel::Low).expect("low").side, SideLabel::Low);
        assert_eq!(
            load_at(tmp.path(), SideLabel::High).expect("high").side,
            SideLabel::High
        );
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().expect("tempdir");
        save_at(tmp.path(), &sample(SideLabel::Low)).expect("save");
        let tmp_path = snapshot_path_at(tmp.path(), SideLabel::Low).with_extension("yaml.tmp");
        assert!(
            !tmp_path.exists(),
            "tmp file should be removed after atomic rename"
        );
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let tmp = TempDir::new().expect("tempdir");
        let path = snapshot_path_at(tmp.path(), SideLabel::Low);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, "side: low\ncaptured_at: [not a timestamp\n").expect("write");

        let err = load_at(tmp.path(), SideLabel::Low).expect_err("parse failure");
        match err {
            SnapshotError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn fingerprint_stable_and_content_sensitive() {
        let snapshot = sample(SideLabel::Low);
        let a = snapshot.fingerprint().expect("fingerprint");
        let b = snapshot.clone().fingerprint().expect("fingerprint");
        assert_eq!(a, b);

        let mut edited = snapshot;
        edited.logs[0].stdout.push_str("more\n");
        let c = edited.fingerprint().expect("fingerprint");
        assert_ne!(a, c);
    }
}
