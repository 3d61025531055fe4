//! Domain types for the two reconciled sides.
//!
//! Each record category gets its own struct; the closed [`Record`] union is
//! what the reconciliation engine dispatches over. Volatile per-side fields
//! (process ids, local paths, view timestamps) live on the structs but are
//! never part of a comparator allow-list.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed record identifier, stable across both sides.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which replica a snapshot or record copy came from.
///
/// Arbitrary labels, not a trust hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideLabel {
    Low,
    High,
}

impl fmt::Display for SideLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideLabel::Low => write!(f, "low"),
            SideLabel::High => write!(f, "high"),
        }
    }
}

/// The category of a reconcilable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordCategory {
    Project,
    Request,
    CodeSubmission,
    Job,
    Log,
}

impl RecordCategory {
    /// All categories in the fixed processing order used by the builder.
    pub fn all() -> &'static [RecordCategory] {
        &[
            RecordCategory::Project,
            RecordCategory::Request,
            RecordCategory::CodeSubmission,
            RecordCategory::Job,
            RecordCategory::Log,
        ]
    }
}

impl fmt::Display for RecordCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordCategory::Project => write!(f, "project"),
            RecordCategory::Request => write!(f, "request"),
            RecordCategory::CodeSubmission => write!(f, "code_submission"),
            RecordCategory::Job => write!(f, "job"),
            RecordCategory::Log => write!(f, "log"),
        }
    }
}

/// Effective review decision for a code submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    #[default]
    Pending,
    Approved,
    Denied,
}

/// Execution status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Created,
    Processing,
    Completed,
    Errored,
    Interrupted,
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A research project grouping requests and submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: RecordId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Requests attached to this project, in attachment order.
    #[serde(default)]
    pub request_ids: Vec<RecordId>,
    /// Per-side UI state; legitimately diverges and is never compared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_viewed_at: Option<DateTime<Utc>>,
}

/// One proposed change within a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestChange {
    pub target_id: RecordId,
    pub summary: String,
}

/// One audit entry in a request's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub at: DateTime<Utc>,
    pub note: String,
}

/// A review request raised by a researcher on the low side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RecordId,
    pub requester_name: String,
    pub requester_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_institution: Option<String>,
    pub requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub request_hash: String,
    #[serde(default)]
    pub changes: Vec<RequestChange>,
    #[serde(default)]
    pub history: Vec<HistoryEvent>,
}

/// Code submitted for review and cross-side execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSubmission {
    pub id: RecordId,
    pub raw_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed_code: Option<String>,
    pub entry_point: String,
    pub code_hash: String,
    pub signature: String,
    #[serde(default)]
    pub input_kwargs: Vec<String>,
    #[serde(default)]
    pub policy_kwargs: BTreeMap<String, String>,
    /// Child submissions keyed by call-site name.
    #[serde(default)]
    pub nested_submissions: BTreeMap<String, RecordId>,
    /// Review decisions keyed by reviewing enclave. Holds a single entry in
    /// practice; comparators unwrap the sole effective decision.
    #[serde(default)]
    pub approvals: BTreeMap<String, ApprovalDecision>,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_pool: Option<String>,
    /// Where this side cached the source on disk; never compared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

/// An execution job spawned from a code submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: RecordId,
    pub status: JobStatus,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_job_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_iters: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_iter: Option<u64>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Worker process id on the executing side; never compared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_pid: Option<u32>,
}

/// Captured output of a job run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<RecordId>,
    pub stdout: String,
    pub stderr: String,
    /// When this side last pulled the log from its worker; never compared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Record union
// ---------------------------------------------------------------------------

/// A record of any supported category.
///
/// Closed union: adding a category is a compile-time decision, and every
/// consumer that matches on `Record` is forced to handle it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Record {
    Project(Project),
    Request(Request),
    CodeSubmission(CodeSubmission),
    Job(Job),
    Log(LogEntry),
}

impl Record {
    /// Stable identity of the wrapped record.
    pub fn id(&self) -> &RecordId {
        match self {
            Record::Project(p) => &p.id,
            Record::Request(r) => &r.id,
            Record::CodeSubmission(c) => &c.id,
            Record::Job(j) => &j.id,
            Record::Log(l) => &l.id,
        }
    }

    /// Category tag of the wrapped record.
    pub fn category(&self) -> RecordCategory {
        match self {
            Record::Project(_) => RecordCategory::Project,
            Record::Request(_) => RecordCategory::Request,
            Record::CodeSubmission(_) => RecordCategory::CodeSubmission,
            Record::Job(_) => RecordCategory::Job,
            Record::Log(_) => RecordCategory::Log,
        }
    }
}

// ---------------------------------------------------------------------------
// Side collaborator seam
// ---------------------------------------------------------------------------

/// Read access to one side's record collections.
///
/// Implementations are expected to have finished any fetching before the
/// engine starts a pass (fetch-then-compute); the engine never mutates
/// returned records.
pub trait SideView {
    fn projects(&self) -> Vec<Project>;
    fn requests(&self) -> Vec<Request>;
    fn code_submissions(&self) -> Vec<CodeSubmission>;
    fn jobs(&self) -> Vec<Job>;
    fn logs(&self) -> Vec<LogEntry>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
