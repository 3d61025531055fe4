//! Per-category record comparators.
//!
//! Each comparator walks a fixed allow-list of comparable fields in
//! declaration order, so difference output is deterministic. Fields that are
//! per-side operational state (`worker_pid`, `local_path`, `last_viewed_at`,
//! `fetched_at`) are not in any allow-list — they legitimately diverge
//! between replicas and must not be reported as drift.
//!
//! Every comparator's precondition is that both copies carry the same
//! identity; a violation means the caller paired unrelated records and fails
//! the pass.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use sidesync_core::types::{
    ApprovalDecision, CodeSubmission, Job, LogEntry, Project, Record, RecordCategory, RecordId,
    Request,
};

use crate::classify::FieldDifference;
use crate::error::ReconcileError;
use crate::primitives::{diff_keyed, diff_sequence};

// ---------------------------------------------------------------------------
// Field allow-lists
// ---------------------------------------------------------------------------

/// Comparable `Project` fields, in output order.
pub const PROJECT_FIELDS: &[&str] = &[
    "name",
    "description",
    "created_at",
    "updated_at",
    "request_ids",
];

/// Comparable `Request` fields, in output order.
pub const REQUEST_FIELDS: &[&str] = &[
    "requester_name",
    "requester_email",
    "requester_institution",
    "requested_at",
    "updated_at",
    "request_hash",
    "changes",
    "history",
];

/// Comparable `CodeSubmission` fields, in output order.
///
/// `status` is the unwrapped effective approval decision, not the raw
/// `approvals` map.
pub const CODE_SUBMISSION_FIELDS: &[&str] = &[
    "raw_code",
    "parsed_code",
    "entry_point",
    "code_hash",
    "signature",
    "input_kwargs",
    "submitted_at",
    "worker_pool",
    "policy_kwargs",
    "nested_submissions",
    "status",
];

/// Comparable `Job` fields, in output order.
pub const JOB_FIELDS: &[&str] = &[
    "status",
    "resolved",
    "result_id",
    "log_id",
    "parent_job_id",
    "submission_id",
    "n_iters",
    "current_iter",
    "created_at",
    "updated_at",
];

/// Comparable `LogEntry` fields, in output order.
pub const LOG_FIELDS: &[&str] = &["stdout", "stderr", "job_id"];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn capture<T: Serialize>(value: &T) -> Result<Value, ReconcileError> {
    Ok(serde_json::to_value(value)?)
}

fn ensure_same_identity(
    category: RecordCategory,
    low: &RecordId,
    high: &RecordId,
) -> Result<(), ReconcileError> {
    if low != high {
        return Err(ReconcileError::IdentityMismatch {
            category,
            low_id: low.clone(),
            high_id: high.clone(),
        });
    }
    Ok(())
}

fn scalar_field<T: Serialize + PartialEq>(
    diffs: &mut Vec<FieldDifference>,
    field: &'static str,
    low: &T,
    high: &T,
) -> Result<(), ReconcileError> {
    if low != high {
        diffs.push(FieldDifference::Scalar {
            field,
            low: capture(low)?,
            high: capture(high)?,
        });
    }
    Ok(())
}

fn sequence_field<T: Serialize + PartialEq>(
    diffs: &mut Vec<FieldDifference>,
    field: &'static str,
    low: &[T],
    high: &[T],
) -> Result<(), ReconcileError> {
    let outcome = diff_sequence(low, high);
    if !outcome.is_empty() {
        diffs.push(FieldDifference::Sequence {
            field,
            low: capture(&low)?,
            high: capture(&high)?,
            changed_indices: outcome.changed_indices,
            low_only_indices: outcome.low_only_indices,
            high_only_indices: outcome.high_only_indices,
        });
    }
    Ok(())
}

fn keyed_field<V: Serialize + PartialEq>(
    diffs: &mut Vec<FieldDifference>,
    field: &'static str,
    low: &BTreeMap<String, V>,
    high: &BTreeMap<String, V>,
) -> Result<(), ReconcileError> {
    let outcome = diff_keyed(low, high);
    if !outcome.is_empty() {
        diffs.push(FieldDifference::Keyed {
            field,
            low: capture(low)?,
            high: capture(high)?,
            changed_keys: outcome.changed,
            low_only_keys: outcome.low_only,
            high_only_keys: outcome.high_only,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Comparators
// ---------------------------------------------------------------------------

/// Compare two copies of the same project.
pub fn compare_projects(
    low: &Project,
    high: &Project,
) -> Result<Vec<FieldDifference>, ReconcileError> {
    ensure_same_identity(RecordCategory::Project, &low.id, &high.id)?;

    let mut diffs = Vec::new();
    scalar_field(&mut diffs, "name", &low.name, &high.name)?;
    scalar_field(&mut diffs, "description", &low.description, &high.description)?;
    scalar_field(&mut diffs, "created_at", &low.created_at, &high.created_at)?;
    scalar_field(&mut diffs, "updated_at", &low.updated_at, &high.updated_at)?;
    sequence_field(&mut diffs, "request_ids", &low.request_ids, &high.request_ids)?;
    Ok(diffs)
}

/// Compare two copies of the same request.
pub fn compare_requests(
    low: &Request,
    high: &Request,
) -> Result<Vec<FieldDifference>, ReconcileError> {
    ensure_same_identity(RecordCategory::Request, &low.id, &high.id)?;

    let mut diffs = Vec::new();
    scalar_field(&mut diffs, "requester_name", &low.requester_name, &high.requester_name)?;
    scalar_field(
        &mut diffs,
        "requester_email",
        &low.requester_email,
        &high.requester_email,
    )?;
    scalar_field(
        &mut diffs,
        "requester_institution",
        &low.requester_institution,
        &high.requester_institution,
    )?;
    scalar_field(&mut diffs, "requested_at", &low.requested_at, &high.requested_at)?;
    scalar_field(&mut diffs, "updated_at", &low.updated_at, &high.updated_at)?;
    scalar_field(&mut diffs, "request_hash", &low.request_hash, &high.request_hash)?;
    sequence_field(&mut diffs, "changes", &low.changes, &high.changes)?;
    sequence_field(&mut diffs, "history", &low.history, &high.history)?;
    Ok(diffs)
}

/// Effective review decision: the sole value of the approvals map.
fn effective_approval(submission: &CodeSubmission) -> Option<ApprovalDecision> {
    submission.approvals.values().next().copied()
}

/// Compare two copies of the same code submission.
///
/// The `approvals` map is unwrapped to its single effective decision before
/// comparison; which enclave recorded the decision is not drift.
pub fn compare_code_submissions(
    low: &CodeSubmission,
    high: &CodeSubmission,
) -> Result<Vec<FieldDifference>, ReconcileError> {
    ensure_same_identity(RecordCategory::CodeSubmission, &low.id, &high.id)?;

    let mut diffs = Vec::new();
    scalar_field(&mut diffs, "raw_code", &low.raw_code, &high.raw_code)?;
    scalar_field(&mut diffs, "parsed_code", &low.parsed_code, &high.parsed_code)?;
    scalar_field(&mut diffs, "entry_point", &low.entry_point, &high.entry_point)?;
    scalar_field(&mut diffs, "code_hash", &low.code_hash, &high.code_hash)?;
    scalar_field(&mut diffs, "signature", &low.signature, &high.signature)?;
    scalar_field(&mut diffs, "input_kwargs", &low.input_kwargs, &high.input_kwargs)?;
    scalar_field(&mut diffs, "submitted_at", &low.submitted_at, &high.submitted_at)?;
    scalar_field(&mut diffs, "worker_pool", &low.worker_pool, &high.worker_pool)?;
    keyed_field(&mut diffs, "policy_kwargs", &low.policy_kwargs, &high.policy_kwargs)?;
    keyed_field(
        &mut diffs,
        "nested_submissions",
        &low.nested_submissions,
        &high.nested_submissions,
    )?;
    scalar_field(
        &mut diffs,
        "status",
        &effective_approval(low),
        &effective_approval(high),
    )?;
    Ok(diffs)
}

/// Compare two copies of the same job.
pub fn compare_jobs(low: &Job, high: &Job) -> Result<Vec<FieldDifference>, ReconcileError> {
    ensure_same_identity(RecordCategory::Job, &low.id, &high.id)?;

    let mut diffs = Vec::new();
    scalar_field(&mut diffs, "status", &low.status, &high.status)?;
    scalar_field(&mut diffs, "resolved", &low.resolved, &high.resolved)?;
    scalar_field(&mut diffs, "result_id", &low.result_id, &high.result_id)?;
    scalar_field(&mut diffs, "log_id", &low.log_id, &high.log_id)?;
    scalar_field(&mut diffs, "parent_job_id", &low.parent_job_id, &high.parent_job_id)?;
    scalar_field(&mut diffs, "submission_id", &low.submission_id, &high.submission_id)?;
    scalar_field(&mut diffs, "n_iters", &low.n_iters, &high.n_iters)?;
    scalar_field(&mut diffs, "current_iter", &low.current_iter, &high.current_iter)?;
    scalar_field(&mut diffs, "created_at", &low.created_at, &high.created_at)?;
    scalar_field(&mut diffs, "updated_at", &low.updated_at, &high.updated_at)?;
    Ok(diffs)
}

/// Compare two copies of the same log entry.
pub fn compare_logs(
    low: &LogEntry,
    high: &LogEntry,
) -> Result<Vec<FieldDifference>, ReconcileError> {
    ensure_same_identity(RecordCategory::Log, &low.id, &high.id)?;

    let mut diffs = Vec::new();
    scalar_field(&mut diffs, "stdout", &low.stdout, &high.stdout)?;
    scalar_field(&mut diffs, "stderr", &low.stderr, &high.stderr)?;
    scalar_field(&mut diffs, "job_id", &low.job_id, &high.job_id)?;
    Ok(diffs)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Dispatch to the category's comparator.
///
/// The match is exhaustive over the closed [`Record`] union, so a category
/// without a comparator cannot exist; pairing two different categories is
/// a caller bug surfaced as [`ReconcileError::CategoryMismatch`].
pub fn compare_records(low: &Record, high: &Record) -> Result<Vec<FieldDifference>, ReconcileError> {
    match (low, high) {
        (Record::Project(l), Record::Project(h)) => compare_projects(l, h),
        (Record::Request(l), Record::Request(h)) => compare_requests(l, h),
        (Record::CodeSubmission(l), Record::CodeSubmission(h)) => compare_code_submissions(l, h),
        (Record::Job(l), Record::Job(h)) => compare_jobs(l, h),
        (Record::Log(l), Record::Log(h)) => compare_logs(l, h),
        (l, h) => Err(ReconcileError::CategoryMismatch {
            low: l.category(),
            high: h.category(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
