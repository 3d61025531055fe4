//! Full-pass reconciliation over file-backed side snapshots.
//!
//! Exercises the snapshot save/load boundary and the engine together, the
//! way a periodic exchange would: capture both sides, persist, reload,
//! reconcile, inspect.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use sidesync_core::snapshot::{self, SideSnapshot};
use sidesync_core::types::{
    ApprovalDecision, CodeSubmission, HistoryEvent, Job, JobStatus, LogEntry, Project,
    RecordCategory, Request, RequestChange, SideLabel,
};
use sidesync_engine::{build_state, MergeState};

fn low_side() -> SideSnapshot {
    let mut snapshot = SideSnapshot::empty(SideLabel::Low);
    snapshot.projects.push(Project {
        id: "P1".into(),
        name: "fraud-study".to_string(),
        description: Some("cross-bank fraud model".to_string()),
        created_at: Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
        updated_at: None,
        request_ids: vec!["R1".into()],
        last_viewed_at: None,
    });
    snapshot.requests.push(Request {
        id: "R1".into(),
        requester_name: "Ada".to_string(),
        requester_email: "ada@example.org".to_string(),
        requester_institution: Some("Example Labs".to_string()),
        requested_at: Utc.with_ymd_and_hms(2024, 1, 11, 9, 0, 0).unwrap(),
        updated_at: None,
        request_hash: "r1hash".to_string(),
        changes: vec![RequestChange {
            target_id: "C1".into(),
            summary: "approve submission".to_string(),
        }],
        history: vec![],
    });
    snapshot.code_submissions.push(CodeSubmission {
        id: "C1".into(),
        raw_code: "def main(df): return df.sum()".to_string(),
        parsed_code: None,
        entry_point: "main".to_string(),
        code_hash: "c1hash".to_string(),
        signature: "main(df)".to_string(),
        input_kwargs: vec!["df".to_string()],
        policy_kwargs: BTreeMap::new(),
        nested_submissions: BTreeMap::new(),
        approvals: BTreeMap::from([("enclave".to_string(), ApprovalDecision::Pending)]),
        submitted_at: Utc.with_ymd_and_hms(2024, 1, 11, 9, 5, 0).unwrap(),
        worker_pool: None,
        local_path: None,
    });
    snapshot.jobs.push(Job {
        id: "J1".into(),
        status: JobStatus::Processing,
        resolved: false,
        result_id: None,
        log_id: Some("L1".into()),
        parent_job_id: None,
        submission_id: Some("C1".into()),
        n_iters: Some(5),
        current_iter: Some(1),
        created_at: Utc.with_ymd_and_hms(2024, 1, 12, 8, 0, 0).unwrap(),
        updated_at: None,
        worker_pid: Some(311),
    });
    snapshot.logs.push(LogEntry {
        id: "L1".into(),
        job_id: Some("J1".into()),
        stdout: "iteration 1\n".to_string(),
        stderr: String::new(),
        fetched_at: None,
    });
    snapshot
}

fn high_side() -> SideSnapshot {
    let mut snapshot = low_side();
    snapshot.side = SideLabel::High;

    // Request gained a history entry on the high side.
    snapshot.requests[0].history.push(HistoryEvent {
        at: Utc.with_ymd_and_hms(2024, 1, 12, 10, 0, 0).unwrap(),
        note: "reviewed by data owner".to_string(),
    });

    // Submission was approved.
    snapshot.code_submissions[0].approvals =
        BTreeMap::from([("enclave".to_string(), ApprovalDecision::Approved)]);

    // J1 finished there and spawned J2; its log grew. Worker pids differ per
    // side, which must not register as drift.
    snapshot.jobs[0].status = JobStatus::Completed;
    snapshot.jobs[0].resolved = true;
    snapshot.jobs[0].current_iter = Some(5);
    snapshot.jobs[0].worker_pid = Some(8080);
    snapshot.jobs.push(Job {
        id: "J2".into(),
        status: JobStatus::Processing,
        resolved: false,
        result_id: None,
        log_id: None,
        parent_job_id: Some("J1".into()),
        submission_id: Some("C1".into()),
        n_iters: None,
        current_iter: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 12, 11, 0, 0).unwrap(),
        updated_at: None,
        worker_pid: Some(8081),
    });
    snapshot.logs[0].stdout = "iteration 1\niteration 5\n".to_string();
    snapshot
}

#[test]
fn full_pass_over_persisted_snapshots() {
    let home = TempDir::new().expect("home");
    snapshot::save_at(home.path(), &low_side()).expect("save low");
    snapshot::save_at(home.path(), &high_side()).expect("save high");

    let low = snapshot::load_at(home.path(), SideLabel::Low).expect("load low");
    let high = snapshot::load_at(home.path(), SideLabel::High).expect("load high");

    let state = build_state(&low, &high).expect("build");
    // P1, R1, C1, J1, J2, L1
    assert_eq!(state.len(), 6);

    let summary = state.summary();
    assert_eq!(summary.category(RecordCategory::Project).same, 1);
    assert_eq!(summary.category(RecordCategory::Request).diff, 1);
    assert_eq!(summary.category(RecordCategory::CodeSubmission).diff, 1);
    assert_eq!(summary.category(RecordCategory::Job).diff, 1);
    assert_eq!(summary.category(RecordCategory::Job).new, 1);
    assert_eq!(summary.category(RecordCategory::Log).diff, 1);
    assert_eq!(summary.overall().total(), 6);

    // Only the high-only job is a propagation candidate.
    let to_sync = state.records_to_sync();
    assert_eq!(to_sync.len(), 1);
    assert_eq!(to_sync[0].id(), &"J2".into());

    // The altered job reports exactly its changed allow-listed fields.
    let j1 = state.iter().find(|d| d.id() == &"J1".into()).expect("J1");
    assert_eq!(j1.merge_state, MergeState::Diff);
    let fields: Vec<&str> = j1.differences.iter().map(|d| d.field_name()).collect();
    assert_eq!(fields, vec!["status", "resolved", "current_iter"]);
}

#[test]
fn fingerprints_tell_unchanged_snapshots_apart() {
    let low = low_side();
    let high = high_side();
    let low_fp = low.fingerprint().expect("fingerprint");
    assert_eq!(low_fp, low.clone().fingerprint().expect("fingerprint"));
    assert_ne!(low_fp, high.fingerprint().expect("fingerprint"));
}

#[test]
fn identical_sides_reconcile_to_all_same() {
    let mut high = low_side();
    high.side = SideLabel::High;
    let state = build_state(&low_side(), &high).expect("build");

    assert_eq!(state.len(), 5);
    assert!(state.iter().all(|d| d.merge_state == MergeState::Same));
    assert!(state.records_to_sync().is_empty());
    assert!(state.one_sided().is_empty());
}
