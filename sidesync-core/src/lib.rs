//! Sidesync core library — domain records, side collaborator seam, snapshots.
//!
//! Public API surface:
//! - [`types`] — record structs, the closed [`Record`](types::Record) union,
//!   and the [`SideView`](types::SideView) trait
//! - [`error`] — [`SnapshotError`]
//! - [`snapshot`] — load / save / fingerprint of per-side snapshots

pub mod error;
pub mod snapshot;
pub mod types;

pub use error::SnapshotError;
pub use snapshot::SideSnapshot;
pub use types::{
    ApprovalDecision, CodeSubmission, HistoryEvent, Job, JobStatus, LogEntry, Project, Record,
    RecordCategory, RecordId, Request, RequestChange, SideLabel, SideView,
};
