//! # sidesync-engine
//!
//! Reconciliation engine for two independently-administered replicas of a
//! shared workflow state.
//!
//! Call [`build_state`] with a low-side and a high-side [`SideView`] to
//! classify every record that exists on either side as new, unchanged, or
//! altered, and get back a [`ReconciliationState`] of structured diffs.
//!
//! [`SideView`]: sidesync_core::types::SideView

pub mod builder;
pub mod classify;
pub mod compare;
pub mod error;
pub mod primitives;
pub mod state;

pub use builder::build_state;
pub use classify::{classify, FieldDifference, MergeState, RecordDiff};
pub use error::ReconcileError;
pub use primitives::{diff_keyed, diff_sequence, KeyedOutcome, SequenceOutcome};
pub use state::{MergeCounts, ReconciliationState, StateSummary};
