//! Diff record and merge-state classification.
//!
//! [`classify`] is the single constructor for [`RecordDiff`]; presence
//! invariants (exactly one side absent iff `New`, both present iff
//! `Same`/`Diff`, never both absent) hold by construction because the pair
//! is stored as a [`SidePair`].

use std::collections::BTreeSet;

use serde_json::Value;

use sidesync_core::types::{Record, RecordCategory, RecordId};

use crate::compare::compare_records;
use crate::error::ReconcileError;

// ---------------------------------------------------------------------------
// Field-level differences
// ---------------------------------------------------------------------------

/// One field whose value differs between the two sides of a record.
///
/// Emitted only when the sides genuinely differ: scalar variants carry
/// unequal values, structural variants carry at least one non-empty set.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDifference {
    /// A plain or opaque field compared by equality.
    Scalar {
        field: &'static str,
        low: Value,
        high: Value,
    },
    /// An ordered field, diffed prefix-aligned.
    Sequence {
        field: &'static str,
        low: Value,
        high: Value,
        changed_indices: BTreeSet<usize>,
        low_only_indices: BTreeSet<usize>,
        high_only_indices: BTreeSet<usize>,
    },
    /// A mapping field, diffed by key.
    Keyed {
        field: &'static str,
        low: Value,
        high: Value,
        changed_keys: BTreeSet<String>,
        low_only_keys: BTreeSet<String>,
        high_only_keys: BTreeSet<String>,
    },
}

impl FieldDifference {
    /// Name of the differing field, as listed in the category's allow-list.
    pub fn field_name(&self) -> &'static str {
        match self {
            FieldDifference::Scalar { field, .. }
            | FieldDifference::Sequence { field, .. }
            | FieldDifference::Keyed { field, .. } => field,
        }
    }
}

// ---------------------------------------------------------------------------
// Merge state
// ---------------------------------------------------------------------------

/// Terminal classification of one record's two copies.
///
/// Recomputed fresh on every pass; there is no persisted transition history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    /// Present on exactly one side.
    New,
    /// Present on both sides with no field differences.
    Same,
    /// Present on both sides with at least one field difference.
    Diff,
}

impl std::fmt::Display for MergeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeState::New => write!(f, "new"),
            MergeState::Same => write!(f, "same"),
            MergeState::Diff => write!(f, "diff"),
        }
    }
}

// ---------------------------------------------------------------------------
// Record diff
// ---------------------------------------------------------------------------

/// The two copies of one identity, with at least one side present.
#[derive(Debug, Clone, PartialEq)]
enum SidePair {
    LowOnly(Record),
    HighOnly(Record),
    Both { low: Record, high: Record },
}

/// One comparison result: the paired copies, their category, the derived
/// merge state, and the ordered field-level differences.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDiff {
    pair: SidePair,
    pub category: RecordCategory,
    pub merge_state: MergeState,
    /// Ordered by the category's field allow-list.
    pub differences: Vec<FieldDifference>,
}

impl RecordDiff {
    /// The low-side copy, if present.
    pub fn low(&self) -> Option<&Record> {
        match &self.pair {
            SidePair::LowOnly(record) | SidePair::Both { low: record, .. } => Some(record),
            SidePair::HighOnly(_) => None,
        }
    }

    /// The high-side copy, if present.
    pub fn high(&self) -> Option<&Record> {
        match &self.pair {
            SidePair::HighOnly(record) | SidePair::Both { high: record, .. } => Some(record),
            SidePair::LowOnly(_) => None,
        }
    }

    /// A present copy of the record (the low side when both exist).
    pub fn record(&self) -> &Record {
        match &self.pair {
            SidePair::LowOnly(record)
            | SidePair::HighOnly(record)
            | SidePair::Both { low: record, .. } => record,
        }
    }

    /// Identity shared by both copies.
    pub fn id(&self) -> &RecordId {
        self.record().id()
    }

    /// Whether the record exists on exactly one side.
    pub fn is_one_sided(&self) -> bool {
        self.merge_state == MergeState::New
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify one identity's pair of optional copies into a [`RecordDiff`].
///
/// Pure and deterministic:
/// 1. both absent → [`ReconcileError::InvalidPair`];
/// 2. exactly one present → `New` with no differences;
/// 3. both present → identity and category are verified, the category's
///    comparator runs, and the state is `Same` iff it reported nothing.
pub fn classify(low: Option<Record>, high: Option<Record>) -> Result<RecordDiff, ReconcileError> {
    match (low, high) {
        (None, None) => Err(ReconcileError::InvalidPair),
        (Some(record), None) => Ok(RecordDiff {
            category: record.category(),
            merge_state: MergeState::New,
            differences: Vec::new(),
            pair: SidePair::LowOnly(record),
        }),
        (None, Some(record)) => Ok(RecordDiff {
            category: record.category(),
            merge_state: MergeState::New,
            differences: Vec::new(),
            pair: SidePair::HighOnly(record),
        }),
        (Some(low), Some(high)) => {
            let differences = compare_records(&low, &high)?;
            let merge_state = if differences.is_empty() {
                MergeState::Same
            } else {
                MergeState::Diff
            };
            Ok(RecordDiff {
                category: low.category(),
                merge_state,
                differences,
                pair: SidePair::Both { low, high },
            })
        }
    }
}
