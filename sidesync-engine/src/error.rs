//! Error types for sidesync-engine.
//!
//! Every variant except [`ReconcileError::Value`] signals a caller bug
//! (malformed pairing or identity enumeration), not an expected runtime
//! condition; none are retried, and any of them aborts the current pass.

use thiserror::Error;

use sidesync_core::types::{RecordCategory, RecordId};

/// All errors that can arise during a reconciliation pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Both sides were absent for a classification — the caller enumerated
    /// an identity that exists on neither side.
    #[error("invalid pair: neither side holds a record")]
    InvalidPair,

    /// Two records with different identities were paired for comparison.
    #[error("identity mismatch for {category}: low={low_id} high={high_id}")]
    IdentityMismatch {
        category: RecordCategory,
        low_id: RecordId,
        high_id: RecordId,
    },

    /// Two records of different categories were paired for comparison.
    #[error("category mismatch: paired {low} record with {high} record")]
    CategoryMismatch {
        low: RecordCategory,
        high: RecordCategory,
    },

    /// A field value could not be captured for the diff report.
    #[error("failed to capture field value: {0}")]
    Value(#[from] serde_json::Error),
}
