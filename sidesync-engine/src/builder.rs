//! State builder — joins both sides' collections into a
//! [`ReconciliationState`].
//!
//! Categories are processed in the fixed order of
//! [`RecordCategory::all`](sidesync_core::types::RecordCategory::all); within
//! a category, low-side records are classified in enumeration order first,
//! then any identities present only on the high side. The join is symmetric
//! for every category: a record found on either side alone classifies as
//! `New`.

use std::collections::BTreeMap;

use sidesync_core::types::{Record, RecordCategory, RecordId, SideView};

use crate::classify::classify;
use crate::error::ReconcileError;
use crate::state::ReconciliationState;

/// Run one reconciliation pass over two side collaborators.
///
/// Both views are expected to be point-in-time snapshots; any fetching has
/// already happened. Identities must be unique within a side per category —
/// duplicates are a precondition violation (the lookup is last-wins, not
/// detected).
///
/// The pass either fully succeeds or returns the first error; a failed pass
/// leaves no partial state behind.
pub fn build_state(
    low: &impl SideView,
    high: &impl SideView,
) -> Result<ReconciliationState, ReconcileError> {
    let mut state = ReconciliationState::new();

    join_category(&mut state, low.projects(), high.projects(), Record::Project)?;
    join_category(&mut state, low.requests(), high.requests(), Record::Request)?;
    join_category(
        &mut state,
        low.code_submissions(),
        high.code_submissions(),
        Record::CodeSubmission,
    )?;
    join_category(&mut state, low.jobs(), high.jobs(), Record::Job)?;
    join_category(&mut state, low.logs(), high.logs(), Record::Log)?;

    let summary = state.summary();
    for category in RecordCategory::all() {
        let counts = summary.category(*category);
        if counts.total() > 0 {
            tracing::debug!(
                "{category}: {} new, {} same, {} diff",
                counts.new,
                counts.same,
                counts.diff
            );
        }
    }
    tracing::info!("reconciliation pass classified {} record(s)", state.len());

    Ok(state)
}

/// Join one category's collections by identity and classify every pair.
fn join_category<T>(
    state: &mut ReconciliationState,
    low: Vec<T>,
    high: Vec<T>,
    wrap: fn(T) -> Record,
) -> Result<(), ReconcileError> {
    // High-side lookup; slots are taken as they pair up so the leftover is
    // exactly the high-only set, still in enumeration order.
    let mut high_slots: Vec<Option<Record>> = high.into_iter().map(wrap).map(Some).collect();
    let mut high_index: BTreeMap<RecordId, usize> = BTreeMap::new();
    for (i, slot) in high_slots.iter().enumerate() {
        if let Some(record) = slot {
            high_index.insert(record.id().clone(), i);
        }
    }

    for record in low.into_iter().map(wrap) {
        let paired = high_index
            .get(record.id())
            .and_then(|&i| high_slots[i].take());
        state.push(classify(Some(record), paired)?);
    }

    for slot in high_slots {
        if let Some(record) = slot {
            state.push(classify(None, Some(record))?);
        }
    }

    Ok(())
}
