//! Aggregate result of one reconciliation pass.

use std::collections::BTreeMap;

use sidesync_core::types::{Record, RecordCategory};

use crate::classify::{MergeState, RecordDiff};

// ---------------------------------------------------------------------------
// Reconciliation state
// ---------------------------------------------------------------------------

/// Append-ordered collection of every [`RecordDiff`] produced by one pass.
///
/// Append order is the builder's processing order; it matters only for human
/// review, never for correctness. The state is created fresh per pass and is
/// not persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReconciliationState {
    diffs: Vec<RecordDiff>,
}

impl ReconciliationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, diff: RecordDiff) {
        self.diffs.push(diff);
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordDiff> {
        self.diffs.iter()
    }

    pub fn len(&self) -> usize {
        self.diffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    /// Diffs whose record exists on exactly one side.
    pub fn one_sided(&self) -> Vec<&RecordDiff> {
        self.diffs.iter().filter(|d| d.is_one_sided()).collect()
    }

    /// Candidate records for one-directional propagation: the present side
    /// of every `New` diff.
    ///
    /// `Same` and `Diff` entries are excluded — content divergence requires a
    /// human or policy decision, not automatic propagation.
    pub fn records_to_sync(&self) -> Vec<&Record> {
        self.diffs
            .iter()
            .filter(|d| d.merge_state == MergeState::New)
            .map(|d| d.record())
            .collect()
    }

    /// Per-category merge-state tallies.
    pub fn summary(&self) -> StateSummary {
        let mut counts: BTreeMap<RecordCategory, MergeCounts> = BTreeMap::new();
        for diff in &self.diffs {
            let entry = counts.entry(diff.category).or_default();
            match diff.merge_state {
                MergeState::New => entry.new += 1,
                MergeState::Same => entry.same += 1,
                MergeState::Diff => entry.diff += 1,
            }
        }
        StateSummary { counts }
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Merge-state tallies for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeCounts {
    pub new: usize,
    pub same: usize,
    pub diff: usize,
}

impl MergeCounts {
    pub fn total(&self) -> usize {
        self.new + self.same + self.diff
    }
}

/// Per-category tallies for a whole pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateSummary {
    counts: BTreeMap<RecordCategory, MergeCounts>,
}

impl StateSummary {
    /// Tallies for one category (zero counts if nothing was classified).
    pub fn category(&self, category: RecordCategory) -> MergeCounts {
        self.counts.get(&category).copied().unwrap_or_default()
    }

    /// Tallies across all categories.
    pub fn overall(&self) -> MergeCounts {
        let mut overall = MergeCounts::default();
        for counts in self.counts.values() {
            overall.new += counts.new;
            overall.same += counts.same;
            overall.diff += counts.diff;
        }
        overall
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use sidesync_core::types::{LogEntry, Record};

    fn log_entry(id: &str, stdout: &str) -> Record {
        Record::Log(LogEntry {
            id: id.into(),
            job_id: None,
            stdout: stdout.to_string(),
            stderr: String::new(),
            fetched_at: None,
        })
    }

    fn sample_state() -> ReconciliationState {
        let mut state = ReconciliationState::new();
        // One of each merge state.
        state.push(classify(Some(log_entry("l1", "a")), None).expect("new"));
        state.push(
            classify(Some(log_entry("l2", "a")), Some(log_entry("l2", "a"))).expect("same"),
        );
        state.push(
            classify(Some(log_entry("l3", "a")), Some(log_entry("l3", "b"))).expect("diff"),
        );
        state
    }

    #[test]
    fn append_order_is_preserved() {
        let state = sample_state();
        let ids: Vec<String> = state.iter().map(|d| d.id().to_string()).collect();
        assert_eq!(ids, vec!["l1", "l2", "l3"]);
    }

    #[test]
    fn records_to_sync_is_exactly_the_new_set() {
        let state = sample_state();
        let to_sync = state.records_to_sync();
        assert_eq!(to_sync.len(), 1);
        assert_eq!(to_sync[0].id(), &"l1".into());
    }

    #[test]
    fn one_sided_matches_new() {
        let state = sample_state();
        let one_sided = state.one_sided();
        assert_eq!(one_sided.len(), 1);
        assert_eq!(one_sided[0].id(), &"l1".into());
    }

    #[test]
    fn summary_counts_per_category() {
        let state = sample_state();
        let summary = state.summary();
        let logs = summary.category(RecordCategory::Log);
        assert_eq!(logs, MergeCounts { new: 1, same: 1, diff: 1 });
        assert_eq!(logs.total(), 3);
        assert_eq!(summary.category(RecordCategory::Job).total(), 0);
        assert_eq!(summary.overall().total(), 3);
    }
}
