//! Structural diff primitives for nested record fields.
//!
//! Two generic algorithms shared by every comparator:
//! - [`diff_keyed`] — mapping-like fields, set algebra over keys.
//! - [`diff_sequence`] — ordered fields, prefix-aligned only.
//!
//! `diff_sequence` is deliberately NOT an LCS/edit-distance diff. Positions
//! in the common prefix are compared pairwise; anything past the shorter
//! length is reported as only-on-the-longer-side and never value-compared.
//! A single insertion at the head therefore shows up as a run of changed
//! indices plus one trailing extra element.

use std::collections::{BTreeMap, BTreeSet};

/// Result of diffing two mapping-like fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedOutcome<K: Ord> {
    /// Keys present on both sides whose values differ.
    pub changed: BTreeSet<K>,
    /// Keys present only on the low side.
    pub low_only: BTreeSet<K>,
    /// Keys present only on the high side.
    pub high_only: BTreeSet<K>,
}

impl<K: Ord> KeyedOutcome<K> {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.low_only.is_empty() && self.high_only.is_empty()
    }
}

/// Result of diffing two ordered fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequenceOutcome {
    /// Indices in the common prefix whose elements differ.
    pub changed_indices: BTreeSet<usize>,
    /// Indices past the common prefix, present only on the low side.
    pub low_only_indices: BTreeSet<usize>,
    /// Indices past the common prefix, present only on the high side.
    pub high_only_indices: BTreeSet<usize>,
}

impl SequenceOutcome {
    pub fn is_empty(&self) -> bool {
        self.changed_indices.is_empty()
            && self.low_only_indices.is_empty()
            && self.high_only_indices.is_empty()
    }
}

/// Diff two mapping-like fields by key.
///
/// `changed` holds the intersection keys whose values compare unequal;
/// `low_only`/`high_only` hold the key set differences. Input ordering is
/// irrelevant; output sets iterate in key order.
pub fn diff_keyed<K, V>(low: &BTreeMap<K, V>, high: &BTreeMap<K, V>) -> KeyedOutcome<K>
where
    K: Ord + Clone,
    V: PartialEq,
{
    let mut outcome = KeyedOutcome {
        changed: BTreeSet::new(),
        low_only: BTreeSet::new(),
        high_only: BTreeSet::new(),
    };

    for (key, low_value) in low {
        match high.get(key) {
            Some(high_value) if high_value == low_value => {}
            Some(_) => {
                outcome.changed.insert(key.clone());
            }
            None => {
                outcome.low_only.insert(key.clone());
            }
        }
    }
    for key in high.keys() {
        if !low.contains_key(key) {
            outcome.high_only.insert(key.clone());
        }
    }

    outcome
}

/// Diff two ordered fields, prefix-aligned.
///
/// Compares indices `[0, min(len))` pairwise; the tail of the longer side is
/// reported as `low_only_indices` or `high_only_indices` without any value
/// comparison.
pub fn diff_sequence<V: PartialEq>(low: &[V], high: &[V]) -> SequenceOutcome {
    let common = low.len().min(high.len());

    let mut outcome = SequenceOutcome::default();
    for i in 0..common {
        if low[i] != high[i] {
            outcome.changed_indices.insert(i);
        }
    }
    outcome.low_only_indices = (common..low.len()).collect();
    outcome.high_only_indices = (common..high.len()).collect();

    outcome
}
