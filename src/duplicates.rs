//! Duplicate key detection and secondary-side resolution.
//!
//! The secondary dataset collapses to one record per key (last occurrence
//! wins). The primary dataset is never collapsed: every primary row is its own
//! entity, so only detection is offered for it.

use std::collections::{HashMap, hash_map::Entry};

use crate::key::NormalizedKey;

/// Lookup from normalized key to the retained secondary row.
#[derive(Debug, Clone, Default)]
pub struct SecondaryIndex {
    by_key: HashMap<NormalizedKey, usize>,
    retained: Vec<usize>,
    discarded: usize,
}

impl SecondaryIndex {
    /// Row index retained for `key`, if any.
    pub fn get(&self, key: &NormalizedKey) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    /// Retained row indices in original relative order.
    pub fn retained_rows(&self) -> &[usize] {
        &self.retained
    }

    /// Rows dropped because a later row shared their key.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Collapses secondary keys to one row each, keeping the last occurrence.
///
/// Retained rows keep the position of the occurrence that won.
pub fn resolve_secondary(keys: &[NormalizedKey]) -> SecondaryIndex {
    let mut by_key: HashMap<NormalizedKey, usize> = HashMap::with_capacity(keys.len());
    let mut discarded = 0usize;
    for (row_idx, key) in keys.iter().enumerate() {
        match by_key.entry(key.clone()) {
            Entry::Occupied(mut slot) => {
                slot.insert(row_idx);
                discarded += 1;
            }
            Entry::Vacant(slot) => {
                slot.insert(row_idx);
            }
        }
    }
    let mut retained = by_key.values().copied().collect::<Vec<_>>();
    retained.sort_unstable();
    SecondaryIndex {
        by_key,
        retained,
        discarded,
    }
}

/// Keys appearing more than once, in order of first appearance.
pub fn detect_duplicates(keys: &[NormalizedKey]) -> Vec<NormalizedKey> {
    let mut counts: HashMap<&NormalizedKey, usize> = HashMap::with_capacity(keys.len());
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    let mut duplicates = Vec::new();
    for key in keys {
        if let Some(count) = counts.get_mut(key)
            && *count > 1
        {
            duplicates.push(key.clone());
            // Zero the count so the key is reported once.
            *count = 0;
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::Value, key::build_key};

    fn key(text: &str) -> NormalizedKey {
        build_key(&[Value::text(text)], &[0])
    }

    #[test]
    fn last_occurrence_wins() {
        let keys = vec![key("k"), key("other"), key("K ")];
        let index = resolve_secondary(&keys);
        assert_eq!(index.get(&key("k")), Some(2));
        assert_eq!(index.discarded(), 1);
        assert_eq!(index.retained_rows(), &[1, 2]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn detect_duplicates_reports_each_key_once() {
        let keys = vec![key("a"), key("b"), key("a"), key("a"), key("b"), key("c")];
        assert_eq!(detect_duplicates(&keys), vec![key("a"), key("b")]);
    }

    #[test]
    fn unique_keys_have_no_duplicates() {
        let keys = vec![key("a"), key("b")];
        assert!(detect_duplicates(&keys).is_empty());
        assert_eq!(resolve_secondary(&keys).discarded(), 0);
    }
}
