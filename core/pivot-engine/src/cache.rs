//! FILENAME: core/pivot-engine/src/cache.rs
//! Count Table - the aggregated result and its merge.
//!
//! A `CountTable` maps each `(main, secondary)` key to the number of rows that
//! carried it. Every stored count is at least 1; an absent key means zero.
//!
//! Merging two tables sums the counts of shared keys and copies the rest. The
//! merge is commutative and associative with the empty table as identity, which
//! is what lets chunked and parallel aggregation reproduce the whole-file
//! result exactly.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// PIVOT KEY
// ============================================================================

/// A unique combination of main and secondary values.
/// Ordered by main value first, which is also the output order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PivotKey {
    pub main: String,
    pub secondary: String,
}

impl PivotKey {
    pub fn new(main: impl Into<String>, secondary: impl Into<String>) -> Self {
        PivotKey {
            main: main.into(),
            secondary: secondary.into(),
        }
    }
}

// ============================================================================
// COUNT TABLE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTable {
    counts: FxHashMap<PivotKey, u64>,
}

impl CountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn get(&self, main: &str, secondary: &str) -> Option<u64> {
        self.counts.get(&PivotKey::new(main, secondary)).copied()
    }

    /// Adds `count` occurrences of `key`. A zero count stores nothing.
    pub fn add(&mut self, key: PivotKey, count: u64) {
        if count == 0 {
            return;
        }
        *self.counts.entry(key).or_insert(0) += count;
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PivotKey, u64)> {
        self.counts.iter().map(|(k, &c)| (k, c))
    }

    /// Entries ordered by key.
    pub fn sorted_entries(&self) -> Vec<(&PivotKey, u64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Folds `other` into this table.
    pub fn merge_from(&mut self, other: CountTable) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other;
            return;
        }
        self.counts.reserve(other.len());
        for (key, count) in other.counts {
            *self.counts.entry(key).or_insert(0) += count;
        }
    }

    /// Combines two tables. Walks the smaller one into the larger one.
    pub fn merge(self, other: CountTable) -> CountTable {
        let (mut large, small) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        large.merge_from(small);
        large
    }
}

/// Combines two partial tables into one. See `CountTable::merge`.
pub fn merge(a: CountTable, b: CountTable) -> CountTable {
    a.merge(b)
}

impl FromIterator<(PivotKey, u64)> for CountTable {
    fn from_iter<I: IntoIterator<Item = (PivotKey, u64)>>(iter: I) -> Self {
        let mut table = CountTable::new();
        for (key, count) in iter {
            table.add(key, count);
        }
        table
    }
}

impl IntoIterator for CountTable {
    type Item = (PivotKey, u64);
    type IntoIter = std::collections::hash_map::IntoIter<PivotKey, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str, u64)]) -> CountTable {
        entries
            .iter()
            .map(|&(m, s, c)| (PivotKey::new(m, s), c))
            .collect()
    }

    #[test]
    fn test_merge_sums_shared_keys() {
        let a = table(&[("NY", "Blue", 2), ("LA", "Red", 1)]);
        let b = table(&[("NY", "Blue", 3), ("SF", "Green", 4)]);

        let merged = merge(a, b);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("NY", "Blue"), Some(5));
        assert_eq!(merged.get("LA", "Red"), Some(1));
        assert_eq!(merged.get("SF", "Green"), Some(4));
        assert_eq!(merged.total(), 10);
    }

    #[test]
    fn test_empty_is_identity() {
        let a = table(&[("NY", "Blue", 2)]);
        assert_eq!(merge(a.clone(), CountTable::new()), a);
        assert_eq!(merge(CountTable::new(), a.clone()), a);
    }

    #[test]
    fn test_zero_counts_are_not_stored() {
        let mut t = CountTable::new();
        t.add(PivotKey::new("NY", "Blue"), 0);
        assert!(t.is_empty());
        assert_eq!(t.get("NY", "Blue"), None);
    }

    #[test]
    fn test_sorted_entries_order_by_main_then_secondary() {
        let t = table(&[("b", "1", 1), ("a", "2", 1), ("a", "1", 1)]);
        let keys: Vec<(&str, &str)> = t
            .sorted_entries()
            .into_iter()
            .map(|(k, _)| (k.main.as_str(), k.secondary.as_str()))
            .collect();
        assert_eq!(keys, vec![("a", "1"), ("a", "2"), ("b", "1")]);
    }
}
