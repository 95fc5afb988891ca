//! Vector clocks for causal ordering of room texts.
//!
//! Each room keeps one clock with a coordinate per member. A text message
//! carries the author's clock snapshot; comparing snapshots against the
//! room clock decides delivery order.
//!
//! Reference: Kleppmann, Chapter 5 — Detecting Concurrent Writes

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A map from peer id to a monotonically increasing counter.
///
/// Missing coordinates read as 0, so a freshly seeded clock and one that
/// never saw a peer compare equal on that coordinate.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VectorClock {
    counters: HashMap<Uuid, u64>,
}

impl VectorClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a clock with every given id at 0.
    pub fn from_ids(ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            counters: ids.into_iter().map(|id| (id, 0)).collect(),
        }
    }

    /// The counter for `id`, 0 when absent.
    pub fn get(&self, id: Uuid) -> u64 {
        self.counters.get(&id).copied().unwrap_or(0)
    }

    /// Bump one coordinate.
    pub fn increment(&mut self, id: Uuid) {
        *self.counters.entry(id).or_insert(0) += 1;
    }

    /// Coordinate-wise maximum with `other`.
    pub fn merge(&mut self, other: &VectorClock) {
        for (id, value) in &other.counters {
            let entry = self.counters.entry(*id).or_insert(0);
            *entry = (*entry).max(*value);
        }
    }

    /// `self[id] <= other[id]` for every coordinate.
    pub fn le(&self, other: &VectorClock) -> bool {
        self.counters
            .iter()
            .all(|(id, value)| *value <= other.get(*id))
    }

    /// Strictly less: `self <= other` on every coordinate and different
    /// somewhere.
    pub fn lt(&self, other: &VectorClock) -> bool {
        self.le(other) && !other.le(self)
    }

    /// A copy with `id`'s coordinate dropped (read back as 0).
    pub fn slice_excluding(&self, id: Uuid) -> VectorClock {
        let mut counters = self.counters.clone();
        counters.remove(&id);
        VectorClock { counters }
    }

    /// Sum of every coordinate.
    pub fn sum(&self) -> u64 {
        self.counters.values().sum()
    }

    /// Ids with an explicit coordinate.
    pub fn ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.counters.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn clock(entries: &[(u128, u64)]) -> VectorClock {
        let mut vc = VectorClock::new();
        for (who, ticks) in entries {
            for _ in 0..*ticks {
                vc.increment(id(*who));
            }
        }
        vc
    }

    #[test]
    fn test_missing_coordinate_reads_zero() {
        let vc = VectorClock::new();
        assert_eq!(vc.get(id(1)), 0);
    }

    #[test]
    fn test_from_ids_seeds_zeros() {
        let vc = VectorClock::from_ids([id(1), id(2)]);
        assert_eq!(vc.get(id(1)), 0);
        assert_eq!(vc.get(id(2)), 0);
        assert_eq!(vc.sum(), 0);
    }

    #[test]
    fn test_increment_raises_order() {
        let before = clock(&[(1, 2), (2, 1)]);
        let mut after = before.clone();
        after.increment(id(1));

        assert!(before.lt(&after));
        assert!(!after.le(&before));
    }

    #[test]
    fn test_merge_is_commutative() {
        let a = clock(&[(1, 3), (2, 1)]);
        let b = clock(&[(2, 4), (3, 2)]);

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);

        assert_eq!(ab, ba);
    }

    #[test]
    fn test_merge_is_associative() {
        let a = clock(&[(1, 1)]);
        let b = clock(&[(2, 2)]);
        let c = clock(&[(1, 3), (3, 1)]);

        let mut left = a.clone();
        left.merge(&b);
        left.merge(&c);

        let mut bc = b.clone();
        bc.merge(&c);
        let mut right = a.clone();
        right.merge(&bc);

        assert_eq!(left, right);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let a = clock(&[(1, 2), (2, 5)]);
        let mut merged = a.clone();
        merged.merge(&a);
        assert_eq!(merged, a);
    }

    #[test]
    fn test_merge_takes_coordinate_wise_max() {
        let mut a = clock(&[(1, 3), (2, 1)]);
        let b = clock(&[(1, 1), (2, 4)]);
        a.merge(&b);

        assert_eq!(a.get(id(1)), 3);
        assert_eq!(a.get(id(2)), 4);
    }

    #[test]
    fn test_concurrent_clocks_are_unordered() {
        let a = clock(&[(1, 1)]);
        let b = clock(&[(2, 1)]);

        assert!(!a.le(&b));
        assert!(!b.le(&a));
        assert!(!a.lt(&b));
        assert!(!b.lt(&a));
    }

    #[test]
    fn test_le_against_sparse_clock() {
        // An explicit zero compares equal to an absent coordinate.
        let seeded = VectorClock::from_ids([id(1), id(2)]);
        let empty = VectorClock::new();

        assert!(seeded.le(&empty));
        assert!(empty.le(&seeded));
        assert!(!seeded.lt(&empty));
    }

    #[test]
    fn test_slice_excluding_zeroes_one_coordinate() {
        let vc = clock(&[(1, 3), (2, 2)]);
        let sliced = vc.slice_excluding(id(1));

        assert_eq!(sliced.get(id(1)), 0);
        assert_eq!(sliced.get(id(2)), 2);
        assert_eq!(sliced.sum(), 2);
        // the original is untouched
        assert_eq!(vc.get(id(1)), 3);
    }

    #[test]
    fn test_sum() {
        assert_eq!(clock(&[]).sum(), 0);
        assert_eq!(clock(&[(1, 2), (2, 3)]).sum(), 5);
    }
}
