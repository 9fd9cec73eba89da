//! Bounded max-heap leaderboard
//!
//! Tracks the top `capacity` players by one score. A side index map gives
//! O(log n) rescoring of an already-tracked player instead of an O(n)
//! search. Heaps are not stable, so ordering is pinned explicitly: higher
//! score wins, equal scores resolve by ascending player id.

use fxhash::FxHashMap;
use tracing::trace;

use crate::error::{CoreError, Result};
use crate::store::{PlayerId, PlayerStore};

#[derive(Debug, Clone, PartialEq)]
pub struct HeapEntry {
    pub id: PlayerId,
    pub score: f64,
}

impl HeapEntry {
    /// The one total order used for sifting, eviction and top_k.
    fn beats(&self, other: &HeapEntry) -> bool {
        self.score > other.score || (self.score == other.score && self.id < other.id)
    }
}

/// Outcome of [`RankingHeap::upsert`]. `Rejected` is the defined no-op of
/// a full heap refusing a score that does not beat its current minimum —
/// an expected outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Rejected,
}

impl UpsertOutcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, UpsertOutcome::Rejected)
    }
}

#[derive(Debug, Clone)]
pub struct RankingHeap {
    entries: Vec<HeapEntry>,
    index: FxHashMap<PlayerId, usize>,
    capacity: usize,
}

impl RankingHeap {
    pub fn new(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity), index: FxHashMap::default(), capacity }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.index.contains_key(id)
    }

    /// Insert a new player or rescore a tracked one.
    ///
    /// A rescore never rejects. A new player inserts while below
    /// capacity; at capacity it either evicts the current minimum (when
    /// the newcomer beats it) or is rejected.
    pub fn upsert(&mut self, id: PlayerId, score: f64) -> UpsertOutcome {
        if let Some(&pos) = self.index.get(&id) {
            self.entries[pos].score = score;
            let pos = self.sift_up(pos);
            self.sift_down(pos);
            return UpsertOutcome::Updated;
        }

        let entry = HeapEntry { id, score };
        if self.entries.len() < self.capacity {
            self.index.insert(entry.id.clone(), self.entries.len());
            self.entries.push(entry);
            self.sift_up(self.entries.len() - 1);
            return UpsertOutcome::Inserted;
        }

        let min_pos = match self.min_position() {
            Some(pos) => pos,
            None => return UpsertOutcome::Rejected, // capacity 0
        };
        if !entry.beats(&self.entries[min_pos]) {
            trace!(id = %entry.id, score, "leaderboard full, score below minimum");
            return UpsertOutcome::Rejected;
        }

        self.index.remove(&self.entries[min_pos].id);
        self.index.insert(entry.id.clone(), min_pos);
        self.entries[min_pos] = entry;
        let pos = self.sift_up(min_pos);
        self.sift_down(pos);
        UpsertOutcome::Inserted
    }

    /// Stop tracking a player (e.g. deactivated upstream).
    pub fn remove(&mut self, id: &PlayerId) -> Result<()> {
        let pos = *self
            .index
            .get(id)
            .ok_or_else(|| CoreError::NotFound { id: id.to_string() })?;
        self.index.remove(id);
        let last = self.entries.len() - 1;
        if pos != last {
            self.entries.swap(pos, last);
            self.index.insert(self.entries[pos].id.clone(), pos);
        }
        self.entries.pop();
        if pos < self.entries.len() {
            let pos = self.sift_up(pos);
            self.sift_down(pos);
        }
        Ok(())
    }

    /// Current best entry, O(1).
    pub fn top(&self) -> Option<&HeapEntry> {
        self.entries.first()
    }

    /// The k best entries in descending order, extracted from a copy so
    /// the live heap is untouched. `k >= len` returns everything sorted.
    pub fn top_k(&self, k: usize) -> Vec<HeapEntry> {
        let mut scratch = self.clone();
        let mut out = Vec::with_capacity(k.min(scratch.len()));
        while out.len() < k {
            match scratch.pop_root() {
                Some(entry) => out.push(entry),
                None => break,
            }
        }
        out
    }

    /// Drop everything and re-rank all active players in the store by one
    /// statistic. This is the refresh path for callers that need the
    /// leaderboard to reflect the very latest store writes.
    pub fn rebuild_from(&mut self, store: &PlayerStore, metric: &str) {
        self.entries.clear();
        self.index.clear();
        for record in store.all() {
            self.upsert(record.id.clone(), record.stat(metric));
        }
    }

    fn pop_root(&mut self) -> Option<HeapEntry> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let root = self.entries.pop()?;
        self.index.remove(&root.id);
        if !self.entries.is_empty() {
            self.index.insert(self.entries[0].id.clone(), 0);
            self.sift_down(0);
        }
        Some(root)
    }

    /// Position of the worst entry. Only leaves can be the minimum under
    /// the heap invariant.
    fn min_position(&self) -> Option<usize> {
        let n = self.entries.len();
        if n == 0 {
            return None;
        }
        let first_leaf = n / 2;
        let mut min = first_leaf;
        for i in first_leaf + 1..n {
            if self.entries[min].beats(&self.entries[i]) {
                min = i;
            }
        }
        Some(min)
    }

    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.entries[pos].beats(&self.entries[parent]) {
                self.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
        pos
    }

    fn sift_down(&mut self, mut pos: usize) {
        loop {
            let left = 2 * pos + 1;
            let right = 2 * pos + 2;
            let mut best = pos;
            if left < self.entries.len() && self.entries[left].beats(&self.entries[best]) {
                best = left;
            }
            if right < self.entries.len() && self.entries[right].beats(&self.entries[best]) {
                best = right;
            }
            if best == pos {
                break;
            }
            self.swap(pos, best);
            pos = best;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
        self.index.insert(self.entries[a].id.clone(), a);
        self.index.insert(self.entries[b].id.clone(), b);
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        assert!(self.entries.len() <= self.capacity);
        for pos in 1..self.entries.len() {
            let parent = (pos - 1) / 2;
            assert!(
                !self.entries[pos].beats(&self.entries[parent]),
                "heap order violated at {pos}"
            );
        }
        assert_eq!(self.index.len(), self.entries.len());
        for (id, &pos) in &self.index {
            assert_eq!(&self.entries[pos].id, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(entries: &[HeapEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn empty_heap_queries() {
        let heap = RankingHeap::new(5);
        assert!(heap.top().is_none());
        assert!(heap.top_k(3).is_empty());
    }

    #[test]
    fn top_tracks_maximum() {
        let mut heap = RankingHeap::new(10);
        heap.upsert("a".into(), 3.0);
        heap.upsert("b".into(), 9.0);
        heap.upsert("c".into(), 6.0);
        assert_eq!(heap.top().unwrap().id.as_str(), "b");
        heap.upsert("c".into(), 11.0);
        assert_eq!(heap.top().unwrap().id.as_str(), "c");
        heap.assert_invariants();
    }

    #[test]
    fn eviction_at_capacity() {
        let mut heap = RankingHeap::new(3);
        heap.upsert("a".into(), 5.0);
        heap.upsert("b".into(), 7.0);
        heap.upsert("c".into(), 9.0);

        // Below the minimum: defined no-op, contents unchanged
        let before = heap.top_k(3);
        assert_eq!(heap.upsert("d".into(), 4.0), UpsertOutcome::Rejected);
        assert_eq!(heap.top_k(3), before);
        assert!(!heap.contains(&"d".into()));

        // Beats the minimum: evicts "a"
        assert_eq!(heap.upsert("e".into(), 6.0), UpsertOutcome::Inserted);
        assert!(!heap.contains(&"a".into()));
        assert_eq!(ids(&heap.top_k(3)), vec!["c", "b", "e"]);
        heap.assert_invariants();
    }

    #[test]
    fn rescore_never_rejects_at_capacity() {
        let mut heap = RankingHeap::new(2);
        heap.upsert("a".into(), 5.0);
        heap.upsert("b".into(), 7.0);
        assert_eq!(heap.upsert("a".into(), 1.0), UpsertOutcome::Updated);
        assert_eq!(heap.top().unwrap().id.as_str(), "b");
        heap.assert_invariants();
    }

    #[test]
    fn ties_break_by_ascending_id() {
        let mut heap = RankingHeap::new(5);
        heap.upsert("z".into(), 5.0);
        heap.upsert("a".into(), 5.0);
        heap.upsert("m".into(), 5.0);
        assert_eq!(ids(&heap.top_k(5)), vec!["a", "m", "z"]);

        // At capacity 3, a tying newcomer with a higher id does not evict
        let mut full = RankingHeap::new(3);
        full.upsert("a".into(), 5.0);
        full.upsert("b".into(), 5.0);
        full.upsert("c".into(), 5.0);
        assert_eq!(full.upsert("d".into(), 5.0), UpsertOutcome::Rejected);
        // ...but a tying newcomer with a lower id beats the worst ("c")
        assert_eq!(full.upsert("0".into(), 5.0), UpsertOutcome::Inserted);
        assert!(!full.contains(&"c".into()));
    }

    #[test]
    fn top_k_does_not_mutate_live_heap() {
        let mut heap = RankingHeap::new(10);
        for (i, score) in [4.0, 8.0, 1.0, 9.0, 3.0].iter().enumerate() {
            heap.upsert(PlayerId::new(format!("p{i}")), *score);
        }
        let first = heap.top_k(3);
        let second = heap.top_k(3);
        assert_eq!(first, second);
        assert_eq!(heap.len(), 5);
        heap.assert_invariants();
    }

    #[test]
    fn top_k_larger_than_size_returns_all_sorted() {
        let mut heap = RankingHeap::new(10);
        heap.upsert("a".into(), 1.0);
        heap.upsert("b".into(), 2.0);
        let all = heap.top_k(100);
        assert_eq!(ids(&all), vec!["b", "a"]);
    }

    #[test]
    fn remove_keeps_order() {
        let mut heap = RankingHeap::new(10);
        for (i, score) in [4.0, 8.0, 1.0, 9.0, 3.0, 7.0].iter().enumerate() {
            heap.upsert(PlayerId::new(format!("p{i}")), *score);
        }
        heap.remove(&"p3".into()).unwrap();
        assert!(!heap.contains(&"p3".into()));
        assert_eq!(heap.top().unwrap().id.as_str(), "p1");
        assert!(heap.remove(&"p3".into()).is_err());
        heap.assert_invariants();
    }

    #[test]
    fn rebuild_from_store_ranks_by_metric() {
        use crate::store::{PlayerRecord, PlayerStore, Position};
        let mut store = PlayerStore::new();
        store.put(PlayerRecord::new("a", "A", Position::Forward).with_stat("goals", 12.0));
        store.put(PlayerRecord::new("b", "B", Position::Forward).with_stat("goals", 20.0));
        store.put(PlayerRecord::new("c", "C", Position::Forward).with_stat("goals", 7.0));
        store.delete(&"c".into()).unwrap();

        let mut heap = RankingHeap::new(10);
        heap.upsert("stale".into(), 99.0);
        heap.rebuild_from(&store, "goals");
        assert_eq!(ids(&heap.top_k(10)), vec!["b", "a"]);
    }

    proptest! {
        #[test]
        fn invariants_hold_under_random_upserts(
            ops in proptest::collection::vec((0u8..30, -100i32..100), 1..150),
            capacity in 1usize..12,
        ) {
            let mut heap = RankingHeap::new(capacity);
            for (id, score) in ops {
                heap.upsert(PlayerId::new(format!("p{id}")), score as f64);
                heap.assert_invariants();
            }
            // top() equals the maximum under the beats order
            if let Some(top) = heap.top() {
                let sorted = heap.top_k(heap.len());
                prop_assert_eq!(&sorted[0], top);
                for w in sorted.windows(2) {
                    let in_order = w[0].score > w[1].score
                        || (w[0].score == w[1].score && w[0].id < w[1].id);
                    prop_assert!(in_order);
                }
            }
        }
    }
}
