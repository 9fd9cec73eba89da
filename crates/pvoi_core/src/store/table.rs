//! Separate-chaining hash table for player records
//!
//! A standard `HashMap` would do the job; this table exists because the
//! engine wants explicit control over resize timing (no rehash may be
//! observable mid-operation under the engine lock) and a version-stable
//! hash so bucket layout is reproducible across runs. FxHasher provides
//! the stable hash, as elsewhere in this codebase.

use std::hash::{Hash, Hasher};

use fxhash::FxHasher;
use tracing::debug;

use crate::error::{CoreError, Result};
use crate::store::record::{PlayerId, PlayerRecord};

const INITIAL_BUCKETS: usize = 16;
const GROW_LOAD_FACTOR: f64 = 0.75;
const SHRINK_LOAD_FACTOR: f64 = 0.25;

/// Hash table keyed by [`PlayerId`], separate chaining, O(1) average ops.
///
/// Records are soft-deactivated rather than removed so valuation history
/// stays reproducible; [`PlayerStore::purge_inactive`] reclaims slots.
#[derive(Debug, Clone)]
pub struct PlayerStore {
    buckets: Vec<Vec<PlayerRecord>>,
    /// Stored entries, active or not (drives the load factor)
    entries: usize,
    active: usize,
}

impl Default for PlayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerStore {
    pub fn new() -> Self {
        Self { buckets: vec![Vec::new(); INITIAL_BUCKETS], entries: 0, active: 0 }
    }

    fn bucket_index(&self, id: &PlayerId, bucket_count: usize) -> usize {
        let mut hasher = FxHasher::default();
        id.hash(&mut hasher);
        (hasher.finish() as usize) % bucket_count
    }

    /// Insert or overwrite by id. Overwriting an inactive record
    /// reactivates it (fresh data supersedes a soft delete).
    pub fn put(&mut self, record: PlayerRecord) {
        let idx = self.bucket_index(&record.id, self.buckets.len());
        let chain = &mut self.buckets[idx];
        if let Some(existing) = chain.iter_mut().find(|r| r.id == record.id) {
            if !existing.active {
                self.active += 1;
            }
            *existing = PlayerRecord { active: true, ..record };
            return;
        }
        self.active += 1;
        self.entries += 1;
        chain.push(record);
        if self.load_factor() > GROW_LOAD_FACTOR {
            self.resize(self.buckets.len() * 2);
        }
    }

    /// Active record lookup. Deactivated records report NotFound, same as
    /// never-seen ids.
    pub fn get(&self, id: &PlayerId) -> Result<&PlayerRecord> {
        let idx = self.bucket_index(id, self.buckets.len());
        self.buckets[idx]
            .iter()
            .find(|r| r.id == *id && r.active)
            .ok_or_else(|| CoreError::NotFound { id: id.to_string() })
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.get(id).is_ok()
    }

    /// Soft-deactivate. The record stays in the table (and in the load
    /// factor) until purged.
    pub fn delete(&mut self, id: &PlayerId) -> Result<()> {
        let idx = self.bucket_index(id, self.buckets.len());
        let record = self.buckets[idx]
            .iter_mut()
            .find(|r| r.id == *id && r.active)
            .ok_or_else(|| CoreError::NotFound { id: id.to_string() })?;
        record.active = false;
        self.active -= 1;
        Ok(())
    }

    /// Undo a soft delete. NotFound if the id was never stored or is
    /// already active.
    pub fn reactivate(&mut self, id: &PlayerId) -> Result<()> {
        let idx = self.bucket_index(id, self.buckets.len());
        let record = self.buckets[idx]
            .iter_mut()
            .find(|r| r.id == *id && !r.active)
            .ok_or_else(|| CoreError::NotFound { id: id.to_string() })?;
        record.active = true;
        self.active += 1;
        Ok(())
    }

    /// Point update for a single statistic on an active record.
    pub fn update_stat(&mut self, id: &PlayerId, key: &str, value: f64) -> Result<()> {
        let idx = self.bucket_index(id, self.buckets.len());
        let record = self.buckets[idx]
            .iter_mut()
            .find(|r| r.id == *id && r.active)
            .ok_or_else(|| CoreError::NotFound { id: id.to_string() })?;
        record.stats.insert(key.to_string(), value);
        record.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Lazy, restartable iteration over active records.
    pub fn all(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.buckets.iter().flat_map(|chain| chain.iter()).filter(|r| r.active)
    }

    /// Active record count.
    pub fn len(&self) -> usize {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    pub fn load_factor(&self) -> f64 {
        self.entries as f64 / self.buckets.len() as f64
    }

    #[cfg(test)]
    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Hard-remove deactivated records, shrinking the table (never below
    /// the initial bucket count) if that leaves it sparse. Returns the
    /// number of purged records.
    pub fn purge_inactive(&mut self) -> usize {
        let before = self.entries;
        for chain in &mut self.buckets {
            chain.retain(|r| r.active);
        }
        self.entries = self.active;
        let purged = before - self.entries;
        while self.buckets.len() > INITIAL_BUCKETS && self.load_factor() < SHRINK_LOAD_FACTOR {
            let target = self.buckets.len() / 2;
            self.resize(target);
        }
        purged
    }

    /// Rehash every entry into a fresh bucket array. Runs to completion
    /// before returning, so no caller can observe a half-moved table.
    fn resize(&mut self, new_bucket_count: usize) {
        debug!(
            from = self.buckets.len(),
            to = new_bucket_count,
            entries = self.entries,
            "resizing player table"
        );
        let mut new_buckets: Vec<Vec<PlayerRecord>> = vec![Vec::new(); new_bucket_count];
        for chain in self.buckets.drain(..) {
            for record in chain {
                let mut hasher = FxHasher::default();
                record.id.hash(&mut hasher);
                let idx = (hasher.finish() as usize) % new_bucket_count;
                new_buckets[idx].push(record);
            }
        }
        self.buckets = new_buckets;
    }
}
