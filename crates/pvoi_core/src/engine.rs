//! Analytics engine facade
//!
//! Explicit, constructed instances wired together at startup and handed
//! to the API layer by reference — no module-level singletons. Each
//! shared structure sits behind its own coarse mutex; operations are
//! O(1)/O(log n) so contention stays low. PageRank, BFS and PVOI runs
//! take a snapshot under the lock and compute after releasing it, so an
//! in-flight iteration can never observe a concurrent mutation.
//!
//! Consistency: reads on one structure observe the latest committed
//! write to it. No cross-structure ordering is promised — the heap may
//! lag the store until [`AnalyticsEngine::refresh_leaderboard`].

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::graph::{
    pagerank, shortest_path, EdgeKind, NodeId, PageRankScores, RelationshipGraph,
};
use crate::ranking::{HeapEntry, RankingHeap, UpsertOutcome};
use crate::store::{PlayerId, PlayerRecord, PlayerStore};
use crate::valuation::{PvoiReport, ShapleyValuator, StrategyKind, ValueFunction};

#[derive(Clone)]
pub struct AnalyticsEngine {
    config: EngineConfig,
    store: Arc<Mutex<PlayerStore>>,
    heap: Arc<Mutex<RankingHeap>>,
    graph: Arc<Mutex<RelationshipGraph>>,
    valuator: ShapleyValuator,
}

/// A poisoned mutex only means another handler panicked mid-operation;
/// the structures themselves are never left half-resized or half-sifted
/// (every mutation completes before the guard drops), so recover the
/// guard instead of propagating the panic.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AnalyticsEngine {
    pub fn new(config: EngineConfig) -> Self {
        let heap = RankingHeap::new(config.heap_capacity);
        let valuator = ShapleyValuator::new(config.shapley.clone());
        Self {
            config,
            store: Arc::new(Mutex::new(PlayerStore::new())),
            heap: Arc::new(Mutex::new(heap)),
            graph: Arc::new(Mutex::new(RelationshipGraph::new())),
            valuator,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- ingestion ----

    /// Insert or overwrite a player record, keep the leaderboard current
    /// and register the player as a graph node.
    pub fn ingest(&self, record: PlayerRecord) -> UpsertOutcome {
        let id = record.id.clone();
        let score = record.stat(&self.config.ranking_metric);
        lock(&self.store).put(record);
        lock(&self.graph).add_node(NodeId::new(id.as_str()));
        lock(&self.heap).upsert(id, score)
    }

    /// Point stat update; re-ranks the player if the leaderboard metric
    /// changed.
    pub fn update_stat(&self, id: &PlayerId, key: &str, value: f64) -> Result<()> {
        lock(&self.store).update_stat(id, key, value)?;
        if key == self.config.ranking_metric {
            lock(&self.heap).upsert(id.clone(), value);
        }
        Ok(())
    }

    /// Soft-deactivate a player and drop it from the leaderboard. The
    /// graph node stays: historical relationships remain queryable.
    pub fn deactivate(&self, id: &PlayerId) -> Result<()> {
        lock(&self.store).delete(id)?;
        // Not every active player is on the bounded leaderboard
        let _ = lock(&self.heap).remove(id);
        Ok(())
    }

    /// Register a non-player node (e.g. a team).
    pub fn add_node(&self, id: NodeId) {
        lock(&self.graph).add_node(id);
    }

    /// Record or re-weight a relationship between two known nodes.
    pub fn record_relationship(
        &self,
        a: &NodeId,
        b: &NodeId,
        weight: f64,
        kind: EdgeKind,
    ) -> Result<()> {
        lock(&self.graph).add_edge(a, b, weight, kind)
    }

    // ---- queries: plain owned data out, never internal references ----

    pub fn player(&self, id: &PlayerId) -> Result<PlayerRecord> {
        lock(&self.store).get(id).cloned()
    }

    pub fn player_count(&self) -> usize {
        lock(&self.store).len()
    }

    pub fn top_players(&self, k: usize) -> Vec<HeapEntry> {
        lock(&self.heap).top_k(k)
    }

    pub fn top_player(&self) -> Option<HeapEntry> {
        lock(&self.heap).top().cloned()
    }

    /// Rebuild the leaderboard from the store. Callers that need the
    /// ranking to reflect the very latest store writes call this first.
    pub fn refresh_leaderboard(&self) {
        let snapshot = lock(&self.store).clone();
        lock(&self.heap).rebuild_from(&snapshot, &self.config.ranking_metric);
    }

    pub fn pagerank(&self) -> PageRankScores {
        let snapshot = lock(&self.graph).snapshot();
        pagerank(&snapshot, &self.config.pagerank)
    }

    pub fn shortest_path(&self, a: &NodeId, b: &NodeId) -> Result<Vec<NodeId>> {
        let snapshot = lock(&self.graph).snapshot();
        shortest_path(&snapshot, a, b)
    }

    /// Value every active player with the given strategy. Runs on a
    /// store snapshot in canonical id order, so results are deterministic
    /// for a fixed seed even while ingestion continues.
    pub fn pvoi(
        &self,
        value_function: &dyn ValueFunction,
        strategy: StrategyKind,
    ) -> Result<PvoiReport> {
        let mut players: Vec<PlayerRecord> = {
            let store = lock(&self.store);
            store.all().cloned().collect()
        };
        players.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(players = players.len(), ?strategy, "starting pvoi run");
        self.valuator.compute(&players, value_function, strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{stat_keys, Position};
    use crate::valuation::StatWeightedValue;

    fn forward(id: &str, rating: f64, goals: f64) -> PlayerRecord {
        PlayerRecord::new(id, format!("player {id}"), Position::Forward)
            .with_stat(stat_keys::RATING, rating)
            .with_stat(stat_keys::GOALS, goals)
            .with_stat(stat_keys::MINUTES, 900.0)
    }

    fn engine() -> AnalyticsEngine {
        AnalyticsEngine::new(EngineConfig::fast())
    }

    #[test]
    fn ingest_feeds_store_heap_and_graph() {
        let engine = engine();
        engine.ingest(forward("a", 7.5, 3.0));
        engine.ingest(forward("b", 8.1, 5.0));

        assert_eq!(engine.player(&"a".into()).unwrap().stat(stat_keys::GOALS), 3.0);
        assert_eq!(engine.top_player().unwrap().id.as_str(), "b");
        assert!(engine
            .record_relationship(&"a".into(), &"b".into(), 12.0, EdgeKind::Teammate)
            .is_ok());
    }

    #[test]
    fn stat_update_re_ranks_on_metric_change() {
        let engine = engine();
        engine.ingest(forward("a", 7.0, 0.0));
        engine.ingest(forward("b", 8.0, 0.0));
        engine.update_stat(&"a".into(), stat_keys::RATING, 9.0).unwrap();
        assert_eq!(engine.top_player().unwrap().id.as_str(), "a");
        // non-metric updates leave the ranking alone
        engine.update_stat(&"b".into(), stat_keys::GOALS, 99.0).unwrap();
        assert_eq!(engine.top_player().unwrap().id.as_str(), "a");
    }

    #[test]
    fn deactivate_removes_from_queries_but_keeps_graph_node() {
        let engine = engine();
        engine.ingest(forward("a", 7.0, 1.0));
        engine.ingest(forward("b", 6.0, 1.0));
        engine
            .record_relationship(&"a".into(), &"b".into(), 1.0, EdgeKind::Teammate)
            .unwrap();

        engine.deactivate(&"a".into()).unwrap();
        assert!(engine.player(&"a".into()).is_err());
        assert_eq!(engine.top_player().unwrap().id.as_str(), "b");
        // historical relationships still queryable
        let path = engine.shortest_path(&"a".into(), &"b".into()).unwrap();
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn refresh_restores_store_heap_consistency() {
        let engine = engine();
        for i in 0..5 {
            engine.ingest(forward(&format!("p{i}"), i as f64, 0.0));
        }
        // heap may be stale relative to direct store writes; refresh fixes it
        engine.refresh_leaderboard();
        let top = engine.top_players(5);
        assert_eq!(top[0].id.as_str(), "p4");
        assert_eq!(top.len(), 5);
    }

    #[test]
    fn pvoi_runs_on_active_players_only() {
        let engine = engine();
        engine.ingest(forward("a", 7.0, 4.0));
        engine.ingest(forward("b", 7.0, 2.0));
        engine.ingest(forward("c", 7.0, 9.0));
        engine.deactivate(&"c".into()).unwrap();

        let report = engine
            .pvoi(&StatWeightedValue::new("goals_only", vec![("goals".into(), 1.0)]), StrategyKind::Exact)
            .unwrap();
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.phi(&"a".into()), Some(4.0));
        assert_eq!(report.phi(&"b".into()), Some(2.0));
        assert!(report.phi(&"c".into()).is_none());
    }

    #[test]
    fn concurrent_ingestion_stays_consistent() {
        let engine = engine();
        let threads: Vec<_> = (0..4)
            .map(|t| {
                let engine = engine.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let id = format!("t{t}_p{i}");
                        engine.ingest(forward(&id, (t * 50 + i) as f64, 1.0));
                    }
                })
            })
            .collect();
        for handle in threads {
            handle.join().unwrap();
        }
        assert_eq!(engine.player_count(), 200);
        let top = engine.top_players(10);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].id.as_str(), "t3_p49");
        let scores = engine.pagerank();
        assert_eq!(scores.scores.len(), 200);
    }
}
