//! # pvoi_core - In-Memory Player Analytics Engine
//!
//! Single-process analytics core for soccer player statistics:
//! - O(1) player storage in a custom separate-chaining hash table
//! - Bounded max-heap leaderboards with O(log n) rank updates
//! - Weighted relationship graph with PageRank and BFS queries
//! - Shapley-value player valuation (PVOI) with exact, Monte Carlo and
//!   model-based strategies
//!
//! The crate is a library: the REST layer, data acquisition and
//! reporting are external consumers of [`engine::AnalyticsEngine`] and
//! the [`api`] JSON surface.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod ranking;
pub mod store;
pub mod valuation;

// Re-export the main entry points
pub use config::{EngineConfig, PageRankConfig, ShapleyConfig};
pub use engine::AnalyticsEngine;
pub use error::{CoreError, Result};

// Re-export component types
pub use graph::{pagerank, shortest_path, EdgeKind, NodeId, PageRankScores, RelationshipGraph};
pub use ranking::{HeapEntry, RankingHeap, UpsertOutcome};
pub use store::{stat_keys, PlayerId, PlayerRecord, PlayerStore, Position};
pub use valuation::{
    Coalition, CompositeValue, Per90Value, PvoiReport, ShapleyResult, ShapleyValuator,
    StatWeightedValue, StrategyKind, ValueFunction,
};
