//! Relationship graph over players and teams
//!
//! Weighted, typed adjacency lists. Teammate/Opponent relationships are
//! symmetric and stored in both directions; PassedTo is directed. Edge
//! endpoints must already exist as nodes — implicit node creation would
//! silently swallow data errors, so it is an [`CoreError::InvalidReference`]
//! instead.
//!
//! Queries (PageRank, BFS) never run against the live structure under a
//! lock: callers take a [`RelationshipGraph::snapshot`] first.

mod bfs;
mod pagerank;

pub use bfs::shortest_path;
pub use pagerank::{pagerank, PageRankScores};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Graph node identifier: a player id or a team id.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum EdgeKind {
    Teammate,
    Opponent,
    PassedTo,
}

impl EdgeKind {
    pub fn is_directed(&self) -> bool {
        matches!(self, EdgeKind::PassedTo)
    }
}

/// Adjacency-list graph. BTreeMaps keep iteration order stable so score
/// vectors and paths are reproducible run to run.
#[derive(Debug, Clone, Default)]
pub struct RelationshipGraph {
    adjacency: BTreeMap<NodeId, BTreeMap<(NodeId, EdgeKind), f64>>,
    edge_count: usize,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent node registration.
    pub fn add_node(&mut self, id: NodeId) {
        self.adjacency.entry(id).or_default();
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.adjacency.contains_key(id)
    }

    /// Insert or re-weight the (a, b, kind) edge. Symmetric kinds are
    /// stored in both directions. Self-loops and negative weights are
    /// invalid; unknown endpoints are an InvalidReference.
    pub fn add_edge(&mut self, a: &NodeId, b: &NodeId, weight: f64, kind: EdgeKind) -> Result<()> {
        if a == b {
            return Err(CoreError::InvalidEdge(format!("self-loop on {a}")));
        }
        if !(weight >= 0.0) {
            return Err(CoreError::InvalidEdge(format!(
                "negative or NaN weight {weight} on {a}->{b}"
            )));
        }
        if !self.has_node(a) {
            return Err(CoreError::InvalidReference { node: a.to_string() });
        }
        if !self.has_node(b) {
            return Err(CoreError::InvalidReference { node: b.to_string() });
        }

        let fresh = self
            .adjacency
            .get_mut(a)
            .map(|edges| edges.insert((b.clone(), kind), weight).is_none())
            .unwrap_or(false);
        if !kind.is_directed() {
            if let Some(edges) = self.adjacency.get_mut(b) {
                edges.insert((a.clone(), kind), weight);
            }
        }
        if fresh {
            self.edge_count += 1;
        }
        Ok(())
    }

    /// Outgoing neighbors of a node with edge kind and weight.
    pub fn neighbors(&self, id: &NodeId) -> Result<Vec<(NodeId, EdgeKind, f64)>> {
        let edges = self
            .adjacency
            .get(id)
            .ok_or_else(|| CoreError::InvalidReference { node: id.to_string() })?;
        Ok(edges
            .iter()
            .map(|((to, kind), &w)| (to.clone(), *kind, w))
            .collect())
    }

    pub fn degree(&self, id: &NodeId) -> Result<usize> {
        Ok(self.neighbors(id)?.len())
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Logical edge count (symmetric pairs counted once).
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.adjacency.keys()
    }

    /// Frozen copy for lock-free query runs.
    pub fn snapshot(&self) -> RelationshipGraph {
        self.clone()
    }

    pub(crate) fn adjacency(&self) -> &BTreeMap<NodeId, BTreeMap<(NodeId, EdgeKind), f64>> {
        &self.adjacency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_requires_existing_endpoints() {
        let mut g = RelationshipGraph::new();
        g.add_node("a".into());
        let err = g.add_edge(&"a".into(), &"ghost".into(), 1.0, EdgeKind::Teammate);
        assert!(matches!(err, Err(CoreError::InvalidReference { .. })));
        let err = g.add_edge(&"ghost".into(), &"a".into(), 1.0, EdgeKind::Teammate);
        assert!(matches!(err, Err(CoreError::InvalidReference { .. })));
    }

    #[test]
    fn rejects_self_loops_and_bad_weights() {
        let mut g = RelationshipGraph::new();
        g.add_node("a".into());
        g.add_node("b".into());
        assert!(g.add_edge(&"a".into(), &"a".into(), 1.0, EdgeKind::Teammate).is_err());
        assert!(g.add_edge(&"a".into(), &"b".into(), -2.0, EdgeKind::Teammate).is_err());
        assert!(g.add_edge(&"a".into(), &"b".into(), f64::NAN, EdgeKind::Teammate).is_err());
    }

    #[test]
    fn re_adding_edge_updates_weight() {
        let mut g = RelationshipGraph::new();
        g.add_node("a".into());
        g.add_node("b".into());
        g.add_edge(&"a".into(), &"b".into(), 1.0, EdgeKind::PassedTo).unwrap();
        g.add_edge(&"a".into(), &"b".into(), 5.0, EdgeKind::PassedTo).unwrap();
        assert_eq!(g.edge_count(), 1);
        let nbrs = g.neighbors(&"a".into()).unwrap();
        assert_eq!(nbrs, vec![("b".into(), EdgeKind::PassedTo, 5.0)]);
    }

    #[test]
    fn symmetric_kinds_visible_from_both_sides() {
        let mut g = RelationshipGraph::new();
        g.add_node("a".into());
        g.add_node("b".into());
        g.add_edge(&"a".into(), &"b".into(), 2.0, EdgeKind::Teammate).unwrap();
        assert_eq!(g.degree(&"a".into()).unwrap(), 1);
        assert_eq!(g.degree(&"b".into()).unwrap(), 1);
        // directed kind only visible from the source
        g.add_edge(&"a".into(), &"b".into(), 3.0, EdgeKind::PassedTo).unwrap();
        assert_eq!(g.degree(&"a".into()).unwrap(), 2);
        assert_eq!(g.degree(&"b".into()).unwrap(), 1);
    }

    #[test]
    fn parallel_kinds_are_distinct_edges() {
        let mut g = RelationshipGraph::new();
        g.add_node("a".into());
        g.add_node("b".into());
        g.add_edge(&"a".into(), &"b".into(), 1.0, EdgeKind::Teammate).unwrap();
        g.add_edge(&"a".into(), &"b".into(), 4.0, EdgeKind::Opponent).unwrap();
        assert_eq!(g.edge_count(), 2);
    }
}
