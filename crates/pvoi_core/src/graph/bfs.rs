//! Unweighted shortest-path queries
//!
//! BFS over stored edge directions; weights are deliberately ignored
//! here (hop count, not cost). A weighted variant is out of scope.

use std::collections::{BTreeMap, VecDeque};

use crate::error::{CoreError, Result};
use crate::graph::{NodeId, RelationshipGraph};

/// Shortest node sequence from `a` to `b` by hop count.
///
/// `a == b` yields the single-element path. Unknown endpoints are an
/// InvalidReference; a missing route is NotReachable.
pub fn shortest_path(graph: &RelationshipGraph, a: &NodeId, b: &NodeId) -> Result<Vec<NodeId>> {
    if !graph.has_node(a) {
        return Err(CoreError::InvalidReference { node: a.to_string() });
    }
    if !graph.has_node(b) {
        return Err(CoreError::InvalidReference { node: b.to_string() });
    }
    if a == b {
        return Ok(vec![a.clone()]);
    }

    let mut predecessor: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    let mut queue = VecDeque::new();
    queue.push_back(a.clone());

    while let Some(current) = queue.pop_front() {
        for ((next, _kind), _w) in &graph.adjacency()[&current] {
            if next == a || predecessor.contains_key(next) {
                continue;
            }
            predecessor.insert(next.clone(), current.clone());
            if next == b {
                let mut path = vec![b.clone()];
                let mut cursor = b;
                while let Some(prev) = predecessor.get(cursor) {
                    path.push(prev.clone());
                    cursor = prev;
                }
                path.reverse();
                return Ok(path);
            }
            queue.push_back(next.clone());
        }
    }

    Err(CoreError::NotReachable { from: a.to_string(), to: b.to_string() })
}
