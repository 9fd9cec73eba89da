//! PageRank influence scoring
//!
//! Power iteration over the weighted adjacency structure. Mass flows
//! along stored edge directions, so symmetric relationship kinds push
//! both ways and PassedTo pushes one way. Dangling nodes redistribute
//! their mass uniformly. Scores always sum to 1 across nodes.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::config::PageRankConfig;
use crate::graph::{NodeId, RelationshipGraph};

/// Result of a PageRank run. Hitting the iteration cap before the
/// tolerance is a valid best-effort outcome reported via `converged`,
/// not an error.
#[derive(Debug, Clone, Serialize)]
pub struct PageRankScores {
    pub scores: BTreeMap<NodeId, f64>,
    pub iterations: usize,
    pub converged: bool,
}

pub fn pagerank(graph: &RelationshipGraph, config: &PageRankConfig) -> PageRankScores {
    let nodes: Vec<&NodeId> = graph.node_ids().collect();
    let n = nodes.len();
    if n == 0 {
        return PageRankScores { scores: BTreeMap::new(), iterations: 0, converged: true };
    }

    let index: BTreeMap<&NodeId, usize> =
        nodes.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    // Outgoing weight totals; edges to (neighbor index, weight) lists
    let mut out_weight = vec![0.0f64; n];
    let mut out_edges: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for (from, edges) in graph.adjacency() {
        let i = index[from];
        for ((to, _kind), &w) in edges {
            if w > 0.0 {
                out_weight[i] += w;
                out_edges[i].push((index[to], w));
            }
        }
    }

    let damping = config.damping;
    let base = (1.0 - damping) / n as f64;
    let mut rank = vec![1.0 / n as f64; n];
    let mut next = vec![0.0f64; n];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;

        let dangling_mass: f64 = (0..n)
            .filter(|&i| out_weight[i] == 0.0)
            .map(|i| rank[i])
            .sum();
        let dangling_share = damping * dangling_mass / n as f64;

        next.iter_mut().for_each(|r| *r = base + dangling_share);
        for i in 0..n {
            if out_weight[i] > 0.0 {
                let share = damping * rank[i] / out_weight[i];
                for &(j, w) in &out_edges[i] {
                    next[j] += share * w;
                }
            }
        }

        let l1_change: f64 = rank.iter().zip(&next).map(|(a, b)| (a - b).abs()).sum();
        std::mem::swap(&mut rank, &mut next);
        if l1_change < config.tolerance {
            converged = true;
            break;
        }
    }

    debug!(nodes = n, iterations, converged, "pagerank finished");

    // Stochastic normalization guards against float drift
    let total: f64 = rank.iter().sum();
    let scores = nodes
        .into_iter()
        .zip(&rank)
        .map(|(id, &r)| (id.clone(), r / total))
        .collect();
    PageRankScores { scores, iterations, converged }
}
