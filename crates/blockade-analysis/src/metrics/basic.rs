//! Static graph metrics: degree centrality, topological order, density.
//!
//! # Overview
//!
//! These are Phase 1 metrics: synchronous, linear in nodes plus edges,
//! and computed before any background work starts. They never fail.

use petgraph::algo::toposort;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::rank::int_ranks;
use crate::graph::{Condensation, DependencyGraph};

/// Phase 1 results, indexed by node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FastMetrics {
    /// How many issues depend on each node.
    pub in_degree: Vec<usize>,
    /// How many blocking dependencies each node has.
    pub out_degree: Vec<usize>,
    /// Prerequisites before dependents. Best-effort when `acyclic` is false.
    pub topological_order: Vec<usize>,
    /// Whether the topological sort succeeded.
    pub acyclic: bool,
    pub density: f64,
    pub in_degree_rank: Vec<usize>,
    pub out_degree_rank: Vec<usize>,
}

#[must_use]
#[instrument(skip(graph), fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn fast_metrics(graph: &DependencyGraph) -> FastMetrics {
    let n = graph.node_count();
    let in_degree: Vec<usize> = (0..n).map(|i| graph.dependents_of(i).len()).collect();
    let out_degree: Vec<usize> = (0..n).map(|i| graph.dependencies_of(i).len()).collect();

    let (topological_order, acyclic) = topological_order(graph);

    let ids = graph.ids();
    let in_degree_rank = int_ranks(&ids, &in_degree);
    let out_degree_rank = int_ranks(&ids, &out_degree);

    FastMetrics {
        in_degree,
        out_degree,
        topological_order,
        acyclic,
        density: graph.density(),
        in_degree_rank,
        out_degree_rank,
    }
}

/// Topological order with prerequisites first.
///
/// petgraph's sort lists dependents before their dependencies (edges run
/// dependent → dependency), so the result is reversed. On a cyclic graph
/// the order falls back to the SCC condensation, which still lists every
/// node once and respects every edge between different components.
fn topological_order(graph: &DependencyGraph) -> (Vec<usize>, bool) {
    match toposort(&graph.graph, None) {
        Ok(order) => (order.into_iter().rev().map(|ix| ix.index()).collect(), true),
        Err(cycle) => {
            debug!(node = cycle.node_id().index(), "cycle in topological sort, using condensation order");
            (Condensation::new(graph).flattened().collect(), false)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
