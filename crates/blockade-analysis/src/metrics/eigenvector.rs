//! Eigenvector centrality.
//!
//! A node is central when the issues depending on it are themselves
//! central. Power iteration: each round sets `x(v)` to the sum of `x(u)`
//! over the nodes `u → v` that depend on it, then L2-normalizes. The round
//! count is fixed, so the cost is a predictable O(50·E) and the metric
//! runs without a timeout guard.
//!
//! A graph without edges has no dominant eigenvector; every score is 0.
//! On an acyclic graph the mass drains out after as many rounds as the
//! longest path; the last non-zero iterate is kept.

use tracing::instrument;

use crate::graph::DependencyGraph;

/// Fixed number of power iterations.
pub const EIGENVECTOR_ITERATIONS: usize = 50;

/// Eigenvector centrality per node index.
#[must_use]
#[instrument(skip(graph), fields(nodes = graph.node_count()))]
#[allow(clippy::cast_precision_loss)]
pub fn eigenvector_centrality(graph: &DependencyGraph) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }
    if graph.edge_count() == 0 {
        return vec![0.0; n];
    }

    let mut x = vec![1.0 / n as f64; n];
    let mut next = vec![0.0_f64; n];

    for _ in 0..EIGENVECTOR_ITERATIONS {
        for (v, slot) in next.iter_mut().enumerate() {
            *slot = graph.dependents_of(v).iter().map(|&u| x[u]).sum();
        }

        let norm = next.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 {
            break;
        }
        for v in &mut next {
            *v /= norm;
        }
        std::mem::swap(&mut x, &mut next);
    }

    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{graph, value};

    #[test]
    fn empty_graph_returns_empty() {
        assert!(eigenvector_centrality(&graph(&[], &[])).is_empty());
    }

    #[test]
    fn edgeless_graph_is_all_zero() {
        let scores = eigenvector_centrality(&graph(&["a", "b"], &[]));
        assert_eq!(scores, vec![0.0, 0.0]);
    }

    #[test]
    fn cycle_members_share_score() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let scores = eigenvector_centrality(&g);
        let a = value(&g, &scores, "a");
        assert!(a > 0.0);
        assert!((a - value(&g, &scores, "b")).abs() < 1e-9);
        assert!((a - value(&g, &scores, "c")).abs() < 1e-9);
    }

    #[test]
    fn acyclic_chain_keeps_last_iterate() {
        // a -> b -> c: after two rounds only c holds mass.
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let scores = eigenvector_centrality(&g);
        assert!((value(&g, &scores, "c") - 1.0).abs() < 1e-9);
        assert!(value(&g, &scores, "a").abs() < 1e-12);
        assert!(value(&g, &scores, "b").abs() < 1e-12);
    }

    #[test]
    fn scores_are_unit_length_and_non_negative() {
        let g = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "a"), ("c", "a"), ("d", "a")],
        );
        let scores = eigenvector_centrality(&g);
        assert!(scores.iter().all(|s| *s >= 0.0));
        let norm = scores.iter().map(|s| s * s).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
        assert!(value(&g, &scores, "a") > value(&g, &scores, "c"));
    }
}
