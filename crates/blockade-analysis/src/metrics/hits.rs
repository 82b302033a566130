//! HITS (Hyperlink-Induced Topic Search) hub and authority scores.
//!
//! # Overview
//!
//! - **Hub**: an issue that depends on many strong authorities.
//! - **Authority**: an issue that many strong hubs depend on.
//!
//! # Algorithm
//!
//! Iterative power method (Kleinberg, 1999):
//!
//! 1. Initialize hub and authority scores to 1.0.
//! 2. `auth(v) = Σ hub(u)` for all `u → v`.
//! 3. `hub(v) = Σ auth(w)` for all `v → w`.
//! 4. Normalize both vectors to unit length (L2).
//! 5. Repeat until both deltas are under the tolerance or `max_iter`.
//!
//! An edgeless graph never converges meaningfully; callers must skip HITS
//! when [`DependencyGraph::edge_count`] is zero. This function still
//! returns zeros in that case rather than dividing by zero.

use tracing::{instrument, warn};

use crate::{cancel::CancelToken, graph::DependencyGraph};

/// Default convergence tolerance.
pub const HITS_TOLERANCE: f64 = 1e-3;
/// Default iteration cap.
pub const HITS_MAX_ITER: usize = 100;

/// Result of the HITS algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct HitsResult {
    /// Hub score per node index.
    pub hubs: Vec<f64>,
    /// Authority score per node index.
    pub authorities: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

#[must_use]
#[instrument(skip(graph, cancel), fields(nodes = graph.node_count()))]
pub fn hits(graph: &DependencyGraph, max_iter: usize, tolerance: f64, cancel: &CancelToken) -> HitsResult {
    let n = graph.node_count();
    let mut hubs = vec![1.0_f64; n];
    let mut auths = vec![1.0_f64; n];

    if n == 0 || graph.edge_count() == 0 {
        return HitsResult {
            hubs: vec![0.0; n],
            authorities: vec![0.0; n],
            iterations: 0,
            converged: true,
        };
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iter {
        if cancel.is_cancelled() {
            warn!(iterations, "hits cancelled");
            break;
        }
        iterations += 1;

        let mut new_auths: Vec<f64> = (0..n)
            .map(|v| graph.dependents_of(v).iter().map(|&u| hubs[u]).sum())
            .collect();
        normalize(&mut new_auths);

        let mut new_hubs: Vec<f64> = (0..n)
            .map(|v| graph.dependencies_of(v).iter().map(|&w| new_auths[w]).sum())
            .collect();
        normalize(&mut new_hubs);

        let delta = l2_distance(&auths, &new_auths).max(l2_distance(&hubs, &new_hubs));
        auths = new_auths;
        hubs = new_hubs;

        if delta < tolerance {
            converged = true;
            break;
        }
    }

    HitsResult {
        hubs,
        authorities: auths,
        iterations,
        converged,
    }
}

fn normalize(v: &mut [f64]) {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v {
            *x /= norm;
        }
    }
}

fn l2_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{graph, value};

    fn run(g: &DependencyGraph) -> HitsResult {
        hits(g, HITS_MAX_ITER, HITS_TOLERANCE, &CancelToken::new())
    }

    #[test]
    fn edgeless_graph_returns_zeros_without_iterating() {
        let result = run(&graph(&["a", "b"], &[]));
        assert_eq!(result.iterations, 0);
        assert_eq!(result.hubs, vec![0.0, 0.0]);
        assert_eq!(result.authorities, vec![0.0, 0.0]);
    }

    #[test]
    fn star_center_is_the_authority() {
        let g = graph(
            &["core", "a", "b", "c"],
            &[("a", "core"), ("b", "core"), ("c", "core")],
        );
        let result = run(&g);
        assert!(result.converged);
        assert!((value(&g, &result.authorities, "core") - 1.0).abs() < 1e-9);
        assert!(value(&g, &result.hubs, "a") > value(&g, &result.hubs, "core"));
    }

    #[test]
    fn scores_are_non_negative() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let result = run(&g);
        assert!(result.hubs.iter().chain(&result.authorities).all(|s| *s >= 0.0));
    }
}
