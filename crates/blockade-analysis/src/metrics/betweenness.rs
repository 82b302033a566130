//! Betweenness centrality via Brandes' algorithm, exact or sampled.
//!
//! # Overview
//!
//! Betweenness measures how often a node lies on shortest dependency
//! paths between other pairs. High-betweenness issues are bottlenecks:
//! many chains of work route through them.
//!
//! # Algorithm
//!
//! Brandes (2001) for unweighted directed graphs:
//!
//! 1. For each source `s`, BFS to count shortest paths and distances.
//! 2. Accumulate dependencies in reverse BFS order.
//! 3. Sum across sources.
//!
//! Exact mode uses every node as a source: O(V·E). Approximate mode
//! (Brandes & Pich, 2007) uses `k` pivots drawn with a seeded RNG and
//! scales the sum by `n / k`, trading accuracy for O(k·E). When `k ≥ n`
//! the approximation is the exact computation and is reported as such.
//!
//! # Output
//!
//! Raw, unnormalized scores per node index.

use std::collections::VecDeque;

use rand::{SeedableRng, rngs::StdRng, seq::index::sample};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{cancel::CancelToken, graph::DependencyGraph};

/// Which betweenness computation ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetweennessMode {
    #[default]
    Exact,
    Approximate,
}

impl BetweennessMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Approximate => "approximate",
        }
    }
}

/// Result of a betweenness computation.
#[derive(Debug, Clone, PartialEq)]
pub struct BetweennessResult {
    /// Score per node index.
    pub scores: Vec<f64>,
    pub mode: BetweennessMode,
    /// Pivots used; equals `total_nodes` in exact mode.
    pub sample_size: usize,
    pub total_nodes: usize,
    /// False when cancelled before every source was processed.
    pub completed: bool,
}

/// Exact betweenness: every node is a BFS source.
#[must_use]
#[instrument(skip(graph, cancel), fields(nodes = graph.node_count()))]
pub fn betweenness(graph: &DependencyGraph, cancel: &CancelToken) -> BetweennessResult {
    let n = graph.node_count();
    let (scores, completed) = accumulate(graph, 0..n, cancel);
    BetweennessResult {
        scores,
        mode: BetweennessMode::Exact,
        sample_size: n,
        total_nodes: n,
        completed,
    }
}

/// Sampled betweenness with `sample_size` pivots (clamped to at least 1).
///
/// Falls back to [`betweenness`] when the sample would cover every node.
#[must_use]
#[instrument(skip(graph, cancel), fields(nodes = graph.node_count()))]
#[allow(clippy::cast_precision_loss)]
pub fn approximate_betweenness(
    graph: &DependencyGraph,
    sample_size: usize,
    seed: u64,
    cancel: &CancelToken,
) -> BetweennessResult {
    let n = graph.node_count();
    let k = sample_size.max(1);
    if k >= n {
        return betweenness(graph, cancel);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut pivots: Vec<usize> = sample(&mut rng, n, k).into_vec();
    pivots.sort_unstable();

    let (mut scores, completed) = accumulate(graph, pivots, cancel);
    let scale = n as f64 / k as f64;
    for s in &mut scores {
        *s *= scale;
    }

    BetweennessResult {
        scores,
        mode: BetweennessMode::Approximate,
        sample_size: k,
        total_nodes: n,
        completed,
    }
}

/// Recommended pivot count for approximate mode, by node count.
#[must_use]
pub fn recommend_sample_size(nodes: usize) -> usize {
    match nodes {
        n if n < 100 => n,
        n if n < 500 => (n / 5).clamp(50, 100),
        n if n < 2000 => 100,
        _ => 200,
    }
}

/// Brandes accumulation from the given sources.
fn accumulate(
    graph: &DependencyGraph,
    sources: impl IntoIterator<Item = usize>,
    cancel: &CancelToken,
) -> (Vec<f64>, bool) {
    let n = graph.node_count();
    let mut cb = vec![0.0_f64; n];

    let mut stack: Vec<usize> = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0_f64; n];
    let mut dist = vec![-1_i64; n];
    let mut delta = vec![0.0_f64; n];
    let mut queue: VecDeque<usize> = VecDeque::new();

    for s in sources {
        if cancel.is_cancelled() {
            return (cb, false);
        }

        stack.clear();
        for p in &mut predecessors {
            p.clear();
        }
        sigma.fill(0.0);
        dist.fill(-1);
        delta.fill(0.0);

        sigma[s] = 1.0;
        dist[s] = 0;
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in graph.dependencies_of(v) {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                if sigma[w] > 0.0 {
                    delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
                }
            }
            if w != s {
                cb[w] += delta[w];
            }
        }
    }

    (cb, true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
