//! Critical-path heights and longest-path slack.
//!
//! # Definitions
//!
//! All lengths count sequential steps; every issue is one step.
//!
//! | Term     | Definition |
//! |----------|------------|
//! | `height` | Number of issues in the longest chain of dependents ending at this issue, inclusive. An issue nothing depends on has height 1. |
//! | `dist_from_start` | Edges on the longest prerequisite chain leading into the issue. |
//! | `dist_to_end` | Edges on the longest chain of dependents leading out of it. |
//! | `slack`  | `longest − dist_from_start − dist_to_end`; zero on a longest path. |
//!
//! # Algorithm
//!
//! Both computations are linear dynamic programs over the
//! [`Condensation`], so they stay well-defined when the graph has cycles:
//! members of one cycle share a super-node and therefore share their
//! height and slack. On an acyclic graph every super-node is a single
//! issue and the results are the plain per-node definitions.

use tracing::instrument;

use super::{build::DependencyGraph, condense::Condensation};

/// Height of every node, indexed like the graph.
///
/// `height(v) = 1 + max height(u)` over all `u` that depend on `v`.
/// For the chain `a → b → c` this gives `a = 1`, `b = 2`, `c = 3`.
#[must_use]
#[instrument(skip_all, fields(nodes = graph.node_count()))]
#[allow(clippy::cast_precision_loss)]
pub fn critical_path_heights(graph: &DependencyGraph, cond: &Condensation) -> Vec<f64> {
    let mut comp_height = vec![0_usize; cond.components.len()];

    // Dependents first: walk the prerequisite-first order backwards.
    for (cid, members) in cond.components.iter().enumerate().rev() {
        let best = members
            .iter()
            .flat_map(|&m| graph.dependents_of(m))
            .map(|&p| cond.component[p])
            .filter(|&pc| pc != cid)
            .map(|pc| comp_height[pc])
            .max()
            .unwrap_or(0);
        comp_height[cid] = best + 1;
    }

    (0..graph.node_count())
        .map(|i| comp_height[cond.component[i]] as f64)
        .collect()
}

/// Per-node slack on the execution-order view.
#[must_use]
#[instrument(skip_all, fields(nodes = graph.node_count()))]
#[allow(clippy::cast_precision_loss)]
pub fn slack(graph: &DependencyGraph, cond: &Condensation) -> Vec<f64> {
    let comps = cond.components.len();
    let mut from_start = vec![0_usize; comps];
    let mut to_end = vec![0_usize; comps];

    // Forward pass: prerequisites are already settled.
    for (cid, members) in cond.components.iter().enumerate() {
        from_start[cid] = members
            .iter()
            .flat_map(|&m| graph.dependencies_of(m))
            .map(|&q| cond.component[q])
            .filter(|&qc| qc != cid)
            .map(|qc| from_start[qc] + 1)
            .max()
            .unwrap_or(0);
    }

    // Backward pass: dependents are already settled.
    for (cid, members) in cond.components.iter().enumerate().rev() {
        to_end[cid] = members
            .iter()
            .flat_map(|&m| graph.dependents_of(m))
            .map(|&p| cond.component[p])
            .filter(|&pc| pc != cid)
            .map(|pc| to_end[pc] + 1)
            .max()
            .unwrap_or(0);
    }

    let longest = (0..comps)
        .map(|c| from_start[c] + to_end[c])
        .max()
        .unwrap_or(0);

    (0..graph.node_count())
        .map(|i| {
            let c = cond.component[i];
            (longest - from_start[c] - to_end[c]) as f64
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
