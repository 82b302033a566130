//! Cycle detection and bounded cycle enumeration.
//!
//! # Algorithm
//!
//! Detection is a Tarjan SCC pass: the graph is cyclic iff some SCC has
//! more than one member (self-loops never exist in a [`DependencyGraph`]).
//! Enumeration only runs when detection says so.
//!
//! Enumeration lists elementary cycles one SCC at a time. Nodes of an SCC
//! are ranked by ID; for each start node `s` a DFS walks only through
//! higher-ranked members looking for an edge back to `s`. Every elementary
//! cycle is therefore produced exactly once, already rotated to its
//! smallest ID. The walk stops as soon as one more cycle than the caller's
//! bound has been seen, and polls a [`CancelToken`] at every step so a
//! timed-out enumeration stops promptly.
//!
//! # Output
//!
//! Cycles are open paths (`[a, b, c]` for `a → b → c → a`) in canonical
//! rotation, sorted by length then lexicographically.

use petgraph::algo::tarjan_scc;
use tracing::instrument;

use super::build::DependencyGraph;
use crate::cancel::CancelToken;

/// Outcome of a bounded enumeration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleEnumeration {
    /// Canonical cycles, at most the requested bound.
    pub cycles: Vec<Vec<String>>,
    /// More cycles exist than were kept.
    pub truncated: bool,
    /// False when the enumeration was cancelled part-way.
    pub completed: bool,
}

/// Whether the graph contains at least one directed cycle.
#[must_use]
pub fn has_cycles(graph: &DependencyGraph) -> bool {
    tarjan_scc(&graph.graph).iter().any(|scc| scc.len() > 1)
}

/// Enumerate up to `max_cycles` elementary cycles.
#[must_use]
#[instrument(skip(graph, cancel), fields(nodes = graph.node_count()))]
pub fn enumerate_cycles(
    graph: &DependencyGraph,
    max_cycles: usize,
    cancel: &CancelToken,
) -> CycleEnumeration {
    let n = graph.node_count();
    let mut found: Vec<Vec<usize>> = Vec::new();
    let limit = max_cycles.saturating_add(1);

    // Component id per node, and the SCCs that can hold a cycle.
    let mut component = vec![usize::MAX; n];
    let mut cyclic: Vec<Vec<usize>> = Vec::new();
    for scc in tarjan_scc(&graph.graph) {
        if scc.len() < 2 {
            continue;
        }
        let cid = cyclic.len();
        let mut members: Vec<usize> = scc.iter().map(|ix| ix.index()).collect();
        for &m in &members {
            component[m] = cid;
        }
        members.sort_by(|&a, &b| graph.node_id(a).cmp(&graph.node_id(b)));
        cyclic.push(members);
    }

    // Rank inside its SCC by ID; the DFS from `s` only enters higher ranks.
    let mut rank = vec![0_usize; n];
    for members in &cyclic {
        for (r, &m) in members.iter().enumerate() {
            rank[m] = r;
        }
    }

    let mut completed = true;
    'outer: for (cid, members) in cyclic.iter().enumerate() {
        for &start in members {
            if found.len() >= limit {
                break 'outer;
            }
            if !cycles_from(graph, start, cid, &component, &rank, limit, cancel, &mut found) {
                completed = false;
                break 'outer;
            }
        }
    }

    let truncated = found.len() > max_cycles;
    let mut cycles: Vec<Vec<String>> = found
        .into_iter()
        .map(|cycle| {
            cycle
                .into_iter()
                .filter_map(|i| graph.node_id(i).map(str::to_string))
                .collect()
        })
        .collect();
    cycles.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    cycles.truncate(max_cycles);

    CycleEnumeration {
        cycles,
        truncated,
        completed,
    }
}

/// DFS for cycles through `start`. Returns false if cancelled.
#[allow(clippy::too_many_arguments)]
fn cycles_from(
    graph: &DependencyGraph,
    start: usize,
    cid: usize,
    component: &[usize],
    rank: &[usize],
    limit: usize,
    cancel: &CancelToken,
    found: &mut Vec<Vec<usize>>,
) -> bool {
    let mut on_path = vec![false; component.len()];
    let mut path: Vec<usize> = vec![start];
    // (node, next neighbour position)
    let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
    on_path[start] = true;

    while let Some(frame) = stack.last_mut() {
        if cancel.is_cancelled() {
            return false;
        }
        if found.len() >= limit {
            return true;
        }

        let (node, pos) = *frame;
        let neighbours = graph.dependencies_of(node);
        if pos < neighbours.len() {
            frame.1 += 1;
            let next = neighbours[pos];

            if component[next] != cid {
                continue;
            }
            if next == start {
                found.push(path.clone());
            } else if rank[next] > rank[start] && !on_path[next] {
                on_path[next] = true;
                path.push(next);
                stack.push((next, 0));
            }
        } else {
            stack.pop();
            if let Some(done) = path.pop() {
                on_path[done] = false;
            }
        }
    }

    true
}

// ---------------------------------------------------------------------------
// Canonical form
// ---------------------------------------------------------------------------

/// Rotate a cycle so it starts at its lexicographically smallest ID.
///
/// Accepts open (`[a, b, c]`) or closed (`[a, b, c, a]`) paths and returns
/// the open form, so every rotation of one cycle maps to the same value.
#[must_use]
pub fn normalize_cycle(cycle: &[String]) -> Vec<String> {
    let open = match cycle {
        [first, .., last] if first == last => &cycle[..cycle.len() - 1],
        _ => cycle,
    };

    let Some(min_pos) = open
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(i, _)| i)
    else {
        return Vec::new();
    };

    open[min_pos..]
        .iter()
        .chain(&open[..min_pos])
        .cloned()
        .collect()
}

/// Stable string key for a cycle: its canonical form joined with `->`.
#[must_use]
pub fn cycle_key(cycle: &[String]) -> String {
    normalize_cycle(cycle).join("->")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
