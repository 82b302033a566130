//! Graph construction from an issue list.
//!
//! # Overview
//!
//! Every issue becomes one node with a dense zero-based index assigned in
//! input order. That index is the only identity the metric code uses:
//! per-node state lives in flat `Vec`s, and [`NodeIds`] maps back to issue
//! identifiers at the edges of the engine.
//!
//! ## Edge Direction
//!
//! An edge `u → v` means "u depends on v": v must be closed before u is
//! unblocked. This is the reverse of an execution-order view, where the
//! prerequisite comes first.
//!
//! ## Only Blocking Edges
//!
//! Only [`DependencyType::Blocks`](blockade_core::DependencyType) creates
//! edges. Dependencies on unknown issues are dropped, duplicates collapse
//! to one edge, and self-references never produce a loop.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use blockade_core::Issue;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

// ---------------------------------------------------------------------------
// NodeIds
// ---------------------------------------------------------------------------

/// Bidirectional, immutable mapping between issue IDs and node indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct NodeIds {
    ids: Vec<String>,
    index: HashMap<String, usize>,
}

impl NodeIds {
    fn push(&mut self, id: &str) -> Option<usize> {
        if self.index.contains_key(id) {
            return None;
        }
        let idx = self.ids.len();
        self.ids.push(id.to_string());
        self.index.insert(id.to_string(), idx);
        Some(idx)
    }

    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    #[must_use]
    pub fn id(&self, idx: usize) -> Option<&str> {
        self.ids.get(idx).map(String::as_str)
    }

    /// IDs in index order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Pair every index with a value from `values` (indexed the same way).
    #[must_use]
    pub fn zip_map<T: Clone>(&self, values: &[T]) -> HashMap<String, T> {
        self.ids
            .iter()
            .zip(values)
            .map(|(id, v)| (id.clone(), v.clone()))
            .collect()
    }
}

impl From<Vec<String>> for NodeIds {
    fn from(ids: Vec<String>) -> Self {
        let mut out = Self::default();
        for id in &ids {
            out.push(id);
        }
        out
    }
}

impl From<NodeIds> for Vec<String> {
    fn from(ids: NodeIds) -> Self {
        ids.ids
    }
}

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// Index-addressed directed dependency graph.
///
/// Adjacency lists are kept sorted by index so that every numeric
/// algorithm accumulates in the same order on every run.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// petgraph view used for topological sort and SCC partitioning.
    /// Node weights are issue IDs; `NodeIndex::index()` equals the dense index.
    pub graph: DiGraph<String, ()>,
    ids: Arc<NodeIds>,
    /// `dependencies[u]`: nodes `v` with `u → v`.
    dependencies: Vec<Vec<usize>>,
    /// `dependents[v]`: nodes `u` with `u → v`.
    dependents: Vec<Vec<usize>>,
    edge_count: usize,
}

impl DependencyGraph {
    /// Build the graph in O(issues + dependencies).
    ///
    /// Construction never fails. A repeated issue ID keeps its first
    /// occurrence.
    #[must_use]
    #[instrument(skip(issues), fields(issues = issues.len()))]
    pub fn build(issues: &[Issue]) -> Self {
        let mut ids = NodeIds::default();
        let mut graph = DiGraph::<String, ()>::with_capacity(issues.len(), issues.len());
        let mut owners: Vec<&Issue> = Vec::with_capacity(issues.len());

        for issue in issues {
            if ids.push(&issue.id).is_some() {
                graph.add_node(issue.id.clone());
                owners.push(issue);
            } else {
                debug!(id = %issue.id, "duplicate issue id ignored");
            }
        }

        let n = ids.len();
        let mut dependencies: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut seen: HashSet<(usize, usize)> = HashSet::new();

        for (u, issue) in owners.iter().enumerate() {
            for target in issue.blocking_targets() {
                let Some(v) = ids.index_of(target) else {
                    continue;
                };
                if u == v || !seen.insert((u, v)) {
                    continue;
                }
                graph.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
                dependencies[u].push(v);
                dependents[v].push(u);
            }
        }

        for list in dependencies.iter_mut().chain(dependents.iter_mut()) {
            list.sort_unstable();
        }

        Self {
            graph,
            ids: Arc::new(ids),
            dependencies,
            dependents,
            edge_count: seen.len(),
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.ids.index_of(id)
    }

    #[must_use]
    pub fn node_id(&self, idx: usize) -> Option<&str> {
        self.ids.id(idx)
    }

    /// Shared handle to the ID mapping, for result storage.
    #[must_use]
    pub fn ids(&self) -> Arc<NodeIds> {
        Arc::clone(&self.ids)
    }

    /// What `idx` depends on (outgoing edges).
    #[must_use]
    pub fn dependencies_of(&self, idx: usize) -> &[usize] {
        self.dependencies.get(idx).map_or(&[][..], Vec::as_slice)
    }

    /// What depends on `idx` (incoming edges).
    #[must_use]
    pub fn dependents_of(&self, idx: usize) -> &[usize] {
        self.dependents.get(idx).map_or(&[][..], Vec::as_slice)
    }

    /// All edges `(u, v)` with `u → v`, ordered by `u` then `v`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.dependencies
            .iter()
            .enumerate()
            .flat_map(|(u, vs)| vs.iter().map(move |&v| (u, v)))
    }

    /// Density `e / (n·(n−1))`, zero for fewer than two nodes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn density(&self) -> f64 {
        let n = self.node_count();
        if n < 2 {
            return 0.0;
        }
        self.edge_count as f64 / (n as f64 * (n as f64 - 1.0))
    }

    /// Content hash of the graph's structure.
    ///
    /// Covers sorted node IDs and the sorted edge list, so it is stable
    /// under input reordering and changes whenever a node or edge does.
    /// Titles, statuses and priorities are not part of it.
    #[must_use]
    pub fn structure_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();

        let mut sorted: Vec<&str> = self.ids.as_slice().iter().map(String::as_str).collect();
        sorted.sort_unstable();
        for id in &sorted {
            hasher.update(id.as_bytes());
            hasher.update(b"\0");
        }
        hasher.update(b"\x01");

        let mut edges: Vec<(&str, &str)> = self
            .edges()
            .filter_map(|(u, v)| Some((self.node_id(u)?, self.node_id(v)?)))
            .collect();
        edges.sort_unstable();
        for (from, to) in edges {
            hasher.update(from.as_bytes());
            hasher.update(b"\0");
            hasher.update(to.as_bytes());
            hasher.update(b"\0");
        }

        short_hex(&hasher.finalize())
    }
}

/// First 16 hex characters of a blake3 digest.
pub(crate) fn short_hex(hash: &blake3::Hash) -> String {
    let mut hex = hash.to_hex().to_string();
    hex.truncate(16);
    hex
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use blockade_core::{DependencyType, Status};

    fn issue(id: &str, deps: &[&str]) -> Issue {
        deps.iter()
            .fold(Issue::new(id, id.to_uppercase()), |i, d| i.blocked_by(*d))
    }

    #[test]
    fn empty_input_builds_empty_graph() {
        let g = DependencyGraph::build(&[]);
        assert!(g.is_empty());
        assert_eq!(g.edge_count(), 0);
        assert!(g.density().abs() < f64::EPSILON);
    }

    #[test]
    fn indices_follow_input_order() {
        let g = DependencyGraph::build(&[issue("b", &[]), issue("a", &[])]);
        assert_eq!(g.node_index("b"), Some(0));
        assert_eq!(g.node_index("a"), Some(1));
        assert_eq!(g.node_id(1), Some("a"));
        assert_eq!(g.node_id(2), None);
    }

    #[test]
    fn edge_points_from_dependent_to_dependency() {
        let g = DependencyGraph::build(&[issue("a", &["b"]), issue("b", &[])]);
        assert_eq!(g.dependencies_of(0), &[1]);
        assert_eq!(g.dependents_of(1), &[0]);
        assert!(g.graph.contains_edge(NodeIndex::new(0), NodeIndex::new(1)));
    }

    #[test]
    fn missing_targets_and_self_loops_are_dropped() {
        let g = DependencyGraph::build(&[issue("a", &["ghost", "a", "b", "b"]), issue("b", &[])]);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.graph.edge_count(), 1);
    }

    #[test]
    fn non_blocking_types_create_no_edges() {
        let a = Issue::new("a", "A")
            .with_dependency("b", DependencyType::Related)
            .with_dependency("b", DependencyType::ParentChild)
            .with_dependency("b", DependencyType::DiscoveredFrom);
        let g = DependencyGraph::build(&[a, issue("b", &[])]);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn duplicate_issue_keeps_first() {
        let g = DependencyGraph::build(&[issue("a", &["b"]), issue("b", &[]), issue("a", &[])]);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn density_counts_directed_pairs() {
        let g = DependencyGraph::build(&[issue("a", &["b"]), issue("b", &["a"])]);
        assert!((g.density() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn structure_hash_ignores_order_and_payload() {
        let one = DependencyGraph::build(&[issue("a", &["b"]), issue("b", &[])]);
        let two = DependencyGraph::build(&[
            issue("b", &[]).with_status(Status::Closed),
            issue("a", &["b", "b"]),
        ]);
        assert_eq!(one.structure_hash(), two.structure_hash());
        assert_eq!(one.structure_hash().len(), 16);

        let three = DependencyGraph::build(&[issue("a", &[]), issue("b", &["a"])]);
        assert_ne!(one.structure_hash(), three.structure_hash());
    }

    #[test]
    fn node_ids_round_trip_through_serde() {
        let g = DependencyGraph::build(&[issue("x", &[]), issue("y", &[])]);
        let json = serde_json::to_string(g.ids().as_ref()).expect("serialize");
        assert_eq!(json, r#"["x","y"]"#);
        let back: NodeIds = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.index_of("y"), Some(1));
    }
}
