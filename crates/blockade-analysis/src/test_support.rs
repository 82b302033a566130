use blockade_core::Issue;

use crate::graph::DependencyGraph;

/// Build a graph from node IDs and `(dependent, dependency)` edges.
pub fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
    DependencyGraph::build(&issues(nodes, edges))
}

/// Open issues with blocking dependencies given as `(dependent, dependency)`.
pub fn issues(nodes: &[&str], edges: &[(&str, &str)]) -> Vec<Issue> {
    nodes
        .iter()
        .map(|&id| {
            edges
                .iter()
                .filter(|(from, _)| *from == id)
                .fold(Issue::new(id, id.to_uppercase()), |issue, &(_, to)| {
                    issue.blocked_by(to)
                })
        })
        .collect()
}

/// Score of `id` in a per-index vector.
pub fn value(graph: &DependencyGraph, values: &[f64], id: &str) -> f64 {
    values[graph.node_index(id).expect("node exists")]
}
