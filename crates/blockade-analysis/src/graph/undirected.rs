//! Undirected projection of the dependency graph.
//!
//! K-core and articulation points ignore edge direction. This view merges
//! `u → v` and `v → u` into a single undirected edge and drops self-loops,
//! so every neighbour list is duplicate-free and sorted.

use super::build::DependencyGraph;

/// Deduplicated undirected adjacency over the same dense indices.
#[derive(Debug, Clone, Default)]
pub struct UndirectedView {
    adjacency: Vec<Vec<usize>>,
}

impl UndirectedView {
    #[must_use]
    pub fn from_graph(graph: &DependencyGraph) -> Self {
        let n = graph.node_count();
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (u, v) in graph.edges() {
            if u != v {
                adjacency[u].push(v);
                adjacency[v].push(u);
            }
        }

        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
        }

        Self { adjacency }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    #[must_use]
    pub fn neighbors(&self, idx: usize) -> &[usize] {
        self.adjacency.get(idx).map_or(&[][..], Vec::as_slice)
    }

    #[must_use]
    pub fn degree(&self, idx: usize) -> usize {
        self.neighbors(idx).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockade_core::Issue;

    #[test]
    fn mutual_edges_collapse() {
        let issues = vec![
            Issue::new("a", "A").blocked_by("b"),
            Issue::new("b", "B").blocked_by("a").blocked_by("c"),
            Issue::new("c", "C"),
        ];
        let view = UndirectedView::from_graph(&DependencyGraph::build(&issues));
        assert_eq!(view.neighbors(0), &[1]);
        assert_eq!(view.neighbors(1), &[0, 2]);
        assert_eq!(view.degree(2), 1);
        assert!(view.neighbors(9).is_empty());
    }
}
