//! Strongly-connected-component condensation.
//!
//! Tarjan's algorithm emits SCCs in reverse topological order of the
//! condensed DAG. With edges pointing from dependent to dependency, that
//! means prerequisites come first, which is the order both the fallback
//! topological order and the critical-path passes want.

use petgraph::algo::tarjan_scc;

use super::build::DependencyGraph;

#[derive(Debug, Clone, Default)]
pub struct Condensation {
    /// Component id per node.
    pub component: Vec<usize>,
    /// Components, prerequisites first. Members sorted by issue ID.
    pub components: Vec<Vec<usize>>,
}

impl Condensation {
    #[must_use]
    pub fn new(graph: &DependencyGraph) -> Self {
        let mut component = vec![0; graph.node_count()];
        let components: Vec<Vec<usize>> = tarjan_scc(&graph.graph)
            .into_iter()
            .map(|scc| {
                let mut members: Vec<usize> = scc.into_iter().map(|ix| ix.index()).collect();
                members.sort_by(|&a, &b| graph.node_id(a).cmp(&graph.node_id(b)));
                members
            })
            .collect();

        for (cid, members) in components.iter().enumerate() {
            for &m in members {
                component[m] = cid;
            }
        }

        Self {
            component,
            components,
        }
    }

    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        self.components.iter().all(|c| c.len() == 1)
    }

    /// Every node, prerequisites before dependents.
    pub fn flattened(&self) -> impl Iterator<Item = usize> + '_ {
        self.components.iter().flatten().copied()
    }
}
