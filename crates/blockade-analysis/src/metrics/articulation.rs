//! Articulation points via iterative Tarjan low-link.
//!
//! A node is an articulation point when removing it splits its connected
//! component. On the undirected view, a DFS root qualifies with two or
//! more tree children; any other node `v` qualifies when some tree child
//! `c` has `low[c] >= disc[v]`. The DFS keeps an explicit stack so deep
//! dependency chains cannot overflow the thread stack.

use tracing::instrument;

use crate::graph::UndirectedView;

/// Articulation flag per node index.
#[must_use]
#[instrument(skip(view), fields(nodes = view.node_count()))]
pub fn articulation_points(view: &UndirectedView) -> Vec<bool> {
    let n = view.node_count();
    let mut disc = vec![0_usize; n];
    let mut low = vec![0_usize; n];
    let mut visited = vec![false; n];
    let mut is_ap = vec![false; n];
    let mut counter = 1;

    for root in 0..n {
        if visited[root] {
            continue;
        }

        visited[root] = true;
        disc[root] = counter;
        low[root] = counter;
        counter += 1;

        // (node, parent, next neighbour position); parent == usize::MAX for the root.
        let mut stack: Vec<(usize, usize, usize)> = vec![(root, usize::MAX, 0)];
        let mut root_children = 0;

        while let Some(frame) = stack.last_mut() {
            let (node, parent, next) = *frame;
            let neighbours = view.neighbors(node);

            if next < neighbours.len() {
                frame.2 += 1;
                let child = neighbours[next];
                if child == parent {
                    continue;
                }
                if visited[child] {
                    low[node] = low[node].min(disc[child]);
                } else {
                    visited[child] = true;
                    disc[child] = counter;
                    low[child] = counter;
                    counter += 1;
                    if node == root {
                        root_children += 1;
                    }
                    stack.push((child, node, 0));
                }
            } else {
                stack.pop();
                if let Some(&(up, _, _)) = stack.last() {
                    low[up] = low[up].min(low[node]);
                    if up != root && low[node] >= disc[up] {
                        is_ap[up] = true;
                    }
                }
            }
        }

        if root_children >= 2 {
            is_ap[root] = true;
        }
    }

    is_ap
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::graph;

    fn aps(nodes: &[&str], edges: &[(&str, &str)]) -> Vec<bool> {
        articulation_points(&UndirectedView::from_graph(&graph(nodes, edges)))
    }

    #[test]
    fn chain_interior_nodes_are_articulation_points() {
        let result = aps(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d")]);
        assert_eq!(result, vec![false, true, true, false]);
    }

    #[test]
    fn cycle_has_none() {
        let result = aps(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        assert_eq!(result, vec![false; 3]);
    }

    #[test]
    fn star_center_with_root_elsewhere() {
        // Root of the DFS is a leaf; the hub is found via low-link.
        let result = aps(&["leaf1", "hub", "leaf2", "leaf3"], &[
            ("leaf1", "hub"),
            ("leaf2", "hub"),
            ("leaf3", "hub"),
        ]);
        assert_eq!(result, vec![false, true, false, false]);
    }

    #[test]
    fn root_with_two_children() {
        let result = aps(&["hub", "x", "y"], &[("x", "hub"), ("y", "hub")]);
        assert_eq!(result, vec![true, false, false]);
    }

    #[test]
    fn bowtie_shares_one_cut_vertex() {
        // Two triangles joined at m.
        let result = aps(
            &["a", "b", "m", "c", "d"],
            &[("a", "b"), ("b", "m"), ("m", "a"), ("m", "c"), ("c", "d"), ("d", "m")],
        );
        assert_eq!(result, vec![false, false, true, false, false]);
    }

    #[test]
    fn empty_and_isolated() {
        assert!(aps(&[], &[]).is_empty());
        assert_eq!(aps(&["a", "b"], &[]), vec![false, false]);
    }
}
