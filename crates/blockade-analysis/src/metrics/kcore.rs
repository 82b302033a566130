//! K-core decomposition (Batagelj–Zaveršnik, 2003).
//!
//! # Algorithm
//!
//! Bucket-sort nodes by undirected degree, then repeatedly peel the
//! lowest-degree node. Each neighbour with a higher current degree drops
//! one bucket. A node's degree at the moment it is peeled is its core
//! number. O(V + E).

use tracing::instrument;

use crate::graph::UndirectedView;

/// Core number per node index.
#[must_use]
#[instrument(skip(view), fields(nodes = view.node_count()))]
pub fn core_numbers(view: &UndirectedView) -> Vec<usize> {
    let n = view.node_count();
    if n == 0 {
        return Vec::new();
    }

    let mut deg: Vec<usize> = (0..n).map(|v| view.degree(v)).collect();
    let max_deg = deg.iter().copied().max().unwrap_or(0);

    // bin[d]: start position of degree-d nodes inside `vert`.
    let mut bin = vec![0_usize; max_deg + 1];
    for &d in &deg {
        bin[d] += 1;
    }
    let mut start = 0;
    for slot in &mut bin {
        let count = *slot;
        *slot = start;
        start += count;
    }

    let mut pos = vec![0_usize; n];
    let mut vert = vec![0_usize; n];
    for v in 0..n {
        pos[v] = bin[deg[v]];
        vert[pos[v]] = v;
        bin[deg[v]] += 1;
    }
    // Restore bucket starts after the placement pass.
    for d in (1..=max_deg).rev() {
        bin[d] = bin[d - 1];
    }
    bin[0] = 0;

    for i in 0..n {
        let v = vert[i];
        for &u in view.neighbors(v) {
            if deg[u] > deg[v] {
                let du = deg[u];
                let pu = pos[u];
                let pw = bin[du];
                let w = vert[pw];
                if u != w {
                    pos[u] = pw;
                    vert[pu] = w;
                    pos[w] = pu;
                    vert[pw] = u;
                }
                bin[du] += 1;
                deg[u] -= 1;
            }
        }
    }

    deg
}
