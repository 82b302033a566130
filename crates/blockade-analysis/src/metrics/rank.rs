//! Dense 1-based rankings.
//!
//! Rank 1 is the highest score. Ties are broken by ascending issue ID so
//! the ranking is total and identical across runs.

use std::cmp::Ordering;

use crate::graph::NodeIds;

/// Rank per node index for floating-point scores.
#[must_use]
pub fn float_ranks(ids: &NodeIds, scores: &[f64]) -> Vec<usize> {
    ranks_by(ids, scores, |a, b| b.total_cmp(a))
}

/// Rank per node index for integer scores such as degrees.
#[must_use]
pub fn int_ranks(ids: &NodeIds, scores: &[usize]) -> Vec<usize> {
    ranks_by(ids, scores, |a, b| b.cmp(a))
}

fn ranks_by<T>(ids: &NodeIds, scores: &[T], desc: impl Fn(&T, &T) -> Ordering) -> Vec<usize> {
    let names = ids.as_slice();
    let mut order: Vec<usize> = (0..scores.len().min(names.len())).collect();
    order.sort_by(|&a, &b| desc(&scores[a], &scores[b]).then_with(|| names[a].cmp(&names[b])));

    let mut ranks = vec![0; order.len()];
    for (pos, idx) in order.into_iter().enumerate() {
        ranks[idx] = pos + 1;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> NodeIds {
        NodeIds::from(names.iter().map(|s| (*s).to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn highest_score_ranks_first() {
        let ranks = float_ranks(&ids(&["a", "b", "c"]), &[0.1, 0.7, 0.2]);
        assert_eq!(ranks, vec![3, 1, 2]);
    }

    #[test]
    fn ties_break_by_ascending_id() {
        let ranks = int_ranks(&ids(&["zeta", "alpha", "mid"]), &[2, 2, 5]);
        assert_eq!(ranks, vec![3, 2, 1]);
    }

    #[test]
    fn empty_input() {
        assert!(float_ranks(&ids(&[]), &[]).is_empty());
    }
}
