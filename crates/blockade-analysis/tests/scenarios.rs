//! Known-topology scenarios run through the public `Analyzer` API.
//!
//! Each test builds a small hand-crafted issue set whose structural
//! answers are known, runs the full two-phase analysis, and checks both
//! the blocking queries and the published metrics.

use std::{sync::Arc, time::Duration};

use blockade_analysis::{AnalysisConfig, Analyzer, MetricState, StatsCache, normalize_cycle};
use blockade_core::{Issue, Status};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Open issues; each edge is `(dependent, dependency)`.
fn issues(nodes: &[&str], edges: &[(&str, &str)]) -> Vec<Issue> {
    nodes
        .iter()
        .map(|&id| {
            edges
                .iter()
                .filter(|(from, _)| *from == id)
                .fold(Issue::new(id, format!("Issue {id}")), |issue, &(_, to)| issue.blocked_by(to))
        })
        .collect()
}

fn analyzer(input: Vec<Issue>) -> Analyzer {
    Analyzer::new(input)
        .with_cache(Arc::new(StatsCache::new()))
        .with_config(AnalysisConfig::full())
}

fn actionable(a: &Analyzer) -> Vec<String> {
    a.actionable_issues().iter().map(|i| i.id.clone()).collect()
}

fn close(mut input: Vec<Issue>, id: &str) -> Vec<Issue> {
    for issue in &mut input {
        if issue.id == id {
            issue.status = Status::Closed;
        }
    }
    input
}

// ===========================================================================
// Empty input
// ===========================================================================

#[test]
fn empty_input_yields_empty_maps() {
    let a = analyzer(Vec::new());
    let stats = a.analyze();

    assert!(stats.is_ready());
    assert_eq!(stats.node_count(), 0);
    assert!(stats.pagerank().is_empty());
    assert!(stats.betweenness().is_empty());
    assert!(stats.critical_path_score().is_empty());
    assert!(stats.cycles().is_empty());
    assert!(a.actionable_issues().is_empty());
    for (name, status) in stats.status().entries() {
        assert_ne!(status.state, MetricState::Panic, "{name} faulted");
    }
}

// ===========================================================================
// Chain: A → B → C
// ===========================================================================

#[test]
fn chain_actionable_and_heights() {
    let a = analyzer(issues(&["A", "B", "C"], &[("A", "B"), ("B", "C")]));
    assert_eq!(actionable(&a), vec!["C"]);

    let stats = a.analyze();
    assert!(stats.is_acyclic());
    assert_eq!(stats.critical_path_value("C"), Some(3.0));
    assert_eq!(stats.critical_path_value("B"), Some(2.0));
    assert_eq!(stats.critical_path_value("A"), Some(1.0));
    assert_eq!(stats.critical_path_rank("C"), Some(1));
    assert_eq!(stats.topological_order(), vec!["C", "B", "A"]);
}

#[test]
fn chain_is_all_zero_slack() {
    let stats = analyzer(issues(&["A", "B", "C"], &[("A", "B"), ("B", "C")])).analyze();
    for id in ["A", "B", "C"] {
        assert_eq!(stats.slack_value(id), Some(0.0), "{id} is on the longest path");
    }
}

// ===========================================================================
// Diamond: A → {B, C}, B → D, C → D
// ===========================================================================

fn diamond() -> Vec<Issue> {
    issues(&["A", "B", "C", "D"], &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")])
}

#[test]
fn diamond_closing_d_unblocks_both_branches() {
    let a = analyzer(diamond());
    assert_eq!(actionable(&a), vec!["D"]);
    assert_eq!(a.unblocks("D"), vec!["B", "C"]);

    let closed = analyzer(close(diamond(), "D"));
    assert_eq!(actionable(&closed), vec!["B", "C"]);
}

#[test]
fn diamond_branches_split_betweenness() {
    let stats = analyzer(diamond()).analyze();
    let b = stats.betweenness_value("B").unwrap_or_default();
    let c = stats.betweenness_value("C").unwrap_or_default();
    assert!(b > 0.0);
    assert!((b - c).abs() < 1e-9, "symmetric branches: {b} vs {c}");
    assert_eq!(stats.betweenness_value("A"), Some(0.0));
}

#[test]
fn diamond_eigenvector_settles_on_shared_dependency() {
    let stats = analyzer(diamond()).analyze();
    assert_eq!(stats.status().eigenvector.state, MetricState::Computed);

    let d = stats.eigenvector_value("D").expect("D scored");
    assert!((d - 1.0).abs() < 1e-9, "D = {d}");
    assert_eq!(stats.eigenvector_rank("D"), Some(1));
    for id in ["A", "B", "C"] {
        assert!(stats.eigenvector_value(id).is_some_and(|v| v.abs() < 1e-12), "{id}");
    }
}

#[test]
fn off_path_node_has_positive_slack() {
    // A → B → C → D is the longest path; E hangs off D alone.
    let stats = analyzer(issues(
        &["A", "B", "C", "D", "E"],
        &[("A", "B"), ("B", "C"), ("C", "D"), ("E", "D")],
    ))
    .analyze();
    assert_eq!(stats.slack_value("A"), Some(0.0));
    assert_eq!(stats.slack_value("D"), Some(0.0));
    assert!(stats.slack_value("E").unwrap_or_default() > 0.0);
}

// ===========================================================================
// Cycle: A → B → C → A
// ===========================================================================

#[test]
fn cycle_blocks_everything_until_broken() {
    let input = issues(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("C", "A")]);
    let a = analyzer(input.clone());
    assert!(a.actionable_issues().is_empty());

    let stats = a.analyze();
    assert!(!stats.is_acyclic());
    assert_eq!(stats.topological_order().len(), 3);
    let cycles = stats.cycles();
    assert_eq!(cycles.len(), 1);
    assert_eq!(normalize_cycle(&cycles[0]).len(), 3);

    let broken = analyzer(close(input, "C"));
    assert_eq!(actionable(&broken), vec!["B"]);
}

#[test]
fn cycle_rotations_normalize_together() {
    let rot = |v: &[&str]| normalize_cycle(&v.iter().map(ToString::to_string).collect::<Vec<_>>());
    let expected = rot(&["A", "B", "C"]);
    assert_eq!(rot(&["B", "C", "A"]), expected);
    assert_eq!(rot(&["C", "A", "B"]), expected);
    assert_eq!(expected, vec!["A", "B", "C"]);
}

// ===========================================================================
// PageRank
// ===========================================================================

#[test]
fn pagerank_single_node_scores_one() {
    let stats = analyzer(issues(&["solo"], &[])).analyze();
    let score = stats.pagerank_value("solo").unwrap_or_default();
    assert!((score - 1.0).abs() < 1e-6, "got {score}");
}

#[test]
fn pagerank_mutual_pair_is_balanced() {
    let stats = analyzer(issues(&["A", "B"], &[("A", "B"), ("B", "A")])).analyze();
    let a = stats.pagerank_value("A").unwrap_or_default();
    let b = stats.pagerank_value("B").unwrap_or_default();
    assert!((a - b).abs() < 0.1, "A={a} B={b}");
}

#[test]
fn pagerank_timeout_falls_back_to_uniform() {
    let config = AnalysisConfig {
        pagerank_timeout: Duration::ZERO,
        ..AnalysisConfig::full()
    };
    let a = Analyzer::new(issues(&["A", "B", "C", "D"], &[("A", "B"), ("B", "C"), ("C", "D")]))
        .with_cache(Arc::new(StatsCache::new()))
        .with_config(config);
    let stats = a.analyze();

    assert_eq!(stats.status().pagerank.state, MetricState::Timeout);
    for score in stats.pagerank().values() {
        assert!((score - 0.25).abs() < 1e-12);
    }
}

// ===========================================================================
// Articulation and k-core
// ===========================================================================

#[test]
fn bridge_node_is_articulation_point() {
    // Two triangles joined through M.
    let stats = analyzer(issues(
        &["A", "B", "M", "X", "Y"],
        &[("A", "B"), ("B", "M"), ("M", "A"), ("M", "X"), ("X", "Y"), ("Y", "M")],
    ))
    .analyze();
    assert_eq!(stats.articulation_points(), vec!["M"]);
    assert_eq!(stats.core_number_value("A"), Some(2));
    assert_eq!(stats.is_articulation_point("A"), Some(false));
}
