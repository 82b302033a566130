//! The result store for one analysis run.
//!
//! # Overview
//!
//! [`GraphStats`] holds two kinds of data:
//!
//! - **Phase 1** ([`FastMetrics`]): degree, topological order, density.
//!   Set at construction and never mutated.
//! - **Phase 2** ([`Phase2Metrics`]): the expensive centralities, cycles
//!   and per-metric status. Computed in the background and published once
//!   as an immutable snapshot behind an `RwLock<Option<Arc<_>>>`.
//!
//! Readers either see no Phase 2 data at all or the complete snapshot.
//! Single-value accessors clone only the `Arc`; bulk accessors build a
//! fresh `HashMap` the caller owns.

use std::{
    collections::HashMap,
    sync::{Arc, Condvar, Mutex, PoisonError, RwLock},
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::AnalysisConfig,
    graph::{DependencyGraph, NodeIds},
    metrics::{
        BetweennessMode,
        basic::FastMetrics,
        rank::float_ranks,
    },
    pipeline::profile::StartupProfile,
};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Outcome of one Phase 2 metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricState {
    #[default]
    Pending,
    Computed,
    /// Computed from a sample; see [`MetricStatus::sample_size`].
    Approx,
    Timeout,
    Skipped,
    /// The background task faulted; no Phase 2 data is available.
    Panic,
}

impl MetricState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Computed => "computed",
            Self::Approx => "approx",
            Self::Timeout => "timeout",
            Self::Skipped => "skipped",
            Self::Panic => "panic",
        }
    }
}

/// State, reason and timing for a single metric.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricStatus {
    pub state: MetricState,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<usize>,
    #[serde(default, rename = "ms", with = "elapsed_ms")]
    pub elapsed: Duration,
}

impl MetricStatus {
    #[must_use]
    pub const fn computed(elapsed: Duration) -> Self {
        Self {
            state: MetricState::Computed,
            reason: String::new(),
            sample_size: None,
            elapsed,
        }
    }

    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            state: MetricState::Skipped,
            reason: reason.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn timeout(reason: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            state: MetricState::Timeout,
            reason: reason.into(),
            sample_size: None,
            elapsed,
        }
    }
}

/// Status record for every Phase 2 metric.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase2Status {
    pub pagerank: MetricStatus,
    pub betweenness: MetricStatus,
    pub eigenvector: MetricStatus,
    pub hits: MetricStatus,
    pub critical_path: MetricStatus,
    pub cycles: MetricStatus,
    pub kcore: MetricStatus,
    pub articulation: MetricStatus,
    pub slack: MetricStatus,
}

impl Phase2Status {
    /// Every metric in the same state.
    #[must_use]
    pub fn uniform(entry: &MetricStatus) -> Self {
        Self {
            pagerank: entry.clone(),
            betweenness: entry.clone(),
            eigenvector: entry.clone(),
            hits: entry.clone(),
            critical_path: entry.clone(),
            cycles: entry.clone(),
            kcore: entry.clone(),
            articulation: entry.clone(),
            slack: entry.clone(),
        }
    }

    /// Status after the background task faulted.
    #[must_use]
    pub fn panicked(message: &str) -> Self {
        Self::uniform(&MetricStatus {
            state: MetricState::Panic,
            reason: format!("panic: {message}"),
            ..MetricStatus::default()
        })
    }

    /// `(name, status)` pairs in a fixed order.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, &MetricStatus); 9] {
        [
            ("pagerank", &self.pagerank),
            ("betweenness", &self.betweenness),
            ("eigenvector", &self.eigenvector),
            ("hits", &self.hits),
            ("critical_path", &self.critical_path),
            ("cycles", &self.cycles),
            ("kcore", &self.kcore),
            ("articulation", &self.articulation),
            ("slack", &self.slack),
        ]
    }
}

/// Elapsed time as fractional milliseconds.
mod elapsed_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let ms = f64::deserialize(d)?;
        Ok(Duration::try_from_secs_f64(ms / 1000.0).unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Phase 2 snapshot
// ---------------------------------------------------------------------------

/// 1-based ranks for the scored Phase 2 metrics. Empty when the metric has
/// no values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase2Ranks {
    pub pagerank: Vec<usize>,
    pub betweenness: Vec<usize>,
    pub eigenvector: Vec<usize>,
    pub hubs: Vec<usize>,
    pub authorities: Vec<usize>,
    pub critical_path: Vec<usize>,
}

/// Everything Phase 2 produces, indexed by node.
///
/// A metric that was skipped, timed out without a fallback, or faulted
/// has an empty vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Phase2Metrics {
    pub pagerank: Vec<f64>,
    pub betweenness: Vec<f64>,
    pub betweenness_mode: Option<BetweennessMode>,
    pub eigenvector: Vec<f64>,
    pub hubs: Vec<f64>,
    pub authorities: Vec<f64>,
    pub critical_path: Vec<f64>,
    pub slack: Vec<f64>,
    pub core_number: Vec<usize>,
    pub articulation: Vec<bool>,
    /// Canonical cycles: rotated to the smallest id, sorted by length then
    /// lexicographically.
    pub cycles: Vec<Vec<String>>,
    pub ranks: Phase2Ranks,
    pub status: Phase2Status,
}

impl Phase2Metrics {
    /// Fill in [`Phase2Ranks`] from the score vectors.
    pub fn compute_ranks(&mut self, ids: &NodeIds) {
        let rank = |scores: &[f64]| {
            if scores.is_empty() {
                Vec::new()
            } else {
                float_ranks(ids, scores)
            }
        };
        self.ranks = Phase2Ranks {
            pagerank: rank(&self.pagerank),
            betweenness: rank(&self.betweenness),
            eigenvector: rank(&self.eigenvector),
            hubs: rank(&self.hubs),
            authorities: rank(&self.authorities),
            critical_path: rank(&self.critical_path),
        };
    }
}

// ---------------------------------------------------------------------------
// Serializable form
// ---------------------------------------------------------------------------

/// A ready [`GraphStats`] in plain-data form, for persistent caches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub ids: NodeIds,
    pub edge_count: usize,
    pub config: AnalysisConfig,
    pub phase1: FastMetrics,
    pub phase2: Phase2Metrics,
}

// ---------------------------------------------------------------------------
// GraphStats
// ---------------------------------------------------------------------------

/// Derived metrics for one graph.
#[derive(Debug)]
pub struct GraphStats {
    ids: Arc<NodeIds>,
    edge_count: usize,
    config: AnalysisConfig,
    phase1: FastMetrics,
    phase2: RwLock<Option<Arc<Phase2Metrics>>>,
    done: Mutex<bool>,
    done_cv: Condvar,
    profile: Mutex<Option<StartupProfile>>,
}

impl GraphStats {
    /// Stats with Phase 1 populated and Phase 2 pending.
    #[must_use]
    pub fn new(graph: &DependencyGraph, phase1: FastMetrics, config: AnalysisConfig) -> Self {
        Self {
            ids: graph.ids(),
            edge_count: graph.edge_count(),
            config,
            phase1,
            phase2: RwLock::new(None),
            done: Mutex::new(false),
            done_cv: Condvar::new(),
            profile: Mutex::new(None),
        }
    }

    /// Rebuild ready stats from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: StatsSnapshot) -> Self {
        Self {
            ids: Arc::new(snapshot.ids),
            edge_count: snapshot.edge_count,
            config: snapshot.config,
            phase1: snapshot.phase1,
            phase2: RwLock::new(Some(Arc::new(snapshot.phase2))),
            done: Mutex::new(true),
            done_cv: Condvar::new(),
            profile: Mutex::new(None),
        }
    }

    /// Plain-data copy, or `None` while Phase 2 is not ready.
    #[must_use]
    pub fn snapshot(&self) -> Option<StatsSnapshot> {
        let phase2 = self.phase2()?;
        Some(StatsSnapshot {
            ids: NodeIds::clone(&self.ids),
            edge_count: self.edge_count,
            config: self.config.clone(),
            phase1: self.phase1.clone(),
            phase2: Phase2Metrics::clone(&phase2),
        })
    }

    // -- publication (single writer) ---------------------------------------

    /// Publish the Phase 2 snapshot and release waiters.
    ///
    /// Only the first call has any effect.
    pub(crate) fn publish(&self, metrics: Phase2Metrics) -> bool {
        let published = {
            let mut slot = self.phase2.write().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                false
            } else {
                *slot = Some(Arc::new(metrics));
                true
            }
        };
        if !published {
            debug!("phase 2 already published, ignoring second result");
        }
        self.release_waiters();
        published
    }

    /// Mark the background task finished without publishing.
    pub(crate) fn release_waiters(&self) {
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        *done = true;
        self.done_cv.notify_all();
    }

    pub(crate) fn set_profile(&self, profile: StartupProfile) {
        *self.profile.lock().unwrap_or_else(PoisonError::into_inner) = Some(profile);
    }

    // -- readiness ---------------------------------------------------------

    /// Whether the Phase 2 snapshot is available.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase2
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Block until the background task has exited.
    ///
    /// Returns immediately for a cancelled run too; check [`Self::is_ready`]
    /// afterwards.
    pub fn wait_for_phase2(&self) {
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        while !*done {
            done = self
                .done_cv
                .wait(done)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`Self::wait_for_phase2`] but bounded. Returns whether the task
    /// finished in time.
    #[must_use]
    pub fn wait_for_phase2_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait_for_phase2();
            return true;
        };
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        while !*done {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            done = self
                .done_cv
                .wait_timeout(done, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    /// Per-metric status. Everything is pending until Phase 2 publishes.
    #[must_use]
    pub fn status(&self) -> Phase2Status {
        self.phase2().map_or_else(Phase2Status::default, |p| p.status.clone())
    }

    /// The published Phase 2 snapshot, if any.
    #[must_use]
    pub fn phase2(&self) -> Option<Arc<Phase2Metrics>> {
        self.phase2
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Timing profile attached by the pipeline, once Phase 2 has finished.
    #[must_use]
    pub fn profile(&self) -> Option<StartupProfile> {
        self.profile
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // -- phase 1 -----------------------------------------------------------

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[must_use]
    pub const fn density(&self) -> f64 {
        self.phase1.density
    }

    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    #[must_use]
    pub fn ids(&self) -> &NodeIds {
        &self.ids
    }

    /// Whether Phase 1 found a strict topological order.
    #[must_use]
    pub const fn is_acyclic(&self) -> bool {
        self.phase1.acyclic
    }

    /// Issue IDs with prerequisites first.
    #[must_use]
    pub fn topological_order(&self) -> Vec<String> {
        self.phase1
            .topological_order
            .iter()
            .filter_map(|&idx| self.ids.id(idx).map(str::to_string))
            .collect()
    }

    #[must_use]
    pub fn in_degrees(&self) -> HashMap<String, usize> {
        self.ids.zip_map(&self.phase1.in_degree)
    }

    #[must_use]
    pub fn out_degrees(&self) -> HashMap<String, usize> {
        self.ids.zip_map(&self.phase1.out_degree)
    }

    #[must_use]
    pub fn in_degree(&self, id: &str) -> Option<usize> {
        self.phase1_value(&self.phase1.in_degree, id)
    }

    #[must_use]
    pub fn out_degree(&self, id: &str) -> Option<usize> {
        self.phase1_value(&self.phase1.out_degree, id)
    }

    #[must_use]
    pub fn in_degree_rank(&self, id: &str) -> Option<usize> {
        self.phase1_value(&self.phase1.in_degree_rank, id)
    }

    #[must_use]
    pub fn out_degree_rank(&self, id: &str) -> Option<usize> {
        self.phase1_value(&self.phase1.out_degree_rank, id)
    }

    fn phase1_value(&self, values: &[usize], id: &str) -> Option<usize> {
        values.get(self.ids.index_of(id)?).copied()
    }

    // -- phase 2: single values --------------------------------------------

    fn at<T: Copy>(&self, id: &str, pick: impl FnOnce(&Phase2Metrics) -> &[T]) -> Option<T> {
        let idx = self.ids.index_of(id)?;
        let phase2 = self.phase2()?;
        pick(&phase2).get(idx).copied()
    }

    #[must_use]
    pub fn pagerank_value(&self, id: &str) -> Option<f64> {
        self.at(id, |p| p.pagerank.as_slice())
    }

    #[must_use]
    pub fn betweenness_value(&self, id: &str) -> Option<f64> {
        self.at(id, |p| p.betweenness.as_slice())
    }

    #[must_use]
    pub fn eigenvector_value(&self, id: &str) -> Option<f64> {
        self.at(id, |p| p.eigenvector.as_slice())
    }

    #[must_use]
    pub fn hub_value(&self, id: &str) -> Option<f64> {
        self.at(id, |p| p.hubs.as_slice())
    }

    #[must_use]
    pub fn authority_value(&self, id: &str) -> Option<f64> {
        self.at(id, |p| p.authorities.as_slice())
    }

    #[must_use]
    pub fn critical_path_value(&self, id: &str) -> Option<f64> {
        self.at(id, |p| p.critical_path.as_slice())
    }

    #[must_use]
    pub fn core_number_value(&self, id: &str) -> Option<usize> {
        self.at(id, |p| p.core_number.as_slice())
    }

    #[must_use]
    pub fn slack_value(&self, id: &str) -> Option<f64> {
        self.at(id, |p| p.slack.as_slice())
    }

    /// `Some(flag)` once articulation points are computed.
    #[must_use]
    pub fn is_articulation_point(&self, id: &str) -> Option<bool> {
        self.at(id, |p| p.articulation.as_slice())
    }

    // -- phase 2: ranks ----------------------------------------------------

    #[must_use]
    pub fn pagerank_rank(&self, id: &str) -> Option<usize> {
        self.at(id, |p| p.ranks.pagerank.as_slice())
    }

    #[must_use]
    pub fn betweenness_rank(&self, id: &str) -> Option<usize> {
        self.at(id, |p| p.ranks.betweenness.as_slice())
    }

    #[must_use]
    pub fn eigenvector_rank(&self, id: &str) -> Option<usize> {
        self.at(id, |p| p.ranks.eigenvector.as_slice())
    }

    #[must_use]
    pub fn hub_rank(&self, id: &str) -> Option<usize> {
        self.at(id, |p| p.ranks.hubs.as_slice())
    }

    #[must_use]
    pub fn authority_rank(&self, id: &str) -> Option<usize> {
        self.at(id, |p| p.ranks.authorities.as_slice())
    }

    #[must_use]
    pub fn critical_path_rank(&self, id: &str) -> Option<usize> {
        self.at(id, |p| p.ranks.critical_path.as_slice())
    }

    // -- phase 2: bulk copies ----------------------------------------------

    fn bulk<T: Clone>(&self, pick: impl FnOnce(&Phase2Metrics) -> &[T]) -> HashMap<String, T> {
        self.phase2()
            .map(|p| self.ids.zip_map(pick(&p)))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn pagerank(&self) -> HashMap<String, f64> {
        self.bulk(|p| p.pagerank.as_slice())
    }

    #[must_use]
    pub fn betweenness(&self) -> HashMap<String, f64> {
        self.bulk(|p| p.betweenness.as_slice())
    }

    #[must_use]
    pub fn eigenvector(&self) -> HashMap<String, f64> {
        self.bulk(|p| p.eigenvector.as_slice())
    }

    #[must_use]
    pub fn hubs(&self) -> HashMap<String, f64> {
        self.bulk(|p| p.hubs.as_slice())
    }

    #[must_use]
    pub fn authorities(&self) -> HashMap<String, f64> {
        self.bulk(|p| p.authorities.as_slice())
    }

    #[must_use]
    pub fn critical_path_score(&self) -> HashMap<String, f64> {
        self.bulk(|p| p.critical_path.as_slice())
    }

    #[must_use]
    pub fn core_number(&self) -> HashMap<String, usize> {
        self.bulk(|p| p.core_number.as_slice())
    }

    #[must_use]
    pub fn slack(&self) -> HashMap<String, f64> {
        self.bulk(|p| p.slack.as_slice())
    }

    /// Cut vertices of the undirected view, sorted by id.
    #[must_use]
    pub fn articulation_points(&self) -> Vec<String> {
        let Some(p) = self.phase2() else {
            return Vec::new();
        };
        let mut points: Vec<String> = p
            .articulation
            .iter()
            .enumerate()
            .filter(|&(_, &is_ap)| is_ap)
            .filter_map(|(idx, _)| self.ids.id(idx).map(str::to_string))
            .collect();
        points.sort_unstable();
        points
    }

    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<String>> {
        self.phase2().map(|p| p.cycles.clone()).unwrap_or_default()
    }

    /// Betweenness mode actually used, when betweenness ran.
    #[must_use]
    pub fn betweenness_mode(&self) -> Option<BetweennessMode> {
        self.phase2().and_then(|p| p.betweenness_mode)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metrics::basic::fast_metrics, test_support::graph};
    use std::thread;

    fn pending_stats() -> GraphStats {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let phase1 = fast_metrics(&g);
        GraphStats::new(&g, phase1, AnalysisConfig::default())
    }

    fn sample_metrics() -> Phase2Metrics {
        let mut m = Phase2Metrics {
            pagerank: vec![0.2, 0.3, 0.5],
            core_number: vec![1, 1, 1],
            articulation: vec![false, true, false],
            critical_path: vec![1.0, 2.0, 3.0],
            cycles: Vec::new(),
            status: Phase2Status::uniform(&MetricStatus::computed(Duration::from_millis(1))),
            ..Phase2Metrics::default()
        };
        m.compute_ranks(&NodeIds::from(vec!["a".to_string(), "b".to_string(), "c".to_string()]));
        m
    }

    #[test]
    fn phase1_is_available_before_publication() {
        let stats = pending_stats();
        assert!(!stats.is_ready());
        assert_eq!(stats.topological_order(), vec!["c", "b", "a"]);
        assert_eq!(stats.in_degree("b"), Some(1));
        assert_eq!(stats.out_degree("c"), Some(0));
        assert_eq!(stats.pagerank_value("a"), None);
        assert!(stats.pagerank().is_empty());
        assert_eq!(stats.status().pagerank.state, MetricState::Pending);
    }

    #[test]
    fn publication_makes_all_fields_visible_at_once() {
        let stats = pending_stats();
        assert!(stats.publish(sample_metrics()));
        assert!(stats.is_ready());
        assert_eq!(stats.pagerank_value("c"), Some(0.5));
        assert_eq!(stats.pagerank_rank("c"), Some(1));
        assert_eq!(stats.critical_path_rank("a"), Some(3));
        assert_eq!(stats.is_articulation_point("b"), Some(true));
        assert_eq!(stats.articulation_points(), vec!["b"]);
        assert_eq!(stats.pagerank().len(), 3);
        // Skipped metrics stay absent.
        assert_eq!(stats.betweenness_value("a"), None);
        assert!(stats.betweenness().is_empty());
        assert_eq!(stats.pagerank_value("missing"), None);
    }

    #[test]
    fn second_publication_is_ignored() {
        let stats = pending_stats();
        assert!(stats.publish(sample_metrics()));
        let mut other = sample_metrics();
        other.pagerank = vec![1.0, 1.0, 1.0];
        assert!(!stats.publish(other));
        assert_eq!(stats.pagerank_value("c"), Some(0.5));
    }

    #[test]
    fn waiters_are_released_by_publish() {
        let stats = Arc::new(pending_stats());
        let waiter = {
            let stats = Arc::clone(&stats);
            thread::spawn(move || {
                stats.wait_for_phase2();
                stats.is_ready()
            })
        };
        stats.publish(sample_metrics());
        assert!(waiter.join().expect("waiter thread"));
    }

    #[test]
    fn bounded_wait_times_out_then_succeeds() {
        let stats = pending_stats();
        assert!(!stats.wait_for_phase2_timeout(Duration::from_millis(20)));
        stats.release_waiters();
        assert!(stats.wait_for_phase2_timeout(Duration::from_millis(20)));
        assert!(!stats.is_ready());
    }

    #[test]
    fn unbounded_wait_returns_once_released() {
        let stats = Arc::new(pending_stats());
        let waiter = {
            let stats = Arc::clone(&stats);
            thread::spawn(move || stats.wait_for_phase2_timeout(Duration::MAX))
        };
        stats.publish(sample_metrics());
        assert!(waiter.join().expect("waiter thread"));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let stats = pending_stats();
        assert!(stats.snapshot().is_none());
        stats.publish(sample_metrics());

        let json = serde_json::to_string(&stats.snapshot().expect("ready")).expect("serialize");
        let restored = GraphStats::from_snapshot(serde_json::from_str(&json).expect("deserialize"));
        assert!(restored.is_ready());
        assert_eq!(restored.pagerank(), stats.pagerank());
        assert_eq!(restored.topological_order(), stats.topological_order());
        assert_eq!(restored.pagerank_rank("c"), Some(1));
        restored.wait_for_phase2();
    }

    #[test]
    fn status_serializes_elapsed_as_ms() {
        let status = MetricStatus::computed(Duration::from_millis(12));
        let json = serde_json::to_value(&status).expect("serialize");
        assert_eq!(json["state"], "computed");
        assert!((json["ms"].as_f64().expect("ms") - 12.0).abs() < 1e-9);
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn panicked_status_marks_every_metric() {
        let status = Phase2Status::panicked("boom");
        for (_, entry) in status.entries() {
            assert_eq!(entry.state, MetricState::Panic);
            assert_eq!(entry.reason, "panic: boom");
        }
    }
}
