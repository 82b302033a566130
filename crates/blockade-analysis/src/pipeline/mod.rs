//! Phase 2: the background metrics pipeline.
//!
//! # Overview
//!
//! ```text
//! compute_phase2()
//!   ├─ pagerank       ─┐
//!   ├─ betweenness     │ guard::run_guarded: own thread, own deadline,
//!   ├─ hits            │ fallback on timeout or worker panic
//!   ├─ cycles         ─┘
//!   ├─ eigenvector, critical path, k-core, articulation, slack (inline)
//!   └─ ranks
//! publish_phase2()
//!   └─ catch_unwind around the whole run, then one publish
//! ```
//!
//! Results accumulate in a local [`Phase2Metrics`] and reach readers in a
//! single [`GraphStats::publish`]. Cancellation is checked between stages;
//! once observed nothing further starts and nothing is published.

pub mod guard;
pub mod profile;

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::{Duration, Instant},
};

use tracing::{debug, info, instrument, warn};

use self::guard::{Guarded, panic_message, run_guarded};
pub use self::profile::StartupProfile;
use crate::{
    cancel::CancelToken,
    config::AnalysisConfig,
    graph::{Condensation, DependencyGraph, UndirectedView, critical_path, enumerate_cycles, has_cycles},
    metrics::{
        BetweennessMode,
        articulation::articulation_points,
        betweenness::{approximate_betweenness, betweenness},
        eigenvector::eigenvector_centrality,
        hits::{HITS_MAX_ITER, HITS_TOLERANCE, hits},
        kcore::core_numbers,
        pagerank::{PageRankConfig, pagerank, uniform_scores},
    },
    stats::{GraphStats, MetricState, MetricStatus, Phase2Metrics, Phase2Status},
};

/// Cycle bound used when the configuration asks for zero.
const DEFAULT_MAX_CYCLES: usize = 100;

/// How a Phase 2 run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase2Exit {
    /// Metrics published; the stats are ready.
    Published,
    /// The run faulted; a degraded snapshot with `panic` statuses was
    /// published.
    Faulted(String),
    /// Cancelled; nothing was published and the stats stay not-ready.
    Cancelled,
}

/// Run `compute` behind a fault boundary and publish its result.
///
/// Waiters on `stats` are released in every case.
pub fn publish_phase2(
    stats: &GraphStats,
    mut profile: StartupProfile,
    compute: impl FnOnce(&mut StartupProfile) -> Option<Phase2Metrics>,
) -> Phase2Exit {
    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| compute(&mut profile)));
    profile.phase2_total = started.elapsed();
    profile.total = profile.build_graph + profile.phase1 + profile.phase2_total;

    match outcome {
        Ok(Some(metrics)) => {
            stats.set_profile(profile);
            stats.publish(metrics);
            info!(
                nodes = stats.node_count(),
                elapsed_ms = started.elapsed().as_millis(),
                "phase 2 published"
            );
            Phase2Exit::Published
        }
        Ok(None) => {
            debug!("phase 2 cancelled, nothing published");
            stats.release_waiters();
            Phase2Exit::Cancelled
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(%message, "phase 2 panicked, publishing degraded stats");
            stats.set_profile(profile);
            stats.publish(Phase2Metrics {
                status: Phase2Status::panicked(&message),
                ..Phase2Metrics::default()
            });
            Phase2Exit::Faulted(message)
        }
    }
}

/// Phase 2 result for a graph with no nodes: every enabled metric is
/// trivially computed, every disabled one skipped.
#[must_use]
pub fn empty_phase2(config: &AnalysisConfig) -> Phase2Metrics {
    let state = |enabled: bool, reason: &str| {
        if enabled {
            MetricStatus::computed(Duration::ZERO)
        } else {
            MetricStatus::skipped(reason)
        }
    };
    Phase2Metrics {
        status: Phase2Status {
            pagerank: state(config.compute_pagerank, &config.pagerank_skip_reason),
            betweenness: state(config.compute_betweenness, &config.betweenness_skip_reason),
            eigenvector: state(config.compute_eigenvector, ""),
            hits: state(config.compute_hits, &config.hits_skip_reason),
            critical_path: state(config.compute_critical_path, ""),
            cycles: state(config.compute_cycles, &config.cycles_skip_reason),
            kcore: state(config.compute_kcore, ""),
            articulation: state(config.compute_articulation, ""),
            slack: state(config.compute_slack, ""),
        },
        ..Phase2Metrics::default()
    }
}

/// Compute every enabled Phase 2 metric.
///
/// Returns `None` if `cancel` fires. Per-metric timeouts and worker faults
/// never abort the run; they only change that metric's value and status.
#[must_use]
#[instrument(skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn compute_phase2(
    graph: &Arc<DependencyGraph>,
    config: &AnalysisConfig,
    cancel: &CancelToken,
    profile: &mut StartupProfile,
) -> Option<Phase2Metrics> {
    let n = graph.node_count();
    let mut out = Phase2Metrics::default();
    let mut status = Phase2Status::default();

    // -- PageRank ----------------------------------------------------------
    checkpoint(cancel)?;
    if config.compute_pagerank {
        let g = Arc::clone(graph);
        let outcome = guarded("pagerank", config.pagerank_timeout, cancel, move |token| {
            pagerank(&g, &PageRankConfig::default(), token)
        })?;
        match outcome {
            Ok((result, elapsed)) => {
                out.pagerank = result.scores;
                status.pagerank = MetricStatus::computed(elapsed);
                if !result.converged {
                    status.pagerank.reason = format!("not converged after {} iterations", result.iterations);
                }
                profile.pagerank = elapsed;
            }
            Err(failure) => {
                out.pagerank = uniform_scores(n);
                profile.pagerank = failure.elapsed;
                profile.pagerank_timed_out = true;
                status.pagerank = failure.into_status("uniform fallback");
            }
        }
    } else {
        status.pagerank = MetricStatus::skipped(&config.pagerank_skip_reason);
    }

    // -- Betweenness -------------------------------------------------------
    checkpoint(cancel)?;
    if config.compute_betweenness {
        let g = Arc::clone(graph);
        let approximate =
            config.betweenness_mode == BetweennessMode::Approximate && config.betweenness_sample_size > 0;
        let (sample, seed) = (config.betweenness_sample_size, config.betweenness_seed);
        let outcome = guarded("betweenness", config.betweenness_timeout, cancel, move |token| {
            if approximate {
                approximate_betweenness(&g, sample, seed, token)
            } else {
                betweenness(&g, token)
            }
        })?;
        match outcome {
            Ok((result, elapsed)) => {
                status.betweenness = MetricStatus::computed(elapsed);
                if result.mode == BetweennessMode::Approximate {
                    status.betweenness.state = MetricState::Approx;
                    status.betweenness.reason = "approximate".to_string();
                    status.betweenness.sample_size = Some(result.sample_size);
                }
                out.betweenness = result.scores;
                out.betweenness_mode = Some(result.mode);
                profile.betweenness = elapsed;
            }
            Err(failure) => {
                profile.betweenness = failure.elapsed;
                profile.betweenness_timed_out = true;
                status.betweenness = failure.into_status("no scores");
            }
        }
    } else {
        status.betweenness = MetricStatus::skipped(&config.betweenness_skip_reason);
    }

    // -- Eigenvector -------------------------------------------------------
    checkpoint(cancel)?;
    if config.compute_eigenvector {
        let (scores, elapsed) = timed(|| eigenvector_centrality(graph));
        out.eigenvector = scores;
        status.eigenvector = MetricStatus::computed(elapsed);
        profile.eigenvector = elapsed;
    } else {
        status.eigenvector = MetricStatus::skipped("disabled");
    }

    // -- HITS --------------------------------------------------------------
    checkpoint(cancel)?;
    if !config.compute_hits {
        status.hits = MetricStatus::skipped(&config.hits_skip_reason);
    } else if graph.edge_count() == 0 {
        status.hits = MetricStatus::skipped("no edges");
    } else {
        let g = Arc::clone(graph);
        let outcome = guarded("hits", config.hits_timeout, cancel, move |token| {
            hits(&g, HITS_MAX_ITER, HITS_TOLERANCE, token)
        })?;
        match outcome {
            Ok((result, elapsed)) => {
                out.hubs = result.hubs;
                out.authorities = result.authorities;
                status.hits = MetricStatus::computed(elapsed);
                profile.hits = elapsed;
            }
            Err(failure) => {
                profile.hits = failure.elapsed;
                profile.hits_timed_out = true;
                status.hits = failure.into_status("no scores");
            }
        }
    }

    // -- Critical path -----------------------------------------------------
    checkpoint(cancel)?;
    let condensation = (config.compute_critical_path || config.compute_slack).then(|| Condensation::new(graph));
    if let Some(cond) = condensation.as_ref().filter(|_| config.compute_critical_path) {
        let (heights, elapsed) = timed(|| critical_path::critical_path_heights(graph, cond));
        out.critical_path = heights;
        status.critical_path = MetricStatus::computed(elapsed);
        profile.critical_path = elapsed;
    } else {
        status.critical_path = MetricStatus::skipped("disabled");
    }

    // -- Cycles ------------------------------------------------------------
    checkpoint(cancel)?;
    if config.compute_cycles {
        let started = Instant::now();
        if has_cycles(graph) {
            let max = match config.max_cycles_to_store {
                0 => DEFAULT_MAX_CYCLES,
                m => m,
            };
            let g = Arc::clone(graph);
            let outcome = guarded("cycles", config.cycles_timeout, cancel, move |token| {
                enumerate_cycles(&g, max, token)
            })?;
            match outcome {
                Ok((found, elapsed)) => {
                    status.cycles = MetricStatus::computed(elapsed);
                    if found.truncated {
                        status.cycles.reason = "truncated".to_string();
                    }
                    profile.cycle_count = found.cycles.len();
                    out.cycles = found.cycles;
                }
                Err(failure) => {
                    profile.cycles_timed_out = true;
                    status.cycles = failure.into_status("no cycles listed");
                }
            }
        } else {
            status.cycles = MetricStatus::computed(started.elapsed());
        }
        profile.cycles = started.elapsed();
    } else {
        status.cycles = MetricStatus::skipped(&config.cycles_skip_reason);
    }

    // -- K-core and articulation points ------------------------------------
    checkpoint(cancel)?;
    let view = (config.compute_kcore || config.compute_articulation).then(|| UndirectedView::from_graph(graph));
    match view.as_ref().filter(|_| config.compute_kcore) {
        Some(v) => {
            let (cores, elapsed) = timed(|| core_numbers(v));
            out.core_number = cores;
            status.kcore = MetricStatus::computed(elapsed);
            profile.kcore = elapsed;
        }
        None => status.kcore = MetricStatus::skipped("disabled"),
    }
    match view.as_ref().filter(|_| config.compute_articulation) {
        Some(v) => {
            let (points, elapsed) = timed(|| articulation_points(v));
            out.articulation = points;
            status.articulation = MetricStatus::computed(elapsed);
            profile.articulation = elapsed;
        }
        None => status.articulation = MetricStatus::skipped("disabled"),
    }

    // -- Slack -------------------------------------------------------------
    checkpoint(cancel)?;
    match condensation.as_ref().filter(|_| config.compute_slack) {
        Some(cond) => {
            let (values, elapsed) = timed(|| critical_path::slack(graph, cond));
            out.slack = values;
            status.slack = MetricStatus::computed(elapsed);
            profile.slack = elapsed;
        }
        None => status.slack = MetricStatus::skipped("disabled"),
    }

    checkpoint(cancel)?;
    out.compute_ranks(&graph.ids());
    for (name, entry) in status.entries() {
        debug!(metric = name, state = entry.state.as_str(), elapsed_us = entry.elapsed.as_micros(), "phase 2 metric");
    }
    out.status = status;
    Some(out)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A guarded metric that did not produce a value.
struct Failure {
    reason: String,
    elapsed: Duration,
}

impl Failure {
    fn into_status(self, fallback: &str) -> MetricStatus {
        MetricStatus::timeout(format!("{}; {fallback}", self.reason), self.elapsed)
    }
}

/// [`run_guarded`] folded into `Some(Ok)`, `Some(Err)` for timeout or
/// fault, and `None` for cancellation.
fn guarded<T, F>(
    name: &'static str,
    timeout: Duration,
    cancel: &CancelToken,
    work: F,
) -> Option<Result<(T, Duration), Failure>>
where
    T: Send + 'static,
    F: FnOnce(&CancelToken) -> T + Send + 'static,
{
    match run_guarded(name, timeout, cancel, work) {
        Guarded::Completed { value, elapsed } => Some(Ok((value, elapsed))),
        Guarded::TimedOut { elapsed } => Some(Err(Failure {
            reason: format!("exceeded {}ms", timeout.as_millis()),
            elapsed,
        })),
        Guarded::Faulted { message, elapsed } => Some(Err(Failure {
            reason: format!("worker panicked: {message}"),
            elapsed,
        })),
        Guarded::Cancelled => None,
    }
}

fn checkpoint(cancel: &CancelToken) -> Option<()> {
    (!cancel.is_cancelled()).then_some(())
}

fn timed<R>(f: impl FnOnce() -> R) -> (R, Duration) {
    let started = Instant::now();
    let result = f();
    (result, started.elapsed())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
