//! Entry point: build the graph once, then run and query the analysis.
//!
//! # Overview
//!
//! ```text
//! Analyzer::new(issues)            build DependencyGraph (dense indices)
//!   .analyze_async(&cancel)        cache lookup → Phase 1 inline → Phase 2 thread
//!   .analyze()                     same, then wait for Phase 2
//!   .analyze_with_profile(config)  both phases inline, no caches, with timings
//! ```
//!
//! Cache tiers: when a [`PersistentCache`] is attached it is the only tier
//! consulted (keyed by full issue content); otherwise the in-process
//! [`StatsCache`] is used (keyed by graph structure). Both keys end with
//! the config hash.

mod blockers;

pub use blockers::{BlockerChain, BlockerChainEntry};

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use blockade_core::{Issue, config::env_lookup};
use tracing::{debug, instrument, warn};

use crate::{
    cache::{PersistentCache, StatsCache, cache_key, data_hash, global_cache},
    cancel::CancelToken,
    config::AnalysisConfig,
    graph::DependencyGraph,
    metrics::basic::fast_metrics,
    pipeline::{Phase2Exit, StartupProfile, compute_phase2, empty_phase2, publish_phase2},
    stats::{GraphStats, Phase2Metrics, Phase2Status},
};

/// Where a finished run should be written.
struct PersistTarget {
    cache: Arc<dyn PersistentCache>,
    key: String,
    data_hash: String,
    config_hash: String,
}

/// Reads one environment variable.
pub type EnvLookup = fn(&str) -> Option<String>;

/// Owns the issues and their dependency graph.
pub struct Analyzer {
    /// Unique issues, indexed like the graph's nodes.
    issues: Vec<Issue>,
    graph: Arc<DependencyGraph>,
    build_time: Duration,
    config: Option<AnalysisConfig>,
    cache: Option<Arc<StatsCache>>,
    persistent: Option<Arc<dyn PersistentCache>>,
    env: EnvLookup,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("issues", &self.issues.len())
            .field("edges", &self.graph.edge_count())
            .field("config", &self.config)
            .field("persistent", &self.persistent.is_some())
            .finish_non_exhaustive()
    }
}

impl Analyzer {
    /// Build the dependency graph. Later duplicates of an id are dropped.
    #[must_use]
    #[instrument(skip(issues), fields(issues = issues.len()))]
    pub fn new(issues: Vec<Issue>) -> Self {
        let started = Instant::now();
        let graph = DependencyGraph::build(&issues);

        let mut issues = issues;
        if issues.len() != graph.node_count() {
            let mut seen = std::collections::HashSet::with_capacity(graph.node_count());
            issues.retain(|issue| seen.insert(issue.id.clone()));
            debug!(kept = issues.len(), "dropped duplicate issue ids");
        }

        Self {
            issues,
            graph: Arc::new(graph),
            build_time: started.elapsed(),
            config: None,
            cache: None,
            persistent: None,
            env: env_lookup,
        }
    }

    /// Use `config` instead of the size-based preset.
    #[must_use]
    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use `cache` instead of the process-wide in-memory cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<StatsCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Consult and fill `cache`; disables the in-memory tier.
    #[must_use]
    pub fn with_persistent_cache(mut self, cache: Arc<dyn PersistentCache>) -> Self {
        self.persistent = Some(cache);
        self
    }

    /// Read `BLOCKADE_*` overrides through `lookup` instead of the process
    /// environment.
    #[must_use]
    pub fn with_env_lookup(mut self, lookup: EnvLookup) -> Self {
        self.env = lookup;
        self
    }

    /// Configuration the next run will use.
    ///
    /// Without [`Self::with_config`] this is the size preset with the
    /// environment overrides applied.
    #[must_use]
    pub fn config(&self) -> AnalysisConfig {
        self.config.clone().unwrap_or_else(|| {
            AnalysisConfig::for_size(self.graph.node_count(), self.graph.edge_count())
                .with_env_overrides(self.env)
        })
    }

    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    #[must_use]
    pub fn issue(&self, id: &str) -> Option<&Issue> {
        self.graph.node_index(id).and_then(|idx| self.issues.get(idx))
    }

    // -- running -----------------------------------------------------------

    /// Phase 1 now, Phase 2 on a background thread.
    ///
    /// The returned stats answer Phase 1 queries immediately. Cancelling
    /// `cancel` stops Phase 2 without publishing; waiters are still
    /// released.
    #[instrument(skip_all, fields(nodes = self.graph.node_count()))]
    pub fn analyze_async(&self, cancel: &CancelToken) -> Arc<GraphStats> {
        let config = self.config();
        let config_hash = config.config_hash();

        if let Some(persistent) = &self.persistent {
            let data_hash = data_hash(&self.issues);
            let key = cache_key(&data_hash, &config_hash);
            if let Some(hit) = persistent.get(&key) {
                debug!(key = %key, "persistent cache hit");
                return hit;
            }
            let target = PersistTarget {
                cache: Arc::clone(persistent),
                key,
                data_hash,
                config_hash,
            };
            return self.start(config, cancel, None, Some(target));
        }

        let memory = self.cache.clone().unwrap_or_else(|| Arc::clone(global_cache()));
        let key = cache_key(&self.graph.structure_hash(), &config_hash);
        if let Some(hit) = memory.get(&key) {
            debug!(key = %key, "stats cache hit");
            return hit;
        }
        self.start(config, cancel, Some((memory, key)), None)
    }

    /// Run both phases and wait for Phase 2.
    pub fn analyze(&self) -> Arc<GraphStats> {
        let stats = self.analyze_async(&CancelToken::new());
        stats.wait_for_phase2();
        stats
    }

    /// Run both phases inline with `config`, bypassing every cache.
    pub fn analyze_with_profile(&self, config: AnalysisConfig) -> (Arc<GraphStats>, StartupProfile) {
        let (stats, profile) = self.phase1(config.clone());
        if self.graph.is_empty() {
            stats.set_profile(profile.clone());
            stats.publish(empty_phase2(&config));
            return (stats, profile);
        }

        let cancel = CancelToken::new();
        publish_phase2(&stats, profile, |p| compute_phase2(&self.graph, &config, &cancel, p));
        let profile = stats.profile().unwrap_or_else(|| StartupProfile::new(config));
        (stats, profile)
    }

    fn phase1(&self, config: AnalysisConfig) -> (Arc<GraphStats>, StartupProfile) {
        let started = Instant::now();
        let fast = fast_metrics(&self.graph);
        let mut profile = StartupProfile::new(config.clone());
        profile.node_count = self.graph.node_count();
        profile.edge_count = self.graph.edge_count();
        profile.density = fast.density;
        profile.build_graph = self.build_time;
        profile.phase1 = started.elapsed();
        profile.total = profile.build_graph + profile.phase1;
        (Arc::new(GraphStats::new(&self.graph, fast, config)), profile)
    }

    fn start(
        &self,
        config: AnalysisConfig,
        cancel: &CancelToken,
        memory: Option<(Arc<StatsCache>, String)>,
        persist: Option<PersistTarget>,
    ) -> Arc<GraphStats> {
        let (stats, profile) = self.phase1(config.clone());

        if self.graph.is_empty() {
            stats.set_profile(profile);
            stats.publish(empty_phase2(&config));
            return stats;
        }

        // Concurrent identical requests share the in-flight stats.
        if let Some((cache, key)) = &memory {
            cache.insert(key.clone(), Arc::clone(&stats));
        }

        let graph = Arc::clone(&self.graph);
        let worker_stats = Arc::clone(&stats);
        let cancel = cancel.clone();
        let spawned = thread::Builder::new()
            .name("graph-phase2".to_string())
            .spawn(move || {
                let exit = publish_phase2(&worker_stats, profile, |p| compute_phase2(&graph, &config, &cancel, p));
                match exit {
                    Phase2Exit::Published => {
                        if let Some(target) = persist {
                            target
                                .cache
                                .put(&target.key, &target.data_hash, &target.config_hash, &worker_stats);
                        }
                    }
                    Phase2Exit::Cancelled | Phase2Exit::Faulted(_) => {
                        if let Some((cache, key)) = memory {
                            cache.remove_if_same(&key, &worker_stats);
                        }
                    }
                }
            });

        if let Err(err) = spawned {
            warn!(error = %err, "failed to start phase 2 thread");
            stats.publish(Phase2Metrics {
                status: Phase2Status::panicked(&format!("failed to start background task: {err}")),
                ..Phase2Metrics::default()
            });
        }

        stats
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
