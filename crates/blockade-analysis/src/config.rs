//! Analysis configuration: which Phase 2 metrics run and how long each may
//! take.
//!
//! Presets scale with graph size so worst-case latency stays bounded:
//!
//! | Nodes      | Timeouts | Betweenness                    | Cycles          | HITS                  |
//! |------------|----------|--------------------------------|-----------------|-----------------------|
//! | < 100      | 2 s      | exact                          | up to 1000      | on                    |
//! | < 500      | 500 ms   | exact                          | up to 100       | on                    |
//! | < 2000     | 300 ms   | sampled if sparse, else skipped| up to 50        | on                    |
//! | ≥ 2000     | 200 ms   | sampled                        | skipped         | only if very sparse   |
//!
//! Environment overrides (`BLOCKADE_SKIP_PHASE2`, `BLOCKADE_PHASE2_TIMEOUT_S`)
//! and `.blockade/config.toml` settings are layered on top.

use std::{path::Path, time::Duration};

use anyhow::Result;
use blockade_core::config::{AnalysisSettings, env_lookup, is_truthy, load_project_config};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{graph::build::short_hex, metrics::betweenness::{BetweennessMode, recommend_sample_size}};

pub const ENV_SKIP_PHASE2: &str = "BLOCKADE_SKIP_PHASE2";
pub const ENV_PHASE2_TIMEOUT_S: &str = "BLOCKADE_PHASE2_TIMEOUT_S";

/// Seed for approximate betweenness pivot sampling.
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

/// Which Phase 2 metrics to compute, and their budgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub compute_pagerank: bool,
    #[serde(with = "duration_ms")]
    pub pagerank_timeout: Duration,
    pub pagerank_skip_reason: String,

    pub compute_betweenness: bool,
    #[serde(with = "duration_ms")]
    pub betweenness_timeout: Duration,
    pub betweenness_mode: BetweennessMode,
    pub betweenness_sample_size: usize,
    pub betweenness_seed: u64,
    pub betweenness_skip_reason: String,

    pub compute_hits: bool,
    #[serde(with = "duration_ms")]
    pub hits_timeout: Duration,
    pub hits_skip_reason: String,

    pub compute_cycles: bool,
    #[serde(with = "duration_ms")]
    pub cycles_timeout: Duration,
    pub max_cycles_to_store: usize,
    pub cycles_skip_reason: String,

    pub compute_eigenvector: bool,
    pub compute_critical_path: bool,
    pub compute_kcore: bool,
    pub compute_articulation: bool,
    pub compute_slack: bool,
}

impl Default for AnalysisConfig {
    /// Everything on, 500 ms per guarded metric, exact betweenness.
    fn default() -> Self {
        Self::all_on(Duration::from_millis(500), 100)
    }
}

impl AnalysisConfig {
    fn all_on(timeout: Duration, max_cycles: usize) -> Self {
        Self {
            compute_pagerank: true,
            pagerank_timeout: timeout,
            pagerank_skip_reason: String::new(),
            compute_betweenness: true,
            betweenness_timeout: timeout,
            betweenness_mode: BetweennessMode::Exact,
            betweenness_sample_size: 0,
            betweenness_seed: DEFAULT_SAMPLE_SEED,
            betweenness_skip_reason: String::new(),
            compute_hits: true,
            hits_timeout: timeout,
            hits_skip_reason: String::new(),
            compute_cycles: true,
            cycles_timeout: timeout,
            max_cycles_to_store: max_cycles,
            cycles_skip_reason: String::new(),
            compute_eigenvector: true,
            compute_critical_path: true,
            compute_kcore: true,
            compute_articulation: true,
            compute_slack: true,
        }
    }

    /// Preset chosen by graph size and density.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn for_size(nodes: usize, edges: usize) -> Self {
        let density = if nodes > 1 {
            edges as f64 / (nodes as f64 * (nodes as f64 - 1.0))
        } else {
            0.0
        };

        match nodes {
            n if n < 100 => Self::all_on(Duration::from_secs(2), 1000),
            n if n < 500 => Self::all_on(Duration::from_millis(500), 100),
            n if n < 2000 => {
                let mut cfg = Self::all_on(Duration::from_millis(300), 50);
                if density < 0.01 {
                    cfg.betweenness_mode = BetweennessMode::Approximate;
                    cfg.betweenness_sample_size = recommend_sample_size(n);
                    cfg.betweenness_timeout = Duration::from_millis(500);
                } else {
                    cfg.compute_betweenness = false;
                    cfg.betweenness_skip_reason = "graph too dense (density > 0.01)".to_string();
                }
                cfg
            }
            n => {
                let mut cfg = Self::all_on(Duration::from_millis(200), 10);
                cfg.betweenness_mode = BetweennessMode::Approximate;
                cfg.betweenness_sample_size = recommend_sample_size(n);
                cfg.betweenness_timeout = Duration::from_millis(500);
                cfg.compute_cycles = false;
                cfg.cycles_skip_reason = "graph too large (>2000 nodes)".to_string();
                if density >= 0.001 {
                    cfg.compute_hits = false;
                    cfg.hits_skip_reason = "graph too large and dense".to_string();
                }
                cfg
            }
        }
    }

    /// Everything on with very generous budgets, regardless of size.
    #[must_use]
    pub fn full() -> Self {
        Self::all_on(Duration::from_secs(30), 10_000)
    }

    /// Only what scoring needs: PageRank and sampled betweenness.
    #[must_use]
    pub fn triage() -> Self {
        let mut cfg = Self::no_phase2();
        cfg.compute_pagerank = true;
        cfg.pagerank_timeout = Duration::from_millis(200);
        cfg.compute_betweenness = true;
        cfg.betweenness_mode = BetweennessMode::Approximate;
        cfg.betweenness_sample_size = 50;
        cfg.betweenness_timeout = Duration::from_millis(200);
        cfg
    }

    /// Every Phase 2 metric disabled.
    #[must_use]
    pub fn no_phase2() -> Self {
        Self {
            compute_pagerank: false,
            compute_betweenness: false,
            compute_hits: false,
            compute_cycles: false,
            compute_eigenvector: false,
            compute_critical_path: false,
            compute_kcore: false,
            compute_articulation: false,
            compute_slack: false,
            ..Self::default()
        }
    }

    /// True when no Phase 2 metric is enabled.
    #[must_use]
    pub const fn all_phase2_disabled(&self) -> bool {
        !self.compute_pagerank
            && !self.compute_betweenness
            && !self.compute_hits
            && !self.compute_cycles
            && !self.compute_eigenvector
            && !self.compute_critical_path
            && !self.compute_kcore
            && !self.compute_articulation
            && !self.compute_slack
    }

    /// Guarded metrics the configuration disables, with the reason.
    #[must_use]
    pub fn skipped_metrics(&self) -> Vec<(&'static str, &str)> {
        let mut skipped = Vec::new();
        if !self.compute_betweenness {
            skipped.push(("betweenness", self.betweenness_skip_reason.as_str()));
        }
        if !self.compute_pagerank {
            skipped.push(("pagerank", self.pagerank_skip_reason.as_str()));
        }
        if !self.compute_hits {
            skipped.push(("hits", self.hits_skip_reason.as_str()));
        }
        if !self.compute_cycles {
            skipped.push(("cycles", self.cycles_skip_reason.as_str()));
        }
        skipped
    }

    /// Apply `BLOCKADE_SKIP_PHASE2` and `BLOCKADE_PHASE2_TIMEOUT_S`.
    ///
    /// `lookup` reads a variable; pass [`env_lookup`] for the process
    /// environment. Skipping leaves k-core, articulation and slack on:
    /// they are linear and cheap. The timeout applies only to the guarded
    /// metrics that are still enabled.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if lookup(ENV_SKIP_PHASE2).is_some_and(|v| is_truthy(&v)) {
            let reason = format!("{ENV_SKIP_PHASE2} set");
            self.compute_betweenness = false;
            self.betweenness_skip_reason.clone_from(&reason);
            self.compute_pagerank = false;
            self.pagerank_skip_reason.clone_from(&reason);
            self.compute_hits = false;
            self.hits_skip_reason.clone_from(&reason);
            self.compute_cycles = false;
            self.cycles_skip_reason = reason;
            self.compute_eigenvector = false;
            self.compute_critical_path = false;
        }

        if let Some(raw) = lookup(ENV_PHASE2_TIMEOUT_S) {
            let parsed = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|secs| *secs > 0.0)
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
            match parsed {
                Some(timeout) => {
                    for (enabled, slot) in [
                        (self.compute_pagerank, &mut self.pagerank_timeout),
                        (self.compute_betweenness, &mut self.betweenness_timeout),
                        (self.compute_hits, &mut self.hits_timeout),
                        (self.compute_cycles, &mut self.cycles_timeout),
                    ] {
                        if enabled {
                            *slot = timeout;
                        }
                    }
                }
                None => warn!(value = %raw, "ignoring invalid {ENV_PHASE2_TIMEOUT_S}"),
            }
        }

        self
    }

    /// Apply `[analysis]` settings from a project config file.
    #[must_use]
    pub fn with_settings(mut self, settings: &AnalysisSettings) -> Self {
        fn set<T: Copy>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        set(&mut self.compute_pagerank, settings.pagerank);
        set(&mut self.compute_betweenness, settings.betweenness);
        set(&mut self.compute_eigenvector, settings.eigenvector);
        set(&mut self.compute_hits, settings.hits);
        set(&mut self.compute_critical_path, settings.critical_path);
        set(&mut self.compute_cycles, settings.cycles);
        set(&mut self.compute_kcore, settings.kcore);
        set(&mut self.compute_articulation, settings.articulation);
        set(&mut self.compute_slack, settings.slack);
        set(&mut self.pagerank_timeout, settings.pagerank_timeout_ms.map(Duration::from_millis));
        set(&mut self.betweenness_timeout, settings.betweenness_timeout_ms.map(Duration::from_millis));
        set(&mut self.hits_timeout, settings.hits_timeout_ms.map(Duration::from_millis));
        set(&mut self.cycles_timeout, settings.cycles_timeout_ms.map(Duration::from_millis));
        set(&mut self.betweenness_sample_size, settings.betweenness_sample_size);
        set(&mut self.max_cycles_to_store, settings.max_cycles);

        match settings.betweenness_mode.as_deref().map(str::trim) {
            Some(mode) if mode.eq_ignore_ascii_case("exact") => {
                self.betweenness_mode = BetweennessMode::Exact;
            }
            Some(mode) if mode.eq_ignore_ascii_case("approximate") => {
                self.betweenness_mode = BetweennessMode::Approximate;
                if self.betweenness_sample_size == 0 {
                    self.betweenness_sample_size = 100;
                }
            }
            Some(other) => warn!(mode = other, "unknown betweenness_mode in config"),
            None => {}
        }

        for (enabled, reason) in [
            (self.compute_pagerank, &mut self.pagerank_skip_reason),
            (self.compute_betweenness, &mut self.betweenness_skip_reason),
            (self.compute_hits, &mut self.hits_skip_reason),
            (self.compute_cycles, &mut self.cycles_skip_reason),
        ] {
            if !enabled && reason.is_empty() {
                *reason = "disabled in config".to_string();
            }
        }

        self
    }

    /// Size preset plus project file plus environment, in that order.
    ///
    /// # Errors
    ///
    /// Returns an error if `.blockade/config.toml` exists but is unreadable
    /// or malformed.
    pub fn resolve(project_root: &Path, nodes: usize, edges: usize) -> Result<Self> {
        let project = load_project_config(project_root)?;
        Ok(Self::for_size(nodes, edges)
            .with_settings(&project.analysis)
            .with_env_overrides(env_lookup))
    }

    /// Short stable hash of this configuration, for cache keys.
    #[must_use]
    pub fn config_hash(&self) -> String {
        // Serializing a plain struct of scalars cannot fail; fall back to
        // Debug output just in case so the key is still deterministic.
        let bytes = serde_json::to_vec(self).unwrap_or_else(|_| format!("{self:?}").into_bytes());
        short_hex(&blake3::hash(&bytes))
    }
}

/// Serialize a [`Duration`] as whole milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn small_graphs_get_everything_exact() {
        let cfg = AnalysisConfig::for_size(50, 60);
        assert!(cfg.compute_betweenness && cfg.compute_cycles && cfg.compute_hits);
        assert_eq!(cfg.betweenness_mode, BetweennessMode::Exact);
        assert_eq!(cfg.pagerank_timeout, Duration::from_secs(2));
        assert_eq!(cfg.max_cycles_to_store, 1000);
    }

    #[test]
    fn medium_graphs_use_standard_budgets() {
        let cfg = AnalysisConfig::for_size(300, 400);
        assert_eq!(cfg.betweenness_mode, BetweennessMode::Exact);
        assert_eq!(cfg.cycles_timeout, Duration::from_millis(500));
        assert_eq!(cfg.max_cycles_to_store, 100);
    }

    #[test]
    fn large_sparse_graphs_sample_betweenness() {
        let cfg = AnalysisConfig::for_size(1000, 1500);
        assert!(cfg.compute_betweenness);
        assert_eq!(cfg.betweenness_mode, BetweennessMode::Approximate);
        assert_eq!(cfg.betweenness_sample_size, 100);
        assert_eq!(cfg.betweenness_timeout, Duration::from_millis(500));
    }

    #[test]
    fn large_dense_graphs_skip_betweenness() {
        let cfg = AnalysisConfig::for_size(1000, 50_000);
        assert!(!cfg.compute_betweenness);
        assert!(cfg.betweenness_skip_reason.contains("dense"));
        assert_eq!(cfg.skipped_metrics(), vec![("betweenness", "graph too dense (density > 0.01)")]);
    }

    #[test]
    fn huge_graphs_skip_cycles_and_dense_hits() {
        let sparse = AnalysisConfig::for_size(5000, 5000);
        assert!(!sparse.compute_cycles);
        assert_eq!(sparse.cycles_skip_reason, "graph too large (>2000 nodes)");
        assert!(sparse.compute_hits);
        assert_eq!(sparse.betweenness_sample_size, 200);

        let dense = AnalysisConfig::for_size(5000, 100_000);
        assert!(!dense.compute_hits);
        assert_eq!(dense.hits_skip_reason, "graph too large and dense");
    }

    #[test]
    fn triage_and_no_phase2_presets() {
        let triage = AnalysisConfig::triage();
        assert!(triage.compute_pagerank && triage.compute_betweenness);
        assert!(!triage.compute_hits && !triage.compute_slack);
        assert_eq!(triage.betweenness_sample_size, 50);

        assert!(AnalysisConfig::no_phase2().all_phase2_disabled());
        assert!(!AnalysisConfig::default().all_phase2_disabled());
    }

    #[test]
    fn env_skip_keeps_linear_metrics() {
        let cfg = AnalysisConfig::default().with_env_overrides(env(&[(ENV_SKIP_PHASE2, "yes")]));
        assert!(!cfg.compute_pagerank && !cfg.compute_cycles && !cfg.compute_eigenvector);
        assert!(cfg.compute_kcore && cfg.compute_articulation && cfg.compute_slack);
        assert_eq!(cfg.pagerank_skip_reason, "BLOCKADE_SKIP_PHASE2 set");
    }

    #[test]
    fn env_timeout_overrides_all_guarded_metrics() {
        let cfg = AnalysisConfig::default().with_env_overrides(env(&[(ENV_PHASE2_TIMEOUT_S, "3")]));
        assert_eq!(cfg.pagerank_timeout, Duration::from_secs(3));
        assert_eq!(cfg.cycles_timeout, Duration::from_secs(3));

        let ignored = AnalysisConfig::default().with_env_overrides(env(&[(ENV_PHASE2_TIMEOUT_S, "-1")]));
        assert_eq!(ignored.pagerank_timeout, Duration::from_millis(500));
    }

    #[test]
    fn env_timeout_out_of_range_is_ignored() {
        for raw in ["1e20", "inf", "NaN", "soon"] {
            let cfg = AnalysisConfig::for_size(10, 10).with_env_overrides(env(&[(ENV_PHASE2_TIMEOUT_S, raw)]));
            assert_eq!(cfg.pagerank_timeout, Duration::from_secs(2), "{raw}");
        }
    }

    #[test]
    fn env_timeout_leaves_disabled_metrics_alone() {
        let cfg = AnalysisConfig::for_size(1000, 50_000).with_env_overrides(env(&[(ENV_PHASE2_TIMEOUT_S, "3")]));
        assert!(!cfg.compute_betweenness);
        assert_eq!(cfg.betweenness_timeout, Duration::from_millis(300));
        assert_eq!(cfg.pagerank_timeout, Duration::from_secs(3));

        let skipped = AnalysisConfig::default().with_env_overrides(env(&[
            (ENV_SKIP_PHASE2, "1"),
            (ENV_PHASE2_TIMEOUT_S, "3"),
        ]));
        assert_eq!(skipped.hits_timeout, Duration::from_millis(500));
    }

    #[test]
    fn file_settings_layer_on_top() {
        let settings = AnalysisSettings {
            hits: Some(false),
            pagerank_timeout_ms: Some(1234),
            betweenness_mode: Some("Approximate".to_string()),
            max_cycles: Some(7),
            ..AnalysisSettings::default()
        };
        let cfg = AnalysisConfig::default().with_settings(&settings);
        assert!(!cfg.compute_hits);
        assert_eq!(cfg.hits_skip_reason, "disabled in config");
        assert_eq!(cfg.pagerank_timeout, Duration::from_millis(1234));
        assert_eq!(cfg.betweenness_mode, BetweennessMode::Approximate);
        assert_eq!(cfg.betweenness_sample_size, 100);
        assert_eq!(cfg.max_cycles_to_store, 7);
    }

    #[test]
    fn config_hash_tracks_content() {
        let a = AnalysisConfig::default();
        let mut b = a.clone();
        assert_eq!(a.config_hash(), b.config_hash());
        b.max_cycles_to_store = 5;
        assert_ne!(a.config_hash(), b.config_hash());
        assert_eq!(a.config_hash().len(), 16);
    }

    #[test]
    fn serializes_timeouts_as_millis() {
        let json = serde_json::to_value(AnalysisConfig::default()).expect("serialize");
        assert_eq!(json["pagerank_timeout"], 500);
        let back: AnalysisConfig = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, AnalysisConfig::default());
    }
}
