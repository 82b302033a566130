//! Per-phase timing for one analysis run.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::AnalysisConfig;

/// Startup above this is worth a recommendation.
const SLOW_STARTUP: Duration = Duration::from_millis(500);

/// Where the time went during one analysis.
///
/// Durations of metrics that did not run are zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartupProfile {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,

    pub build_graph: Duration,
    pub phase1: Duration,

    pub pagerank: Duration,
    pub pagerank_timed_out: bool,
    pub betweenness: Duration,
    pub betweenness_timed_out: bool,
    pub eigenvector: Duration,
    pub hits: Duration,
    pub hits_timed_out: bool,
    pub critical_path: Duration,
    pub cycles: Duration,
    pub cycles_timed_out: bool,
    pub cycle_count: usize,
    pub kcore: Duration,
    pub articulation: Duration,
    pub slack: Duration,
    pub phase2_total: Duration,

    pub total: Duration,
    pub config: AnalysisConfig,
}

impl StartupProfile {
    #[must_use]
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Render as JSON with durations in microseconds.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "node_count": self.node_count,
            "edge_count": self.edge_count,
            "density": self.density,
            "size_tier": size_tier(self.node_count),
            "build_graph_us": self.build_graph.as_micros(),
            "phase1_us": self.phase1.as_micros(),
            "phase2_us": self.phase2_total.as_micros(),
            "total_us": self.total.as_micros(),
            "metrics": self.metric_rows().iter().map(|row| json!({
                "name": row.name,
                "enabled": row.enabled,
                "elapsed_us": row.elapsed.as_micros(),
                "timed_out": row.timed_out,
            })).collect::<Vec<_>>(),
            "cycle_count": self.cycle_count,
            "config_hash": self.config.config_hash(),
        })
    }

    /// Render as a fixed-width table for terminal output.
    #[must_use]
    pub fn display_table(&self) -> String {
        let mut out = format!(
            "{} nodes, {} edges, density {:.4} ({})\n",
            self.node_count,
            self.edge_count,
            self.density,
            size_tier(self.node_count)
        );
        out.push_str("phase                     elapsed  status\n");
        out.push_str("------------------------------------------\n");
        out.push_str(&row("build graph", self.build_graph, ""));
        out.push_str(&row("phase 1", self.phase1, ""));

        for metric in self.metric_rows() {
            let status = match (metric.enabled, metric.timed_out) {
                (false, _) => "skipped",
                (true, true) => "TIMEOUT",
                (true, false) => "",
            };
            out.push_str(&row(&format!("  {}", metric.name), metric.elapsed, status));
        }

        out.push_str(&row("phase 2", self.phase2_total, ""));
        out.push_str("------------------------------------------\n");
        out.push_str(&row("total", self.total, ""));
        if self.cycle_count > 0 {
            out.push_str(&format!("{} cycles found\n", self.cycle_count));
        }
        out
    }

    /// Human-readable tuning suggestions.
    #[must_use]
    pub fn recommendations(&self) -> Vec<String> {
        let mut recs = Vec::new();
        if self.total > SLOW_STARTUP {
            recs.push(format!(
                "Startup took {}; consider the triage preset or BLOCKADE_SKIP_PHASE2 for interactive use",
                format_duration(self.total).trim()
            ));
        }
        if self.pagerank_timed_out {
            recs.push("PageRank timed out; scores fell back to uniform".to_string());
        }
        if self.betweenness_timed_out {
            recs.push("Betweenness timed out; try approximate mode with a smaller sample".to_string());
        }
        if self.hits_timed_out {
            recs.push("HITS timed out; hub and authority scores are unavailable".to_string());
        }
        if self.cycles_timed_out {
            recs.push("Cycle enumeration timed out; lower max_cycles or disable cycles".to_string());
        }
        recs
    }

    fn metric_rows(&self) -> [MetricRow; 9] {
        let c = &self.config;
        [
            MetricRow::new("pagerank", c.compute_pagerank, self.pagerank, self.pagerank_timed_out),
            MetricRow::new("betweenness", c.compute_betweenness, self.betweenness, self.betweenness_timed_out),
            MetricRow::new("eigenvector", c.compute_eigenvector, self.eigenvector, false),
            MetricRow::new("hits", c.compute_hits, self.hits, self.hits_timed_out),
            MetricRow::new("critical path", c.compute_critical_path, self.critical_path, false),
            MetricRow::new("cycles", c.compute_cycles, self.cycles, self.cycles_timed_out),
            MetricRow::new("k-core", c.compute_kcore, self.kcore, false),
            MetricRow::new("articulation", c.compute_articulation, self.articulation, false),
            MetricRow::new("slack", c.compute_slack, self.slack, false),
        ]
    }
}

struct MetricRow {
    name: &'static str,
    enabled: bool,
    elapsed: Duration,
    timed_out: bool,
}

impl MetricRow {
    const fn new(name: &'static str, enabled: bool, elapsed: Duration, timed_out: bool) -> Self {
        Self {
            name,
            enabled,
            elapsed,
            timed_out,
        }
    }
}

fn row(label: &str, elapsed: Duration, status: &str) -> String {
    let line = format!("{label:<22} {}  {status}", format_duration(elapsed));
    format!("{}\n", line.trim_end())
}

/// Size bucket matching the preset tiers.
#[must_use]
pub const fn size_tier(nodes: usize) -> &'static str {
    match nodes {
        0..100 => "Small (<100 issues)",
        100..500 => "Medium (100-500 issues)",
        500..2000 => "Large (500-2000 issues)",
        _ => "XL (>2000 issues)",
    }
}

/// Right-aligned, eight characters wide.
#[allow(clippy::cast_precision_loss)]
fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();
    if micros >= 1_000_000 {
        format!("{:>7.2}s", duration.as_secs_f64())
    } else if micros >= 10_000 {
        format!("{:>6}ms", micros / 1_000)
    } else {
        format!("{:>6.2}ms", micros as f64 / 1_000.0)
    }
}
