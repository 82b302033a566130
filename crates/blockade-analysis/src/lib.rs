#![forbid(unsafe_code)]
//! blockade-analysis library.
//!
//! Structural analytics over an issue dependency graph, in two phases:
//!
//! - **Phase 1** (caller's thread): degrees, topological order, density.
//! - **Phase 2** (background thread): PageRank, betweenness, eigenvector,
//!   HITS, critical path, cycles, k-core, articulation points, slack.
//!   Each expensive metric runs under its own timeout and falls back on
//!   expiry; a fault degrades the whole snapshot instead of propagating.
//!
//! ```no_run
//! use blockade_analysis::Analyzer;
//! use blockade_core::Issue;
//!
//! let analyzer = Analyzer::new(vec![
//!     Issue::new("a", "Ship").blocked_by("b"),
//!     Issue::new("b", "Build"),
//! ]);
//! let stats = analyzer.analyze();
//! assert_eq!(stats.critical_path_value("a"), Some(2.0));
//! ```
//!
//! # Conventions
//!
//! - **Errors**: construction and analysis never fail. Typed `thiserror`
//!   enums for the disk cache, `anyhow::Result` for configuration loading.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod analyzer;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod graph;
pub mod metrics;
pub mod pipeline;
pub mod stats;

#[cfg(test)]
mod test_support;

pub use analyzer::{Analyzer, BlockerChain, BlockerChainEntry};
pub use cache::{DiskCache, PersistentCache, StatsCache};
pub use cancel::CancelToken;
pub use config::AnalysisConfig;
pub use graph::{DependencyGraph, cycle_key, normalize_cycle};
pub use metrics::BetweennessMode;
pub use pipeline::StartupProfile;
pub use stats::{GraphStats, MetricState, MetricStatus, Phase2Status};
