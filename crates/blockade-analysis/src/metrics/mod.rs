//! Graph metrics.
//!
//! # Overview
//!
//! Each metric answers a different question about issue importance:
//!
//! - **Degree, topological order, density** (`basic`): Phase 1, instant.
//! - **PageRank** (`pagerank`): which issues does the most work flow into?
//! - **Betweenness** (`betweenness`): which issues are bottlenecks?
//! - **Eigenvector** (`eigenvector`): which issues are depended on by other
//!   central issues?
//! - **HITS** (`hits`): hubs (depend on much) vs authorities (depended on).
//! - **K-core** (`kcore`) and **articulation points** (`articulation`):
//!   structural cohesion of the undirected projection.
//!
//! All metrics return flat vectors indexed by the graph's dense node
//! index; [`crate::stats::GraphStats`] maps them back to issue IDs.
//! Iterative metrics take a [`crate::cancel::CancelToken`] and stop early
//! when it fires.

pub mod articulation;
pub mod basic;
pub mod betweenness;
pub mod eigenvector;
pub mod hits;
pub mod kcore;
pub mod pagerank;
pub mod rank;

pub use betweenness::{BetweennessMode, BetweennessResult, recommend_sample_size};
pub use hits::HitsResult;
pub use pagerank::{PageRankConfig, PageRankResult};
