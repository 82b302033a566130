//! Dependency graph model.
//!
//! # Overview
//!
//! ```text
//! &[Issue]
//!    ↓  build::DependencyGraph::build()
//! DependencyGraph (dense indices, blocking edges only, may be cyclic)
//!    ├─ undirected::UndirectedView   → k-core, articulation points
//!    ├─ condense::Condensation       → topological fallback, heights, slack
//!    └─ cycles                       → detection + bounded enumeration
//! ```
//!
//! ## Cache Invalidation
//!
//! [`DependencyGraph::structure_hash`] changes exactly when a node or a
//! blocking edge changes; it is the structural half of the computation
//! cache key.

pub mod build;
pub mod condense;
pub mod critical_path;
pub mod cycles;
pub mod undirected;

pub use build::{DependencyGraph, NodeIds};
pub use condense::Condensation;
pub use cycles::{CycleEnumeration, cycle_key, enumerate_cycles, has_cycles, normalize_cycle};
pub use undirected::UndirectedView;
