//! blockade-core library.
//!
//! Shared vocabulary for the blockade workspace: the issue model consumed
//! by the analysis engine, project configuration files, and logging setup.
//!
//! # Conventions
//!
//! - **Errors**: `anyhow::Result` for configuration loading, typed
//!   `thiserror` enums where a caller can act on the variant.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod config;
pub mod model;
pub mod telemetry;

pub use model::{Dependency, DependencyType, Issue, ParseEnumError, Status};
