//! Result caching.
//!
//! Two tiers:
//!
//! - [`memory::StatsCache`]: in-process, keyed by graph structure plus
//!   config. Short TTL, small capacity. Always consulted unless the
//!   persistent tier is active.
//! - [`disk::PersistentCache`]: optional, keyed by full issue content plus
//!   config ([`hash::data_hash`]), survives restarts.

pub mod disk;
pub mod hash;
pub mod memory;

pub use disk::{DiskCache, DiskCacheError, PersistentCache};
pub use hash::{cache_key, data_hash};
pub use memory::{Clock, ManualClock, StatsCache, SystemClock, global_cache};
