//! In-process cache of recent analysis results.
//!
//! Entries are keyed by `structure_hash | config_hash` and hold the shared
//! [`GraphStats`], so a second identical request gets the same (possibly
//! still computing) result. Every access first drops entries older than
//! the TTL, then evicts the oldest insertions while over capacity.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, OnceLock, PoisonError},
    time::{Duration, Instant},
};

use tracing::debug;

use crate::stats::GraphStats;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CAPACITY: usize = 8;

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
struct Entry {
    stats: Arc<GraphStats>,
    inserted_at: Instant,
    /// Tie-break for entries inserted at the same instant.
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

/// TTL- and capacity-bounded map from cache key to stats.
#[derive(Debug)]
pub struct StatsCache {
    inner: Mutex<Inner>,
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl Default for StatsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsCache {
    /// Default TTL and capacity on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(DEFAULT_TTL, DEFAULT_CAPACITY, Arc::new(SystemClock))
    }

    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn with_clock(ttl: Duration, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            ttl,
            capacity: capacity.max(1),
            clock,
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<GraphStats>> {
        let mut inner = self.lock();
        self.prune(&mut inner);
        let hit = inner.entries.get(key).map(|e| Arc::clone(&e.stats));
        debug!(key, hit = hit.is_some(), "stats cache lookup");
        hit
    }

    /// Insert or replace; a replaced entry counts as newly inserted.
    pub fn insert(&self, key: impl Into<String>, stats: Arc<GraphStats>) {
        let mut inner = self.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key.into(),
            Entry {
                stats,
                inserted_at: self.clock.now(),
                seq,
            },
        );
        self.prune(&mut inner);
    }

    /// Remove `key` only if it still maps to `stats`.
    ///
    /// A run that is cancelled calls this; a newer result under the same
    /// key is left alone.
    pub fn remove_if_same(&self, key: &str, stats: &Arc<GraphStats>) -> bool {
        let mut inner = self.lock();
        let same = inner
            .entries
            .get(key)
            .is_some_and(|e| Arc::ptr_eq(&e.stats, stats));
        if same {
            inner.entries.remove(key);
        }
        same
    }

    pub fn remove(&self, key: &str) -> bool {
        self.lock().entries.remove(key).is_some()
    }

    /// Drop every entry.
    pub fn invalidate(&self) {
        self.lock().entries.clear();
    }

    /// Live entries, after pruning.
    #[must_use]
    pub fn len(&self) -> usize {
        let mut inner = self.lock();
        self.prune(&mut inner);
        inner.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn prune(&self, inner: &mut Inner) {
        let now = self.clock.now();
        let ttl = self.ttl;
        inner
            .entries
            .retain(|_, e| now.saturating_duration_since(e.inserted_at) <= ttl);

        while inner.entries.len() > self.capacity {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| (e.inserted_at, e.seq))
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    debug!(key = %key, "evicting oldest stats cache entry");
                    inner.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

/// The process-wide cache used when an analyzer is not given its own.
pub fn global_cache() -> &'static Arc<StatsCache> {
    static GLOBAL: OnceLock<Arc<StatsCache>> = OnceLock::new();
    GLOBAL.get_or_init(|| Arc::new(StatsCache::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AnalysisConfig, metrics::basic::fast_metrics, test_support::graph};

    fn stats() -> Arc<GraphStats> {
        let g = graph(&["a"], &[]);
        Arc::new(GraphStats::new(&g, fast_metrics(&g), AnalysisConfig::default()))
    }

    fn cache(clock: &Arc<ManualClock>, capacity: usize) -> StatsCache {
        StatsCache::with_clock(Duration::from_secs(60), capacity, Arc::clone(clock) as Arc<dyn Clock>)
    }

    #[test]
    fn hit_returns_shared_stats() {
        let clock = Arc::new(ManualClock::new());
        let c = cache(&clock, 4);
        let s = stats();
        c.insert("k", Arc::clone(&s));
        assert!(Arc::ptr_eq(&c.get("k").expect("hit"), &s));
        assert!(c.get("other").is_none());
    }

    #[test]
    fn entries_expire_after_ttl() {
        let clock = Arc::new(ManualClock::new());
        let c = cache(&clock, 4);
        c.insert("k", stats());
        clock.advance(Duration::from_secs(60));
        assert!(c.get("k").is_some());
        clock.advance(Duration::from_secs(1));
        assert!(c.get("k").is_none());
        assert!(c.is_empty());
    }

    #[test]
    fn oldest_insertion_is_evicted_first() {
        let clock = Arc::new(ManualClock::new());
        let c = cache(&clock, 2);
        c.insert("a", stats());
        c.insert("b", stats());
        // Reading does not refresh insertion order.
        assert!(c.get("a").is_some());
        c.insert("c", stats());
        assert!(c.get("a").is_none());
        assert!(c.get("b").is_some() && c.get("c").is_some());
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn remove_if_same_ignores_replaced_entries() {
        let clock = Arc::new(ManualClock::new());
        let c = cache(&clock, 4);
        let first = stats();
        c.insert("k", Arc::clone(&first));
        c.insert("k", stats());
        assert!(!c.remove_if_same("k", &first));
        assert!(c.get("k").is_some());
        c.invalidate();
        assert!(c.is_empty());
    }
}
