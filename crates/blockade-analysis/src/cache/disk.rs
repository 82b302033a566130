//! Persistent analysis cache in a JSON file.
//!
//! # File layout
//!
//! ```text
//! $BLOCKADE_CACHE_DIR/            (or the user cache dir + /blockade)
//!   analysis_cache.json           {version, entries: {key: entry}}
//!   analysis_cache.lock           advisory lock, held for every access
//! ```
//!
//! Each access takes the lock, reads the file, drops expired entries,
//! applies its change and writes the file back through a temp file and a
//! rename. A missing, unreadable or old-version file reads as empty.

use std::{
    collections::HashMap,
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use blockade_core::config::{CacheSettings, env_lookup, is_truthy, resolve_cache_dir};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::stats::{GraphStats, StatsSnapshot};

pub const CACHE_FILE_NAME: &str = "analysis_cache.json";
pub const LOCK_FILE_NAME: &str = "analysis_cache.lock";
pub const CACHE_VERSION: u32 = 1;
pub const DEFAULT_MAX_ENTRIES: usize = 10;
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_MAX_ENTRY_BYTES: usize = 10 << 20;
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// Environment switch for [`DiskCache::from_env`].
pub const ENV_DISK_CACHE: &str = "BLOCKADE_DISK_CACHE";

/// A store that outlives the process.
///
/// Implementations must never fail loudly: errors degrade to a miss on
/// `get` and a no-op on `put`.
pub trait PersistentCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<GraphStats>>;

    /// Store ready stats. Stats that are not ready are ignored.
    fn put(&self, key: &str, data_hash: &str, config_hash: &str, stats: &GraphStats);
}

#[derive(Debug, thiserror::Error)]
pub enum DiskCacheError {
    #[error("cache I/O failed at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode cache entry")]
    Json(#[from] serde_json::Error),

    #[error("cache lock timed out after {waited:?} at {path}")]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error("cache entry is {size} bytes, over the {limit}-byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("stats are not ready; nothing to persist")]
    NotReady,
}

impl DiskCacheError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    created_at: DateTime<Utc>,
    accessed_at: DateTime<Utc>,
    data_hash: String,
    config_hash: String,
    stats: StatsSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    #[serde(default)]
    entries: HashMap<String, CacheEntry>,
}

impl Default for CacheFile {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// JSON-file [`PersistentCache`].
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    max_entries: usize,
    max_age: Duration,
    max_entry_bytes: usize,
    lock_timeout: Duration,
}

impl DiskCache {
    /// Cache in `dir` with default limits. The directory is created on
    /// first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_entries: DEFAULT_MAX_ENTRIES,
            max_age: DEFAULT_MAX_AGE,
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    #[must_use]
    pub const fn with_max_entry_bytes(mut self, limit: usize) -> Self {
        self.max_entry_bytes = limit;
        self
    }

    /// Enabled when `BLOCKADE_DISK_CACHE` is truthy.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_settings(&CacheSettings::default(), env_lookup)
    }

    /// Enabled when `settings.disk` is set or `BLOCKADE_DISK_CACHE` is
    /// truthy. `settings.dir` wins over the environment for the location.
    #[must_use]
    pub fn from_settings(settings: &CacheSettings, lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let enabled = settings.disk || lookup(ENV_DISK_CACHE).is_some_and(|v| is_truthy(&v));
        if !enabled {
            return None;
        }
        let dir = settings.dir.clone().or_else(|| resolve_cache_dir(&lookup));
        if dir.is_none() {
            warn!("disk cache enabled but no cache directory could be resolved");
        }
        dir.map(Self::new)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE_NAME)
    }

    /// Look up `key` as of `now`, bumping its access time on a hit.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock cannot be taken or the file cannot be
    /// rewritten. A corrupt file is not an error; it reads as empty.
    pub fn try_get_at(&self, key: &str, now: DateTime<Utc>) -> Result<Option<StatsSnapshot>, DiskCacheError> {
        if !self.file_path().exists() {
            return Ok(None);
        }
        let _lock = CacheLock::acquire(&self.dir.join(LOCK_FILE_NAME), self.lock_timeout)?;

        let mut file = self.read_file();
        let expired = self.prune_expired(&mut file, now);

        let hit = file.entries.get_mut(key).map(|entry| {
            entry.accessed_at = now;
            entry.stats.clone()
        });

        if hit.is_some() || expired > 0 {
            self.write_file(&file)?;
        }
        debug!(key, hit = hit.is_some(), expired, "disk cache lookup");
        Ok(hit)
    }

    /// Store `snapshot` under `key` as of `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry exceeds the size limit, the lock
    /// cannot be taken, or the file cannot be written.
    pub fn try_put_at(
        &self,
        key: &str,
        data_hash: &str,
        config_hash: &str,
        snapshot: StatsSnapshot,
        now: DateTime<Utc>,
    ) -> Result<(), DiskCacheError> {
        let entry = CacheEntry {
            created_at: now,
            accessed_at: now,
            data_hash: data_hash.to_string(),
            config_hash: config_hash.to_string(),
            stats: snapshot,
        };
        let size = serde_json::to_vec(&entry)?.len();
        if size > self.max_entry_bytes {
            return Err(DiskCacheError::TooLarge {
                size,
                limit: self.max_entry_bytes,
            });
        }

        fs::create_dir_all(&self.dir).map_err(|e| DiskCacheError::io(&self.dir, e))?;
        let _lock = CacheLock::acquire(&self.dir.join(LOCK_FILE_NAME), self.lock_timeout)?;

        let mut file = self.read_file();
        self.prune_expired(&mut file, now);
        file.entries.insert(key.to_string(), entry);
        self.evict_lru(&mut file);
        self.write_file(&file)
    }

    /// Keys currently on disk, for diagnostics.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read_file().entries.into_keys().collect();
        keys.sort_unstable();
        keys
    }

    fn read_file(&self) -> CacheFile {
        let path = self.file_path();
        let Ok(bytes) = fs::read(&path) else {
            return CacheFile::default();
        };
        match serde_json::from_slice::<CacheFile>(&bytes) {
            Ok(file) if file.version == CACHE_VERSION => file,
            Ok(file) => {
                debug!(version = file.version, "disk cache version mismatch, starting fresh");
                CacheFile::default()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "corrupt disk cache, starting fresh");
                CacheFile::default()
            }
        }
    }

    fn write_file(&self, file: &CacheFile) -> Result<(), DiskCacheError> {
        let path = self.file_path();
        let tmp = self.dir.join(format!("{CACHE_FILE_NAME}.tmp"));
        let bytes = serde_json::to_vec_pretty(file)?;
        fs::write(&tmp, bytes).map_err(|e| DiskCacheError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| DiskCacheError::io(&path, e))
    }

    fn prune_expired(&self, file: &mut CacheFile, now: DateTime<Utc>) -> usize {
        let before = file.entries.len();
        file.entries
            .retain(|_, e| (now - e.created_at).to_std().map_or(true, |age| age <= self.max_age));
        before - file.entries.len()
    }

    /// Drop least recently accessed entries beyond `max_entries`; ties go
    /// by key.
    fn evict_lru(&self, file: &mut CacheFile) {
        if file.entries.len() <= self.max_entries {
            return;
        }
        let mut order: Vec<(DateTime<Utc>, String)> = file
            .entries
            .iter()
            .map(|(k, e)| (e.accessed_at, k.clone()))
            .collect();
        order.sort();
        let excess = file.entries.len() - self.max_entries;
        for (_, key) in order.into_iter().take(excess) {
            file.entries.remove(&key);
        }
    }
}

impl PersistentCache for DiskCache {
    fn get(&self, key: &str) -> Option<Arc<GraphStats>> {
        match self.try_get_at(key, Utc::now()) {
            Ok(hit) => hit.map(|snapshot| Arc::new(GraphStats::from_snapshot(snapshot))),
            Err(err) => {
                warn!(error = %err, "disk cache read failed");
                None
            }
        }
    }

    fn put(&self, key: &str, data_hash: &str, config_hash: &str, stats: &GraphStats) {
        let result = stats
            .snapshot()
            .ok_or(DiskCacheError::NotReady)
            .and_then(|snapshot| self.try_put_at(key, data_hash, config_hash, snapshot, Utc::now()));
        if let Err(err) = result {
            warn!(error = %err, "disk cache write failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Locking
// ---------------------------------------------------------------------------

/// Exclusive advisory lock, released on drop.
#[derive(Debug)]
struct CacheLock {
    file: File,
}

impl CacheLock {
    fn acquire(path: &Path, timeout: Duration) -> Result<Self, DiskCacheError> {
        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)
                .map_err(|e| DiskCacheError::io(path, e))?;

            if file.try_lock_exclusive().is_ok() {
                return Ok(Self { file });
            }

            if start.elapsed() >= timeout {
                return Err(DiskCacheError::LockTimeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
