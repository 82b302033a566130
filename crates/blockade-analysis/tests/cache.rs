//! Cache tiers seen from the analyzer: sharing, expiry and persistence.

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use blockade_analysis::{
    AnalysisConfig, Analyzer, DiskCache, PersistentCache, StatsCache,
    cache::{Clock, ManualClock},
};
use blockade_core::Issue;
use tempfile::TempDir;

fn sample() -> Vec<Issue> {
    vec![
        Issue::new("api", "Public API").blocked_by("db"),
        Issue::new("db", "Schema"),
        Issue::new("ui", "Frontend").blocked_by("api"),
    ]
}

/// Persistent writes land on the Phase 2 thread after waiters wake.
fn wait_for_keys(cache: &DiskCache, count: usize) -> Vec<String> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let keys = cache.keys();
        if keys.len() >= count || Instant::now() >= deadline {
            return keys;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn memory_tier_expires_with_injected_clock() {
    let clock = Arc::new(ManualClock::new());
    let cache = Arc::new(StatsCache::with_clock(
        Duration::from_secs(300),
        8,
        Arc::clone(&clock) as Arc<dyn Clock>,
    ));

    let first = Analyzer::new(sample()).with_cache(Arc::clone(&cache)).analyze();
    let again = Analyzer::new(sample()).with_cache(Arc::clone(&cache)).analyze();
    assert!(Arc::ptr_eq(&first, &again));

    clock.advance(Duration::from_secs(301));
    let fresh = Analyzer::new(sample()).with_cache(cache).analyze();
    assert!(!Arc::ptr_eq(&first, &fresh));
}

#[test]
fn memory_tier_ignores_titles() {
    // Keyed on structure: a retitle reuses the cached stats.
    let cache = Arc::new(StatsCache::new());
    let first = Analyzer::new(sample()).with_cache(Arc::clone(&cache)).analyze();

    let mut retitled = sample();
    retitled[0].title = "Renamed".to_string();
    let second = Analyzer::new(retitled).with_cache(cache).analyze();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn disk_tier_survives_a_new_analyzer() {
    let dir = TempDir::new().expect("tempdir");
    let disk = Arc::new(DiskCache::new(dir.path()));

    let first = Analyzer::new(sample())
        .with_persistent_cache(Arc::clone(&disk) as Arc<dyn PersistentCache>)
        .analyze();
    assert!(first.is_ready());
    assert_eq!(wait_for_keys(&disk, 1).len(), 1);

    let restored = Analyzer::new(sample())
        .with_persistent_cache(Arc::clone(&disk) as Arc<dyn PersistentCache>)
        .analyze();
    assert!(!Arc::ptr_eq(&first, &restored));
    assert!(restored.is_ready());
    assert_eq!(restored.critical_path_value("db"), first.critical_path_value("db"));
    assert_eq!(restored.pagerank().len(), 3);
}

#[test]
fn disk_tier_keys_on_content_and_config() {
    let dir = TempDir::new().expect("tempdir");
    let disk = Arc::new(DiskCache::new(dir.path()));
    let persistent = || Arc::clone(&disk) as Arc<dyn PersistentCache>;

    Analyzer::new(sample()).with_persistent_cache(persistent()).analyze();
    assert_eq!(wait_for_keys(&disk, 1).len(), 1);

    let mut retitled = sample();
    retitled[1].title = "Schema v2".to_string();
    Analyzer::new(retitled).with_persistent_cache(persistent()).analyze();
    assert_eq!(wait_for_keys(&disk, 2).len(), 2);

    Analyzer::new(sample())
        .with_persistent_cache(persistent())
        .with_config(AnalysisConfig::triage())
        .analyze();
    assert_eq!(wait_for_keys(&disk, 3).len(), 3);
}

#[test]
fn corrupt_disk_file_reads_as_miss() {
    let dir = TempDir::new().expect("tempdir");
    let disk = DiskCache::new(dir.path());
    std::fs::write(disk.file_path(), b"{ not json").expect("write");

    assert!(disk.get("anything").is_none());
    assert!(disk.keys().is_empty());
}
