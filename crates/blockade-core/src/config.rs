use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-level settings read from `.blockade/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Optional overrides layered on top of the size-based analysis preset.
///
/// Every field is optional: an absent key keeps the preset's value.
/// Timeouts are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub pagerank: Option<bool>,
    pub betweenness: Option<bool>,
    pub eigenvector: Option<bool>,
    pub hits: Option<bool>,
    pub critical_path: Option<bool>,
    pub cycles: Option<bool>,
    pub kcore: Option<bool>,
    pub articulation: Option<bool>,
    pub slack: Option<bool>,
    pub pagerank_timeout_ms: Option<u64>,
    pub betweenness_timeout_ms: Option<u64>,
    pub hits_timeout_ms: Option<u64>,
    pub cycles_timeout_ms: Option<u64>,
    /// `"exact"` or `"approximate"`.
    pub betweenness_mode: Option<String>,
    pub betweenness_sample_size: Option<usize>,
    pub max_cycles: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Persist analysis results across processes.
    pub disk: bool,
    /// Directory for the disk cache; defaults to the user cache dir.
    pub dir: Option<PathBuf>,
}

/// Load `.blockade/config.toml` under `project_root`.
///
/// A missing file yields the default configuration.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".blockade/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the directory holding persistent analysis caches.
///
/// `BLOCKADE_CACHE_DIR` wins, then the user cache directory. Returns
/// `None` when neither is available.
#[must_use]
pub fn resolve_cache_dir(lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(dir) = lookup("BLOCKADE_CACHE_DIR").filter(|d| !d.trim().is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs::cache_dir().map(|dir| dir.join("blockade"))
}

/// Read a process environment variable; the default lookup for
/// [`resolve_cache_dir`] and the analysis overrides.
#[must_use]
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Supported truthy values: `1`, `true`, `yes`, `on` (case-insensitive).
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("1")
        || value.eq_ignore_ascii_case("true")
        || value.eq_ignore_ascii_case("yes")
        || value.eq_ignore_ascii_case("on")
}
