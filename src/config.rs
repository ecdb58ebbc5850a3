//! Configuration for Ripples.
//!
//! Loaded from an optional `ripples.toml`. Every field has a default so an
//! empty or missing file yields the stock layout: `pkg/`, `api/`, `common/`,
//! `shared/`, `lib/` are shared roots and `internal/`, `cmd/` are
//! service-private roots.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// File name looked up in the repository root when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "ripples.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub boundary: BoundaryConfig,
    pub filter: FilterConfig,
    pub cache: CacheConfig,
    pub concurrency: ConcurrencyConfig,
}

/// Package layout conventions used by the boundary classifier and the
/// entry-point detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    /// Module prefix stripped from package paths before classification, so a
    /// module literally named `.../api` is not mistaken for a shared root.
    pub module_path: Option<String>,
    pub shared_roots: Vec<String>,
    pub private_roots: Vec<String>,
    pub entry_function: String,
    pub entry_package: String,
    pub blank_alias: String,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            module_path: None,
            shared_roots: ["pkg", "api", "common", "shared", "lib"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            private_roots: ["internal", "cmd"].iter().map(|s| s.to_string()).collect(),
            entry_function: "main".to_string(),
            entry_package: "main".to_string(),
            blank_alias: "_".to_string(),
        }
    }
}

/// Weights of the dispatch fan-out scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub path_prefix_weight: u64,
    pub current_prefix_weight: u64,
    pub same_package_bonus: u64,
    pub retain_ratio: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            path_prefix_weight: 10,
            current_prefix_weight: 20,
            same_package_bonus: 100,
            retain_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Persistent cache directory; relative paths resolve against the repo.
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from(".ripples-cache"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// Trace workers; 0 picks half the available cores.
    pub workers: usize,
}

impl Config {
    /// Parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Use `explicit` if given, else `<repo>/ripples.toml` if it exists,
    /// else defaults.
    pub fn discover(repo: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = repo.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Digest of the settings that shape trace results. Persistent cache
    /// entries are partitioned by it, so editing `[boundary]` or `[filter]`
    /// starts from a cold cache.
    pub fn trace_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}|{:?}", self.boundary, self.filter).as_bytes());
        hex::encode(&hasher.finalize()[..8])
    }

    /// Cache directory resolved against the repository root.
    pub fn cache_dir(&self, repo: &Path) -> PathBuf {
        if self.cache.dir.is_absolute() {
            self.cache.dir.clone()
        } else {
            repo.join(&self.cache.dir)
        }
    }
}
