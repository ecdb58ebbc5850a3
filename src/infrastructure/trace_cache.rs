/// Trace Cache Module
///
/// Two-tier memoization of per-symbol traces:
/// - tier 1: in-process `MemoryPathStore`, cleared with the process
/// - tier 2: persistent `DiskPathStore` under the cache directory
///
/// Lookup goes persistent -> memory; writes go through both tiers.
/// A persistent-tier failure is logged and treated as a miss.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::domain::callpath::CallPath;
use crate::domain::store::{CacheKey, DiskPathStore, MemoryPathStore, PathStore};
use crate::error::CacheError;

/// Hit/miss counters, reported with `--verbose`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub persistent_hits: usize,
    pub memory_hits: usize,
    pub misses: usize,
}

pub struct TraceCache {
    memory: MemoryPathStore,
    persistent: Option<Box<dyn PathStore>>,
    persistent_hits: AtomicUsize,
    memory_hits: AtomicUsize,
    misses: AtomicUsize,
}

impl TraceCache {
    /// Open a cache backed by a sled store in `dir`. `partition` is usually
    /// [`Config::trace_fingerprint`](crate::config::Config::trace_fingerprint).
    pub fn open(dir: &Path, partition: &str) -> Result<Self, CacheError> {
        let disk = DiskPathStore::open(dir, partition)?;
        debug!(dir = %dir.display(), partition, "opened persistent trace cache");
        Ok(Self::with_persistent(Box::new(disk)))
    }

    /// Build an in-memory-only cache without touching the filesystem.
    pub fn in_memory_only() -> Self {
        Self::build(None)
    }

    pub fn with_persistent(store: Box<dyn PathStore>) -> Self {
        Self::build(Some(store))
    }

    fn build(persistent: Option<Box<dyn PathStore>>) -> Self {
        Self {
            memory: MemoryPathStore::default(),
            persistent,
            persistent_hits: AtomicUsize::new(0),
            memory_hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Vec<CallPath>> {
        if let Some(store) = &self.persistent {
            match store.get(key) {
                Ok(Some(paths)) => {
                    self.persistent_hits.fetch_add(1, Ordering::Relaxed);
                    if let Err(e) = self.memory.put(key, &paths) {
                        debug!(key = %key.to_hex(), error = %e, "failed to promote cache entry");
                    }
                    return Some(paths);
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(key = %key.to_hex(), error = %e, "persistent cache read failed, treating as miss");
                }
            }
        }

        match self.memory.get(key) {
            Ok(Some(paths)) => {
                self.memory_hits.fetch_add(1, Ordering::Relaxed);
                Some(paths)
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Write through both tiers. Concurrent writers of one key race and the
    /// last write wins; values for one key are identical.
    pub fn set(&self, key: &CacheKey, paths: &[CallPath]) {
        if let Err(e) = self.memory.put(key, paths) {
            debug!(key = %key.to_hex(), error = %e, "memory cache write failed");
        }
        if let Some(store) = &self.persistent {
            if let Err(e) = store.put(key, paths) {
                debug!(key = %key.to_hex(), error = %e, "persistent cache write failed");
            }
        }
    }

    /// Flush the persistent tier. Errors are logged, never returned.
    pub fn flush(&self) {
        if let Some(store) = &self.persistent {
            if let Err(e) = store.flush() {
                debug!(error = %e, "persistent cache flush failed");
            }
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent.is_some()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            persistent_hits: self.persistent_hits.load(Ordering::Relaxed),
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
