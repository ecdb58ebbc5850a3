use crate::domain::callpath::CallPath;
use crate::domain::symbol::ChangedSymbol;
use crate::error::CacheError;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use sled::Db;

/// Bump when the encoding of cached call paths or the traversal semantics
/// change; entries written under an older version are never read again.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// 256-bit content hash of `file|line|column|symbolName`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn new(file: &str, line: u32, column: u32, symbol_name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}|{}|{}|{}", file, line, column, symbol_name).as_bytes());
        Self(hasher.finalize().into())
    }

    pub fn for_symbol(symbol: &ChangedSymbol) -> Self {
        let pos = &symbol.position;
        Self::new(&pos.file, pos.line, pos.column, &symbol.name)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Trait for call-path storage backends.
/// Implementations must be thread-safe (Send + Sync).
pub trait PathStore: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<CallPath>>, CacheError>;
    fn put(&self, key: &CacheKey, paths: &[CallPath]) -> Result<(), CacheError>;

    /// Make pending writes durable. No-op for volatile stores.
    fn flush(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

// ============================================================================
// MemoryPathStore - Fast in-process storage using DashMap
// ============================================================================

#[derive(Default)]
pub struct MemoryPathStore {
    entries: DashMap<CacheKey, Vec<CallPath>>,
}

impl MemoryPathStore {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PathStore for MemoryPathStore {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<CallPath>>, CacheError> {
        Ok(self.entries.get(key).map(|r| r.clone()))
    }

    fn put(&self, key: &CacheKey, paths: &[CallPath]) -> Result<(), CacheError> {
        self.entries.insert(*key, paths.to_vec());
        Ok(())
    }
}

// ============================================================================
// DiskPathStore - Persistent content-addressed storage using sled
// ============================================================================

pub struct DiskPathStore {
    db: Db,
    paths_tree: sled::Tree,
}

impl DiskPathStore {
    /// Open the store in `path`. Entries live in a tree named after the
    /// schema version and `partition`; other partitions are never read.
    pub fn open(path: &std::path::Path, partition: &str) -> Result<Self, CacheError> {
        let db = sled::open(path)?;
        let paths_tree = db.open_tree(Self::tree_name(partition))?;
        Ok(Self { db, paths_tree })
    }

    fn tree_name(partition: &str) -> String {
        format!("call_paths_v{}_{}", CACHE_SCHEMA_VERSION, partition)
    }

    /// Raw write, bypassing encoding. Lets tests plant corrupt entries.
    pub fn put_raw(&self, key: &CacheKey, bytes: &[u8]) -> Result<(), CacheError> {
        self.paths_tree.insert(key.as_bytes(), bytes)?;
        Ok(())
    }
}

impl PathStore for DiskPathStore {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<CallPath>>, CacheError> {
        match self.paths_tree.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put(&self, key: &CacheKey, paths: &[CallPath]) -> Result<(), CacheError> {
        let bytes = bincode::serialize(paths)?;
        self.paths_tree.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), CacheError> {
        self.db.flush()?;
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
