// Infrastructure implementations for Ripples.

pub mod change_loader;
pub mod concurrency;
pub mod snapshot_provider;
pub mod trace_cache;

pub use change_loader::ChangeLoader;
pub use concurrency::{build_trace_pool, CancelToken};
pub use snapshot_provider::{Snapshot, SnapshotProvider};
pub use trace_cache::{CacheStats, TraceCache};
