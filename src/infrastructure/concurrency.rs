/// Concurrency management for Ripples.
/// Builds the trace worker pool and carries cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::ThreadPool;
use tracing::debug;

use crate::error::AnalyzeError;

/// Stack reserved for each trace worker.
pub const TRACE_STACK_SIZE: usize = 8 * 1024 * 1024;

/// Worker count for a configured value; 0 reserves half the cores,
/// minimum 1 worker.
pub fn resolve_workers(configured: usize) -> usize {
    if configured > 0 {
        return configured;
    }
    std::cmp::max(1, num_cpus::get() / 2)
}

/// Build a dedicated pool for one analyzer. Never touches the global pool,
/// so several analyzers can coexist in one process.
pub fn build_trace_pool(configured: usize) -> Result<ThreadPool, AnalyzeError> {
    let workers = resolve_workers(configured);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("ripples-trace-{}", i))
        .stack_size(TRACE_STACK_SIZE)
        .build()
        .map_err(|e| AnalyzeError::setup_with("failed to build trace pool", e))?;

    debug!(
        workers,
        cores = num_cpus::get(),
        "initialized trace pool"
    );
    Ok(pool)
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
