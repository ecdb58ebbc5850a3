//! Impact Analyzer
//!
//! Runs one trace per changed symbol on a dedicated worker pool. Workers only
//! send their paths down a channel; a single collector thread owns the
//! per-binary dedup map, so aggregation needs no locking.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, info};

use crate::application::tracer::{log_trace_failure, ImpactTracer, TraceContext};
use crate::config::Config;
use crate::domain::callpath::{AffectedBinary, CallPath};
use crate::domain::store::CacheKey;
use crate::domain::symbol::ChangedSymbol;
use crate::error::AnalyzeError;
use crate::infrastructure::concurrency::{build_trace_pool, CancelToken};
use crate::infrastructure::trace_cache::TraceCache;
use crate::ports::provider::AnalysisProvider;

pub struct ImpactAnalyzer {
    tracer: ImpactTracer,
    cache: Option<Arc<TraceCache>>,
    pool: ThreadPool,
}

impl ImpactAnalyzer {
    pub fn new(
        provider: Arc<dyn AnalysisProvider>,
        cache: Option<Arc<TraceCache>>,
        config: &Config,
    ) -> Result<Self, AnalyzeError> {
        let pool = build_trace_pool(config.concurrency.workers)?;
        Ok(Self {
            tracer: ImpactTracer::new(provider, config),
            cache,
            pool,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Binaries affected by `symbols`, sorted by name.
    pub fn analyze(&self, symbols: &[ChangedSymbol]) -> Result<Vec<AffectedBinary>, AnalyzeError> {
        self.analyze_with_cancel(symbols, &CancelToken::new())
    }

    /// Like [`analyze`](Self::analyze), but stops early once `cancel` fires.
    /// A cancelled run returns `AnalyzeError::Cancelled` and no results.
    pub fn analyze_with_cancel(
        &self,
        symbols: &[ChangedSymbol],
        cancel: &CancelToken,
    ) -> Result<Vec<AffectedBinary>, AnalyzeError> {
        let start = Instant::now();
        let traceable: Vec<&ChangedSymbol> = symbols
            .iter()
            .filter(|symbol| {
                let supported = symbol.kind.is_traceable();
                if !supported {
                    info!(symbol = %symbol, kind = symbol.kind.label(), "skipping symbol without tracing strategy");
                }
                supported
            })
            .collect();

        let ctx = TraceContext::new(cancel.clone());
        let (tx, rx) = mpsc::channel::<Vec<CallPath>>();

        let (collected, workers) = thread::scope(|scope| {
            let collector = scope.spawn(move || {
                let mut results = ResultCollector::default();
                for paths in rx {
                    results.add(&paths);
                }
                results.finish()
            });

            let workers = panic::catch_unwind(AssertUnwindSafe(|| {
                self.pool.install(|| {
                    traceable.par_iter().for_each_with(tx, |tx, symbol| {
                        if let Some(paths) = self.trace_one(symbol, &ctx) {
                            // The collector outlives every sender.
                            let _ = tx.send(paths);
                        }
                    });
                });
            }));

            (collector.join(), workers)
        });

        if workers.is_err() {
            return Err(AnalyzeError::Worker("trace worker panicked".to_string()));
        }
        let affected =
            collected.map_err(|_| AnalyzeError::Worker("result collector panicked".to_string()))?;

        if cancel.is_cancelled() {
            info!("analysis cancelled, discarding results");
            return Err(AnalyzeError::Cancelled);
        }

        info!(
            symbols = symbols.len(),
            traced = traceable.len(),
            affected = affected.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "analysis complete"
        );
        Ok(affected)
    }

    /// Cache lookup, then trace. `None` if the symbol failed or the run was
    /// cancelled.
    fn trace_one(&self, symbol: &ChangedSymbol, ctx: &TraceContext) -> Option<Vec<CallPath>> {
        if ctx.cancel_token().is_cancelled() {
            return None;
        }

        let key = CacheKey::for_symbol(symbol);
        if let Some(cache) = &self.cache {
            if let Some(paths) = cache.get(&key) {
                debug!(symbol = %symbol, paths = paths.len(), "trace cache hit");
                return Some(paths);
            }
        }

        match self.tracer.trace(symbol, ctx) {
            Ok(paths) => {
                debug!(symbol = %symbol, paths = paths.len(), "traced symbol");
                if let Some(cache) = &self.cache {
                    cache.set(&key, &paths);
                }
                Some(paths)
            }
            Err(e) => {
                log_trace_failure(symbol, &e);
                None
            }
        }
    }
}

/// Single-writer dedup of call paths by binary name.
#[derive(Default)]
struct ResultCollector {
    best: BTreeMap<String, AffectedBinary>,
}

impl ResultCollector {
    fn add(&mut self, paths: &[CallPath]) {
        for path in paths {
            let candidate = AffectedBinary::from(path);
            match self.best.entry(candidate.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(candidate);
                }
                Entry::Occupied(mut slot) => {
                    if candidate.preferred_over(slot.get()) {
                        slot.insert(candidate);
                    }
                }
            }
        }
    }

    fn finish(self) -> Vec<AffectedBinary> {
        self.best.into_values().collect()
    }
}
