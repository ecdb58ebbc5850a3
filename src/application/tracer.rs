//! Impact Tracer
//!
//! Walks the caller graph upward from one changed symbol until it reaches
//! program entry points. One strategy per symbol kind:
//! - functions and methods ascend from the declaration itself
//! - constants and variables ascend from every function that references them
//! - initializers and blank imports follow the package import graph
//!
//! Every ascent shares one visited set per changed symbol, so recursive and
//! mutually recursive call graphs terminate, and each binary is reported at
//! most once per symbol.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::ambiguity::{looks_like_method, AmbiguityFilter};
use crate::domain::boundary::BoundaryClassifier;
use crate::domain::callpath::{CallNode, CallPath};
use crate::domain::entry_point::EntryPointDetector;
use crate::domain::import_graph::ImportGraph;
use crate::domain::symbol::{ChangedSymbol, SymbolKind};
use crate::error::TraceError;
use crate::infrastructure::concurrency::CancelToken;
use crate::ports::provider::{AnalysisProvider, SymbolHandle};

/// State shared by every trace of one analysis run.
#[derive(Default)]
pub struct TraceContext {
    cancel: CancelToken,
    import_graph: OnceLock<Arc<ImportGraph>>,
}

impl TraceContext {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            cancel,
            import_graph: OnceLock::new(),
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    fn checkpoint(&self) -> Result<(), TraceError> {
        if self.cancel.is_cancelled() {
            Err(TraceError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Per-symbol traversal state.
struct Ascent {
    started_shared: bool,
    visited: HashSet<String>,
    seen_binaries: HashSet<String>,
    paths: Vec<CallPath>,
}

impl Ascent {
    fn new(started_shared: bool) -> Self {
        Self {
            started_shared,
            visited: HashSet::new(),
            seen_binaries: HashSet::new(),
            paths: Vec::new(),
        }
    }
}

pub struct ImpactTracer {
    provider: Arc<dyn AnalysisProvider>,
    filter: AmbiguityFilter,
    detector: EntryPointDetector,
    blank_alias: String,
}

impl ImpactTracer {
    pub fn new(provider: Arc<dyn AnalysisProvider>, config: &Config) -> Self {
        let classifier = BoundaryClassifier::from_config(&config.boundary);
        Self {
            provider,
            filter: AmbiguityFilter::new(classifier, &config.filter),
            detector: EntryPointDetector::from_config(&config.boundary),
            blank_alias: config.boundary.blank_alias.clone(),
        }
    }

    pub fn classifier(&self) -> &BoundaryClassifier {
        self.filter.classifier()
    }

    /// All call paths from an entry point down to `symbol`.
    pub fn trace(&self, symbol: &ChangedSymbol, ctx: &TraceContext) -> Result<Vec<CallPath>, TraceError> {
        ctx.checkpoint()?;
        match &symbol.kind {
            SymbolKind::Function { .. } | SymbolKind::Method { .. } => self.trace_calls(symbol, ctx),
            SymbolKind::Constant | SymbolKind::Variable => self.trace_references(symbol, ctx),
            SymbolKind::Init => self.trace_imports(&symbol.package_path, &symbol.name, ctx),
            SymbolKind::BlankImport { alias, path } => {
                if alias != &self.blank_alias {
                    return Err(TraceError::NonBlankImport {
                        alias: alias.clone(),
                        path: path.clone(),
                    });
                }
                if path.is_empty() {
                    return Err(TraceError::MissingImportInfo);
                }
                self.trace_imports(path, "init", ctx)
            }
            other @ (SymbolKind::Type | SymbolKind::Struct | SymbolKind::Interface) => {
                Err(TraceError::Unsupported(other.label()))
            }
        }
    }

    fn trace_calls(&self, symbol: &ChangedSymbol, ctx: &TraceContext) -> Result<Vec<CallPath>, TraceError> {
        let handle = self
            .provider
            .resolve_symbol_at(&symbol.position)
            .map_err(|e| TraceError::provider("resolve symbol", e))?;

        let mut ascent = Ascent::new(self.started_shared(symbol));
        self.ascend(&handle, &mut ascent, ctx)?;
        ctx.checkpoint()?;
        Ok(ascent.paths)
    }

    fn trace_references(&self, symbol: &ChangedSymbol, ctx: &TraceContext) -> Result<Vec<CallPath>, TraceError> {
        let handle = self
            .provider
            .resolve_symbol_at(&symbol.position)
            .map_err(|e| TraceError::provider("resolve symbol", e))?;

        ctx.checkpoint()?;
        let references = self
            .provider
            .find_references(&handle)
            .map_err(|e| TraceError::provider("find references", e))?;

        let mut roots: Vec<SymbolHandle> = Vec::new();
        let mut root_keys = HashSet::new();
        for location in &references {
            ctx.checkpoint()?;
            let containing = self
                .provider
                .containing_function(location)
                .map_err(|e| TraceError::provider("containing function", e))?;
            match containing {
                Some(function) => {
                    if root_keys.insert(function.key()) {
                        roots.push(function);
                    }
                }
                None => debug!(symbol = %symbol.name, location = %location, "package-level reference"),
            }
        }
        debug!(
            symbol = %symbol.name,
            references = references.len(),
            roots = roots.len(),
            "resolved reference roots"
        );

        let mut ascent = Ascent::new(self.started_shared(symbol));
        for root in &roots {
            self.ascend(root, &mut ascent, ctx)?;
        }
        ctx.checkpoint()?;
        Ok(ascent.paths)
    }

    /// Every entry package that imports `target_pkg`, directly or not.
    fn trace_imports(
        &self,
        target_pkg: &str,
        function_name: &str,
        ctx: &TraceContext,
    ) -> Result<Vec<CallPath>, TraceError> {
        let graph = self.import_graph(ctx)?;
        let target = CallNode::new(function_name, target_pkg);

        let paths = graph
            .entry_points_reaching(target_pkg, &self.detector)
            .into_iter()
            .map(|entry| {
                let path = vec![entry.call_node(), target.clone()];
                CallPath::new(entry.binary_name, entry.package_path, path)
            })
            .collect();
        ctx.checkpoint()?;
        Ok(paths)
    }

    fn import_graph(&self, ctx: &TraceContext) -> Result<Arc<ImportGraph>, TraceError> {
        if let Some(graph) = ctx.import_graph.get() {
            return Ok(Arc::clone(graph));
        }
        ctx.checkpoint()?;
        let graph = self
            .provider
            .package_import_graph()
            .map_err(|e| TraceError::provider("load import graph", e))?;
        debug!(packages = graph.len(), "loaded package import graph");
        // Racing loaders build the same graph; the first one is kept.
        Ok(Arc::clone(ctx.import_graph.get_or_init(|| Arc::new(graph))))
    }

    fn started_shared(&self, symbol: &ChangedSymbol) -> bool {
        self.classifier().is_shared_package(&symbol.package_path)
    }

    /// Depth-first ascent from `root`. Runs on an explicit frame stack, so
    /// call chain depth is bounded by memory, not by the worker's stack.
    ///
    /// `trail` holds the nodes walked so far, changed symbol first; frame
    /// `i` holds the callers of `trail[i]` still to be visited.
    fn ascend(&self, root: &SymbolHandle, ascent: &mut Ascent, ctx: &TraceContext) -> Result<(), TraceError> {
        let mut trail: Vec<CallNode> = Vec::new();
        let mut frames: Vec<std::vec::IntoIter<SymbolHandle>> = Vec::new();

        if let Some(callers) = self.enter(root, &mut trail, ascent, ctx)? {
            frames.push(callers.into_iter());
        }
        while let Some(frame) = frames.last_mut() {
            match frame.next() {
                Some(caller) => {
                    if let Some(callers) = self.enter(&caller, &mut trail, ascent, ctx)? {
                        frames.push(callers.into_iter());
                    }
                }
                None => {
                    frames.pop();
                    trail.pop();
                }
            }
        }
        Ok(())
    }

    /// Visit `handle`. Returns the callers to walk next, with `handle` left
    /// on the trail, or `None` if there is nothing to expand.
    fn enter(
        &self,
        handle: &SymbolHandle,
        trail: &mut Vec<CallNode>,
        ascent: &mut Ascent,
        ctx: &TraceContext,
    ) -> Result<Option<Vec<SymbolHandle>>, TraceError> {
        if !ascent.visited.insert(handle.key()) {
            return Ok(None);
        }
        trail.push(handle.call_node());

        if let Some(entry) = self
            .detector
            .detect(&handle.name, &handle.package_name, &handle.package_path)
        {
            if ascent.seen_binaries.insert(entry.binary_name.clone()) {
                let path: Vec<CallNode> = trail.iter().rev().cloned().collect();
                debug!(binary = %entry.binary_name, depth = path.len(), "reached entry point");
                ascent
                    .paths
                    .push(CallPath::new(entry.binary_name, entry.package_path, path));
            }
            trail.pop();
            return Ok(None);
        }

        ctx.checkpoint()?;
        let callers = self
            .provider
            .incoming_callers(handle)
            .map_err(|e| TraceError::provider("incoming callers", e))?;
        Ok(Some(self.eligible_callers(handle, callers, trail, ascent.started_shared)))
    }

    /// Callers of `handle` that survive dispatch pruning and the service
    /// boundary rules, in provider order.
    fn eligible_callers(
        &self,
        handle: &SymbolHandle,
        callers: Vec<SymbolHandle>,
        trail: &[CallNode],
        started_shared: bool,
    ) -> Vec<SymbolHandle> {
        if callers.is_empty() {
            return callers;
        }

        let current = handle.call_node();
        let below = &trail[..trail.len().saturating_sub(1)];
        let caller_packages: Vec<&str> = callers.iter().map(|c| c.package_path.as_str()).collect();
        let is_method = handle.is_method() || looks_like_method(&handle.name);
        let keep = self
            .filter
            .dispatch_survivors(&current, is_method, below, &caller_packages);

        callers
            .into_iter()
            .zip(keep)
            .filter(|(caller, keep)| {
                if !keep {
                    debug!(
                        caller = %caller.call_node().qualified_name(),
                        from = %current.qualified_name(),
                        cross_service = self
                            .classifier()
                            .crosses_service(&current.package_path, &caller.package_path),
                        "pruned ambiguous dispatch caller"
                    );
                    return false;
                }
                match self
                    .filter
                    .boundary_violation(&caller.package_path, started_shared, trail)
                {
                    Some(rule) => {
                        debug!(
                            caller = %caller.call_node().qualified_name(),
                            rule = rule.describe(),
                            "skipped caller at service boundary"
                        );
                        false
                    }
                    None => true,
                }
            })
            .map(|(caller, _)| caller)
            .collect()
    }
}

/// Warn about a failed trace. Cancellation is not a failure.
pub(crate) fn log_trace_failure(symbol: &ChangedSymbol, error: &TraceError) {
    match error {
        TraceError::Cancelled => debug!(symbol = %symbol, "trace cancelled"),
        TraceError::Unsupported(kind) => {
            info!(symbol = %symbol, kind, "no tracing strategy for symbol kind")
        }
        other => warn!(symbol = %symbol, error = %other, "trace failed, symbol contributes no paths"),
    }
}
