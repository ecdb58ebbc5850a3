//! Shared fixtures: the reference workspaces as analysis snapshots, plus
//! provider wrappers for counting and failure injection.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ripples::domain::import_graph::ImportGraph;
use ripples::infrastructure::{CancelToken, Snapshot, SnapshotProvider};
use ripples::ports::provider::SymbolHandle;
use ripples::{
    AffectedBinary, AnalysisProvider, ChangedSymbol, Config, ImpactAnalyzer, Position, ProviderError,
    TraceCache,
};

// ============================================================================
// shared-package-test
// ============================================================================

pub const SHARED: &str = "example.com/shared-package-test";

pub fn shared_pkg(rel: &str) -> String {
    format!("{}/{}", SHARED, rel)
}

/// Two services that both log through `pkg/common` and both start their
/// server through `common.RunServer(r Runner)`. The engine reports
/// `RunServer` as a caller of every `Run` implementation.
pub fn shared_package_snapshot() -> Snapshot {
    let common = shared_pkg("pkg/common");
    let mut snapshot = Snapshot::default()
        .package(&common, "common", &[])
        .function("NewLogger", &common, "common", Position::new("pkg/common/logger.go", 11, 6))
        .method("Log", "*Logger", &common, "common", Position::new("pkg/common/logger.go", 16, 18))
        .method("LogWithLevel", "*Logger", &common, "common", Position::new("pkg/common/logger.go", 22, 18))
        .function("LogMessage", &common, "common", Position::new("pkg/common/logger.go", 29, 6))
        .function("LogMessageWithPrefix", &common, "common", Position::new("pkg/common/logger.go", 34, 6))
        .function("RunServer", &common, "common", Position::new("pkg/common/logger.go", 45, 6))
        .call("pkg/common/logger.go:22:18", "pkg/common/logger.go:16:18")
        .call("pkg/common/logger.go:34:6", "pkg/common/logger.go:29:6");

    for (svc, pkg_name) in [("service-a", "servicea"), ("service-b", "serviceb")] {
        let internal = shared_pkg(&format!("internal/{}", svc));
        let cmd = shared_pkg(&format!("cmd/{}", svc));
        let handler = format!("internal/{}/handler.go", svc);
        let main_go = format!("cmd/{}/main.go", svc);
        let key = |line: u32, col: u32| format!("{}:{}:{}", handler, line, col);
        let main_key = format!("{}:8:6", main_go);

        snapshot = snapshot
            .package(&cmd, "main", &[common.as_str(), internal.as_str()])
            .package(&internal, pkg_name, &[common.as_str()])
            .function("main", &cmd, "main", Position::new(&main_go, 8, 6))
            .function("NewHandler", &internal, pkg_name, Position::new(&handler, 11, 6))
            .method("ProcessRequest", "*Handler", &internal, pkg_name, Position::new(&handler, 18, 19))
            .function("NewServer", &internal, pkg_name, Position::new(&handler, 32, 6))
            .method("Run", "*Server", &internal, pkg_name, Position::new(&handler, 39, 18))
            .method("internalServiceLogic", "*Server", &internal, pkg_name, Position::new(&handler, 46, 18))
            .call(&main_key, &key(11, 6))
            .call(&main_key, &key(18, 19))
            .call(&main_key, &key(32, 6))
            .call(&main_key, "pkg/common/logger.go:45:6")
            .call(&key(11, 6), "pkg/common/logger.go:11:6")
            .call(&key(32, 6), &key(11, 6))
            .call(&key(18, 19), "pkg/common/logger.go:16:18")
            .call(&key(18, 19), "pkg/common/logger.go:22:18")
            .call(&key(18, 19), "pkg/common/logger.go:29:6")
            .call(&key(39, 18), &key(46, 18))
            .call(&key(46, 18), &key(18, 19))
            // Interface dispatch: r.Run() resolves to every implementation.
            .call("pkg/common/logger.go:45:6", &key(39, 18));
    }
    snapshot
}

pub fn log_message() -> ChangedSymbol {
    ChangedSymbol::function("LogMessage", &shared_pkg("pkg/common"), Position::new("pkg/common/logger.go", 29, 6))
}

pub fn log_method() -> ChangedSymbol {
    ChangedSymbol::method("Log", "*Logger", &shared_pkg("pkg/common"), Position::new("pkg/common/logger.go", 16, 18))
}

pub fn log_message_with_prefix() -> ChangedSymbol {
    ChangedSymbol::function(
        "LogMessageWithPrefix",
        &shared_pkg("pkg/common"),
        Position::new("pkg/common/logger.go", 34, 6),
    )
}

pub fn run_server() -> ChangedSymbol {
    ChangedSymbol::function("RunServer", &shared_pkg("pkg/common"), Position::new("pkg/common/logger.go", 45, 6))
}

/// Reported by the change source as a plain function, with column drift.
pub fn process_request_a() -> ChangedSymbol {
    ChangedSymbol::function(
        "ProcessRequest",
        &shared_pkg("internal/service-a"),
        Position::new("internal/service-a/handler.go", 18, 21),
    )
}

pub fn server_run_a() -> ChangedSymbol {
    ChangedSymbol::method(
        "Run",
        "*Server",
        &shared_pkg("internal/service-a"),
        Position::new("internal/service-a/handler.go", 39, 18),
    )
}

// ============================================================================
// dispatch-test
// ============================================================================

pub const DISPATCH: &str = "example.com/dispatch-test";

pub fn dispatch_pkg(rel: &str) -> String {
    format!("{}/{}", DISPATCH, rel)
}

/// Two services whose `Serve` loops call `h.Handle()` through an interface
/// held in private code. The engine reports every `Serve` as a caller of
/// every `Handle` implementation; no shared package is involved, so only
/// the dispatch pruning can separate the services.
pub fn dispatch_snapshot() -> Snapshot {
    let services = [("service-a", "servicea"), ("service-b", "serviceb")];
    let handle_key = |svc: &str| format!("internal/{}/handler.go:12:19", svc);

    let mut snapshot = Snapshot::default();
    for (svc, pkg_name) in services {
        let internal = dispatch_pkg(&format!("internal/{}", svc));
        let cmd = dispatch_pkg(&format!("cmd/{}", svc));
        let handler = format!("internal/{}/handler.go", svc);
        let main_go = format!("cmd/{}/main.go", svc);
        let serve_key = format!("{}:30:6", handler);

        snapshot = snapshot
            .package(&cmd, "main", &[internal.as_str()])
            .package(&internal, pkg_name, &[])
            .function("main", &cmd, "main", Position::new(&main_go, 5, 6))
            .method("Handle", "*Handler", &internal, pkg_name, Position::new(&handler, 12, 19))
            .function("helper", &internal, pkg_name, Position::new(&handler, 20, 6))
            .function("Serve", &internal, pkg_name, Position::new(&handler, 30, 6))
            .call(&format!("{}:5:6", main_go), &serve_key)
            .call(&handle_key(svc), &format!("{}:20:6", handler));

        for (target, _) in services {
            snapshot = snapshot.call(&serve_key, &handle_key(target));
        }
    }
    snapshot
}

pub fn dispatch_helper(svc: &str) -> ChangedSymbol {
    ChangedSymbol::function(
        "helper",
        &dispatch_pkg(&format!("internal/{}", svc)),
        Position::new(&format!("internal/{}/handler.go", svc), 20, 6),
    )
}

pub fn dispatch_handle(svc: &str) -> ChangedSymbol {
    ChangedSymbol::method(
        "Handle",
        "*Handler",
        &dispatch_pkg(&format!("internal/{}", svc)),
        Position::new(&format!("internal/{}/handler.go", svc), 12, 19),
    )
}

// ============================================================================
// constant-test
// ============================================================================

pub const CONSTANT: &str = "example.com/constant-test";

pub fn constant_pkg(rel: &str) -> String {
    format!("{}/{}", CONSTANT, rel)
}

/// `cmd/server.main -> service.DoWithRetry`, which reads
/// `config.MaxRetries` twice. `config.DefaultTimeout` is never read from a
/// function.
pub fn constant_snapshot() -> Snapshot {
    let cmd = constant_pkg("cmd/server");
    let service = constant_pkg("internal/service");
    let config = constant_pkg("internal/config");
    let retry = "internal/service/retry.go:6:6";

    Snapshot::default()
        .package(&cmd, "main", &[service.as_str()])
        .package(&service, "service", &[config.as_str()])
        .package(&config, "config", &[])
        .function("main", &cmd, "main", Position::new("cmd/server/main.go", 8, 6))
        .function("DoWithRetry", &service, "service", Position::new("internal/service/retry.go", 6, 6))
        .function("performOperation", &service, "service", Position::new("internal/service/retry.go", 17, 6))
        .constant("MaxRetries", &config, "config", Position::new("internal/config/config.go", 4, 7))
        .variable("DefaultTimeout", &config, "config", Position::new("internal/config/config.go", 7, 5))
        .call("cmd/server/main.go:8:6", retry)
        .call(retry, "internal/service/retry.go:17:6")
        .reference(
            "internal/config/config.go:4:7",
            Position::new("internal/service/retry.go", 7, 29),
            Some(retry),
        )
        .reference(
            "internal/config/config.go:4:7",
            Position::new("internal/service/retry.go", 13, 12),
            Some(retry),
        )
        .reference(
            "internal/config/config.go:7:5",
            Position::new("internal/config/config.go", 9, 18),
            None,
        )
}

pub fn max_retries() -> ChangedSymbol {
    ChangedSymbol::constant("MaxRetries", &constant_pkg("internal/config"), Position::new("internal/config/config.go", 4, 7))
}

pub fn default_timeout() -> ChangedSymbol {
    ChangedSymbol::new(
        "DefaultTimeout",
        ripples::SymbolKind::Variable,
        Position::new("internal/config/config.go", 7, 5),
        constant_pkg("internal/config"),
    )
}

pub fn do_with_retry() -> ChangedSymbol {
    ChangedSymbol::function("DoWithRetry", &constant_pkg("internal/service"), Position::new("internal/service/retry.go", 6, 6))
}

// ============================================================================
// init-test
// ============================================================================

pub const INIT: &str = "example.com/init-test";

pub fn init_pkg(rel: &str) -> String {
    format!("{}/{}", INIT, rel)
}

/// Binaries `server`, `api-server`, `worker`. `internal/handler` and
/// `internal/logger` import each other.
pub fn init_snapshot() -> Snapshot {
    let p = init_pkg;
    Snapshot::default()
        .package(&p("cmd/server"), "main", &[p("internal/cache").as_str(), p("internal/db").as_str()])
        .package(&p("cmd/api-server"), "main", &[p("internal/handler").as_str(), p("pkg/config").as_str()])
        .package(&p("cmd/worker"), "main", &[p("internal/db").as_str()])
        .package(&p("internal/handler"), "handler", &[p("internal/cache").as_str(), p("internal/logger").as_str()])
        .package(&p("internal/logger"), "logger", &[p("internal/handler").as_str()])
        .package(&p("internal/cache"), "cache", &[p("internal/db").as_str()])
        .package(&p("internal/db"), "db", &[p("pkg/config").as_str()])
        .package(&p("pkg/config"), "config", &[])
}

pub fn init_of(rel: &str) -> ChangedSymbol {
    ChangedSymbol::init(&init_pkg(rel), Position::new(format!("{}/init.go", rel), 5, 6))
}

// ============================================================================
// Harness
// ============================================================================

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.concurrency.workers = 2;
    config
}

pub fn provider(snapshot: Snapshot) -> Arc<dyn AnalysisProvider> {
    Arc::new(SnapshotProvider::new(snapshot))
}

pub fn analyzer(snapshot: Snapshot) -> ImpactAnalyzer {
    analyzer_with(provider(snapshot), None)
}

pub fn analyzer_with(provider: Arc<dyn AnalysisProvider>, cache: Option<Arc<TraceCache>>) -> ImpactAnalyzer {
    ImpactAnalyzer::new(provider, cache, &test_config()).unwrap()
}

pub fn names(results: &[AffectedBinary]) -> Vec<&str> {
    results.iter().map(|r| r.name.as_str()).collect()
}

/// Counts every provider query.
pub struct CountingProvider {
    inner: SnapshotProvider,
    calls: AtomicUsize,
}

impl CountingProvider {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            inner: SnapshotProvider::new(snapshot),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl AnalysisProvider for CountingProvider {
    fn resolve_symbol_at(&self, position: &Position) -> Result<SymbolHandle, ProviderError> {
        self.hit();
        self.inner.resolve_symbol_at(position)
    }

    fn incoming_callers(&self, handle: &SymbolHandle) -> Result<Vec<SymbolHandle>, ProviderError> {
        self.hit();
        self.inner.incoming_callers(handle)
    }

    fn find_references(&self, handle: &SymbolHandle) -> Result<Vec<Position>, ProviderError> {
        self.hit();
        self.inner.find_references(handle)
    }

    fn containing_function(&self, location: &Position) -> Result<Option<SymbolHandle>, ProviderError> {
        self.hit();
        self.inner.containing_function(location)
    }

    fn package_import_graph(&self) -> Result<ImportGraph, ProviderError> {
        self.hit();
        self.inner.package_import_graph()
    }
}

/// Fails caller queries for one declaration name.
pub struct FailingProvider {
    inner: SnapshotProvider,
    fail_on: &'static str,
}

impl FailingProvider {
    pub fn new(snapshot: Snapshot, fail_on: &'static str) -> Self {
        Self {
            inner: SnapshotProvider::new(snapshot),
            fail_on,
        }
    }
}

impl AnalysisProvider for FailingProvider {
    fn resolve_symbol_at(&self, position: &Position) -> Result<SymbolHandle, ProviderError> {
        self.inner.resolve_symbol_at(position)
    }

    fn incoming_callers(&self, handle: &SymbolHandle) -> Result<Vec<SymbolHandle>, ProviderError> {
        if handle.name == self.fail_on {
            return Err(ProviderError::Unavailable("engine crashed".to_string()));
        }
        self.inner.incoming_callers(handle)
    }

    fn find_references(&self, handle: &SymbolHandle) -> Result<Vec<Position>, ProviderError> {
        self.inner.find_references(handle)
    }

    fn containing_function(&self, location: &Position) -> Result<Option<SymbolHandle>, ProviderError> {
        self.inner.containing_function(location)
    }

    fn package_import_graph(&self) -> Result<ImportGraph, ProviderError> {
        self.inner.package_import_graph()
    }
}

/// Fires the token on the first symbol resolution.
pub struct CancellingProvider {
    inner: SnapshotProvider,
    token: CancelToken,
    later_calls: AtomicUsize,
}

impl CancellingProvider {
    pub fn new(snapshot: Snapshot, token: CancelToken) -> Self {
        Self {
            inner: SnapshotProvider::new(snapshot),
            token,
            later_calls: AtomicUsize::new(0),
        }
    }

    /// Queries made after the first resolution fired the token.
    pub fn later_calls(&self) -> usize {
        self.later_calls.load(Ordering::SeqCst)
    }
}

impl AnalysisProvider for CancellingProvider {
    fn resolve_symbol_at(&self, position: &Position) -> Result<SymbolHandle, ProviderError> {
        self.token.cancel();
        self.inner.resolve_symbol_at(position)
    }

    fn incoming_callers(&self, handle: &SymbolHandle) -> Result<Vec<SymbolHandle>, ProviderError> {
        self.later_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.incoming_callers(handle)
    }

    fn find_references(&self, handle: &SymbolHandle) -> Result<Vec<Position>, ProviderError> {
        self.later_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.find_references(handle)
    }

    fn containing_function(&self, location: &Position) -> Result<Option<SymbolHandle>, ProviderError> {
        self.later_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.containing_function(location)
    }

    fn package_import_graph(&self) -> Result<ImportGraph, ProviderError> {
        self.later_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.package_import_graph()
    }
}
